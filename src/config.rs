//! Runtime configuration: schedule, threshold, and filesystem paths.

use std::path::PathBuf;
use std::str::FromStr;

use chrono_tz::Tz;
use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "RxAlert";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Days before the estimated end date during which the refill flag is set.
pub const DEFAULT_THRESHOLD_DAYS: i64 = 7;

/// Local hour (0-23) at which the daily scan fires.
pub const DEFAULT_TRIGGER_HOUR: u32 = 1;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value}")]
    Invalid { var: &'static str, value: String },
}

/// Refill-scan configuration, loaded once at startup.
#[derive(Debug, Clone, Copy)]
pub struct RefillConfig {
    pub threshold_days: i64,
    pub trigger_hour: u32,
    /// Zone in which the trigger hour is interpreted.
    pub time_zone: Tz,
}

impl Default for RefillConfig {
    fn default() -> Self {
        Self {
            threshold_days: DEFAULT_THRESHOLD_DAYS,
            trigger_hour: DEFAULT_TRIGGER_HOUR,
            time_zone: chrono_tz::UTC,
        }
    }
}

impl RefillConfig {
    /// Load from `RXALERT_THRESHOLD_DAYS`, `RXALERT_TRIGGER_HOUR` and
    /// `RXALERT_TZ` environment variables.
    ///
    /// A broken schedule is a silent correctness bug (prescriptions never
    /// re-flagged), so unparseable values fail here, at startup.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(
            std::env::var("RXALERT_THRESHOLD_DAYS").ok().as_deref(),
            std::env::var("RXALERT_TRIGGER_HOUR").ok().as_deref(),
            std::env::var("RXALERT_TZ").ok().as_deref(),
        )
    }

    fn from_vars(
        threshold: Option<&str>,
        hour: Option<&str>,
        zone: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(v) = threshold {
            config.threshold_days = v
                .parse::<i64>()
                .ok()
                .filter(|days| *days >= 0)
                .ok_or_else(|| ConfigError::Invalid {
                    var: "RXALERT_THRESHOLD_DAYS",
                    value: v.to_string(),
                })?;
        }

        if let Some(v) = hour {
            config.trigger_hour = v
                .parse::<u32>()
                .ok()
                .filter(|h| *h < 24)
                .ok_or_else(|| ConfigError::Invalid {
                    var: "RXALERT_TRIGGER_HOUR",
                    value: v.to_string(),
                })?;
        }

        if let Some(v) = zone {
            config.time_zone = Tz::from_str(v).map_err(|_| ConfigError::Invalid {
                var: "RXALERT_TZ",
                value: v.to_string(),
            })?;
        }

        Ok(config)
    }
}

/// Get the application data directory
/// ~/RxAlert/ on all platforms (user-visible)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join(APP_NAME)
}

/// Path of the prescriptions database
pub fn database_path() -> PathBuf {
    app_data_dir().join("rxalert.db")
}

/// Default tracing filter when RUST_LOG is unset
pub fn default_log_filter() -> String {
    format!("info,{}=debug", env!("CARGO_PKG_NAME"))
}
