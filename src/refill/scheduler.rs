//! Daily refill-alert trigger.
//!
//! Spawns a background thread that wakes once a minute and runs the refill
//! scan the first time the wall clock in the configured time zone reaches
//! the trigger hour each calendar day. The process owns the handle; there
//! is no cancellation beyond shutdown.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;

use super::updater::update_refill_alerts;
use super::RefillError;
use crate::config::RefillConfig;
use crate::db::sqlite::open_database;

/// Check interval: once a minute.
const CHECK_INTERVAL_SECS: u64 = 60;

/// Sleep granularity for shutdown responsiveness (5 seconds).
const SLEEP_GRANULARITY_SECS: u64 = 5;

/// Handle for the refill scheduler thread.
///
/// Supports graceful shutdown via `shutdown()` or automatic cleanup on
/// `Drop`. Owned by the composition root for the life of the process.
pub struct RefillSchedulerHandle {
    shutdown: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl RefillSchedulerHandle {
    /// Request graceful shutdown. A scan in flight completes; no new
    /// scans are started.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// True while a scan is in flight.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}

impl Drop for RefillSchedulerHandle {
    fn drop(&mut self) {
        self.shutdown();
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

/// Start the refill scheduler on a separate thread.
///
/// Opens its own database connection per pass; the returned handle joins
/// the thread on drop.
pub fn start_refill_scheduler(db_path: PathBuf, config: RefillConfig) -> RefillSchedulerHandle {
    let shutdown = Arc::new(AtomicBool::new(false));
    let running = Arc::new(AtomicBool::new(false));
    let shutdown_flag = shutdown.clone();
    let running_flag = running.clone();

    let handle = std::thread::spawn(move || {
        tracing::info!(
            hour = config.trigger_hour,
            zone = %config.time_zone,
            threshold_days = config.threshold_days,
            "Refill scheduler started"
        );
        scheduler_loop(&db_path, &config, &shutdown_flag, &running_flag);
    });

    RefillSchedulerHandle {
        shutdown,
        running,
        handle: Some(handle),
    }
}

fn scheduler_loop(
    db_path: &Path,
    config: &RefillConfig,
    shutdown: &AtomicBool,
    running: &AtomicBool,
) {
    let mut last_run: Option<NaiveDate> = None;

    while !shutdown.load(Ordering::Relaxed) {
        // Sleep in small increments for responsive shutdown
        for _ in 0..(CHECK_INTERVAL_SECS / SLEEP_GRANULARITY_SECS) {
            if shutdown.load(Ordering::Relaxed) {
                tracing::info!("Refill scheduler shutting down");
                return;
            }
            std::thread::sleep(Duration::from_secs(SLEEP_GRANULARITY_SECS));
        }

        let now = Utc::now().with_timezone(&config.time_zone);
        let today = now.date_naive();
        if !should_fire(now, last_run, config.trigger_hour) {
            continue;
        }

        // Overlap guard: the scan is not proven safe against self-overlap.
        if running
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            tracing::warn!("Previous refill scan still in flight, skipping trigger");
            continue;
        }

        // A failed pass is not retried today; the next trigger is the retry.
        last_run = Some(today);
        if let Err(e) = run_scan(db_path, today, config.threshold_days) {
            tracing::error!(error = %e, "Refill scan failed");
        }
        running.store(false, Ordering::Release);
    }
    tracing::info!("Refill scheduler shutting down");
}

/// Whether the daily scan should fire at `now`.
///
/// Fires once per calendar day (in the configured zone) the first time
/// the wall clock enters the trigger hour; never twice on the same day.
fn should_fire(now: DateTime<Tz>, last_run: Option<NaiveDate>, trigger_hour: u32) -> bool {
    now.hour() == trigger_hour && last_run != Some(now.date_naive())
}

fn run_scan(db_path: &Path, today: NaiveDate, threshold_days: i64) -> Result<(), RefillError> {
    let conn = open_database(db_path)?;
    update_refill_alerts(&conn, today, threshold_days)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, d: u32) -> DateTime<Tz> {
        chrono_tz::Europe::Paris
            .with_ymd_and_hms(2024, 6, d, h, 30, 0)
            .unwrap()
    }

    #[test]
    fn fires_within_trigger_hour() {
        assert!(should_fire(at(1, 15), None, 1));
        // Any minute of the hour qualifies, not just 01:00 sharp.
        assert!(should_fire(at(1, 15), Some(at(1, 14).date_naive()), 1));
    }

    #[test]
    fn refuses_second_fire_same_day() {
        let today = at(1, 15).date_naive();
        assert!(!should_fire(at(1, 15), Some(today), 1));
    }

    #[test]
    fn fires_again_the_next_day() {
        let yesterday = at(1, 14).date_naive();
        assert!(should_fire(at(1, 15), Some(yesterday), 1));
    }

    #[test]
    fn refuses_outside_trigger_hour() {
        assert!(!should_fire(at(0, 15), None, 1));
        assert!(!should_fire(at(2, 15), None, 1));
    }

    #[test]
    fn sleep_granularity_divides_check_interval() {
        assert_eq!(CHECK_INTERVAL_SECS % SLEEP_GRANULARITY_SECS, 0);
    }

    #[test]
    fn shutdown_flag_sets_atomic() {
        let handle = RefillSchedulerHandle {
            shutdown: Arc::new(AtomicBool::new(false)),
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        };
        assert!(!handle.shutdown.load(Ordering::Relaxed));
        handle.shutdown();
        assert!(handle.shutdown.load(Ordering::Relaxed));
    }

    #[test]
    fn overlap_guard_rejects_second_entry() {
        let running = AtomicBool::new(false);
        assert!(running
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok());
        assert!(running
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err());
        running.store(false, Ordering::Release);
        assert!(running
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok());
    }

    #[test]
    fn scheduler_starts_and_shuts_down() {
        let dir = tempfile::tempdir().unwrap();
        let handle = start_refill_scheduler(dir.path().join("test.db"), RefillConfig::default());
        assert!(!handle.is_running());
        handle.shutdown();
        // Drop joins the thread; the first 5s sleep slot observes the flag.
    }
}
