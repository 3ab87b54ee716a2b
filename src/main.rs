//! Composition root: tracing, config, database, scheduler, shutdown.

use tracing_subscriber::EnvFilter;

use rxalert::config::{self, RefillConfig};
use rxalert::db::sqlite::open_database;
use rxalert::refill::start_refill_scheduler;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    // An unparseable schedule would silently stop re-flagging
    // prescriptions, so configuration errors are fatal at startup.
    let refill_config = RefillConfig::from_env().expect("Invalid RXALERT_* configuration");

    std::fs::create_dir_all(config::app_data_dir()).expect("Cannot create data directory");
    let db_path = config::database_path();

    // Run migrations up front; the scheduler opens its own connection per pass.
    open_database(&db_path).expect("Cannot open prescriptions database");

    let scheduler = start_refill_scheduler(db_path, refill_config);

    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for shutdown signal");
    tracing::info!("Shutdown signal received");

    // Dropping the handle joins the scheduler thread.
    drop(scheduler);
}
