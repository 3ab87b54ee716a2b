//! Refill-alert core: the daily scan plus the trigger that fires it.

pub mod scheduler;
pub mod updater;

pub use scheduler::{start_refill_scheduler, RefillSchedulerHandle};
pub use updater::{needs_refill_soon, update_refill_alerts, RefillOutcome};

use thiserror::Error;

use crate::db::DatabaseError;

#[derive(Error, Debug)]
pub enum RefillError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}
