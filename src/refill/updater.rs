//! Refill-alert scan — recomputes `needs_refill_soon` across all
//! prescriptions with a known estimated end date.
//!
//! Run-to-completion and idempotent: a second pass with the same `today`
//! writes nothing. "Today" is established once by the caller and applied
//! to every record, so a pass that straddles midnight still produces one
//! consistent snapshot. Dates are `NaiveDate` throughout, which is the
//! midnight normalization: there is no time-of-day component to compare.

use chrono::NaiveDate;
use rusqlite::Connection;

use super::RefillError;
use crate::db::repository::{get_refill_candidates, set_needs_refill_soon};

/// What one scan did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefillOutcome {
    /// Candidate rows read (only rows with an estimated end date).
    pub scanned: usize,
    /// Rows whose flag actually changed and was written.
    pub changed: usize,
    /// Rows whose write failed; the scan continued past them.
    pub failed: usize,
}

/// Whether a prescription ending on `end_date` should carry the
/// refill-soon flag as of `today`.
///
/// True iff the end date is today or later and at most `threshold_days`
/// whole days away. Yesterday is false, today is true, `today + threshold`
/// is true, one day beyond is false.
pub fn needs_refill_soon(end_date: NaiveDate, today: NaiveDate, threshold_days: i64) -> bool {
    let days_until_end = (end_date - today).num_days();
    (0..=threshold_days).contains(&days_until_end)
}

/// Run one refill scan.
///
/// Prescriptions without an estimated end date are excluded by the query
/// and keep whatever flag they have. Unchanged rows are skipped, so the
/// scan writes nothing when nothing moved. A single-record write failure
/// is logged and counted; the scan continues. A read failure aborts the
/// whole pass.
pub fn update_refill_alerts(
    conn: &Connection,
    today: NaiveDate,
    threshold_days: i64,
) -> Result<RefillOutcome, RefillError> {
    let candidates = get_refill_candidates(conn)?;

    let mut outcome = RefillOutcome {
        scanned: candidates.len(),
        ..RefillOutcome::default()
    };

    for candidate in candidates {
        let desired = needs_refill_soon(candidate.estimated_end_date, today, threshold_days);
        if desired == candidate.needs_refill_soon {
            continue;
        }
        match set_needs_refill_soon(conn, &candidate.id, desired) {
            Ok(()) => {
                outcome.changed += 1;
                tracing::debug!(prescription_id = %candidate.id, flag = desired, "Refill flag updated");
            }
            Err(e) => {
                outcome.failed += 1;
                tracing::warn!(prescription_id = %candidate.id, error = %e, "Refill flag write failed, continuing");
            }
        }
    }

    tracing::info!(
        scanned = outcome.scanned,
        changed = outcome.changed,
        failed = outcome.failed,
        "Refill scan completed"
    );
    Ok(outcome)
}
