//! Crash recovery for rows caught mid-submission.
//!
//! A submission marks its rows 'Submitting' before driving the external
//! service; if the process dies in between, those rows would otherwise be
//! invisible to the draft grid forever.

use crate::errors::AppResult;
use rusqlite::{Connection, params};
use tracing::warn;

/// Rows stuck in 'Submitting' longer than `max_age_minutes` are flipped to
/// 'Failed' so the user can see and reset them.
pub fn recover_stuck(conn: &Connection, max_age_minutes: i64) -> AppResult<usize> {
    let n = conn.execute(
        "UPDATE timesheet
         SET status = 'Failed',
             submission_started_at = NULL
         WHERE status = 'Submitting'
           AND datetime(submission_started_at) < datetime('now', ?1)",
        params![format!("-{} minutes", max_age_minutes)],
    )?;

    if n > 0 {
        warn!("recovered {} entries stuck in submission from a previous session", n);
    }

    Ok(n)
}

/// Reset failed entries back to draft state; the grid picks them up on the
/// next load.
pub fn reset_failed(conn: &Connection) -> AppResult<usize> {
    let n = conn.execute(
        "UPDATE timesheet
         SET status = NULL,
             submission_started_at = NULL
         WHERE status = 'Failed'",
        [],
    )?;
    Ok(n)
}
