//! Per-day eligibility screening.
//!
//! A worker drops out of the sweep for the day when approved leave covers
//! the date, or the date is a weekend day or holiday they are not
//! rostered for. The push-destination check lives in the engine (it needs
//! the tokens anyway), and the custom-hours policy is a fixed "never"
//! pending a real scheduling table.

use chrono::{Datelike, NaiveDate, Weekday};

use crate::error::StoreError;
use crate::model::{Worker, WorkerId};
use crate::store::WorkforceReader;

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Whether the worker sits out the whole day.
///
/// Weekends and holidays skip everyone except workers on the weekend duty
/// roster for that date; weekdays skip workers with an approved leave or
/// medical-report request covering the date.
///
/// # Errors
/// Returns an error if a store lookup fails.
pub fn on_leave_today<S: WorkforceReader>(
    store: &S,
    worker: WorkerId,
    date: NaiveDate,
) -> Result<bool, StoreError> {
    if is_weekend(date) || store.is_holiday(date)? {
        return Ok(!store.on_weekend_roster(worker, date)?);
    }
    store.approved_leave(worker, date)
}

/// Custom working hours exempt a worker from evaluation. The policy is a
/// deliberate constant "no" until per-worker schedules exist.
pub fn has_custom_hours(_worker: &Worker) -> bool {
    false
}
