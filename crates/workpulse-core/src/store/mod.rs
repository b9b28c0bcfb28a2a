//! Storage ports and their default SQLite implementation.
//!
//! The sweep engine never talks to a database directly; it goes through the
//! [`WorkforceReader`] and [`WorkforceWriter`] ports. [`SqliteStore`]
//! implements both and is what the CLI wires in.

mod config;
pub mod sqlite;

pub use config::{Config, PushConfig, StorageConfig};
pub use sqlite::SqliteStore;

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::{ConfigError, StoreError};
use crate::model::{
    AttendanceRecord, LedgerEntry, LocalDay, LocationPing, Milestone, PushCommand, Worker,
    WorkdayState, WorkerId,
};

/// Returns the data directory (`~/.local/share/workpulse` or platform
/// equivalent), creating it if needed.
///
/// Set WORKPULSE_DATA_DIR to use a different directory.
///
/// # Errors
/// Returns an error if no base directory can be determined or if creating
/// the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var("WORKPULSE_DATA_DIR") {
        Ok(custom) if !custom.is_empty() => PathBuf::from(custom),
        _ => dirs::data_dir()
            .ok_or_else(|| ConfigError::DataDir("no platform data directory".to_string()))?
            .join("workpulse"),
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(e.to_string()))?;
    Ok(dir)
}

/// Read side of the record store.
///
/// Day-scoped lookups take either a plain [`NaiveDate`] (tables keyed by
/// local calendar date) or a [`LocalDay`] (tables keyed by UTC timestamp,
/// filtered to the day's UTC bounds).
pub trait WorkforceReader {
    /// All workers with the enrollment flag set, in id order.
    fn enrolled_workers(&self) -> Result<Vec<Worker>, StoreError>;

    /// Registered push destinations for a worker.
    fn push_tokens(&self, worker: WorkerId) -> Result<Vec<String>, StoreError>;

    /// Most recent location ping for a worker within the given day.
    fn latest_ping(&self, worker: WorkerId, day: &LocalDay)
        -> Result<Option<LocationPing>, StoreError>;

    /// Attendance row for a worker on a date, if they have checked in.
    fn attendance(
        &self,
        worker: WorkerId,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError>;

    /// Whether an approved leave or medical-report request covers the date.
    fn approved_leave(&self, worker: WorkerId, date: NaiveDate) -> Result<bool, StoreError>;

    /// Whether the worker is on the weekend duty roster for the date.
    fn on_weekend_roster(&self, worker: WorkerId, date: NaiveDate) -> Result<bool, StoreError>;

    /// Whether the date falls inside a calendar holiday.
    fn is_holiday(&self, date: NaiveDate) -> Result<bool, StoreError>;

    /// Whether the worker is on a shift-based schedule for the date.
    fn on_shift(&self, worker: WorkerId, date: NaiveDate) -> Result<bool, StoreError>;

    /// Per-day sweep state; `Default` when the row is absent.
    fn day_state(&self, worker: WorkerId, date: NaiveDate) -> Result<WorkdayState, StoreError>;

    /// Whether the ledger already holds {recipient, command} within the day.
    fn ledger_contains(
        &self,
        recipient: WorkerId,
        command: PushCommand,
        day: &LocalDay,
    ) -> Result<bool, StoreError>;

    /// The digest recipient: first worker with the admin role, if any.
    fn admin(&self) -> Result<Option<Worker>, StoreError>;
}

/// Write side of the record store. Every method is a single discrete call;
/// no transaction spans workers.
pub trait WorkforceWriter {
    /// Set one milestone flag for the day. Idempotent; flags never regress.
    fn set_milestone(
        &self,
        worker: WorkerId,
        date: NaiveDate,
        milestone: Milestone,
    ) -> Result<(), StoreError>;

    /// Record that the early-arrival reminder went out today.
    fn mark_early_notified(&self, worker: WorkerId, date: NaiveDate) -> Result<(), StoreError>;

    /// Persist an incremented attempt counter and send timestamp. Written
    /// before the push goes out, so the counter reflects attempts, not
    /// deliveries.
    fn record_resume_attempt(
        &self,
        worker: WorkerId,
        date: NaiveDate,
        attempts: u32,
        sent_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Clear the attempt counter and send timestamp after backoff expiry.
    fn reset_resume(&self, worker: WorkerId, date: NaiveDate) -> Result<(), StoreError>;

    /// Append one idempotency-ledger row.
    fn append_ledger(&self, entry: &LedgerEntry) -> Result<(), StoreError>;
}
