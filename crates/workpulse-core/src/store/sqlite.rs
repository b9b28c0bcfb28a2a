//! SQLite-backed record store.
//!
//! Owns every table the sweep touches: the worker roster, push tokens,
//! location pings, attendance, leave requests, shift assignments, the
//! weekend duty roster, the holiday calendar, per-day sweep state, and the
//! notification ledger. The surrounding product writes most of these
//! tables; the sweep only reads them, plus the two it owns
//! (`workday_state`, `notification_ledger`).
//!
//! Timestamps are stored as RFC 3339 UTC strings, always written through
//! this module so lexicographic range comparisons stay valid. Date-keyed
//! tables store the local calendar date as `YYYY-MM-DD`.

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::StoreError;
use crate::model::{
    AttendanceRecord, LedgerEntry, LocalDay, LocationPing, Milestone, PushCommand, Worker,
    WorkdayState, WorkerId,
};
use crate::store::{WorkforceReader, WorkforceWriter};

// === Helper Functions ===

/// Format a push command for database storage
fn format_command(command: PushCommand) -> &'static str {
    match command {
        PushCommand::Resume => "resume",
        PushCommand::Stop => "stop",
        PushCommand::AdminResume => "admin_resume",
        PushCommand::AdminStop => "admin_stop",
    }
}

/// Column owning a milestone flag in `workday_state`
fn milestone_column(milestone: Milestone) -> &'static str {
    match milestone {
        Milestone::Arrival0900 => "arrival_0900",
        Milestone::Arrival1100 => "arrival_1100",
        Milestone::Arrival1220 => "arrival_1220",
        Milestone::Departure1650 => "departure_1650",
        Milestone::Departure1715 => "departure_1715",
        Milestone::Departure1740 => "departure_1740",
    }
}

/// Parse a stored RFC 3339 timestamp. Sweep decisions hang off these, so a
/// value that does not parse is surfaced instead of papered over.
fn parse_timestamp(column: &str, value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| StoreError::CorruptValue {
            column: column.to_string(),
            value: value.to_string(),
        })
}

/// Build a Worker from a full roster row
fn row_to_worker(row: &rusqlite::Row) -> Result<Worker, rusqlite::Error> {
    Ok(Worker {
        id: row.get(0)?,
        name: row.get(1)?,
        enrolled: row.get(2)?,
        admin: row.get(3)?,
        check_in_point: row.get(4)?,
        check_out_point: row.get(5)?,
    })
}

const WORKER_COLUMNS: &str = "id, name, enrolled, admin, check_in_point, check_out_point";

/// SQLite store implementing both workforce ports.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and run migrations.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory database. Used by tests and dry runs.
    ///
    /// # Errors
    /// Returns an error if the database cannot be created or migrated.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|source| StoreError::OpenFailed {
            path: ":memory:".into(),
            source,
        })?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), StoreError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS workers (
                    id              INTEGER PRIMARY KEY,
                    name            TEXT NOT NULL,
                    enrolled        INTEGER NOT NULL DEFAULT 0,
                    admin           INTEGER NOT NULL DEFAULT 0,
                    check_in_point  TEXT,
                    check_out_point TEXT
                );

                CREATE TABLE IF NOT EXISTS push_tokens (
                    worker_id INTEGER NOT NULL,
                    token     TEXT NOT NULL,
                    UNIQUE (worker_id, token)
                );

                CREATE TABLE IF NOT EXISTS location_pings (
                    id          INTEGER PRIMARY KEY AUTOINCREMENT,
                    worker_id   INTEGER NOT NULL,
                    recorded_at TEXT NOT NULL,
                    coordinates TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_pings_worker_time
                    ON location_pings (worker_id, recorded_at);

                CREATE TABLE IF NOT EXISTS attendance (
                    worker_id    INTEGER NOT NULL,
                    day          TEXT NOT NULL,
                    check_in_at  TEXT NOT NULL,
                    check_out_at TEXT,
                    PRIMARY KEY (worker_id, day)
                );

                CREATE TABLE IF NOT EXISTS leave_requests (
                    id        INTEGER PRIMARY KEY AUTOINCREMENT,
                    worker_id INTEGER NOT NULL,
                    kind      TEXT NOT NULL,
                    status    TEXT NOT NULL,
                    start_day TEXT NOT NULL,
                    end_day   TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS shift_assignments (
                    worker_id INTEGER NOT NULL,
                    day       TEXT NOT NULL,
                    PRIMARY KEY (worker_id, day)
                );

                CREATE TABLE IF NOT EXISTS weekend_roster (
                    worker_id INTEGER NOT NULL,
                    day       TEXT NOT NULL,
                    PRIMARY KEY (worker_id, day)
                );

                CREATE TABLE IF NOT EXISTS holidays (
                    id        INTEGER PRIMARY KEY AUTOINCREMENT,
                    name      TEXT NOT NULL,
                    start_day TEXT NOT NULL,
                    end_day   TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS workday_state (
                    worker_id       INTEGER NOT NULL,
                    day             TEXT NOT NULL,
                    early_notified  INTEGER NOT NULL DEFAULT 0,
                    arrival_0900    INTEGER NOT NULL DEFAULT 0,
                    arrival_1100    INTEGER NOT NULL DEFAULT 0,
                    arrival_1220    INTEGER NOT NULL DEFAULT 0,
                    departure_1650  INTEGER NOT NULL DEFAULT 0,
                    departure_1715  INTEGER NOT NULL DEFAULT 0,
                    departure_1740  INTEGER NOT NULL DEFAULT 0,
                    resume_attempts INTEGER NOT NULL DEFAULT 0,
                    resume_sent_at  TEXT,
                    PRIMARY KEY (worker_id, day)
                );

                CREATE TABLE IF NOT EXISTS notification_ledger (
                    id         INTEGER PRIMARY KEY AUTOINCREMENT,
                    recipient  INTEGER NOT NULL,
                    command    TEXT NOT NULL,
                    status     TEXT NOT NULL,
                    detail     TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_ledger_lookup
                    ON notification_ledger (recipient, command, created_at);",
            )
            .map_err(|e| StoreError::MigrationFailed(e.to_string()))
    }

    // === Roster and fixture surface ===
    //
    // The surrounding product owns these tables; inserting into them is
    // part of the store's public API and what tests seed with.

    /// Insert or replace a roster row.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    pub fn insert_worker(&self, worker: &Worker) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO workers
                 (id, name, enrolled, admin, check_in_point, check_out_point)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                worker.id,
                worker.name,
                worker.enrolled,
                worker.admin,
                worker.check_in_point,
                worker.check_out_point,
            ],
        )?;
        Ok(())
    }

    /// Register a push destination for a worker. Duplicate tokens are
    /// ignored.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    pub fn insert_push_token(&self, worker: WorkerId, token: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR IGNORE INTO push_tokens (worker_id, token) VALUES (?1, ?2)",
            params![worker, token],
        )?;
        Ok(())
    }

    /// Append one location ping.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    pub fn insert_ping(
        &self,
        worker: WorkerId,
        recorded_at: DateTime<Utc>,
        coordinates: &str,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO location_pings (worker_id, recorded_at, coordinates)
             VALUES (?1, ?2, ?3)",
            params![worker, recorded_at.to_rfc3339(), coordinates],
        )?;
        Ok(())
    }

    /// Record a check-in for the day.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    pub fn record_check_in(
        &self,
        worker: WorkerId,
        day: NaiveDate,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO attendance (worker_id, day, check_in_at, check_out_at)
             VALUES (?1, ?2, ?3, NULL)",
            params![worker, day.to_string(), at.to_rfc3339()],
        )?;
        Ok(())
    }

    /// Record a check-out on an existing attendance row.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    pub fn record_check_out(
        &self,
        worker: WorkerId,
        day: NaiveDate,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            "UPDATE attendance SET check_out_at = ?3 WHERE worker_id = ?1 AND day = ?2",
            params![worker, day.to_string(), at.to_rfc3339()],
        )?;
        Ok(())
    }

    /// Insert a leave request covering `[start_day, end_day]`.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    pub fn insert_leave(
        &self,
        worker: WorkerId,
        kind: &str,
        status: &str,
        start_day: NaiveDate,
        end_day: NaiveDate,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO leave_requests (worker_id, kind, status, start_day, end_day)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                worker,
                kind,
                status,
                start_day.to_string(),
                end_day.to_string()
            ],
        )?;
        Ok(())
    }

    /// Put a worker on a shift-based schedule for the day.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    pub fn insert_shift(&self, worker: WorkerId, day: NaiveDate) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR IGNORE INTO shift_assignments (worker_id, day) VALUES (?1, ?2)",
            params![worker, day.to_string()],
        )?;
        Ok(())
    }

    /// Put a worker on the weekend duty roster for the day.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    pub fn insert_weekend_duty(&self, worker: WorkerId, day: NaiveDate) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR IGNORE INTO weekend_roster (worker_id, day) VALUES (?1, ?2)",
            params![worker, day.to_string()],
        )?;
        Ok(())
    }

    /// Insert a holiday covering `[start_day, end_day]`.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    pub fn insert_holiday(
        &self,
        name: &str,
        start_day: NaiveDate,
        end_day: NaiveDate,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO holidays (name, start_day, end_day) VALUES (?1, ?2, ?3)",
            params![name, start_day.to_string(), end_day.to_string()],
        )?;
        Ok(())
    }
}

impl WorkforceReader for SqliteStore {
    fn enrolled_workers(&self) -> Result<Vec<Worker>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {WORKER_COLUMNS} FROM workers WHERE enrolled = 1 ORDER BY id ASC"
        ))?;
        let mut rows = stmt.query([])?;
        let mut workers = Vec::new();
        while let Some(row) = rows.next()? {
            workers.push(row_to_worker(row)?);
        }
        Ok(workers)
    }

    fn push_tokens(&self, worker: WorkerId) -> Result<Vec<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT token FROM push_tokens WHERE worker_id = ?1 ORDER BY rowid ASC")?;
        let mut rows = stmt.query(params![worker])?;
        let mut tokens = Vec::new();
        while let Some(row) = rows.next()? {
            tokens.push(row.get(0)?);
        }
        Ok(tokens)
    }

    fn latest_ping(
        &self,
        worker: WorkerId,
        day: &LocalDay,
    ) -> Result<Option<LocationPing>, StoreError> {
        let row: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT recorded_at, coordinates FROM location_pings
                 WHERE worker_id = ?1 AND recorded_at >= ?2 AND recorded_at < ?3
                 ORDER BY recorded_at DESC LIMIT 1",
                params![
                    worker,
                    day.start_utc.to_rfc3339(),
                    day.end_utc.to_rfc3339()
                ],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        match row {
            Some((recorded_at, coordinates)) => Ok(Some(LocationPing {
                worker_id: worker,
                recorded_at: parse_timestamp("location_pings.recorded_at", &recorded_at)?,
                coordinates,
            })),
            None => Ok(None),
        }
    }

    fn attendance(
        &self,
        worker: WorkerId,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let row: Option<(String, Option<String>)> = self
            .conn
            .query_row(
                "SELECT check_in_at, check_out_at FROM attendance
                 WHERE worker_id = ?1 AND day = ?2",
                params![worker, date.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        match row {
            Some((check_in, check_out)) => Ok(Some(AttendanceRecord {
                worker_id: worker,
                check_in_at: parse_timestamp("attendance.check_in_at", &check_in)?,
                check_out_at: check_out
                    .map(|v| parse_timestamp("attendance.check_out_at", &v))
                    .transpose()?,
            })),
            None => Ok(None),
        }
    }

    fn approved_leave(&self, worker: WorkerId, date: NaiveDate) -> Result<bool, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM leave_requests
             WHERE worker_id = ?1 AND status = 'approved'
               AND start_day <= ?2 AND end_day >= ?2",
            params![worker, date.to_string()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn on_weekend_roster(&self, worker: WorkerId, date: NaiveDate) -> Result<bool, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM weekend_roster WHERE worker_id = ?1 AND day = ?2",
            params![worker, date.to_string()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn is_holiday(&self, date: NaiveDate) -> Result<bool, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM holidays WHERE start_day <= ?1 AND end_day >= ?1",
            params![date.to_string()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn on_shift(&self, worker: WorkerId, date: NaiveDate) -> Result<bool, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM shift_assignments WHERE worker_id = ?1 AND day = ?2",
            params![worker, date.to_string()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn day_state(&self, worker: WorkerId, date: NaiveDate) -> Result<WorkdayState, StoreError> {
        let row: Option<(WorkdayState, Option<String>)> = self
            .conn
            .query_row(
                "SELECT early_notified, arrival_0900, arrival_1100, arrival_1220,
                        departure_1650, departure_1715, departure_1740,
                        resume_attempts, resume_sent_at
                 FROM workday_state WHERE worker_id = ?1 AND day = ?2",
                params![worker, date.to_string()],
                |row| {
                    let state = WorkdayState {
                        early_notified: row.get(0)?,
                        arrival_0900: row.get(1)?,
                        arrival_1100: row.get(2)?,
                        arrival_1220: row.get(3)?,
                        departure_1650: row.get(4)?,
                        departure_1715: row.get(5)?,
                        departure_1740: row.get(6)?,
                        resume_attempts: row.get(7)?,
                        resume_sent_at: None,
                    };
                    Ok((state, row.get(8)?))
                },
            )
            .optional()?;

        match row {
            Some((mut state, sent_at)) => {
                state.resume_sent_at = sent_at
                    .map(|v| parse_timestamp("workday_state.resume_sent_at", &v))
                    .transpose()?;
                Ok(state)
            }
            None => Ok(WorkdayState::default()),
        }
    }

    fn ledger_contains(
        &self,
        recipient: WorkerId,
        command: PushCommand,
        day: &LocalDay,
    ) -> Result<bool, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM notification_ledger
             WHERE recipient = ?1 AND command = ?2
               AND created_at >= ?3 AND created_at < ?4",
            params![
                recipient,
                format_command(command),
                day.start_utc.to_rfc3339(),
                day.end_utc.to_rfc3339()
            ],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn admin(&self) -> Result<Option<Worker>, StoreError> {
        let worker = self
            .conn
            .query_row(
                &format!(
                    "SELECT {WORKER_COLUMNS} FROM workers WHERE admin = 1 ORDER BY id ASC LIMIT 1"
                ),
                [],
                row_to_worker,
            )
            .optional()?;
        Ok(worker)
    }
}

impl WorkforceWriter for SqliteStore {
    fn set_milestone(
        &self,
        worker: WorkerId,
        date: NaiveDate,
        milestone: Milestone,
    ) -> Result<(), StoreError> {
        let column = milestone_column(milestone);
        self.conn.execute(
            &format!(
                "INSERT INTO workday_state (worker_id, day, {column}) VALUES (?1, ?2, 1)
                 ON CONFLICT (worker_id, day) DO UPDATE SET {column} = 1"
            ),
            params![worker, date.to_string()],
        )?;
        Ok(())
    }

    fn mark_early_notified(&self, worker: WorkerId, date: NaiveDate) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO workday_state (worker_id, day, early_notified) VALUES (?1, ?2, 1)
             ON CONFLICT (worker_id, day) DO UPDATE SET early_notified = 1",
            params![worker, date.to_string()],
        )?;
        Ok(())
    }

    fn record_resume_attempt(
        &self,
        worker: WorkerId,
        date: NaiveDate,
        attempts: u32,
        sent_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO workday_state (worker_id, day, resume_attempts, resume_sent_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (worker_id, day)
             DO UPDATE SET resume_attempts = ?3, resume_sent_at = ?4",
            params![worker, date.to_string(), attempts, sent_at.to_rfc3339()],
        )?;
        Ok(())
    }

    fn reset_resume(&self, worker: WorkerId, date: NaiveDate) -> Result<(), StoreError> {
        self.conn.execute(
            "UPDATE workday_state SET resume_attempts = 0, resume_sent_at = NULL
             WHERE worker_id = ?1 AND day = ?2",
            params![worker, date.to_string()],
        )?;
        Ok(())
    }

    fn append_ledger(&self, entry: &LedgerEntry) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO notification_ledger (recipient, command, status, detail, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.recipient,
                format_command(entry.command),
                entry.status,
                entry.detail,
                entry.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset, TimeZone};

    fn store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    fn make_worker(id: WorkerId) -> Worker {
        Worker {
            id,
            name: format!("worker-{id}"),
            enrolled: true,
            admin: false,
            check_in_point: Some("41.015,28.979".to_string()),
            check_out_point: Some("41.015,28.979".to_string()),
        }
    }

    fn day_at_plus3(y: i32, m: u32, d: u32) -> LocalDay {
        let offset = FixedOffset::east_opt(3 * 3600).unwrap();
        let noon_utc = Utc.with_ymd_and_hms(y, m, d, 9, 0, 0).unwrap();
        LocalDay::containing(noon_utc, offset)
    }

    #[test]
    fn enrolled_workers_filters_and_orders() {
        let store = store();
        let mut off = make_worker(5);
        off.enrolled = false;
        store.insert_worker(&make_worker(3)).unwrap();
        store.insert_worker(&make_worker(1)).unwrap();
        store.insert_worker(&off).unwrap();

        let workers = store.enrolled_workers().unwrap();
        let ids: Vec<WorkerId> = workers.iter().map(|w| w.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn push_tokens_deduplicate() {
        let store = store();
        store.insert_push_token(1, "tok-a").unwrap();
        store.insert_push_token(1, "tok-a").unwrap();
        store.insert_push_token(1, "tok-b").unwrap();
        assert_eq!(store.push_tokens(1).unwrap(), vec!["tok-a", "tok-b"]);
        assert!(store.push_tokens(2).unwrap().is_empty());
    }

    #[test]
    fn latest_ping_is_scoped_to_the_day() {
        let store = store();
        let day = day_at_plus3(2025, 3, 10);

        // yesterday, inside today, newest today
        store
            .insert_ping(1, day.start_utc - Duration::hours(2), "1.0,1.0")
            .unwrap();
        store
            .insert_ping(1, day.start_utc + Duration::hours(5), "2.0,2.0")
            .unwrap();
        store
            .insert_ping(1, day.start_utc + Duration::hours(8), "3.0,3.0")
            .unwrap();

        let ping = store.latest_ping(1, &day).unwrap().unwrap();
        assert_eq!(ping.coordinates, "3.0,3.0");
        assert_eq!(ping.recorded_at, day.start_utc + Duration::hours(8));

        let empty_day = day_at_plus3(2025, 3, 12);
        assert!(store.latest_ping(1, &empty_day).unwrap().is_none());
    }

    #[test]
    fn attendance_roundtrip_with_checkout() {
        let store = store();
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let check_in = Utc.with_ymd_and_hms(2025, 3, 10, 5, 30, 0).unwrap();

        assert!(store.attendance(1, date).unwrap().is_none());

        store.record_check_in(1, date, check_in).unwrap();
        let record = store.attendance(1, date).unwrap().unwrap();
        assert_eq!(record.check_in_at, check_in);
        assert!(record.check_out_at.is_none());

        let check_out = check_in + Duration::hours(9);
        store.record_check_out(1, date, check_out).unwrap();
        let record = store.attendance(1, date).unwrap().unwrap();
        assert_eq!(record.check_out_at, Some(check_out));
    }

    #[test]
    fn approved_leave_respects_status_and_range() {
        let store = store();
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();

        store
            .insert_leave(1, "half_day", "pending", date, date)
            .unwrap();
        assert!(!store.approved_leave(1, date).unwrap());

        store
            .insert_leave(
                1,
                "medical_report",
                "approved",
                date - Duration::days(1),
                date + Duration::days(1),
            )
            .unwrap();
        assert!(store.approved_leave(1, date).unwrap());
        assert!(!store.approved_leave(1, date + Duration::days(2)).unwrap());
    }

    #[test]
    fn holiday_range_covers_inclusive_bounds() {
        let store = store();
        let start = NaiveDate::from_ymd_opt(2025, 4, 23).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 4, 25).unwrap();
        store.insert_holiday("spring", start, end).unwrap();

        assert!(store.is_holiday(start).unwrap());
        assert!(store.is_holiday(end).unwrap());
        assert!(!store.is_holiday(end + Duration::days(1)).unwrap());
    }

    #[test]
    fn day_state_defaults_until_first_write() {
        let store = store();
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();

        assert_eq!(store.day_state(1, date).unwrap(), WorkdayState::default());

        store
            .set_milestone(1, date, Milestone::Arrival0900)
            .unwrap();
        let state = store.day_state(1, date).unwrap();
        assert!(state.arrival_0900);
        assert!(!state.arrival_1100);
        assert_eq!(state.resume_attempts, 0);

        // different day keeps its own row
        assert_eq!(
            store.day_state(1, date + Duration::days(1)).unwrap(),
            WorkdayState::default()
        );
    }

    #[test]
    fn milestone_write_is_idempotent() {
        let store = store();
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        store
            .set_milestone(1, date, Milestone::Departure1650)
            .unwrap();
        store
            .set_milestone(1, date, Milestone::Departure1650)
            .unwrap();
        assert!(store.day_state(1, date).unwrap().departure_1650);
    }

    #[test]
    fn resume_counters_roundtrip_and_reset() {
        let store = store();
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let sent = Utc.with_ymd_and_hms(2025, 3, 10, 7, 0, 0).unwrap();

        store.record_resume_attempt(1, date, 1, sent).unwrap();
        store
            .record_resume_attempt(1, date, 2, sent + Duration::minutes(10))
            .unwrap();
        let state = store.day_state(1, date).unwrap();
        assert_eq!(state.resume_attempts, 2);
        assert_eq!(state.resume_sent_at, Some(sent + Duration::minutes(10)));

        store.reset_resume(1, date).unwrap();
        let state = store.day_state(1, date).unwrap();
        assert_eq!(state.resume_attempts, 0);
        assert!(state.resume_sent_at.is_none());
    }

    #[test]
    fn resume_write_keeps_milestones() {
        let store = store();
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        store
            .set_milestone(1, date, Milestone::Arrival0900)
            .unwrap();
        store
            .record_resume_attempt(1, date, 1, Utc::now())
            .unwrap();
        let state = store.day_state(1, date).unwrap();
        assert!(state.arrival_0900);
        assert_eq!(state.resume_attempts, 1);
    }

    #[test]
    fn ledger_lookup_is_scoped_to_day_and_command() {
        let store = store();
        let day = day_at_plus3(2025, 3, 10);
        let entry = LedgerEntry::sent(
            1,
            PushCommand::Resume,
            "attempt 1",
            day.start_utc + Duration::hours(6),
        );
        store.append_ledger(&entry).unwrap();

        assert!(store.ledger_contains(1, PushCommand::Resume, &day).unwrap());
        assert!(!store.ledger_contains(1, PushCommand::Stop, &day).unwrap());
        assert!(!store.ledger_contains(2, PushCommand::Resume, &day).unwrap());

        let next_day = day_at_plus3(2025, 3, 11);
        assert!(!store
            .ledger_contains(1, PushCommand::Resume, &next_day)
            .unwrap());
    }

    #[test]
    fn admin_is_first_flagged_worker() {
        let store = store();
        assert!(store.admin().unwrap().is_none());

        let mut boss = make_worker(9);
        boss.admin = true;
        let mut second = make_worker(12);
        second.admin = true;
        store.insert_worker(&boss).unwrap();
        store.insert_worker(&second).unwrap();

        assert_eq!(store.admin().unwrap().unwrap().id, 9);
    }
}
