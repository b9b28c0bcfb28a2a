//! Domain types shared by the sweep engine and the storage ports.
//!
//! Everything here mirrors a table owned by the surrounding workforce
//! product; the sweep reads most of it and writes only the per-day state
//! record and the notification ledger.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

pub type WorkerId = i64;

/// One row of the worker roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Worker {
    pub id: WorkerId,
    pub name: String,
    /// Explicit opt-in flag; only enrolled workers are swept.
    pub enrolled: bool,
    /// Administrative recipients get the daily digests.
    pub admin: bool,
    /// Registered arrival point, raw `"lat,lng"`.
    pub check_in_point: Option<String>,
    /// Registered departure point, raw `"lat,lng"`.
    pub check_out_point: Option<String>,
}

/// One timestamped location report from a worker's tracking agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationPing {
    pub worker_id: WorkerId,
    pub recorded_at: DateTime<Utc>,
    /// Raw `"lat,lng"`; parsed at evaluation time.
    pub coordinates: String,
}

/// Attendance for one worker on one day. A row exists once the worker has
/// checked in; `check_out_at` is set once they have checked out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub worker_id: WorkerId,
    pub check_in_at: DateTime<Utc>,
    pub check_out_at: Option<DateTime<Utc>>,
}

/// Timed checkpoint flags recorded by the sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Milestone {
    Arrival0900,
    Arrival1100,
    Arrival1220,
    Departure1650,
    Departure1715,
    Departure1740,
}

impl Milestone {
    /// Clock label used in report annotations.
    pub fn clock_label(self) -> &'static str {
        match self {
            Milestone::Arrival0900 => "09:00",
            Milestone::Arrival1100 => "11:00",
            Milestone::Arrival1220 => "12:20",
            Milestone::Departure1650 => "16:50",
            Milestone::Departure1715 => "17:15",
            Milestone::Departure1740 => "17:40",
        }
    }
}

/// Per-worker per-day sweep state. Keyed by `(worker, date)` in storage;
/// a day's row is absent until the first write, so a fresh day starts from
/// `Default`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkdayState {
    /// One-shot guard for the early-arrival reminder push.
    pub early_notified: bool,
    pub arrival_0900: bool,
    pub arrival_1100: bool,
    pub arrival_1220: bool,
    pub departure_1650: bool,
    pub departure_1715: bool,
    pub departure_1740: bool,
    pub resume_attempts: u32,
    pub resume_sent_at: Option<DateTime<Utc>>,
}

impl WorkdayState {
    pub fn is_set(&self, milestone: Milestone) -> bool {
        match milestone {
            Milestone::Arrival0900 => self.arrival_0900,
            Milestone::Arrival1100 => self.arrival_1100,
            Milestone::Arrival1220 => self.arrival_1220,
            Milestone::Departure1650 => self.departure_1650,
            Milestone::Departure1715 => self.departure_1715,
            Milestone::Departure1740 => self.departure_1740,
        }
    }

    /// Set a milestone flag. Returns `false` when the flag was already set,
    /// so callers can skip the redundant write. Flags only go false→true;
    /// nothing in the sweep clears one within a day.
    pub fn set(&mut self, milestone: Milestone) -> bool {
        let slot = match milestone {
            Milestone::Arrival0900 => &mut self.arrival_0900,
            Milestone::Arrival1100 => &mut self.arrival_1100,
            Milestone::Arrival1220 => &mut self.arrival_1220,
            Milestone::Departure1650 => &mut self.departure_1650,
            Milestone::Departure1715 => &mut self.departure_1715,
            Milestone::Departure1740 => &mut self.departure_1740,
        };
        if *slot {
            return false;
        }
        *slot = true;
        true
    }
}

/// Logical notification kinds recorded in the idempotency ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PushCommand {
    Resume,
    Stop,
    AdminResume,
    AdminStop,
}

/// One append-only idempotency-ledger row. Existence of an entry for
/// {recipient, command, day} suppresses a duplicate send.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub recipient: WorkerId,
    pub command: PushCommand,
    pub status: String,
    pub detail: String,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn sent(
        recipient: WorkerId,
        command: PushCommand,
        detail: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            recipient,
            command,
            status: "sent".to_string(),
            detail: detail.into(),
            created_at,
        }
    }
}

/// One local calendar day with its UTC bounds, computed once per sweep.
/// Day-scoped queries (pings, attendance, ledger) compare against the
/// half-open `[start_utc, end_utc)` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalDay {
    pub date: NaiveDate,
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
}

impl LocalDay {
    /// The local day containing `now` under the given UTC offset.
    pub fn containing(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        let date = now.with_timezone(&offset).date_naive();
        let start_local = date.and_time(NaiveTime::MIN);
        let start_utc = DateTime::<Utc>::from_naive_utc_and_offset(
            start_local - Duration::seconds(i64::from(offset.local_minus_utc())),
            Utc,
        );
        Self {
            date,
            start_utc,
            end_utc: start_utc + Duration::days(1),
        }
    }

    /// A local clock time on this day, as a UTC instant.
    pub fn instant_at(&self, time: NaiveTime, offset: FixedOffset) -> DateTime<Utc> {
        let local = self.date.and_time(time);
        DateTime::<Utc>::from_naive_utc_and_offset(
            local - Duration::seconds(i64::from(offset.local_minus_utc())),
            Utc,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn plus3() -> FixedOffset {
        FixedOffset::east_opt(3 * 3600).unwrap()
    }

    #[test]
    fn local_day_bounds_cross_utc_midnight() {
        // 01:30 local on 2025-03-10 at UTC+3 is 22:30 UTC on 2025-03-09.
        let now = Utc.with_ymd_and_hms(2025, 3, 9, 22, 30, 0).unwrap();
        let day = LocalDay::containing(now, plus3());
        assert_eq!(day.date, NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
        assert_eq!(
            day.start_utc,
            Utc.with_ymd_and_hms(2025, 3, 9, 21, 0, 0).unwrap()
        );
        assert_eq!(
            day.end_utc,
            Utc.with_ymd_and_hms(2025, 3, 10, 21, 0, 0).unwrap()
        );
    }

    #[test]
    fn instant_at_converts_local_clock_to_utc() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).unwrap();
        let day = LocalDay::containing(now, plus3());
        let expected = day.instant_at(NaiveTime::from_hms_opt(18, 5, 0).unwrap(), plus3());
        assert_eq!(expected, Utc.with_ymd_and_hms(2025, 3, 10, 15, 5, 0).unwrap());
    }

    #[test]
    fn milestone_flags_write_once() {
        let mut state = WorkdayState::default();
        assert!(state.set(Milestone::Arrival0900));
        assert!(!state.set(Milestone::Arrival0900));
        assert!(state.is_set(Milestone::Arrival0900));
        assert!(!state.is_set(Milestone::Departure1740));
    }

    #[test]
    fn default_state_is_blank() {
        let state = WorkdayState::default();
        assert_eq!(state.resume_attempts, 0);
        assert!(state.resume_sent_at.is_none());
        assert!(!state.early_notified);
    }
}
