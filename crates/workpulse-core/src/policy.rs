//! Sweep policy: the thresholds and clock literals the sweep evaluates.
//!
//! Defaults reproduce the reference deployment (UTC+3 site, 40-second
//! active threshold, 6-minute resume cool-down, 3 attempts, 2-hour
//! backoff, 18:05 stop check). Checkpoint clock times live in
//! `sweep::checkpoints` as constants because they are tied one-to-one to
//! the day-state flag columns.

use chrono::{Duration, FixedOffset, NaiveTime};
use serde::{Deserialize, Serialize};

/// Tunable sweep behavior, section `[sweep]` of the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepPolicy {
    /// Hours east of UTC for the site's wall clock.
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,
    /// A ping at most this old means the tracking agent is live.
    #[serde(default = "default_active_threshold_secs")]
    pub active_threshold_secs: i64,
    /// A newest ping at least this old means tracking is off.
    #[serde(default = "default_ping_gap_minutes")]
    pub ping_gap_minutes: i64,
    /// Minimum spacing between two resume pushes to one worker.
    #[serde(default = "default_resume_cooldown_minutes")]
    pub resume_cooldown_minutes: i64,
    /// Resume attempts per burst before backing off.
    #[serde(default = "default_max_resume_attempts")]
    pub max_resume_attempts: u32,
    /// Wait after an exhausted burst before the counter may reset.
    #[serde(default = "default_resume_backoff_hours")]
    pub resume_backoff_hours: i64,
    /// Per-axis proximity tolerance, decimal degrees.
    #[serde(default = "default_proximity_tolerance")]
    pub proximity_tolerance: f64,
    /// Post-checkout grace before the stop check runs.
    #[serde(default = "default_checkout_grace_minutes")]
    pub checkout_grace_minutes: i64,
    /// Local instant by which tracking should have stopped.
    #[serde(default = "default_stop_check_time")]
    pub stop_check_time: NaiveTime,
    /// Local hour of the morning on-duty digest.
    #[serde(default = "default_digest_morning_hour")]
    pub digest_morning_hour: u32,
    /// Local hour of the midnight stopped digest.
    #[serde(default = "default_digest_midnight_hour")]
    pub digest_midnight_hour: u32,
}

fn default_utc_offset_hours() -> i32 {
    3
}
fn default_active_threshold_secs() -> i64 {
    40
}
fn default_ping_gap_minutes() -> i64 {
    20
}
fn default_resume_cooldown_minutes() -> i64 {
    6
}
fn default_max_resume_attempts() -> u32 {
    3
}
fn default_resume_backoff_hours() -> i64 {
    2
}
fn default_proximity_tolerance() -> f64 {
    0.001
}
fn default_checkout_grace_minutes() -> i64 {
    2
}
fn default_stop_check_time() -> NaiveTime {
    NaiveTime::from_hms_opt(18, 5, 0).unwrap_or(NaiveTime::MIN)
}
fn default_digest_morning_hour() -> u32 {
    8
}
fn default_digest_midnight_hour() -> u32 {
    0
}

impl Default for SweepPolicy {
    fn default() -> Self {
        Self {
            utc_offset_hours: default_utc_offset_hours(),
            active_threshold_secs: default_active_threshold_secs(),
            ping_gap_minutes: default_ping_gap_minutes(),
            resume_cooldown_minutes: default_resume_cooldown_minutes(),
            max_resume_attempts: default_max_resume_attempts(),
            resume_backoff_hours: default_resume_backoff_hours(),
            proximity_tolerance: default_proximity_tolerance(),
            checkout_grace_minutes: default_checkout_grace_minutes(),
            stop_check_time: default_stop_check_time(),
            digest_morning_hour: default_digest_morning_hour(),
            digest_midnight_hour: default_digest_midnight_hour(),
        }
    }
}

impl SweepPolicy {
    /// The site's wall-clock offset. Invalid configured offsets fall back
    /// to UTC rather than failing the run.
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_hours * 3600)
            .unwrap_or(FixedOffset::east_opt(0).unwrap())
    }

    pub fn active_threshold(&self) -> Duration {
        Duration::seconds(self.active_threshold_secs)
    }

    pub fn ping_gap(&self) -> Duration {
        Duration::minutes(self.ping_gap_minutes)
    }

    pub fn resume_cooldown(&self) -> Duration {
        Duration::minutes(self.resume_cooldown_minutes)
    }

    pub fn resume_backoff(&self) -> Duration {
        Duration::hours(self.resume_backoff_hours)
    }

    pub fn checkout_grace(&self) -> Duration {
        Duration::minutes(self.checkout_grace_minutes)
    }
}
