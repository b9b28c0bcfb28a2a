//! Resume retry policy.
//!
//! Decides, from persisted day state and the newest ping, whether a
//! "tracking stopped" reminder goes out this pass. Pure: the engine
//! applies the decision (persisting counters before sending).

use chrono::{DateTime, Utc};

use crate::model::WorkdayState;
use crate::policy::SweepPolicy;

/// Outcome of one resume evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeDecision {
    /// Tracking is reporting after all (newest ping under the gap); no
    /// reminder.
    TrackingActive { age_minutes: i64 },
    /// A reminder went out too recently; debounced.
    CoolDown { minutes_since: i64 },
    /// Attempt cap reached and the backoff window has not elapsed.
    BackoffPending { minutes_since: i64 },
    /// Send a reminder. `reset_first` asks the engine to clear the
    /// exhausted counter before recording attempt 1: a worker inactive
    /// through the whole backoff gets a fresh burst of retries, not
    /// escalation.
    Send { reset_first: bool, attempt: u32 },
}

/// Evaluate the resume policy for one worker.
///
/// `last_ping` is the newest ping today, if any. Tracking counts as off
/// when there is none or it is at least the ping gap old; everything else
/// aborts the reminder. Checks run in order: freshness, cool-down,
/// attempt cap with backoff.
pub fn evaluate(
    state: &WorkdayState,
    last_ping: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    policy: &SweepPolicy,
) -> ResumeDecision {
    if let Some(at) = last_ping {
        let age = now - at;
        if age < policy.ping_gap() {
            return ResumeDecision::TrackingActive {
                age_minutes: age.num_minutes(),
            };
        }
    }

    if let Some(sent) = state.resume_sent_at {
        let since = now - sent;
        if since < policy.resume_cooldown() {
            return ResumeDecision::CoolDown {
                minutes_since: since.num_minutes(),
            };
        }
        if state.resume_attempts >= policy.max_resume_attempts && since < policy.resume_backoff() {
            return ResumeDecision::BackoffPending {
                minutes_since: since.num_minutes(),
            };
        }
    }

    if state.resume_attempts >= policy.max_resume_attempts {
        // Cap reached with the backoff elapsed (or no send recorded at
        // all): start over at attempt 1.
        return ResumeDecision::Send {
            reset_first: true,
            attempt: 1,
        };
    }

    ResumeDecision::Send {
        reset_first: false,
        attempt: state.resume_attempts + 1,
    }
}
