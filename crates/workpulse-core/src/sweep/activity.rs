//! Activity detection from ping age.

use chrono::{DateTime, Utc};

use crate::model::LocationPing;
use crate::policy::SweepPolicy;

/// What the newest ping says about the tracking agent right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assessment {
    /// A ping exists and is within the active threshold.
    Active,
    /// A ping exists but is older than the active threshold.
    Inactive { age_seconds: i64 },
    /// No ping at all today.
    NoPing,
}

/// Judge the agent from the most recent ping today. The threshold is
/// deliberately tight (seconds, not minutes): a live agent pings every few
/// seconds, so anything older means it has at least stalled.
pub fn assess(
    last_ping: Option<&LocationPing>,
    now: DateTime<Utc>,
    policy: &SweepPolicy,
) -> Assessment {
    match last_ping {
        None => Assessment::NoPing,
        Some(ping) => {
            let age = now - ping.recorded_at;
            if age <= policy.active_threshold() {
                Assessment::Active
            } else {
                Assessment::Inactive {
                    age_seconds: age.num_seconds(),
                }
            }
        }
    }
}
