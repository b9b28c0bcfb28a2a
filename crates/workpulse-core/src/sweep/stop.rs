//! Stop confirmation policy.
//!
//! After checkout (plus the grace period) the agent should have stopped
//! reporting by the expected control instant. This module only judges;
//! the engine sends the reminder and keeps it idempotent via the ledger.

use chrono::{DateTime, Utc};

/// Outcome of one stop confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopDecision {
    /// The control instant has not arrived yet; nothing to confirm.
    Defer,
    /// The newest ping today predates the control instant: tracking
    /// stopped correctly.
    Stopped { last_ping: DateTime<Utc> },
    /// Pings continued at or past the control instant: tracking did not
    /// stop.
    Overrun { last_ping: DateTime<Utc> },
    /// No ping today at all. Absence of data triggers no reminder.
    CannotConfirm,
}

/// Compare the newest ping today against the expected control instant.
pub fn evaluate(
    now: DateTime<Utc>,
    expected: DateTime<Utc>,
    last_ping: Option<DateTime<Utc>>,
) -> StopDecision {
    if now < expected {
        return StopDecision::Defer;
    }
    match last_ping {
        Some(at) if at < expected => StopDecision::Stopped { last_ping: at },
        Some(at) => StopDecision::Overrun { last_ping: at },
        None => StopDecision::CannotConfirm,
    }
}
