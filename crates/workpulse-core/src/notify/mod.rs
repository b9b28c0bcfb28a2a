//! Push delivery port and message construction.
//!
//! The sweep engine builds a [`PushMessage`] per logical notification and
//! hands it to a [`PushGateway`]. [`HttpPushGateway`] is the wired-in
//! implementation; tests substitute a recording fake.

pub mod http;

pub use http::HttpPushGateway;

use crate::error::NotifyError;
use crate::model::WorkerId;

/// One logical push: destinations plus rendered content. The `action`
/// string rides in the payload's `data` block so the receiving app can
/// react without parsing the display text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushMessage {
    pub recipient: WorkerId,
    pub tokens: Vec<String>,
    pub title: String,
    pub body: String,
    pub action: String,
}

impl PushMessage {
    fn new(
        recipient: WorkerId,
        tokens: Vec<String>,
        title: &str,
        body: String,
        action: &str,
    ) -> Self {
        Self {
            recipient,
            tokens,
            title: title.to_string(),
            body,
            action: action.to_string(),
        }
    }

    /// Reminder that tracking looks stopped and should be resumed.
    pub fn resume(recipient: WorkerId, tokens: Vec<String>) -> Self {
        Self::new(
            recipient,
            tokens,
            "Tracking stopped",
            "Location tracking appears to have stopped. Open the app to resume reporting.".into(),
            "resume",
        )
    }

    /// Reminder that tracking kept reporting past checkout.
    pub fn stop(recipient: WorkerId, tokens: Vec<String>) -> Self {
        Self::new(
            recipient,
            tokens,
            "Tracking still running",
            "You have checked out but location tracking is still reporting. Please stop it."
                .into(),
            "stop",
        )
    }

    /// Heads-up for a worker near the check-in point who has not checked in.
    pub fn early_arrival(recipient: WorkerId, tokens: Vec<String>) -> Self {
        Self::new(
            recipient,
            tokens,
            "Almost there",
            "You are near the check-in point. Remember to check in.".into(),
            "early_arrival",
        )
    }

    /// Morning digest for the administrator.
    pub fn admin_resume(recipient: WorkerId, tokens: Vec<String>, on_duty: usize) -> Self {
        Self::new(
            recipient,
            tokens,
            "Morning digest",
            format!("{on_duty} workers are still reporting as on duty."),
            "admin_resume",
        )
    }

    /// Midnight digest for the administrator.
    pub fn admin_stop(recipient: WorkerId, tokens: Vec<String>, stopped: usize) -> Self {
        Self::new(
            recipient,
            tokens,
            "Midnight digest",
            format!("{stopped} workers ended tracking after checkout today."),
            "admin_stop",
        )
    }

    /// Per-pass resume activity summary, sent only with the summary flag.
    pub fn resume_summary(recipient: WorkerId, tokens: Vec<String>, attempts: u32) -> Self {
        Self::new(
            recipient,
            tokens,
            "Sweep summary",
            format!("{attempts} resume reminders were sent this pass."),
            "resume_summary",
        )
    }
}

/// Per-destination accounting from one multicast send.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: u32,
    pub failed: u32,
}

/// Send port. One call per logical notification; a multicast to all of a
/// recipient's destinations counts as one send.
pub trait PushGateway {
    /// Deliver `message` to every destination it names.
    ///
    /// # Errors
    /// Returns an error when the message has no destinations, the
    /// transport fails, or the gateway rejects the request.
    fn send(&self, message: &PushMessage) -> Result<DeliveryReport, NotifyError>;
}
