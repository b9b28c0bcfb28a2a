//! Daily administrator digests.
//!
//! Two clock-gated pushes to the administrator account: a morning count of
//! workers still presumed on duty and a midnight count of workers whose
//! evaluation reached the stop check. Each fires during its configured
//! local hour, at most once per calendar day, deduplicated through the
//! notification ledger. Counts come from the run report accumulated by the
//! sweep that fires the digest.

use chrono::{DateTime, Utc};
use tracing::{error, info};

use crate::error::Result;
use crate::model::{LedgerEntry, LocalDay, PushCommand, Worker};
use crate::notify::{PushGateway, PushMessage};
use crate::policy::SweepPolicy;
use crate::report::{RunReport, Stage};
use crate::store::{WorkforceReader, WorkforceWriter};

/// Run both digest branches if their hour matches. Each branch catches its
/// own failure so a broken morning digest never blocks the midnight one,
/// and neither blocks the caller.
pub fn dispatch<S, G>(
    store: &S,
    gateway: &G,
    report: &mut RunReport,
    day: &LocalDay,
    local_hour: u32,
    now: DateTime<Utc>,
    policy: &SweepPolicy,
) where
    S: WorkforceReader + WorkforceWriter,
    G: PushGateway,
{
    if local_hour != policy.digest_morning_hour && local_hour != policy.digest_midnight_hour {
        return;
    }

    let admin = match store.admin() {
        Ok(Some(admin)) => admin,
        Ok(None) => {
            info!("no administrator account enrolled; digests skipped");
            return;
        }
        Err(err) => {
            error!(error = %err, "administrator lookup failed; digests skipped");
            report.admin_note(
                Stage::Error,
                format!("administrator lookup failed: {err}"),
            );
            return;
        }
    };

    if local_hour == policy.digest_morning_hour {
        if let Err(err) = morning(store, gateway, report, day, now, &admin) {
            error!(error = %err, admin = admin.id, "morning digest failed");
            report.admin_note(Stage::Error, format!("morning digest failed: {err}"));
        }
    }
    if local_hour == policy.digest_midnight_hour {
        if let Err(err) = midnight(store, gateway, report, day, now, &admin) {
            error!(error = %err, admin = admin.id, "midnight digest failed");
            report.admin_note(Stage::Error, format!("midnight digest failed: {err}"));
        }
    }
}

fn morning<S, G>(
    store: &S,
    gateway: &G,
    report: &mut RunReport,
    day: &LocalDay,
    now: DateTime<Utc>,
    admin: &Worker,
) -> Result<()>
where
    S: WorkforceReader + WorkforceWriter,
    G: PushGateway,
{
    if store.ledger_contains(admin.id, PushCommand::AdminResume, day)? {
        report.admin_note(Stage::Resume, "morning digest already sent today");
        return Ok(());
    }

    let on_duty = report.on_duty_count();
    let tokens = store.push_tokens(admin.id)?;
    let delivery = gateway.send(&PushMessage::admin_resume(admin.id, tokens, on_duty))?;
    info!(
        on_duty,
        delivered = delivery.delivered,
        failed = delivery.failed,
        "morning digest sent"
    );
    report.admin_note(
        Stage::Resume,
        format!(
            "morning digest sent; {on_duty} on duty, delivered {}, failed {}",
            delivery.delivered, delivery.failed
        ),
    );

    // The push went out; a failed ledger insert must not mask that, so it
    // is caught here instead of propagating.
    let entry = LedgerEntry::sent(
        admin.id,
        PushCommand::AdminResume,
        format!(
            "morning digest; {on_duty} on duty; delivered {}, failed {}",
            delivery.delivered, delivery.failed
        ),
        now,
    );
    if let Err(err) = store.append_ledger(&entry) {
        error!(error = %err, "morning digest ledger write failed");
        report.admin_note(Stage::Ledger, format!("ledger write failed: {err}"));
    }
    Ok(())
}

fn midnight<S, G>(
    store: &S,
    gateway: &G,
    report: &mut RunReport,
    day: &LocalDay,
    now: DateTime<Utc>,
    admin: &Worker,
) -> Result<()>
where
    S: WorkforceReader + WorkforceWriter,
    G: PushGateway,
{
    // The ledger entry is dated to the day the digest fires, so the dedupe
    // window is the same local day the count describes.
    if store.ledger_contains(admin.id, PushCommand::AdminStop, day)? {
        report.admin_note(Stage::Stop, "midnight digest already sent today");
        return Ok(());
    }

    let stopped = report.stopped_count();
    let tokens = store.push_tokens(admin.id)?;
    let delivery = gateway.send(&PushMessage::admin_stop(admin.id, tokens, stopped))?;
    info!(
        stopped,
        delivered = delivery.delivered,
        failed = delivery.failed,
        "midnight digest sent"
    );
    report.admin_note(
        Stage::Stop,
        format!(
            "midnight digest sent; {stopped} stopped, delivered {}, failed {}",
            delivery.delivered, delivery.failed
        ),
    );

    let entry = LedgerEntry::sent(
        admin.id,
        PushCommand::AdminStop,
        format!(
            "midnight digest; {stopped} stopped; delivered {}, failed {}",
            delivery.delivered, delivery.failed
        ),
        now,
    );
    if let Err(err) = store.append_ledger(&entry) {
        error!(error = %err, "midnight digest ledger write failed");
        report.admin_note(Stage::Ledger, format!("ledger write failed: {err}"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use chrono::{FixedOffset, TimeZone};

    use crate::error::NotifyError;
    use crate::model::Worker;
    use crate::notify::DeliveryReport;
    use crate::store::SqliteStore;

    struct FakeGateway {
        sent: RefCell<Vec<PushMessage>>,
        fail: bool,
    }

    impl FakeGateway {
        fn new() -> Self {
            Self {
                sent: RefCell::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                sent: RefCell::new(Vec::new()),
                fail: true,
            }
        }
    }

    impl PushGateway for FakeGateway {
        fn send(&self, message: &PushMessage) -> Result<DeliveryReport, NotifyError> {
            if self.fail {
                return Err(NotifyError::Rejected {
                    status: 503,
                    body: "unavailable".to_string(),
                });
            }
            self.sent.borrow_mut().push(message.clone());
            Ok(DeliveryReport {
                delivered: message.tokens.len() as u32,
                failed: 0,
            })
        }
    }

    fn store_with_admin() -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .insert_worker(&Worker {
                id: 1,
                name: "admin".to_string(),
                enrolled: false,
                admin: true,
                check_in_point: None,
                check_out_point: None,
            })
            .unwrap();
        store.insert_push_token(1, "admin-token").unwrap();
        store
    }

    fn morning_instant() -> (DateTime<Utc>, LocalDay) {
        // 08:30 local at UTC+3
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 5, 30, 0).unwrap();
        let day = LocalDay::containing(now, FixedOffset::east_opt(3 * 3600).unwrap());
        (now, day)
    }

    #[test]
    fn morning_digest_sends_once_per_day() {
        let store = store_with_admin();
        let gateway = FakeGateway::new();
        let policy = SweepPolicy::default();
        let (now, day) = morning_instant();

        let mut report = RunReport::new(day.date, now);
        report.entry(2, "a").note(Stage::Activity, "active");
        report.entry(3, "b").note(Stage::Activity, "active");
        report
            .entry(4, "c")
            .note(Stage::Evening, "on shift; evening checks skipped");

        dispatch(&store, &gateway, &mut report, &day, 8, now, &policy);

        let sent = gateway.sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].action, "admin_resume");
        assert!(sent[0].body.contains('2'));
        assert!(store
            .ledger_contains(1, PushCommand::AdminResume, &day)
            .unwrap());
        drop(sent);

        // a later sweep in the same hour is a no-op
        let mut replay = RunReport::new(day.date, now);
        dispatch(&store, &gateway, &mut replay, &day, 8, now, &policy);
        assert_eq!(gateway.sent.borrow().len(), 1);
        assert!(replay
            .admin
            .iter()
            .any(|n| n.detail.contains("already sent")));
    }

    #[test]
    fn midnight_digest_counts_stop_outcomes() {
        let store = store_with_admin();
        let gateway = FakeGateway::new();
        let policy = SweepPolicy::default();
        let (now, day) = morning_instant();

        let mut report = RunReport::new(day.date, now);
        report.entry(2, "a").note(Stage::Stop, "stop reminder sent");
        report.entry(3, "b").note(Stage::Activity, "active");

        dispatch(&store, &gateway, &mut report, &day, 0, now, &policy);

        let sent = gateway.sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].action, "admin_stop");
        assert!(sent[0].body.contains('1'));
        assert!(store
            .ledger_contains(1, PushCommand::AdminStop, &day)
            .unwrap());
    }

    #[test]
    fn other_hours_do_nothing() {
        let store = store_with_admin();
        let gateway = FakeGateway::new();
        let policy = SweepPolicy::default();
        let (now, day) = morning_instant();

        let mut report = RunReport::new(day.date, now);
        dispatch(&store, &gateway, &mut report, &day, 13, now, &policy);

        assert!(gateway.sent.borrow().is_empty());
        assert!(report.admin.is_empty());
    }

    #[test]
    fn missing_admin_account_is_a_quiet_no_op() {
        let store = SqliteStore::open_in_memory().unwrap();
        let gateway = FakeGateway::new();
        let policy = SweepPolicy::default();
        let (now, day) = morning_instant();

        let mut report = RunReport::new(day.date, now);
        dispatch(&store, &gateway, &mut report, &day, 8, now, &policy);

        assert!(gateway.sent.borrow().is_empty());
        assert!(report.admin.is_empty());
    }

    #[test]
    fn delivery_failure_leaves_no_ledger_row() {
        let store = store_with_admin();
        let gateway = FakeGateway::failing();
        let policy = SweepPolicy::default();
        let (now, day) = morning_instant();

        let mut report = RunReport::new(day.date, now);
        dispatch(&store, &gateway, &mut report, &day, 8, now, &policy);

        assert!(report
            .admin
            .iter()
            .any(|n| n.stage == Stage::Error && n.detail.contains("morning digest failed")));
        // no ledger row means the next sweep in the hour retries
        assert!(!store
            .ledger_contains(1, PushCommand::AdminResume, &day)
            .unwrap());
    }
}
