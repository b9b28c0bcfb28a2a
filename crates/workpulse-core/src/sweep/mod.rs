//! The sweep: one evaluation pass over every enrolled worker.
//!
//! Pure decision logic lives in the submodules; [`SweepEngine`] wires it
//! to the storage and push ports, isolates per-worker failures, and
//! accumulates the run report. One engine call corresponds to one
//! scheduler tick.

pub mod activity;
pub mod checkpoints;
pub mod digest;
pub mod eligibility;
pub mod resume;
pub mod stop;

use std::path::PathBuf;

use chrono::{DateTime, NaiveTime, Timelike, Utc};
use tracing::{error, info, warn};

use crate::error::{GeoError, Result};
use crate::geo::GeoPoint;
use crate::model::{
    AttendanceRecord, LedgerEntry, LocalDay, PushCommand, WorkdayState, Worker,
};
use crate::notify::{PushGateway, PushMessage};
use crate::policy::SweepPolicy;
use crate::report::{RunReport, Stage, WorkerReport};
use crate::store::{WorkforceReader, WorkforceWriter};

/// Pushes that went out for one worker during one pass.
#[derive(Debug, Clone, Copy, Default)]
struct Deliveries {
    resume: bool,
    early: bool,
    stop: bool,
}

/// Evaluates the enrolled roster against the configured policy, through
/// the given store and push gateway.
pub struct SweepEngine<S, G> {
    store: S,
    gateway: G,
    policy: SweepPolicy,
    report_dir: PathBuf,
}

impl<S, G> SweepEngine<S, G>
where
    S: WorkforceReader + WorkforceWriter,
    G: PushGateway,
{
    pub fn new(store: S, gateway: G, policy: SweepPolicy, report_dir: PathBuf) -> Self {
        Self {
            store,
            gateway,
            policy,
            report_dir,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// One pass at the current instant.
    ///
    /// # Errors
    /// Returns an error only for run-level failures: the roster cannot be
    /// enumerated or the report artifact cannot be written. Per-worker
    /// failures are absorbed into the report.
    pub fn run(&self, summary: bool) -> Result<RunReport> {
        self.run_at(Utc::now(), summary)
    }

    /// One pass pinned to `now`. Split out so tests can replay instants.
    ///
    /// # Errors
    /// Same contract as [`SweepEngine::run`].
    pub fn run_at(&self, now: DateTime<Utc>, summary: bool) -> Result<RunReport> {
        let offset = self.policy.offset();
        let day = LocalDay::containing(now, offset);
        let local_time = now.with_timezone(&offset).time();
        let mut report = RunReport::new(day.date, now);

        let workers = self.store.enrolled_workers()?;
        info!(
            run = %report.run_id,
            date = %day.date,
            workers = workers.len(),
            "sweep started"
        );
        if workers.is_empty() {
            info!("no enrolled workers; nothing to do");
            return Ok(report);
        }

        for worker in &workers {
            let pass = WorkerPass {
                store: &self.store,
                gateway: &self.gateway,
                policy: &self.policy,
                worker,
                day: &day,
                now,
                local_time,
            };
            let entry = report.entry(worker.id, &worker.name);
            match pass.evaluate(entry) {
                Ok(sent) => {
                    if sent.resume {
                        report.totals.resume_attempts += 1;
                    }
                    if sent.early {
                        report.totals.early_reminders += 1;
                    }
                    if sent.stop {
                        report.totals.stop_reminders += 1;
                    }
                }
                Err(err) => {
                    error!(error = %err, worker = worker.id, "worker evaluation failed");
                    report
                        .entry(worker.id, &worker.name)
                        .note(Stage::Error, format!("evaluation failed: {err}"));
                    report.totals.worker_errors += 1;
                }
            }
        }

        let path = report.save(&self.report_dir)?;
        info!(path = %path.display(), "run report written");

        if summary {
            self.send_summary(&mut report);
        }

        digest::dispatch(
            &self.store,
            &self.gateway,
            &mut report,
            &day,
            local_time.hour(),
            now,
            &self.policy,
        );

        info!(
            run = %report.run_id,
            resume = report.totals.resume_attempts,
            early = report.totals.early_reminders,
            stop = report.totals.stop_reminders,
            errors = report.totals.worker_errors,
            "sweep finished"
        );
        Ok(report)
    }

    fn send_summary(&self, report: &mut RunReport) {
        if let Err(err) = self.try_send_summary(report) {
            error!(error = %err, "resume summary failed");
            report.admin_note(Stage::Error, format!("resume summary failed: {err}"));
        }
    }

    fn try_send_summary(&self, report: &mut RunReport) -> Result<()> {
        let Some(admin) = self.store.admin()? else {
            info!("no administrator account; resume summary skipped");
            return Ok(());
        };
        let attempts = report.totals.resume_attempts;
        let tokens = self.store.push_tokens(admin.id)?;
        let delivery = self
            .gateway
            .send(&PushMessage::resume_summary(admin.id, tokens, attempts))?;
        info!(
            attempts,
            delivered = delivery.delivered,
            failed = delivery.failed,
            "resume summary sent"
        );
        report.admin_note(
            Stage::Resume,
            format!("resume summary sent; {attempts} reminders this pass"),
        );
        Ok(())
    }
}

/// One worker's slice of a sweep. Bundles the borrowed collaborators so
/// the phase methods stay flat.
struct WorkerPass<'a, S, G> {
    store: &'a S,
    gateway: &'a G,
    policy: &'a SweepPolicy,
    worker: &'a Worker,
    day: &'a LocalDay,
    now: DateTime<Utc>,
    local_time: NaiveTime,
}

impl<S, G> WorkerPass<'_, S, G>
where
    S: WorkforceReader + WorkforceWriter,
    G: PushGateway,
{
    /// Eligibility, activity, then either the resume path or the clock
    /// checks. Store and coordinate-parse errors propagate to the
    /// per-worker boundary in the engine loop; push delivery failures are
    /// noted and absorbed here.
    fn evaluate(&self, entry: &mut WorkerReport) -> Result<Deliveries> {
        let mut sent = Deliveries::default();

        let tokens = self.store.push_tokens(self.worker.id)?;
        if tokens.is_empty() {
            entry.note(Stage::Destination, "no push destination registered; skipped");
            return Ok(sent);
        }

        if eligibility::on_leave_today(self.store, self.worker.id, self.day.date)? {
            entry.note(
                Stage::Leave,
                "not working today (leave, weekend or holiday); skipped",
            );
            return Ok(sent);
        }

        if eligibility::has_custom_hours(self.worker) {
            entry.note(Stage::CustomHours, "custom working hours; skipped");
            return Ok(sent);
        }

        let mut state = self.store.day_state(self.worker.id, self.day.date)?;
        let ping = match self.store.latest_ping(self.worker.id, self.day)? {
            Some(ping) => ping,
            None => {
                entry.note(Stage::Ping, "no ping today; resume check");
                sent.resume = self.run_resume(&tokens, &state, None, entry)?;
                return Ok(sent);
            }
        };

        match activity::assess(Some(&ping), self.now, self.policy) {
            activity::Assessment::Active => {
                entry.note(Stage::Activity, "active");
            }
            activity::Assessment::Inactive { age_seconds } => {
                entry.note(
                    Stage::Activity,
                    format!("inactive; newest ping {age_seconds}s old; resume check"),
                );
                sent.resume = self.run_resume(&tokens, &state, Some(ping.recorded_at), entry)?;
                return Ok(sent);
            }
            activity::Assessment::NoPing => {
                entry.note(Stage::Ping, "no ping today; resume check");
                sent.resume = self.run_resume(&tokens, &state, None, entry)?;
                return Ok(sent);
            }
        }

        let position = GeoPoint::parse(&ping.coordinates)?;
        let attendance = self.store.attendance(self.worker.id, self.day.date)?;

        sent.early = self.morning(&tokens, &mut state, attendance.as_ref(), position, entry)?;
        sent.stop = self.evening(
            &tokens,
            &mut state,
            attendance.as_ref(),
            position,
            ping.recorded_at,
            entry,
        )?;
        Ok(sent)
    }

    /// Early-arrival reminder and the timed arrival confirmations. Returns
    /// whether the early push went out.
    fn morning(
        &self,
        tokens: &[String],
        state: &mut WorkdayState,
        attendance: Option<&AttendanceRecord>,
        position: GeoPoint,
        entry: &mut WorkerReport,
    ) -> Result<bool> {
        let mut sent_early = false;

        if checkpoints::early_window_contains(self.local_time) {
            if attendance.is_some() {
                entry.note(Stage::EarlyArrival, "already checked in");
            } else if !position.is_near(self.check_in_point()?, self.policy.proximity_tolerance) {
                entry.note(Stage::EarlyArrival, "not near the check-in point");
            } else if state.early_notified {
                entry.note(Stage::EarlyArrival, "reminder already sent today");
            } else {
                self.store
                    .mark_early_notified(self.worker.id, self.day.date)?;
                state.early_notified = true;
                match self
                    .gateway
                    .send(&PushMessage::early_arrival(self.worker.id, tokens.to_vec()))
                {
                    Ok(delivery) => {
                        info!(
                            worker = self.worker.id,
                            delivered = delivery.delivered,
                            failed = delivery.failed,
                            "early-arrival reminder sent"
                        );
                        entry.note(
                            Stage::EarlyArrival,
                            format!(
                                "reminder sent; delivered {}, failed {}",
                                delivery.delivered, delivery.failed
                            ),
                        );
                        sent_early = true;
                    }
                    Err(err) => {
                        error!(error = %err, worker = self.worker.id, "early-arrival push failed");
                        entry.note(Stage::Error, format!("early-arrival push failed: {err}"));
                    }
                }
            }
        }

        if attendance.is_none() && checkpoints::arrival_window_contains(self.local_time) {
            if position.is_near(self.check_in_point()?, self.policy.proximity_tolerance) {
                if let Some(milestone) = checkpoints::arrival_bucket(self.local_time) {
                    if state.set(milestone) {
                        self.store
                            .set_milestone(self.worker.id, self.day.date, milestone)?;
                        info!(
                            worker = self.worker.id,
                            at = milestone.clock_label(),
                            "arrival milestone recorded"
                        );
                        entry.note(
                            Stage::Arrival,
                            format!("{} arrival confirmed", milestone.clock_label()),
                        );
                    } else {
                        entry.note(
                            Stage::Arrival,
                            format!("{} arrival already confirmed", milestone.clock_label()),
                        );
                    }
                }
            } else {
                entry.note(Stage::Arrival, "not near the check-in point");
            }
        } else {
            entry.note(
                Stage::Arrival,
                if attendance.is_some() {
                    "already checked in"
                } else {
                    "outside the arrival monitoring period"
                },
            );
        }

        Ok(sent_early)
    }

    /// Departure gates and the post-checkout stop handoff. Returns whether
    /// a stop reminder went out.
    fn evening(
        &self,
        tokens: &[String],
        state: &mut WorkdayState,
        attendance: Option<&AttendanceRecord>,
        position: GeoPoint,
        ping_at: DateTime<Utc>,
        entry: &mut WorkerReport,
    ) -> Result<bool> {
        if self.store.on_shift(self.worker.id, self.day.date)? {
            entry.note(Stage::Evening, "on shift; evening checks skipped");
            return Ok(false);
        }

        let Some(att) = attendance else {
            entry.note(Stage::Evening, "no check-in today; evening checks skipped");
            return Ok(false);
        };

        match att.check_out_at {
            None => {
                for gate in checkpoints::departure_gates() {
                    if self.local_time < gate.opens_at || state.is_set(gate.milestone) {
                        continue;
                    }
                    if gate.requires_proximity
                        && !position
                            .is_near(self.check_out_point()?, self.policy.proximity_tolerance)
                    {
                        entry.note(
                            Stage::Departure,
                            format!(
                                "{}: not near the check-out point",
                                gate.milestone.clock_label()
                            ),
                        );
                        continue;
                    }
                    state.set(gate.milestone);
                    self.store
                        .set_milestone(self.worker.id, self.day.date, gate.milestone)?;
                    info!(
                        worker = self.worker.id,
                        at = gate.milestone.clock_label(),
                        "departure milestone recorded"
                    );
                    entry.note(
                        Stage::Departure,
                        format!("{} departure recorded", gate.milestone.clock_label()),
                    );
                }
                Ok(false)
            }
            Some(checked_out) => {
                if self.now - checked_out >= self.policy.checkout_grace() {
                    entry.note(Stage::Stop, "checked out; stop check");
                    self.run_stop(tokens, ping_at, entry)
                } else {
                    entry.note(
                        Stage::Evening,
                        "recently checked out; waiting for the stop check",
                    );
                    Ok(false)
                }
            }
        }
    }

    /// Resume retry ladder. Counter writes happen before the push, so a
    /// delivery failure costs the attempt.
    fn run_resume(
        &self,
        tokens: &[String],
        state: &WorkdayState,
        last_ping: Option<DateTime<Utc>>,
        entry: &mut WorkerReport,
    ) -> Result<bool> {
        match resume::evaluate(state, last_ping, self.now, self.policy) {
            resume::ResumeDecision::TrackingActive { age_minutes } => {
                entry.note(
                    Stage::Resume,
                    format!("newest ping {age_minutes}m old; tracking treated as live"),
                );
                Ok(false)
            }
            resume::ResumeDecision::CoolDown { minutes_since } => {
                entry.note(
                    Stage::Resume,
                    format!("last reminder {minutes_since}m ago; cooling down"),
                );
                Ok(false)
            }
            resume::ResumeDecision::BackoffPending { minutes_since } => {
                entry.note(
                    Stage::Resume,
                    format!("attempts exhausted; backing off ({minutes_since}m since last send)"),
                );
                Ok(false)
            }
            resume::ResumeDecision::Send {
                reset_first,
                attempt,
            } => {
                if reset_first {
                    self.store.reset_resume(self.worker.id, self.day.date)?;
                    entry.note(Stage::ResumeReset, "backoff elapsed; attempt counter reset");
                }
                self.store
                    .record_resume_attempt(self.worker.id, self.day.date, attempt, self.now)?;
                match self
                    .gateway
                    .send(&PushMessage::resume(self.worker.id, tokens.to_vec()))
                {
                    Ok(delivery) => {
                        info!(
                            worker = self.worker.id,
                            attempt,
                            delivered = delivery.delivered,
                            failed = delivery.failed,
                            "resume reminder sent"
                        );
                        entry.note(
                            Stage::Resume,
                            format!(
                                "reminder sent, attempt {attempt}; delivered {}, failed {}",
                                delivery.delivered, delivery.failed
                            ),
                        );
                        let ledger_entry = LedgerEntry::sent(
                            self.worker.id,
                            PushCommand::Resume,
                            format!(
                                "resume reminder, attempt {attempt}; delivered {}, failed {}",
                                delivery.delivered, delivery.failed
                            ),
                            self.now,
                        );
                        if let Err(err) = self.store.append_ledger(&ledger_entry) {
                            error!(error = %err, worker = self.worker.id, "resume ledger write failed");
                            entry.note(Stage::Ledger, format!("ledger write failed: {err}"));
                        }
                    }
                    Err(err) => {
                        error!(error = %err, worker = self.worker.id, "resume push failed");
                        entry.note(Stage::Error, format!("resume push failed: {err}"));
                    }
                }
                Ok(true)
            }
        }
    }

    /// Post-checkout confirmation that tracking ended by the control time.
    /// Returns whether a stop reminder went out.
    fn run_stop(
        &self,
        tokens: &[String],
        ping_at: DateTime<Utc>,
        entry: &mut WorkerReport,
    ) -> Result<bool> {
        let expected = self
            .day
            .instant_at(self.policy.stop_check_time, self.policy.offset());
        match stop::evaluate(self.now, expected, Some(ping_at)) {
            stop::StopDecision::Defer => {
                entry.note(Stage::Stop, "control time not reached; deferred");
                Ok(false)
            }
            stop::StopDecision::Stopped { .. } => {
                entry.note(Stage::Stop, "tracking stopped before the control time");
                Ok(false)
            }
            stop::StopDecision::CannotConfirm => {
                warn!(worker = self.worker.id, "no ping to confirm the stop against");
                entry.note(Stage::Stop, "no ping today; cannot confirm");
                Ok(false)
            }
            stop::StopDecision::Overrun { .. } => {
                if self
                    .store
                    .ledger_contains(self.worker.id, PushCommand::Stop, self.day)?
                {
                    entry.note(Stage::Stop, "reminder already sent today");
                    return Ok(false);
                }
                match self
                    .gateway
                    .send(&PushMessage::stop(self.worker.id, tokens.to_vec()))
                {
                    Ok(delivery) => {
                        info!(
                            worker = self.worker.id,
                            delivered = delivery.delivered,
                            failed = delivery.failed,
                            "stop reminder sent"
                        );
                        entry.note(
                            Stage::Stop,
                            format!(
                                "reminder sent; delivered {}, failed {}",
                                delivery.delivered, delivery.failed
                            ),
                        );
                        let ledger_entry = LedgerEntry::sent(
                            self.worker.id,
                            PushCommand::Stop,
                            format!(
                                "tracking kept reporting past the control time; delivered {}, failed {}",
                                delivery.delivered, delivery.failed
                            ),
                            self.now,
                        );
                        if let Err(err) = self.store.append_ledger(&ledger_entry) {
                            error!(error = %err, worker = self.worker.id, "stop ledger write failed");
                            entry.note(Stage::Ledger, format!("ledger write failed: {err}"));
                        }
                        Ok(true)
                    }
                    Err(err) => {
                        error!(error = %err, worker = self.worker.id, "stop push failed");
                        entry.note(Stage::Error, format!("stop push failed: {err}"));
                        Ok(false)
                    }
                }
            }
        }
    }

    fn check_in_point(&self) -> Result<GeoPoint> {
        let raw = self
            .worker
            .check_in_point
            .as_deref()
            .ok_or(GeoError::MissingPoint {
                worker: self.worker.id,
                kind: "check-in",
            })?;
        Ok(GeoPoint::parse(raw)?)
    }

    fn check_out_point(&self) -> Result<GeoPoint> {
        let raw = self
            .worker
            .check_out_point
            .as_deref()
            .ok_or(GeoError::MissingPoint {
                worker: self.worker.id,
                kind: "check-out",
            })?;
        Ok(GeoPoint::parse(raw)?)
    }
}
