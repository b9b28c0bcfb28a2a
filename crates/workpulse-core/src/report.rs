//! Structured record of one sweep: per-worker decisions, admin digest
//! outcomes, and run totals.
//!
//! The report is ephemeral (one invocation) and written once as a pretty
//! JSON artifact, `run_report_<date>.json`, overwritten by later sweeps
//! the same day. Nothing reads it back except operators and the `report`
//! CLI command.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::model::WorkerId;

/// Which part of the evaluation produced a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Destination,
    Leave,
    CustomHours,
    Ping,
    Activity,
    EarlyArrival,
    Arrival,
    Departure,
    Evening,
    Stop,
    Resume,
    ResumeReset,
    Ledger,
    Error,
}

/// One annotation in a worker's (or the admin's) decision trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub stage: Stage,
    pub detail: String,
}

/// Decision trail for one worker in one sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerReport {
    pub worker: String,
    pub notes: Vec<Note>,
}

impl WorkerReport {
    pub fn new(worker: impl Into<String>) -> Self {
        Self {
            worker: worker.into(),
            notes: Vec::new(),
        }
    }

    pub fn note(&mut self, stage: Stage, detail: impl Into<String>) {
        self.notes.push(Note {
            stage,
            detail: detail.into(),
        });
    }

    pub fn has(&self, stage: Stage) -> bool {
        self.notes.iter().any(|n| n.stage == stage)
    }
}

/// Aggregate counters for the run banner and the summary notification.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RunTotals {
    /// Resume pushes attempted (counter persisted, send attempted).
    pub resume_attempts: u32,
    /// Early-arrival reminders sent.
    pub early_reminders: u32,
    /// Post-checkout stop reminders sent.
    pub stop_reminders: u32,
    /// Workers whose evaluation hit the failure boundary.
    pub worker_errors: u32,
}

/// Everything one sweep decided, keyed by worker id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub date: NaiveDate,
    pub started_at: DateTime<Utc>,
    pub workers: BTreeMap<WorkerId, WorkerReport>,
    /// Digest and summary outcomes. Populated after the artifact is
    /// written, so these live in logs and in the returned report only.
    pub admin: Vec<Note>,
    pub totals: RunTotals,
}

impl RunReport {
    pub fn new(date: NaiveDate, started_at: DateTime<Utc>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            date,
            started_at,
            workers: BTreeMap::new(),
            admin: Vec::new(),
            totals: RunTotals::default(),
        }
    }

    /// The report entry for a worker, created on first access.
    pub fn entry(&mut self, id: WorkerId, name: &str) -> &mut WorkerReport {
        self.workers
            .entry(id)
            .or_insert_with(|| WorkerReport::new(name))
    }

    pub fn admin_note(&mut self, stage: Stage, detail: impl Into<String>) {
        self.admin.push(Note {
            stage,
            detail: detail.into(),
        });
    }

    /// Workers still presumed on duty: no evening outcome and no stop
    /// handoff recorded. Feeds the morning digest.
    pub fn on_duty_count(&self) -> usize {
        self.workers
            .values()
            .filter(|w| !w.has(Stage::Evening) && !w.has(Stage::Stop))
            .count()
    }

    /// Workers whose evaluation reached the stop check. Feeds the midnight
    /// digest.
    pub fn stopped_count(&self) -> usize {
        self.workers.values().filter(|w| w.has(Stage::Stop)).count()
    }

    pub fn file_name(date: NaiveDate) -> String {
        format!("run_report_{date}.json")
    }

    /// Write the artifact under `dir`, creating the directory if needed.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created or the file
    /// cannot be serialized/written.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(Self::file_name(self.date));
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json)?;
        Ok(path)
    }

    /// Read a stored artifact back.
    ///
    /// # Errors
    /// Returns an error if the file is missing or not valid report JSON.
    pub fn load(dir: &Path, date: NaiveDate) -> Result<Self> {
        let path = dir.join(Self::file_name(date));
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}
