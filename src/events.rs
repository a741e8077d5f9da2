//! NDJSON run log.
//!
//! With `--log FILE`, mprun appends one JSON object per line describing the
//! run: a `run_started` record, one `job_finished` record per job as results
//! arrive, and a closing `run_finished` record. The format is append-only so
//! several runs can share one file and tail-based tooling stays simple.
//!
//! Each record carries:
//! - `ts`: RFC3339 timestamp
//! - `event`: the record kind (snake_case)
//! - `actor`: who ran it (e.g. `user@HOST`)
//! - `job`: job id, only on per-job records
//! - `details`: freeform object with kind-specific fields
//!
//! Logging is best-effort: a write failure warns on stderr and the run
//! carries on, because the log must never take a batch down with it.

use crate::error::{MprunError, Result};
use crate::job::{JobResult, RunSummary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

/// Record kinds written to the run log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogEvent {
    /// The run was configured and the pool is about to start.
    RunStarted,
    /// One job completed (any exit code).
    JobFinished,
    /// Every job completed and the summary is final.
    RunFinished,
}

/// One line of the run log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    /// RFC3339 timestamp when the record was created.
    pub ts: DateTime<Utc>,

    /// The record kind.
    pub event: LogEvent,

    /// Who performed the run (e.g. `user@HOST`).
    pub actor: String,

    /// Job id for per-job records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job: Option<usize>,

    /// Freeform details object with kind-specific fields.
    pub details: Value,
}

impl LogRecord {
    /// Create a record stamped with the current time and actor.
    pub fn new(event: LogEvent) -> Self {
        Self {
            ts: Utc::now(),
            event,
            actor: get_actor_string(),
            job: None,
            details: Value::Object(serde_json::Map::new()),
        }
    }

    /// Attach a job id to this record.
    pub fn with_job(mut self, id: usize) -> Self {
        self.job = Some(id);
        self
    }

    /// Attach the details object to this record.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// Serialize to a single-line JSON string (no trailing newline).
    pub fn to_ndjson_line(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| MprunError::Config(format!("failed to serialize run log record: {}", e)))
    }
}

/// Get the actor string for log metadata.
fn get_actor_string() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, host)
}

/// The opt-in NDJSON log file for one run.
#[derive(Debug, Clone)]
pub struct RunLog {
    path: PathBuf,
}

impl RunLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Append one record, creating the file on first write.
    ///
    /// Each append is one line plus a trailing newline, synced to disk so
    /// the log survives a crash mid-run.
    pub fn append(&self, record: &LogRecord) -> Result<()> {
        let line = record.to_ndjson_line()?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                MprunError::Config(format!(
                    "failed to open run log '{}': {}",
                    self.path.display(),
                    e
                ))
            })?;

        writeln!(file, "{}", line).map_err(|e| {
            MprunError::Config(format!(
                "failed to write run log '{}': {}",
                self.path.display(),
                e
            ))
        })?;

        file.sync_all().map_err(|e| {
            MprunError::Config(format!(
                "failed to sync run log '{}': {}",
                self.path.display(),
                e
            ))
        })?;

        Ok(())
    }

    /// Best-effort append: warn and continue on failure.
    fn record(&self, record: LogRecord) {
        if let Err(err) = self.append(&record) {
            eprintln!("Warning: {}", err);
        }
    }

    /// Log that the pool is about to start.
    pub fn run_started(&self, total_jobs: usize, workers: usize) {
        self.record(LogRecord::new(LogEvent::RunStarted).with_details(json!({
            "total_jobs": total_jobs,
            "workers": workers,
        })));
    }

    /// Log one completed job.
    pub fn job_finished(&self, result: &JobResult) {
        let mut details = json!({
            "command": result.job.command,
            "exit_code": result.exit_code,
            "duration_ms": result.duration.as_millis() as u64,
        });
        if let Some(error) = &result.error {
            details["error"] = json!(error);
        }
        self.record(
            LogRecord::new(LogEvent::JobFinished)
                .with_job(result.job.id)
                .with_details(details),
        );
    }

    /// Log the final tally for the run.
    pub fn run_finished(&self, summary: &RunSummary) {
        self.record(LogRecord::new(LogEvent::RunFinished).with_details(json!({
            "total_jobs": summary.total_jobs,
            "failed": summary.failed_count(),
            "started_at": summary.started_at.to_rfc3339(),
            "finished_at": summary.finished_at.to_rfc3339(),
            "wall_time_ms": summary.wall_time.as_millis() as u64,
        })));
    }
}
