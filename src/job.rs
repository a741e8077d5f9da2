//! Job records and construction.
//!
//! A [`JobSpec`] is one fully instantiated command plus its capture targets;
//! a [`JobResult`] is the single completion record a job produces; a
//! [`RunSummary`] is the final fold over all results. Ids are a contiguous
//! 1-based sequence in input-file order, assigned here and nowhere else, so
//! two concurrent runs can never share a counter.

use crate::template::Template;
use chrono::{DateTime, Utc};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Sentinel exit code for a job whose child process never produced an exit
/// status (capture file creation or spawn failed). Outside the 0-255 range
/// a shell can return, so it cannot collide with a real exit code.
pub const SPAWN_FAILURE: i32 = -1;

/// One schedulable unit: a concrete shell command for one input file.
#[derive(Debug, Clone)]
pub struct JobSpec {
    /// 1-based position in the input-file order.
    pub id: usize,
    /// The instantiated command line, ready for the shell.
    pub command: String,
    /// Where to write the job's stdout; `None` discards the stream.
    pub stdout_path: Option<PathBuf>,
    /// Where to write the job's stderr; `None` discards the stream.
    pub stderr_path: Option<PathBuf>,
}

/// Completion record for one job. Created exactly once per [`JobSpec`].
#[derive(Debug, Clone)]
pub struct JobResult {
    /// The job this result belongs to.
    pub job: JobSpec,
    /// The child's exit code, a negated signal number (Unix), or
    /// [`SPAWN_FAILURE`] when the child never started.
    pub exit_code: i32,
    /// Wall time from dispatch to termination.
    pub duration: Duration,
    /// Why the job could not be started, when it never ran at all.
    pub error: Option<String>,
}

impl JobResult {
    /// A job succeeded iff its child exited zero.
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Final accounting for one run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Number of jobs admitted to the pool.
    pub total_jobs: usize,
    /// Number of completion events received; equals `total_jobs` unless the
    /// pool broke down mid-run.
    pub completed_jobs: usize,
    /// Wall-clock time the run started.
    pub started_at: DateTime<Utc>,
    /// Wall-clock time the last result was folded in.
    pub finished_at: DateTime<Utc>,
    /// Elapsed time from pool start to the last result.
    pub wall_time: Duration,
    /// All results, sorted by job id.
    pub results: Vec<JobResult>,
}

impl RunSummary {
    /// Results for jobs that did not exit zero.
    pub fn failures(&self) -> impl Iterator<Item = &JobResult> {
        self.results.iter().filter(|result| !result.is_success())
    }

    /// Number of jobs that did not exit zero.
    pub fn failed_count(&self) -> usize {
        self.failures().count()
    }

    /// Wall time divided evenly across the jobs.
    pub fn average_per_job(&self) -> Duration {
        if self.total_jobs == 0 {
            return Duration::ZERO;
        }
        self.wall_time / self.total_jobs as u32
    }
}

/// Build one [`JobSpec`] per input file, in order.
///
/// Capture paths are `<dir>/<file name>.stdout` and `<dir>/<file name>.stderr`
/// for whichever capture directories were resolved; a `None` directory leaves
/// the corresponding stream discarded for every job.
pub fn build_jobs(
    template: &Template,
    inputs: &[PathBuf],
    stdout_dir: Option<&Path>,
    stderr_dir: Option<&Path>,
) -> Vec<JobSpec> {
    inputs
        .iter()
        .enumerate()
        .map(|(index, input)| {
            let file_name = input.file_name().unwrap_or_else(|| input.as_os_str());
            JobSpec {
                id: index + 1,
                command: template.instantiate(input),
                stdout_path: stdout_dir.map(|dir| dir.join(capture_file_name(file_name, "stdout"))),
                stderr_path: stderr_dir.map(|dir| dir.join(capture_file_name(file_name, "stderr"))),
            }
        })
        .collect()
}

fn capture_file_name(file_name: &OsStr, extension: &str) -> OsString {
    let mut name = file_name.to_os_string();
    name.push(".");
    name.push(extension);
    name
}
