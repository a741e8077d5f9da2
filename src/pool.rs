//! Bounded worker pool for running jobs.
//!
//! The pool is N plain OS threads over a shared FIFO queue. Each worker pops
//! the head job, runs it to completion through the shell, and reports one
//! [`JobResult`] over an mpsc channel; the receiver disconnects once every
//! worker has drained the queue and exited. A worker never holds more than
//! one child process, so at most `workers` children exist at any instant,
//! and blocking on child termination is the only suspension point.
//!
//! A job that exits non-zero is data, not an error: the pool keeps going and
//! the result records the code. Failing to even start a job (capture file
//! creation, shell spawn) is likewise confined to that job's result.

use crate::error::{MprunError, Result};
use crate::job::{JobResult, JobSpec, SPAWN_FAILURE};
use std::collections::VecDeque;
use std::fs::File;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// A running pool of worker threads.
///
/// Consume completion events through [`WorkerPool::events`] until the
/// channel disconnects, then call [`WorkerPool::join`]. The join is
/// mandatory: results must not be reported while workers may still be
/// alive.
#[derive(Debug)]
pub struct WorkerPool {
    workers: Vec<JoinHandle<()>>,
    events: Receiver<JobResult>,
}

impl WorkerPool {
    /// Start `workers` threads over the given job queue.
    ///
    /// Jobs are admitted strictly in the order given; completion order is
    /// whatever the children's runtimes make it.
    ///
    /// # Errors
    ///
    /// Returns `MprunError::Config` when `workers` is zero.
    pub fn spawn(jobs: Vec<JobSpec>, workers: usize) -> Result<WorkerPool> {
        if workers < 1 {
            return Err(MprunError::Config(
                "at least one worker is required (-p must be >= 1)".to_string(),
            ));
        }

        let queue = Arc::new(Mutex::new(VecDeque::from(jobs)));
        let (sender, events) = mpsc::channel();

        let mut handles = Vec::with_capacity(workers);
        for _ in 0..workers {
            let queue = Arc::clone(&queue);
            let sender = sender.clone();
            handles.push(thread::spawn(move || worker_loop(&queue, &sender)));
        }
        // The receiver must disconnect once the workers are done, so the
        // original sender cannot outlive them.
        drop(sender);

        Ok(WorkerPool {
            workers: handles,
            events,
        })
    }

    /// The completion-event channel: one [`JobResult`] per job, in
    /// completion order.
    pub fn events(&self) -> &Receiver<JobResult> {
        &self.events
    }

    /// Block until every worker thread has exited.
    ///
    /// # Errors
    ///
    /// Returns `MprunError::Pool` if any worker panicked.
    pub fn join(self) -> Result<()> {
        for handle in self.workers {
            handle
                .join()
                .map_err(|_| MprunError::Pool("a worker thread panicked".to_string()))?;
        }
        Ok(())
    }
}

fn worker_loop(queue: &Mutex<VecDeque<JobSpec>>, events: &Sender<JobResult>) {
    loop {
        // A poisoned queue means another worker died mid-pop; treat it as
        // drained and let join() surface the failure.
        let job = match queue.lock() {
            Ok(mut queue) => queue.pop_front(),
            Err(_) => None,
        };
        let Some(job) = job else {
            break;
        };

        let result = run_job(job);
        if events.send(result).is_err() {
            break;
        }
    }
}

/// Run one job to completion, converting every failure mode into a result.
fn run_job(job: JobSpec) -> JobResult {
    let started = Instant::now();
    match launch(&job) {
        Ok(exit_code) => JobResult {
            job,
            exit_code,
            duration: started.elapsed(),
            error: None,
        },
        Err(message) => JobResult {
            job,
            exit_code: SPAWN_FAILURE,
            duration: started.elapsed(),
            error: Some(message),
        },
    }
}

fn launch(job: &JobSpec) -> std::result::Result<i32, String> {
    let stdout = capture_target(job.stdout_path.as_deref())?;
    let stderr = capture_target(job.stderr_path.as_deref())?;

    let mut command = shell_command(&job.command);
    command.stdout(stdout).stderr(stderr);

    let status = command
        .status()
        .map_err(|e| format!("failed to start shell for '{}': {}", job.command, e))?;
    Ok(exit_code_of(status))
}

/// Open a capture file for one stream, or discard the stream entirely.
/// The child's output never reaches the terminal either way.
fn capture_target(path: Option<&Path>) -> std::result::Result<Stdio, String> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .map_err(|e| format!("failed to create capture file '{}': {}", path.display(), e))?;
            Ok(Stdio::from(file))
        }
        None => Ok(Stdio::null()),
    }
}

#[cfg(not(windows))]
fn shell_command(command_line: &str) -> Command {
    let mut command = Command::new("sh");
    command.arg("-c").arg(command_line);
    command
}

#[cfg(windows)]
fn shell_command(command_line: &str) -> Command {
    let mut command = Command::new("cmd");
    command.arg("/C").arg(command_line);
    command
}

fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }
    SPAWN_FAILURE
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn make_job(id: usize, command: &str) -> JobSpec {
        JobSpec {
            id,
            command: command.to_string(),
            stdout_path: None,
            stderr_path: None,
        }
    }

    fn collect_results(pool: &WorkerPool) -> HashMap<usize, JobResult> {
        pool.events()
            .iter()
            .map(|result| (result.job.id, result))
            .collect()
    }

    #[test]
    fn spawn_rejects_zero_workers() {
        let result = WorkerPool::spawn(vec![make_job(1, "exit 0")], 0);
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains(">= 1"));
    }

    #[test]
    fn every_job_produces_exactly_one_result() {
        let jobs = vec![
            make_job(1, "exit 0"),
            make_job(2, "exit 0"),
            make_job(3, "exit 0"),
        ];
        let pool = WorkerPool::spawn(jobs, 2).unwrap();
        let results = collect_results(&pool);
        pool.join().unwrap();

        assert_eq!(results.len(), 3);
        let mut ids: Vec<usize> = results.keys().copied().collect();
        ids.sort();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(results.values().all(|r| r.exit_code == 0));
    }

    #[test]
    fn nonzero_exit_is_recorded_not_fatal() {
        let jobs = vec![
            make_job(1, "exit 0"),
            make_job(2, "exit 0"),
            make_job(3, "exit 1"),
            make_job(4, "exit 0"),
        ];
        let pool = WorkerPool::spawn(jobs, 2).unwrap();
        let results = collect_results(&pool);
        pool.join().unwrap();

        // The failing job does not stop its siblings.
        assert_eq!(results.len(), 4);
        assert_eq!(results[&3].exit_code, 1);
        assert!(results[&3].error.is_none());
        for id in [1, 2, 4] {
            assert_eq!(results[&id].exit_code, 0);
        }
    }

    #[test]
    fn distinct_exit_codes_are_preserved() {
        let jobs = vec![
            make_job(1, "exit 7"),
            make_job(2, "exit 0"),
            make_job(3, "exit 42"),
        ];
        let pool = WorkerPool::spawn(jobs, 3).unwrap();
        let results = collect_results(&pool);
        pool.join().unwrap();

        assert_eq!(results[&1].exit_code, 7);
        assert_eq!(results[&2].exit_code, 0);
        assert_eq!(results[&3].exit_code, 42);
    }

    #[test]
    fn stdout_capture_receives_child_output() {
        let temp_dir = TempDir::new().unwrap();
        let stdout_path = temp_dir.path().join("job.stdout");

        let mut job = make_job(1, "echo hello");
        job.stdout_path = Some(stdout_path.clone());

        let pool = WorkerPool::spawn(vec![job], 1).unwrap();
        let results = collect_results(&pool);
        pool.join().unwrap();

        assert_eq!(results[&1].exit_code, 0);
        let captured = std::fs::read_to_string(&stdout_path).unwrap();
        assert!(captured.contains("hello"));
    }

    #[cfg(not(windows))]
    #[test]
    fn stderr_capture_receives_child_output() {
        let temp_dir = TempDir::new().unwrap();
        let stderr_path = temp_dir.path().join("job.stderr");

        let mut job = make_job(1, "echo oops >&2");
        job.stderr_path = Some(stderr_path.clone());

        let pool = WorkerPool::spawn(vec![job], 1).unwrap();
        let results = collect_results(&pool);
        pool.join().unwrap();

        assert_eq!(results[&1].exit_code, 0);
        let captured = std::fs::read_to_string(&stderr_path).unwrap();
        assert!(captured.contains("oops"));
    }

    #[test]
    fn unwritable_capture_path_fails_only_that_job() {
        let temp_dir = TempDir::new().unwrap();
        let bad_path = temp_dir.path().join("no_such_dir").join("job.stdout");

        let mut failing = make_job(1, "echo hello");
        failing.stdout_path = Some(bad_path);
        let jobs = vec![failing, make_job(2, "exit 0")];

        let pool = WorkerPool::spawn(jobs, 2).unwrap();
        let results = collect_results(&pool);
        pool.join().unwrap();

        assert_eq!(results[&1].exit_code, SPAWN_FAILURE);
        let error = results[&1].error.as_ref().unwrap();
        assert!(error.contains("failed to create capture file"));
        assert_eq!(results[&2].exit_code, 0);
    }

    #[test]
    fn more_workers_than_jobs_is_fine() {
        let jobs = vec![make_job(1, "exit 0"), make_job(2, "exit 0")];
        let pool = WorkerPool::spawn(jobs, 8).unwrap();
        let results = collect_results(&pool);
        pool.join().unwrap();

        assert_eq!(results.len(), 2);
    }

    #[test]
    fn single_worker_runs_jobs_in_admission_order() {
        let temp_dir = TempDir::new().unwrap();
        let marker = temp_dir.path().join("order.txt");

        let append = |id: usize| format!("echo {} >> {}", id, marker.display());

        let jobs = vec![
            make_job(1, &append(1)),
            make_job(2, &append(2)),
            make_job(3, &append(3)),
        ];
        let pool = WorkerPool::spawn(jobs, 1).unwrap();
        let _ = collect_results(&pool);
        pool.join().unwrap();

        let content = std::fs::read_to_string(&marker).unwrap();
        let order: Vec<&str> = content.split_whitespace().collect();
        assert_eq!(order, vec!["1", "2", "3"]);
    }

    #[cfg(unix)]
    #[test]
    fn signal_death_records_negated_signal() {
        // The shell kills itself with SIGKILL (9).
        let pool = WorkerPool::spawn(vec![make_job(1, "kill -9 $$")], 1).unwrap();
        let results = collect_results(&pool);
        pool.join().unwrap();

        assert_eq!(results[&1].exit_code, -9);
        assert!(!results[&1].is_success());
    }

    #[cfg(not(windows))]
    #[test]
    fn durations_cover_the_child_runtime() {
        let pool = WorkerPool::spawn(vec![make_job(1, "sleep 0.2")], 1).unwrap();
        let results = collect_results(&pool);
        pool.join().unwrap();

        assert!(results[&1].duration >= std::time::Duration::from_millis(150));
    }
}
