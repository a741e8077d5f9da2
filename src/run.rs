//! The mprun run flow.
//!
//! Wires the pieces together in validate-then-execute order: template arity,
//! worker count, input files, and capture directories are all settled before
//! a single job is built, so configuration errors can never waste a partial
//! run. Dry-run stops after instantiation; a real run starts the pool,
//! drains its completion channel through the aggregator, joins every worker,
//! and only then reports.

use crate::cli::Cli;
use crate::error::{MprunError, Result};
use crate::events::RunLog;
use crate::job::{RunSummary, build_jobs};
use crate::paths::{resolve_capture_dir, resolve_input_files};
use crate::pool::WorkerPool;
use crate::progress::Aggregator;
use crate::template::Template;

/// Execute the run described by the parsed command line.
///
/// # Errors
///
/// - `MprunError::Config` for invalid template, worker count, or inputs,
///   always before any job has started
/// - `MprunError::JobsFailed` when the run completed but some jobs exited
///   non-zero
/// - `MprunError::Pool` when a worker thread died
pub fn cmd_run(cli: Cli) -> Result<()> {
    let template = Template::parse(&cli.template)?;
    if !template.has_output() {
        eprintln!("Warning: template does not use {{{{OUTPUT}}}}; no output name is substituted");
    }

    if cli.processes < 1 {
        return Err(MprunError::Config(
            "at least one worker is required (-p must be >= 1)".to_string(),
        ));
    }

    let inputs = resolve_input_files(&cli.files)?;
    let stdout_dir = cli
        .stdout_dir
        .as_deref()
        .and_then(|dir| resolve_capture_dir(dir, "stdout"));
    let stderr_dir = cli
        .stderr_dir
        .as_deref()
        .and_then(|dir| resolve_capture_dir(dir, "stderr"));

    let jobs = build_jobs(&template, &inputs, stdout_dir.as_deref(), stderr_dir.as_deref());
    println!("{} job(s) queued, {} worker(s)", jobs.len(), cli.processes);

    if cli.dry_run {
        println!("Dry-run mode: no commands executed.");
        for job in &jobs {
            println!("  [{}] {}", job.id, job.command);
        }
        return Ok(());
    }

    let log = cli.log_file.map(RunLog::new);
    if let Some(log) = &log {
        log.run_started(jobs.len(), cli.processes);
    }

    let total = jobs.len();
    let aggregator = Aggregator::start(total, !cli.no_progress);
    let pool = WorkerPool::spawn(jobs, cli.processes)?;
    let summary = aggregator.collect(pool.events(), log.as_ref());
    pool.join()?;

    if let Some(log) = &log {
        log.run_finished(&summary);
    }

    report(&summary)
}

/// Print the final tally and map it onto the process outcome.
fn report(summary: &RunSummary) -> Result<()> {
    println!(
        "runtime: {:.4}s ({:.4}s avg per job)",
        summary.wall_time.as_secs_f64(),
        summary.average_per_job().as_secs_f64()
    );

    let failed = summary.failed_count();
    if failed == 0 {
        println!(
            "{} of {} jobs succeeded",
            summary.completed_jobs, summary.total_jobs
        );
        return Ok(());
    }

    for result in summary.failures() {
        match &result.error {
            Some(message) => {
                eprintln!("Warning: job {} never ran: {}", result.job.id, message);
            }
            None => eprintln!(
                "Warning: job {} exited with code {}: {}",
                result.job.id, result.exit_code, result.job.command
            ),
        }
    }

    Err(MprunError::JobsFailed {
        failed,
        total: summary.total_jobs,
    })
}
