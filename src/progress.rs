//! Progress display and result aggregation.
//!
//! The aggregator owns the receiving end of the pool's completion channel.
//! It counts jobs one at a time (every completion is its own event, so the
//! counter never jumps), optionally redraws a fixed-width progress bar on a
//! 100 ms tick, and folds everything into a [`RunSummary`] once the channel
//! disconnects. Suppressing the bar changes the display only; accounting is
//! identical either way.

use crate::events::RunLog;
use crate::job::{JobResult, RunSummary};
use chrono::{DateTime, Utc};
use std::io::{self, Write};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

/// Width of the bar's fill area, in characters.
pub const PROGRESS_BAR_WIDTH: usize = 50;

/// How often the bar is redrawn while jobs are in flight.
pub const PROGRESS_TICK: Duration = Duration::from_millis(100);

/// Render the progress bar line for `completed` of `total` jobs.
///
/// The fill is linear in `completed / total`; an empty run renders as
/// complete. The returned line has a fixed width so `\r` overwrites are
/// clean.
pub fn render_bar(completed: usize, total: usize) -> String {
    let (filled, percent) = if total == 0 {
        (PROGRESS_BAR_WIDTH, 100)
    } else {
        (
            completed * PROGRESS_BAR_WIDTH / total,
            completed * 100 / total,
        )
    };
    format!(
        "[{:<width$}] {:>3}%",
        "=".repeat(filled),
        percent,
        width = PROGRESS_BAR_WIDTH
    )
}

/// Consumes completion events and accumulates the run summary.
pub struct Aggregator {
    total: usize,
    show_progress: bool,
    started_at: DateTime<Utc>,
    started: Instant,
    last_draw: Instant,
    completed: usize,
    results: Vec<JobResult>,
}

impl Aggregator {
    /// Start the clock for a run of `total` jobs.
    ///
    /// When `show_progress` is set, the empty bar is drawn immediately so
    /// the user sees the run is alive before the first job lands.
    pub fn start(total: usize, show_progress: bool) -> Self {
        let aggregator = Aggregator {
            total,
            show_progress,
            started_at: Utc::now(),
            started: Instant::now(),
            last_draw: Instant::now(),
            completed: 0,
            results: Vec::with_capacity(total),
        };
        if show_progress {
            aggregator.draw();
        }
        aggregator
    }

    /// Drain the completion channel until it disconnects, then finalize.
    ///
    /// With the bar enabled the receive uses a 100 ms timeout so the display
    /// refreshes even while all workers are deep in long-running children.
    /// Without it, this is a plain blocking drain with no output at all.
    pub fn collect(mut self, events: &Receiver<JobResult>, log: Option<&RunLog>) -> RunSummary {
        if self.show_progress {
            loop {
                match events.recv_timeout(PROGRESS_TICK) {
                    Ok(result) => {
                        self.record(result, log);
                        if self.last_draw.elapsed() >= PROGRESS_TICK {
                            self.draw();
                            self.last_draw = Instant::now();
                        }
                    }
                    Err(RecvTimeoutError::Timeout) => {
                        self.draw();
                        self.last_draw = Instant::now();
                    }
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            // Leave the final bar state on its own line.
            self.draw();
            println!();
        } else {
            for result in events.iter() {
                self.record(result, log);
            }
        }
        self.finish()
    }

    fn record(&mut self, result: JobResult, log: Option<&RunLog>) {
        if let Some(log) = log {
            log.job_finished(&result);
        }
        self.completed += 1;
        self.results.push(result);
    }

    fn draw(&self) {
        print!("\r{}", render_bar(self.completed, self.total));
        let _ = io::stdout().flush();
    }

    fn finish(mut self) -> RunSummary {
        self.results.sort_by_key(|result| result.job.id);
        RunSummary {
            total_jobs: self.total,
            completed_jobs: self.completed,
            started_at: self.started_at,
            finished_at: Utc::now(),
            wall_time: self.started.elapsed(),
            results: self.results,
        }
    }
}
