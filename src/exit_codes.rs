//! Exit code constants for the mprun CLI.
//!
//! - 0: Success (every job exited zero)
//! - 1: Configuration error (bad template, missing input, bad worker count)
//! - 2: Job failure (at least one job exited non-zero)
//! - 3: Worker pool failure (a worker thread died)

/// Successful execution: every job ran and exited zero.
pub const SUCCESS: i32 = 0;

/// Configuration error: invalid template, missing input file, or bad arguments.
/// Reported before any job runs.
pub const CONFIG_ERROR: i32 = 1;

/// Job failure: the run completed but at least one job exited non-zero.
pub const JOB_FAILURE: i32 = 2;

/// Worker pool failure: a worker thread panicked or the event channel broke.
pub const POOL_FAILURE: i32 = 3;
