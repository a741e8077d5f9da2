//! Error types for the mprun CLI.
//!
//! Uses thiserror for derive macros and provides user-actionable error messages.

use crate::exit_codes;
use thiserror::Error;

/// Main error type for mprun operations.
///
/// Each variant maps to a specific exit code. Per-job failures are not
/// errors while the run is in flight; they are recorded as results and
/// surface once, as `JobsFailed`, after every job has finished.
#[derive(Error, Debug)]
pub enum MprunError {
    /// Invalid template, missing input file, or bad arguments.
    /// Always reported before any job starts.
    #[error("{0}")]
    Config(String),

    /// The run completed but one or more jobs exited non-zero.
    #[error("{failed} of {total} jobs failed")]
    JobsFailed { failed: usize, total: usize },

    /// A worker thread panicked or the completion channel broke.
    #[error("Worker pool failure: {0}")]
    Pool(String),
}

impl MprunError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            MprunError::Config(_) => exit_codes::CONFIG_ERROR,
            MprunError::JobsFailed { .. } => exit_codes::JOB_FAILURE,
            MprunError::Pool(_) => exit_codes::POOL_FAILURE,
        }
    }
}

/// Result type alias for mprun operations.
pub type Result<T> = std::result::Result<T, MprunError>;
