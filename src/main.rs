//! mprun: run a shell command template over many input files through a
//! bounded worker pool.
//!
//! This is the main entry point for the `mprun` CLI. It parses arguments,
//! hands off to the run flow, and maps errors to exit codes.

mod cli;
mod error;
mod events;
mod exit_codes;
mod job;
mod paths;
mod pool;
mod progress;
mod run;
mod template;

use cli::Cli;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    match run::cmd_run(cli) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            // Print user-actionable error message to stderr
            eprintln!("Error: {}", err);

            // Return appropriate exit code
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
