//! CLI argument parsing for mprun.
//!
//! Uses clap derive macros for declarative argument definitions. mprun is a
//! single-purpose tool, so the whole surface is one argument struct; the run
//! flow itself lives in the `run` module.

use clap::Parser;
use std::path::PathBuf;

/// Run a shell command template over many input files through a bounded worker pool.
///
/// The template must contain `{{INPUT}}` exactly once; every input file
/// becomes one job with `{{INPUT}}` replaced by the file's absolute path.
/// An optional `{{OUTPUT}}` placeholder becomes the input's file name with
/// `.out` appended, e.g.:
///
///     mprun 'gzip -c {{INPUT}} > archive/{{OUTPUT}}' data/*.log
#[derive(Parser, Debug)]
#[command(name = "mprun")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Command template with one {{INPUT}} and at most one {{OUTPUT}} placeholder.
    pub template: String,

    /// Input files; one job is run per file.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Number of jobs to run concurrently.
    #[arg(short = 'p', long = "processes", value_name = "N", default_value_t = 2)]
    pub processes: usize,

    /// Directory for per-job stdout capture files (<file name>.stdout).
    ///
    /// If the directory does not exist, a warning is printed and stdout is
    /// discarded for every job.
    #[arg(long = "stdout", value_name = "DIR")]
    pub stdout_dir: Option<PathBuf>,

    /// Directory for per-job stderr capture files (<file name>.stderr).
    ///
    /// If the directory does not exist, a warning is printed and stderr is
    /// discarded for every job.
    #[arg(long = "stderr", value_name = "DIR")]
    pub stderr_dir: Option<PathBuf>,

    /// Print the instantiated commands without executing anything.
    #[arg(long = "dry", alias = "dry-run")]
    pub dry_run: bool,

    /// Disable the live progress bar.
    #[arg(long = "no-pb", alias = "no-progress")]
    pub no_progress: bool,

    /// Append NDJSON run records (run_started/job_finished/run_finished) to FILE.
    #[arg(long = "log", value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_debug_assert() {
        // Verifies the CLI arguments configuration is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_minimal_has_defaults() {
        let cli = Cli::try_parse_from(["mprun", "gzip -k {{INPUT}}", "a.txt"]).unwrap();
        assert_eq!(cli.template, "gzip -k {{INPUT}}");
        assert_eq!(cli.files, vec![PathBuf::from("a.txt")]);
        assert_eq!(cli.processes, 2);
        assert!(cli.stdout_dir.is_none());
        assert!(cli.stderr_dir.is_none());
        assert!(!cli.dry_run);
        assert!(!cli.no_progress);
        assert!(cli.log_file.is_none());
    }

    #[test]
    fn parse_multiple_files_preserves_order() {
        let cli =
            Cli::try_parse_from(["mprun", "cat {{INPUT}}", "c.txt", "a.txt", "b.txt"]).unwrap();
        assert_eq!(
            cli.files,
            vec![
                PathBuf::from("c.txt"),
                PathBuf::from("a.txt"),
                PathBuf::from("b.txt")
            ]
        );
    }

    #[test]
    fn parse_requires_at_least_one_file() {
        let result = Cli::try_parse_from(["mprun", "cat {{INPUT}}"]);
        assert!(result.is_err());
    }

    #[test]
    fn parse_requires_template() {
        let result = Cli::try_parse_from(["mprun"]);
        assert!(result.is_err());
    }

    #[test]
    fn parse_processes_short_flag() {
        let cli = Cli::try_parse_from(["mprun", "-p", "8", "cat {{INPUT}}", "a.txt"]).unwrap();
        assert_eq!(cli.processes, 8);
    }

    #[test]
    fn parse_processes_long_flag() {
        let cli =
            Cli::try_parse_from(["mprun", "--processes", "4", "cat {{INPUT}}", "a.txt"]).unwrap();
        assert_eq!(cli.processes, 4);
    }

    #[test]
    fn parse_zero_processes_is_left_to_validation() {
        // The parser accepts 0; the run flow rejects it with a config error.
        let cli = Cli::try_parse_from(["mprun", "-p", "0", "cat {{INPUT}}", "a.txt"]).unwrap();
        assert_eq!(cli.processes, 0);
    }

    #[test]
    fn parse_capture_directories() {
        let cli = Cli::try_parse_from([
            "mprun",
            "--stdout",
            "out_logs",
            "--stderr",
            "err_logs",
            "cat {{INPUT}}",
            "a.txt",
        ])
        .unwrap();
        assert_eq!(cli.stdout_dir, Some(PathBuf::from("out_logs")));
        assert_eq!(cli.stderr_dir, Some(PathBuf::from("err_logs")));
    }

    #[test]
    fn parse_dry_flag_and_alias() {
        let cli = Cli::try_parse_from(["mprun", "--dry", "cat {{INPUT}}", "a.txt"]).unwrap();
        assert!(cli.dry_run);

        let cli = Cli::try_parse_from(["mprun", "--dry-run", "cat {{INPUT}}", "a.txt"]).unwrap();
        assert!(cli.dry_run);
    }

    #[test]
    fn parse_no_pb_flag_and_alias() {
        let cli = Cli::try_parse_from(["mprun", "--no-pb", "cat {{INPUT}}", "a.txt"]).unwrap();
        assert!(cli.no_progress);

        let cli =
            Cli::try_parse_from(["mprun", "--no-progress", "cat {{INPUT}}", "a.txt"]).unwrap();
        assert!(cli.no_progress);
    }

    #[test]
    fn parse_log_file() {
        let cli = Cli::try_parse_from([
            "mprun",
            "--log",
            "run.ndjson",
            "cat {{INPUT}}",
            "a.txt",
        ])
        .unwrap();
        assert_eq!(cli.log_file, Some(PathBuf::from("run.ndjson")));
    }

    #[test]
    fn parse_everything_together() {
        let cli = Cli::try_parse_from([
            "mprun",
            "-p",
            "6",
            "--stdout",
            "logs",
            "--no-pb",
            "--log",
            "run.ndjson",
            "cp {{INPUT}} {{OUTPUT}}",
            "a.txt",
            "b.txt",
        ])
        .unwrap();
        assert_eq!(cli.processes, 6);
        assert_eq!(cli.stdout_dir, Some(PathBuf::from("logs")));
        assert!(cli.no_progress);
        assert_eq!(cli.log_file, Some(PathBuf::from("run.ndjson")));
        assert_eq!(cli.template, "cp {{INPUT}} {{OUTPUT}}");
        assert_eq!(cli.files.len(), 2);
    }
}
