//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// egosync - IMU resampling and video frame alignment for egocentric datasets
#[derive(Parser, Debug)]
#[command(
    name = "egosync",
    author,
    version,
    about = "Resample raw IMU logs and align them to video frames",
    long_about = "Batch preprocessing for multi-device egocentric recordings.\n\n\
                  `resample` turns each raw IMU log into a uniform series at the \n\
                  configured rate, `synchronize` aligns those series to the video \n\
                  frame timestamps of each session, `run` does both."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "EGOSYNC_VERBOSE")]
    pub verbose: u8,

    /// Suppress all log output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "EGOSYNC_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resample raw IMU logs to the configured rate
    Resample(BatchArgs),

    /// Align resampled series to video frame timestamps
    Synchronize(BatchArgs),

    /// Resample then synchronize every selected session
    Run(BatchArgs),

    /// Validate configuration file without processing anything
    Validate(ValidateArgs),

    /// Display configuration and feature layout
    Info(InfoArgs),
}

/// Arguments shared by the batch commands
#[derive(Args, Debug, Clone)]
pub struct BatchArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "egosync.toml",
        env = "EGOSYNC_CONFIG"
    )]
    pub config: PathBuf,

    /// Process only this session (repeatable, default all)
    #[arg(short, long = "session", value_name = "ID")]
    pub sessions: Vec<String>,

    /// Sessions processed in parallel
    #[arg(short, long, default_value = "1", env = "EGOSYNC_JOBS")]
    pub jobs: usize,

    /// Compute everything and log target paths without writing files
    #[arg(long)]
    pub dry_run: bool,

    /// Print the batch report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `validate` command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "egosync.toml", env = "EGOSYNC_CONFIG")]
    pub config: PathBuf,

    /// Also check that every raw log and frame file exists
    #[arg(long)]
    pub check_inputs: bool,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "egosync.toml", env = "EGOSYNC_CONFIG")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// List every feature column
    #[arg(long)]
    pub columns: bool,

    /// List every session with its inputs
    #[arg(long)]
    pub sessions: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_batch_args() {
        let cli = Cli::try_parse_from([
            "egosync", "-v", "run", "-c", "cmu.toml", "-s", "S07", "-s", "S08", "--jobs", "4",
            "--dry-run",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.config, PathBuf::from("cmu.toml"));
                assert_eq!(args.sessions, vec!["S07", "S08"]);
                assert_eq!(args.jobs, 4);
                assert!(args.dry_run);
                assert!(!args.json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["egosync", "-q", "-v", "info"]).is_err());
    }
}
