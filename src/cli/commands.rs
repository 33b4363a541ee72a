//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Reshape song catalog and listening logs into a Parquet data lake
#[derive(Parser, Debug)]
#[command(name = "sparkify-lake")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (TOML with [KEYS], [PATHS] and [S3] sections)
    #[arg(short, long, global = true, default_value = crate::config::DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Input root, overriding [PATHS] INPUT_DATA (s3://, s3a://, file:// or a local path)
    #[arg(short, long, global = true)]
    pub input: Option<String>,

    /// Output root, overriding [PATHS] OUTPUT_DATA
    #[arg(short, long, global = true)]
    pub output: Option<String>,

    /// Report format
    #[arg(short, long, global = true, default_value = "pretty")]
    pub format: ReportFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Defaults to `run` when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// The subcommand to execute
    pub fn command(&self) -> Commands {
        self.command.unwrap_or(Commands::Run)
    }
}

/// CLI subcommands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Run both pipelines (catalog, then events)
    Run,

    /// Build only `songs` and `artists`
    Songs,

    /// Build only `users`, `time` and `songplays`
    Logs,

    /// Validate configuration and count matching input files
    Check,
}

/// How the final report is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    /// Human-readable table
    Pretty,
    /// One JSON document
    Json,
}
