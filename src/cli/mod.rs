//! CLI module
//!
//! Command-line interface for running the pipelines.
//!
//! # Commands
//!
//! - `run` - Build all five tables (default)
//! - `songs` - Build `songs` and `artists`
//! - `logs` - Build `users`, `time` and `songplays`
//! - `check` - Validate configuration and count input files

mod commands;
mod runner;

pub use commands::{Cli, Commands, ReportFormat};
pub use runner::Runner;
