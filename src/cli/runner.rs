//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, ReportFormat};
use crate::config::LakeConfig;
use crate::error::Result;
use crate::pipeline::{self, PipelineReport, LOG_DATA_PATTERN, SONG_DATA_PATTERN};
use crate::session::{Session, SessionConfig};
use crate::storage::PathPattern;
use serde_json::json;
use std::time::Instant;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let started = Instant::now();
        let session = self.session()?;

        let report = match self.cli.command() {
            Commands::Run => pipeline::run(&session).await?,
            Commands::Songs => PipelineReport {
                tables: pipeline::process_song_data(&session).await?,
            },
            Commands::Logs => PipelineReport {
                tables: pipeline::process_log_data(&session).await?,
            },
            Commands::Check => return self.check(&session).await,
        };

        tracing::info!("Finished in {:.2?}", started.elapsed());
        self.print_report(&report)
    }

    /// Resolve the session configuration from the file and CLI overrides
    pub fn session_config(&self, config: &LakeConfig) -> SessionConfig {
        let mut session = SessionConfig::from_lake_config(config);
        if let Some(input) = &self.cli.input {
            session.input_root.clone_from(input);
        }
        if let Some(output) = &self.cli.output {
            session.output_root.clone_from(output);
        }
        session
    }

    fn session(&self) -> Result<Session> {
        let config = LakeConfig::load(&self.cli.config)?;
        tracing::debug!("Loaded configuration from {}", self.cli.config.display());
        let credentials = config.credentials()?;
        Session::new(&credentials, &self.session_config(&config))
    }

    /// Count input files without processing them
    async fn check(&self, session: &Session) -> Result<()> {
        let mut counts = Vec::new();
        for pattern in [SONG_DATA_PATTERN, LOG_DATA_PATTERN] {
            let matched = session
                .input()
                .list_matching(&PathPattern::new(pattern)?)
                .await?;
            counts.push((session.input().display_path(pattern), matched.len()));
        }

        match self.cli.format {
            ReportFormat::Json => {
                let inputs: Vec<_> = counts
                    .iter()
                    .map(|(pattern, files)| json!({"pattern": pattern, "files": files}))
                    .collect();
                let doc = json!({
                    "input": session.input().root(),
                    "output": session.output().root(),
                    "inputs": inputs,
                });
                println!("{}", serde_json::to_string_pretty(&doc)?);
            }
            ReportFormat::Pretty => {
                println!("input:  {}", session.input().root());
                println!("output: {}", session.output().root());
                for (pattern, files) in &counts {
                    println!("{files:>6} files  {pattern}");
                }
            }
        }
        Ok(())
    }

    fn print_report(&self, report: &PipelineReport) -> Result<()> {
        match self.cli.format {
            ReportFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
            ReportFormat::Pretty => println!("{report}"),
        }
        Ok(())
    }
}
