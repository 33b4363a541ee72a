//! Execution context shared by both pipelines
//!
//! A session owns the input and output storage roots and the Parquet
//! settings. It exposes the two I/O primitives the pipelines need: load a
//! JSON dataset into a table, and overwrite an output table.

use crate::config::{Credentials, LakeConfig, StorageOptions};
use crate::error::Result;
use crate::input::read_json_table;
use crate::output::{ParquetWriterConfig, PartitionedWriter, WriteSummary};
use crate::storage::StorageLocation;
use crate::table::Table;

/// Roots and options a session is built from
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Root holding `song_data/` and `log_data/`
    pub input_root: String,
    /// Root receiving the output tables
    pub output_root: String,
    /// S3 connection options
    pub storage: StorageOptions,
    /// Parquet encoding settings
    pub parquet: ParquetWriterConfig,
}

impl SessionConfig {
    pub fn new(input_root: impl Into<String>, output_root: impl Into<String>) -> Self {
        Self {
            input_root: input_root.into(),
            output_root: output_root.into(),
            storage: StorageOptions::default(),
            parquet: ParquetWriterConfig::default(),
        }
    }

    /// Take roots and storage options from a config file
    pub fn from_lake_config(config: &LakeConfig) -> Self {
        Self {
            storage: config.storage_options(),
            ..Self::new(config.input_root(), config.output_root())
        }
    }
}

/// Ready-to-use execution context
#[derive(Debug, Clone)]
pub struct Session {
    input: StorageLocation,
    writer: PartitionedWriter,
}

impl Session {
    /// Connect to both roots with explicit credentials
    pub fn new(credentials: &Credentials, config: &SessionConfig) -> Result<Self> {
        let input = StorageLocation::open(&config.input_root, credentials, &config.storage)?;
        let output =
            StorageLocation::open_or_create(&config.output_root, credentials, &config.storage)?;

        tracing::info!(
            "Session ready: input={} ({}), output={} ({})",
            input.root(),
            input.scheme(),
            output.root(),
            output.scheme()
        );

        Ok(Self {
            input,
            writer: PartitionedWriter::new(output, config.parquet.clone()),
        })
    }

    pub fn input(&self) -> &StorageLocation {
        &self.input
    }

    pub fn output(&self) -> &StorageLocation {
        self.writer.location()
    }

    /// Load every JSON file matching `pattern` under the input root
    pub async fn read_json(&self, pattern: &str) -> Result<Table> {
        read_json_table(&self.input, pattern).await
    }

    /// Replace an output table, optionally partitioned
    pub async fn write_table(
        &self,
        name: &str,
        table: &Table,
        partition_by: &[&str],
    ) -> Result<WriteSummary> {
        if tracing::enabled!(tracing::Level::DEBUG) {
            if let Some(row) = table.head(1).to_json_rows()?.first() {
                tracing::debug!("{name} sample row: {row}");
            }
        }

        let summary = self.writer.overwrite(name, table, partition_by).await?;
        tracing::info!(
            "Wrote {} rows in {} files ({} partitions) to {}",
            summary.rows,
            summary.files,
            summary.partitions.len(),
            self.output().display_path(name)
        );
        Ok(summary)
    }
}
