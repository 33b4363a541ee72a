//! ETL pipelines
//!
//! Two pipelines run in order against one [`Session`]:
//!
//! - [`process_song_data`] - catalog JSON into `songs` and `artists`
//! - [`process_log_data`] - event logs into `users`, `time` and `songplays`
//!
//! Every table is replaced on each run.

mod catalog;
mod events;

pub use catalog::{
    artists_table, process_song_data, songs_table, ARTIST_COLUMNS, SONGS_PARTITION, SONG_COLUMNS,
};
pub use events::{
    filter_plays, process_log_data, songplays_table, time_table, users_table, with_time_columns,
    Plays, NEXT_SONG_PAGE, SONGPLAYS_PARTITION, SONGPLAY_COLUMNS, TIME_PARTITION, USER_COLUMNS,
};

use crate::error::Result;
use crate::output::WriteSummary;
use crate::session::Session;
use serde::Serialize;
use std::fmt;

/// Song catalog files under the input root
pub const SONG_DATA_PATTERN: &str = "song_data/A/A/*/*.json";

/// Event log files under the input root
pub const LOG_DATA_PATTERN: &str = "log_data/*/*/*.json";

pub const SONGS_TABLE: &str = "songs.parquet";
pub const ARTISTS_TABLE: &str = "artists.parquet";
pub const USERS_TABLE: &str = "users.parquet";
pub const TIME_TABLE: &str = "time.parquet";
pub const SONGPLAYS_TABLE: &str = "songplays.parquet";

/// Outcome of a full run, one entry per table in write order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineReport {
    pub tables: Vec<WriteSummary>,
}

impl PipelineReport {
    /// Summary of one table by directory name
    pub fn table(&self, name: &str) -> Option<&WriteSummary> {
        self.tables.iter().find(|t| t.table == name)
    }

    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|t| t.rows).sum()
    }

    pub fn total_files(&self) -> usize {
        self.tables.iter().map(|t| t.files).sum()
    }
}

impl fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for table in &self.tables {
            writeln!(
                f,
                "{:<20} {:>8} rows {:>6} files {:>6} partitions",
                table.table,
                table.rows,
                table.files,
                table.partitions.len()
            )?;
        }
        write!(
            f,
            "{:<20} {:>8} rows {:>6} files",
            "total",
            self.total_rows(),
            self.total_files()
        )
    }
}

/// Run the catalog pipeline, then the event pipeline
pub async fn run(session: &Session) -> Result<PipelineReport> {
    let mut report = PipelineReport::default();

    tracing::info!("Processing song data");
    report.tables.extend(process_song_data(session).await?);

    tracing::info!("Processing log data");
    report.tables.extend(process_log_data(session).await?);

    tracing::info!(
        "Pipeline finished: {} tables, {} rows",
        report.tables.len(),
        report.total_rows()
    );
    Ok(report)
}
