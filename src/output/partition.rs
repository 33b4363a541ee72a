//! Hive-style partitioned table writer
//!
//! A table named `songs.parquet` partitioned by `(year, artist_id)` lands as
//!
//! ```text
//! songs.parquet/year=2004/artist_id=AR5KOSW1187FB35FF4/part-00000.snappy.parquet
//! songs.parquet/_SUCCESS
//! ```
//!
//! Partition columns are encoded in the directory names and removed from the
//! data files themselves.

use super::writer::{batch_to_parquet_bytes, ParquetWriterConfig};
use crate::error::{Error, Result};
use crate::storage::StorageLocation;
use crate::table::Table;
use arrow::array::{Array, UInt32Array};
use arrow::util::display::array_value_to_string;
use bytes::Bytes;
use serde::Serialize;
use std::collections::BTreeMap;

/// Directory name used for null or empty partition values
pub const DEFAULT_PARTITION_NAME: &str = "__HIVE_DEFAULT_PARTITION__";

/// Marker written once a table is complete
pub const SUCCESS_MARKER: &str = "_SUCCESS";

/// What a table write produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteSummary {
    /// Table directory name (e.g. `songs.parquet`)
    pub table: String,
    /// Rows written across all files
    pub rows: usize,
    /// Data files written (excluding the success marker)
    pub files: usize,
    /// Partition directories, e.g. `year=2018/month=11`
    pub partitions: Vec<String>,
    /// Objects removed by the overwrite
    pub replaced: usize,
}

/// Writes tables under one output root
#[derive(Debug, Clone)]
pub struct PartitionedWriter {
    location: StorageLocation,
    config: ParquetWriterConfig,
}

impl PartitionedWriter {
    /// Create a writer for an output root
    pub fn new(location: StorageLocation, config: ParquetWriterConfig) -> Self {
        Self { location, config }
    }

    pub fn location(&self) -> &StorageLocation {
        &self.location
    }

    /// Data file name for one partition
    fn file_name(&self) -> String {
        match self.config.codec_suffix() {
            Some(codec) => format!("part-00000.{codec}.parquet"),
            None => "part-00000.parquet".to_string(),
        }
    }

    /// Replace `table_dir` with the contents of `table`
    ///
    /// Everything previously under `table_dir` is deleted first. Without
    /// partition columns the table is written as a single file, even when
    /// empty, so readers still see its schema.
    pub async fn overwrite(
        &self,
        table_dir: &str,
        table: &Table,
        partition_by: &[&str],
    ) -> Result<WriteSummary> {
        for column in partition_by {
            table.column(column)?;
        }

        let groups = group_by_partition(table, partition_by)?;
        let data_table = table.drop_columns(partition_by)?;
        if !partition_by.is_empty() && data_table.num_columns() == 0 {
            return Err(Error::output(format!(
                "Cannot partition '{table_dir}' by every one of its columns"
            )));
        }

        let replaced = self.location.delete_dir(table_dir).await?;
        if replaced > 0 {
            tracing::debug!(
                "Removed {replaced} existing objects under {}",
                self.location.display_path(table_dir)
            );
        }

        let file_name = self.file_name();
        let mut summary = WriteSummary {
            table: table_dir.to_string(),
            rows: 0,
            files: 0,
            partitions: Vec::new(),
            replaced,
        };

        if partition_by.is_empty() {
            let data = batch_to_parquet_bytes(data_table.batch(), &self.config)?;
            let path = self.location.write(&[table_dir, &file_name], data).await?;
            tracing::debug!("Wrote {} rows to {path}", data_table.num_rows());
            summary.rows = data_table.num_rows();
            summary.files = 1;
        } else {
            for (values, indices) in groups {
                let dirs: Vec<String> = partition_by
                    .iter()
                    .zip(&values)
                    .map(|(column, value)| format!("{column}={value}"))
                    .collect();

                let part = data_table.take_rows(&UInt32Array::from(indices))?;
                let data = batch_to_parquet_bytes(part.batch(), &self.config)?;

                let mut segments: Vec<&str> = vec![table_dir];
                segments.extend(dirs.iter().map(String::as_str));
                segments.push(&file_name);
                let path = self.location.write(&segments, data).await?;
                tracing::debug!("Wrote {} rows to {path}", part.num_rows());

                summary.rows += part.num_rows();
                summary.files += 1;
                summary.partitions.push(dirs.join("/"));
            }
        }

        self.location
            .write(&[table_dir, SUCCESS_MARKER], Bytes::new())
            .await?;

        Ok(summary)
    }
}

/// Group row indices by their rendered partition values
///
/// Groups come back sorted by value text; rows inside a group keep table
/// order. With no partition columns the result is empty.
pub fn group_by_partition(
    table: &Table,
    partition_by: &[&str],
) -> Result<BTreeMap<Vec<String>, Vec<u32>>> {
    let mut groups: BTreeMap<Vec<String>, Vec<u32>> = BTreeMap::new();
    if partition_by.is_empty() {
        return Ok(groups);
    }

    let columns = partition_by
        .iter()
        .map(|c| table.column(c))
        .collect::<Result<Vec<_>>>()?;

    for row in 0..table.num_rows() {
        let key = columns
            .iter()
            .map(|col| partition_value(col.as_ref(), row))
            .collect::<Result<Vec<_>>>()?;
        groups.entry(key).or_default().push(row as u32);
    }

    Ok(groups)
}

/// Render one cell as a partition directory value
pub fn partition_value(array: &dyn Array, row: usize) -> Result<String> {
    if array.is_null(row) {
        return Ok(DEFAULT_PARTITION_NAME.to_string());
    }
    let value = array_value_to_string(array, row)?;
    if value.is_empty() {
        Ok(DEFAULT_PARTITION_NAME.to_string())
    } else {
        Ok(value)
    }
}
