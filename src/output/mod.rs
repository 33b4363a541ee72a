//! Output module
//!
//! Handles Arrow RecordBatch creation and Parquet table writing.
//!
//! # Overview
//!
//! This module provides utilities for:
//! - Inferring Arrow schemas from JSON records
//! - Converting JSON to Arrow RecordBatches (and back, for inspection)
//! - Encoding Parquet files in memory
//! - Writing Hive-partitioned tables with overwrite semantics

mod partition;
mod schema;
mod writer;

pub use partition::{
    group_by_partition, partition_value, PartitionedWriter, WriteSummary,
    DEFAULT_PARTITION_NAME, SUCCESS_MARKER,
};
pub use schema::{arrow_to_json, infer_schema, json_to_arrow};
pub use writer::{batch_to_parquet_bytes, ParquetWriterConfig};
