//! Parquet encoding
//!
//! Encodes Arrow RecordBatches into in-memory Parquet files ready to be put
//! into an object store.

use crate::error::Result;
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

/// Parquet encoding settings for every table the job writes
#[derive(Debug, Clone)]
pub struct ParquetWriterConfig {
    compression: Compression,
    row_group_size: usize,
}

impl Default for ParquetWriterConfig {
    fn default() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: 1024 * 1024, // 1M rows
        }
    }
}

impl ParquetWriterConfig {
    /// File-name codec tag, e.g. `snappy` in `part-00000.snappy.parquet`
    pub fn codec_suffix(&self) -> Option<&'static str> {
        match self.compression {
            Compression::UNCOMPRESSED => None,
            Compression::SNAPPY => Some("snappy"),
            Compression::GZIP(_) => Some("gz"),
            Compression::ZSTD(_) => Some("zstd"),
            Compression::LZ4 | Compression::LZ4_RAW => Some("lz4"),
            Compression::BROTLI(_) => Some("brotli"),
            Compression::LZO => Some("lzo"),
        }
    }

    /// Build writer properties
    pub fn build_properties(&self) -> WriterProperties {
        WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build()
    }
}

/// Encode a RecordBatch as a complete Parquet file in memory
pub fn batch_to_parquet_bytes(batch: &RecordBatch, config: &ParquetWriterConfig) -> Result<Bytes> {
    let mut buf = Vec::new();
    let props = config.build_properties();

    let mut writer = ArrowWriter::try_new(&mut buf, batch.schema(), Some(props))?;
    writer.write(batch)?;
    writer.close()?;

    Ok(Bytes::from(buf))
}
