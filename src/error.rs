//! Error types for Sparkify Lake
//!
//! This module defines the error hierarchy for the whole job.
//! Every public API returns `Result<T, Error>` where Error is defined here.
//! Nothing is recovered locally: any error aborts the run.

use thiserror::Error;

/// The main error type for Sparkify Lake
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config key: [{section}] {key}")]
    MissingConfigKey { section: String, key: String },

    #[error("Failed to parse config file: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Storage Errors
    // ============================================================================
    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("Storage error: {message}")]
    Storage { message: String },

    // ============================================================================
    // Input Errors
    // ============================================================================
    #[error("No input files match '{pattern}'")]
    NoInputFiles { pattern: String },

    #[error("Failed to decode '{path}' at line {line}: {message}")]
    Decode {
        path: String,
        line: usize,
        message: String,
    },

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Table Errors
    // ============================================================================
    #[error("Column '{column}' not found (available: {available})")]
    MissingColumn { column: String, available: String },

    #[error("Invalid value in column '{column}': {message}")]
    InvalidValue { column: String, message: String },

    #[error("Table error: {message}")]
    Table { message: String },

    // ============================================================================
    // Arrow/Parquet Errors
    // ============================================================================
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Output error: {message}")]
    Output { message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing config key error
    pub fn missing_key(section: impl Into<String>, key: impl Into<String>) -> Self {
        Self::MissingConfigKey {
            section: section.into(),
            key: key.into(),
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create a missing column error listing the columns that do exist
    pub fn missing_column<'a>(
        column: impl Into<String>,
        available: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        Self::MissingColumn {
            column: column.into(),
            available: available.into_iter().collect::<Vec<_>>().join(", "),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a table error
    pub fn table(message: impl Into<String>) -> Self {
        Self::Table {
            message: message.into(),
        }
    }

    /// Create an output error
    pub fn output(message: impl Into<String>) -> Self {
        Self::Output {
            message: message.into(),
        }
    }
}

/// Result type alias for Sparkify Lake
pub type Result<T> = std::result::Result<T, Error>;
