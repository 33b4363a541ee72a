//! # Sparkify Lake
//!
//! Batch ETL that turns a song catalog and listening-event logs, stored as
//! JSON in object storage, into five Parquet tables laid out as a
//! partitioned data lake.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sparkify_lake::{pipeline, Credentials, Result, Session, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let credentials = Credentials::new("AKIA...", "secret");
//!     let config = SessionConfig::new("s3a://udacity-dend/", "s3a://my-lake/");
//!     let session = Session::new(&credentials, &config)?;
//!
//!     let report = pipeline::run(&session).await?;
//!     println!("{report}");
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                            Session                              │
//! │   input: StorageLocation          output: PartitionedWriter     │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────────┬───────────────┴───────┬──────────────┬───────────┐
//! │    Input     │         Table         │  Timestamp   │  Output   │
//! ├──────────────┼───────────────────────┼──────────────┼───────────┤
//! │ Glob listing │ select / filter       │ ms → seconds │ Hive dirs │
//! │ JSON Lines   │ dedup / inner join    │ ms → UTC     │ Parquet   │
//! │ Schema infer │                       │ calendar     │ _SUCCESS  │
//! └──────────────┴───────────────────────┴──────────────┴───────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::unused_self)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Configuration file and credentials
pub mod config;

/// Object storage roots and path patterns
pub mod storage;

/// JSON Lines dataset loading
pub mod input;

/// In-memory Arrow tables
pub mod table;

/// Event timestamp derivation
pub mod timestamp;

/// Arrow/Parquet output
pub mod output;

/// Execution context
pub mod session;

/// Catalog and event pipelines
pub mod pipeline;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::{Credentials, LakeConfig, StorageOptions};
pub use error::{Error, Result};
pub use pipeline::PipelineReport;
pub use session::{Session, SessionConfig};
pub use table::Table;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
