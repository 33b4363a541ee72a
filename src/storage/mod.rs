//! Storage module
//!
//! Object-store access for the job's input and output roots.
//!
//! # Overview
//!
//! - Parsing root URLs (S3, S3A, local paths) into object stores
//! - Listing objects that match a segment-wise path pattern
//! - Reading and writing whole objects
//! - Clearing a table directory before an overwrite

mod location;
mod pattern;

pub use location::StorageLocation;
pub use pattern::PathPattern;
