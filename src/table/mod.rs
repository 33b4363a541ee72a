//! Table module
//!
//! A small single-machine stand-in for a dataframe engine. Tables are
//! immutable Arrow RecordBatches with the handful of relational operations
//! the pipelines need: select, filter, deduplicate, join and add columns.

mod frame;

pub use frame::{Table, JOIN_CONFLICT_SUFFIX};
