//! In-memory table backed by a single Arrow RecordBatch

use crate::error::{Error, Result};
use crate::output::{arrow_to_json, json_to_arrow};
use arrow::array::{Array, ArrayRef, StringArray, UInt32Array};
use arrow::compute::kernels::cmp::eq;
use arrow::compute::{cast, filter_record_batch, take};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use arrow::row::{RowConverter, SortField};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Suffix given to right-hand columns whose names clash after a join
pub const JOIN_CONFLICT_SUFFIX: &str = "_right";

/// An immutable table
///
/// Every operation returns a new table; nothing is mutated in place.
#[derive(Debug, Clone)]
pub struct Table {
    batch: RecordBatch,
}

impl Table {
    /// Wrap an existing RecordBatch
    pub fn new(batch: RecordBatch) -> Self {
        Self { batch }
    }

    /// Build a table from JSON records, inferring the schema
    pub fn from_json_records(records: &[Value]) -> Result<Self> {
        Ok(Self::new(json_to_arrow(records, None)?))
    }

    /// Build a table from named, equally long columns
    pub fn from_columns(columns: Vec<(&str, ArrayRef)>) -> Result<Self> {
        let row_count = columns.first().map_or(0, |(_, array)| array.len());
        let fields: Vec<Field> = columns
            .iter()
            .map(|(name, array)| Field::new(*name, array.data_type().clone(), true))
            .collect();
        let arrays = columns.into_iter().map(|(_, array)| array).collect();
        let options = RecordBatchOptions::new().with_row_count(Some(row_count));
        let batch =
            RecordBatch::try_new_with_options(Arc::new(Schema::new(fields)), arrays, &options)?;
        Ok(Self::new(batch))
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    /// Column names in schema order
    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    fn index_of(&self, name: &str) -> Result<usize> {
        self.batch.schema().index_of(name).map_err(|_| {
            let names = self.column_names();
            Error::missing_column(name, names.iter().map(String::as_str))
        })
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Result<&ArrayRef> {
        let idx = self.index_of(name)?;
        Ok(self.batch.column(idx))
    }

    /// Keep only the named columns, in the given order
    pub fn select(&self, names: &[&str]) -> Result<Self> {
        let pairs: Vec<(&str, &str)> = names.iter().map(|n| (*n, *n)).collect();
        self.select_as(&pairs)
    }

    /// Keep `(source, alias)` columns, renaming each source to its alias
    pub fn select_as(&self, columns: &[(&str, &str)]) -> Result<Self> {
        let mut selected = Vec::with_capacity(columns.len());
        for (source, alias) in columns {
            selected.push((*alias, Arc::clone(self.column(source)?)));
        }
        Self::from_columns_with_rows(selected, self.num_rows())
    }

    /// Append a column, replacing any existing column of the same name
    pub fn with_column(&self, name: &str, array: ArrayRef) -> Result<Self> {
        if array.len() != self.num_rows() {
            return Err(Error::table(format!(
                "Column '{name}' has {} rows, table has {}",
                array.len(),
                self.num_rows()
            )));
        }

        let schema = self.batch.schema();
        let mut columns: Vec<(&str, ArrayRef)> = schema
            .fields()
            .iter()
            .zip(self.batch.columns())
            .filter(|(field, _)| field.name() != name)
            .map(|(field, array)| (field.name().as_str(), Arc::clone(array)))
            .collect();
        columns.push((name, array));
        Self::from_columns_with_rows(columns, self.num_rows())
    }

    /// Drop the named columns; unknown names are ignored
    pub fn drop_columns(&self, names: &[&str]) -> Result<Self> {
        let schema = self.batch.schema();
        let keep: Vec<(&str, &str)> = schema
            .fields()
            .iter()
            .map(|f| f.name().as_str())
            .filter(|n| !names.contains(n))
            .map(|n| (n, n))
            .collect();
        self.select_as(&keep)
    }

    /// Keep rows whose column, rendered as text, equals `value`
    ///
    /// Null cells never match.
    pub fn filter_eq(&self, column: &str, value: &str) -> Result<Self> {
        let text = as_utf8(self.column(column)?)?;
        let mask = eq(&text, &StringArray::new_scalar(value))?;
        Ok(Self::new(filter_record_batch(&self.batch, &mask)?))
    }

    /// Gather rows by index, in index order
    pub fn take_rows(&self, indices: &UInt32Array) -> Result<Self> {
        let columns = self
            .batch
            .columns()
            .iter()
            .map(|c| take(c.as_ref(), indices, None))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let options = RecordBatchOptions::new().with_row_count(Some(indices.len()));
        let batch = RecordBatch::try_new_with_options(self.batch.schema(), columns, &options)?;
        Ok(Self::new(batch))
    }

    /// Keep the first row for every distinct combination of `keys`
    ///
    /// Rows keep their input order. Null keys compare equal to each other.
    pub fn drop_duplicates(&self, keys: &[&str]) -> Result<Self> {
        if keys.is_empty() {
            return Err(Error::table("drop_duplicates needs at least one key column"));
        }

        let key_columns = keys
            .iter()
            .map(|k| comparable(self.column(k)?))
            .collect::<Result<Vec<_>>>()?;
        let fields = key_columns
            .iter()
            .map(|c| SortField::new(c.data_type().clone()))
            .collect();
        let converter = RowConverter::new(fields)?;
        let rows = converter.convert_columns(&key_columns)?;

        let mut seen = HashSet::with_capacity(rows.num_rows());
        let keep: Vec<u32> = (0..rows.num_rows())
            .filter(|&i| seen.insert(rows.row(i)))
            .map(|i| i as u32)
            .collect();

        if keep.len() == self.num_rows() {
            return Ok(self.clone());
        }
        self.take_rows(&UInt32Array::from(keep))
    }

    /// Inner equi-join on `self.left_on == right.right_on`
    ///
    /// Keys are compared as text and nulls never match. Output rows follow
    /// left order, then right order within one left row, so a key that
    /// occurs several times on the right fans out. Right-hand columns whose
    /// names already exist on the left get [`JOIN_CONFLICT_SUFFIX`].
    pub fn inner_join(&self, right: &Table, left_on: &str, right_on: &str) -> Result<Self> {
        let left_text = as_utf8(self.column(left_on)?)?;
        let left_keys = string_values(&left_text)?;
        let right_text = as_utf8(right.column(right_on)?)?;
        let right_keys = string_values(&right_text)?;

        let mut index: HashMap<&str, Vec<u32>> = HashMap::new();
        for (i, key) in right_keys.iter().copied().enumerate() {
            if let Some(key) = key {
                index.entry(key).or_default().push(i as u32);
            }
        }

        let mut left_idx = Vec::new();
        let mut right_idx = Vec::new();
        for (i, key) in left_keys.iter().copied().enumerate() {
            let Some(matches) = key.and_then(|k| index.get(k)) else {
                continue;
            };
            for &r in matches {
                left_idx.push(i as u32);
                right_idx.push(r);
            }
        }

        let left_rows = self.take_rows(&UInt32Array::from(left_idx))?;
        let right_rows = right.take_rows(&UInt32Array::from(right_idx))?;

        let left_names = self.column_names();
        let right_names = right.column_names();
        let renamed: Vec<String> = right_names
            .iter()
            .map(|name| {
                if left_names.contains(name) {
                    format!("{name}{JOIN_CONFLICT_SUFFIX}")
                } else {
                    name.clone()
                }
            })
            .collect();

        let mut columns: Vec<(&str, ArrayRef)> = left_names
            .iter()
            .map(String::as_str)
            .zip(left_rows.batch.columns().iter().cloned())
            .collect();
        columns.extend(
            renamed
                .iter()
                .map(String::as_str)
                .zip(right_rows.batch.columns().iter().cloned()),
        );

        Self::from_columns_with_rows(columns, left_rows.num_rows())
    }

    /// The first `n` rows
    pub fn head(&self, n: usize) -> Self {
        Self::new(self.batch.slice(0, n.min(self.num_rows())))
    }

    /// Rows as JSON objects (nulls explicit)
    pub fn to_json_rows(&self) -> Result<Vec<Value>> {
        arrow_to_json(&self.batch)
    }

    fn from_columns_with_rows(columns: Vec<(&str, ArrayRef)>, rows: usize) -> Result<Self> {
        if columns.is_empty() {
            let options = RecordBatchOptions::new().with_row_count(Some(rows));
            let batch =
                RecordBatch::try_new_with_options(Arc::new(Schema::empty()), vec![], &options)?;
            return Ok(Self::new(batch));
        }
        Self::from_columns(columns)
    }
}

/// Cast a column to Utf8 for text comparisons
fn as_utf8(array: &ArrayRef) -> Result<ArrayRef> {
    if array.data_type() == &DataType::Utf8 {
        return Ok(Arc::clone(array));
    }
    Ok(cast(array.as_ref(), &DataType::Utf8)?)
}

/// Make a key column usable by the row converter
fn comparable(array: &ArrayRef) -> Result<ArrayRef> {
    match array.data_type() {
        DataType::Null => as_utf8(array),
        _ => Ok(Arc::clone(array)),
    }
}

fn string_values(array: &ArrayRef) -> Result<Vec<Option<&str>>> {
    let strings = array
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| Error::table("Failed to downcast join key to StringArray"))?;
    Ok(strings.iter().collect())
}
