//! Event timestamp derivation
//!
//! Events carry `ts` as milliseconds since the Unix epoch. The job derives
//! a whole-second epoch string and a UTC date-time string from it, then
//! calendar fields from the date-time. Everything here is pure.
//!
//! Date-times are rendered in UTC rather than the host's local time zone, so
//! output does not depend on where the job runs.

use crate::error::{Error, Result};
use arrow::array::{Array, ArrayRef, Int32Array, Int64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use chrono::{DateTime, Datelike, NaiveDateTime, Timelike};
use std::sync::Arc;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The two string forms derived from one `ts` value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedTimestamp {
    /// Whole seconds since the epoch, truncated toward zero
    pub epoch_seconds: String,
    /// `YYYY-MM-DD HH:MM:SS[.ffffff]` in UTC
    pub datetime: String,
}

/// Calendar fields of one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarFields {
    pub hour: i32,
    pub day: i32,
    /// ISO-8601 week of year
    pub week: i32,
    pub month: i32,
    pub year: i32,
}

/// Derive the epoch-second and date-time strings for a millisecond timestamp
pub fn derive_timestamp(ts_ms: i64) -> Result<DerivedTimestamp> {
    let datetime = to_datetime(ts_ms)?;
    Ok(DerivedTimestamp {
        epoch_seconds: (ts_ms / 1000).to_string(),
        datetime: format_datetime(&datetime),
    })
}

/// Calendar fields for a millisecond timestamp
pub fn calendar_fields(ts_ms: i64) -> Result<CalendarFields> {
    let dt = to_datetime(ts_ms)?;
    Ok(CalendarFields {
        hour: dt.hour() as i32,
        day: dt.day() as i32,
        week: dt.iso_week().week() as i32,
        month: dt.month() as i32,
        year: dt.year(),
    })
}

fn to_datetime(ts_ms: i64) -> Result<NaiveDateTime> {
    DateTime::from_timestamp_millis(ts_ms)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| Error::invalid_value("ts", format!("{ts_ms} is out of range")))
}

/// Seconds precision, plus microseconds only when they are non-zero
fn format_datetime(dt: &NaiveDateTime) -> String {
    let base = dt.format(DATETIME_FORMAT);
    match dt.nanosecond() / 1000 {
        0 => base.to_string(),
        micros => format!("{base}.{micros:06}"),
    }
}

/// Column-wise form of the derivation, aligned row for row with `ts`
#[derive(Debug, Clone)]
pub struct TimeColumns {
    pub epoch_seconds: ArrayRef,
    pub start_time: ArrayRef,
    pub hour: ArrayRef,
    pub day: ArrayRef,
    pub week: ArrayRef,
    pub month: ArrayRef,
    pub year: ArrayRef,
}

impl TimeColumns {
    /// Derive every time column from a `ts` column
    ///
    /// The column may hold integers, floats or numeric strings; a null or
    /// unparseable value is an error.
    pub fn from_ts(ts: &ArrayRef) -> Result<Self> {
        let ts = cast(ts.as_ref(), &DataType::Int64)?;
        let ts = ts
            .as_any()
            .downcast_ref::<Int64Array>()
            .ok_or_else(|| Error::invalid_value("ts", "not an integer column"))?;

        let len = ts.len();
        let mut epoch_seconds = Vec::with_capacity(len);
        let mut start_time = Vec::with_capacity(len);
        let mut hour = Vec::with_capacity(len);
        let mut day = Vec::with_capacity(len);
        let mut week = Vec::with_capacity(len);
        let mut month = Vec::with_capacity(len);
        let mut year = Vec::with_capacity(len);

        for row in 0..len {
            if ts.is_null(row) {
                return Err(Error::invalid_value(
                    "ts",
                    format!("missing or non-numeric value at row {row}"),
                ));
            }
            let value = ts.value(row);
            let derived = derive_timestamp(value)?;
            let fields = calendar_fields(value)?;

            epoch_seconds.push(derived.epoch_seconds);
            start_time.push(derived.datetime);
            hour.push(fields.hour);
            day.push(fields.day);
            week.push(fields.week);
            month.push(fields.month);
            year.push(fields.year);
        }

        Ok(Self {
            epoch_seconds: Arc::new(StringArray::from(epoch_seconds)),
            start_time: Arc::new(StringArray::from(start_time)),
            hour: Arc::new(Int32Array::from(hour)),
            day: Arc::new(Int32Array::from(day)),
            week: Arc::new(Int32Array::from(week)),
            month: Arc::new(Int32Array::from(month)),
            year: Arc::new(Int32Array::from(year)),
        })
    }
}
