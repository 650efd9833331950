// file: src/models/columnar.rs
// description: arrow record batch conversion shared by all stage records
// reference: https://docs.rs/arrow-array

use crate::error::{PipelineError, Result};
use arrow_array::{
    Array, BooleanArray, Float64Array, RecordBatch, StringArray, TimestampMicrosecondArray,
    UInt64Array,
};
use arrow_schema::{DataType, SchemaRef, TimeUnit};
use chrono::{DateTime, NaiveDateTime, Utc};

/// A row type that can be written to and read from an arrow record batch.
pub trait ColumnarRecord: Sized {
    /// Stage tag written into the `processing_stage` column.
    const STAGE: &'static str;

    fn schema() -> SchemaRef;

    fn to_batch(rows: &[Self]) -> Result<RecordBatch>;

    fn from_batch(batch: &RecordBatch) -> Result<Vec<Self>>;
}

pub const PROCESSED_AT_TZ: &str = "UTC";

pub fn utc_timestamp_type() -> DataType {
    DataType::Timestamp(TimeUnit::Microsecond, Some(PROCESSED_AT_TZ.into()))
}

pub fn naive_timestamp_type() -> DataType {
    DataType::Timestamp(TimeUnit::Microsecond, None)
}

fn column<'a, T: Array + 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
    batch
        .column_by_name(name)
        .ok_or_else(|| PipelineError::Schema(format!("Missing '{}' column", name)))?
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| PipelineError::Schema(format!("Invalid '{}' column type", name)))
}

/// Typed read access to the columns of one batch.
pub struct BatchReader<'a> {
    batch: &'a RecordBatch,
}

impl<'a> BatchReader<'a> {
    pub fn new(batch: &'a RecordBatch) -> Self {
        Self { batch }
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn strings(&self, name: &str) -> Result<Vec<String>> {
        let col = column::<StringArray>(self.batch, name)?;
        (0..col.len())
            .map(|i| {
                if col.is_null(i) {
                    Err(PipelineError::Schema(format!(
                        "Unexpected null in '{}' at row {}",
                        name, i
                    )))
                } else {
                    Ok(col.value(i).to_string())
                }
            })
            .collect()
    }

    pub fn optional_strings(&self, name: &str) -> Result<Vec<Option<String>>> {
        let col = column::<StringArray>(self.batch, name)?;
        Ok((0..col.len())
            .map(|i| (!col.is_null(i)).then(|| col.value(i).to_string()))
            .collect())
    }

    pub fn u64s(&self, name: &str) -> Result<Vec<u64>> {
        let col = column::<UInt64Array>(self.batch, name)?;
        Ok(col.values().to_vec())
    }

    pub fn f64s(&self, name: &str) -> Result<Vec<f64>> {
        let col = column::<Float64Array>(self.batch, name)?;
        Ok(col.values().to_vec())
    }

    pub fn bools(&self, name: &str) -> Result<Vec<bool>> {
        let col = column::<BooleanArray>(self.batch, name)?;
        Ok((0..col.len()).map(|i| col.value(i)).collect())
    }

    pub fn utc_timestamps(&self, name: &str) -> Result<Vec<DateTime<Utc>>> {
        let col = column::<TimestampMicrosecondArray>(self.batch, name)?;
        col.values()
            .iter()
            .map(|&micros| {
                DateTime::from_timestamp_micros(micros).ok_or_else(|| {
                    PipelineError::Schema(format!("Out of range timestamp in '{}'", name))
                })
            })
            .collect()
    }

    pub fn optional_naive_timestamps(&self, name: &str) -> Result<Vec<Option<NaiveDateTime>>> {
        let col = column::<TimestampMicrosecondArray>(self.batch, name)?;
        (0..col.len())
            .map(|i| {
                if col.is_null(i) {
                    return Ok(None);
                }
                micros_to_naive(col.value(i)).map(Some).ok_or_else(|| {
                    PipelineError::Schema(format!("Out of range timestamp in '{}'", name))
                })
            })
            .collect()
    }

    pub fn naive_timestamps(&self, name: &str) -> Result<Vec<NaiveDateTime>> {
        self.optional_naive_timestamps(name)?
            .into_iter()
            .enumerate()
            .map(|(i, ts)| {
                ts.ok_or_else(|| {
                    PipelineError::Schema(format!("Unexpected null in '{}' at row {}", name, i))
                })
            })
            .collect()
    }
}

pub fn string_array<'a>(values: impl Iterator<Item = &'a str>) -> StringArray {
    StringArray::from(values.collect::<Vec<_>>())
}

pub fn optional_string_array<'a>(values: impl Iterator<Item = Option<&'a str>>) -> StringArray {
    StringArray::from(values.collect::<Vec<_>>())
}

pub fn stage_array(stage: &str, len: usize) -> StringArray {
    StringArray::from(vec![stage; len])
}

pub fn utc_timestamp_array(values: impl Iterator<Item = DateTime<Utc>>) -> TimestampMicrosecondArray {
    TimestampMicrosecondArray::from(values.map(|ts| ts.timestamp_micros()).collect::<Vec<_>>())
        .with_timezone(PROCESSED_AT_TZ)
}

pub fn naive_timestamp_array(
    values: impl Iterator<Item = Option<NaiveDateTime>>,
) -> TimestampMicrosecondArray {
    TimestampMicrosecondArray::from(
        values
            .map(|ts| ts.map(|ts| ts.and_utc().timestamp_micros()))
            .collect::<Vec<_>>(),
    )
}

fn micros_to_naive(micros: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_micros(micros).map(|dt| dt.naive_utc())
}
