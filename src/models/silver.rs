// file: src/models/silver.rs
// description: cleaned and typed article record produced by normalization
// reference: internal data structures

use crate::error::Result;
use crate::models::columnar::{
    BatchReader, ColumnarRecord, naive_timestamp_array, naive_timestamp_type,
    optional_string_array, stage_array, string_array, utc_timestamp_array, utc_timestamp_type,
};
use arrow_array::{BooleanArray, Float64Array, RecordBatch, UInt64Array};
use arrow_schema::{DataType, Field, Schema, SchemaRef};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::mem;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct SilverRecord {
    pub file_id: String,
    pub raw_filename: String,
    pub title: String,
    pub description: String,
    pub url: String,
    pub publish_date: Option<String>,
    /// `None` when `publish_date` was absent or unparseable.
    pub publish_ts: Option<NaiveDateTime>,
    pub extracted_text: String,
    pub text_length: u64,
    pub word_count: u64,
    pub reading_time_min: f64,
    pub has_description: bool,
    pub processed_at: DateTime<Utc>,
}

impl ColumnarRecord for SilverRecord {
    const STAGE: &'static str = "silver";

    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("file_id", DataType::Utf8, false),
            Field::new("raw_filename", DataType::Utf8, false),
            Field::new("title", DataType::Utf8, false),
            Field::new("description", DataType::Utf8, false),
            Field::new("url", DataType::Utf8, false),
            Field::new("publish_date", DataType::Utf8, true),
            Field::new("publish_ts", naive_timestamp_type(), true),
            Field::new("extracted_text", DataType::Utf8, false),
            Field::new("text_length", DataType::UInt64, false),
            Field::new("word_count", DataType::UInt64, false),
            Field::new("reading_time_min", DataType::Float64, false),
            Field::new("has_description", DataType::Boolean, false),
            Field::new("processed_at", utc_timestamp_type(), false),
            Field::new("processing_stage", DataType::Utf8, false),
        ]))
    }

    fn to_batch(rows: &[Self]) -> Result<RecordBatch> {
        let batch = RecordBatch::try_new(
            Self::schema(),
            vec![
                Arc::new(string_array(rows.iter().map(|r| r.file_id.as_str()))),
                Arc::new(string_array(rows.iter().map(|r| r.raw_filename.as_str()))),
                Arc::new(string_array(rows.iter().map(|r| r.title.as_str()))),
                Arc::new(string_array(rows.iter().map(|r| r.description.as_str()))),
                Arc::new(string_array(rows.iter().map(|r| r.url.as_str()))),
                Arc::new(optional_string_array(
                    rows.iter().map(|r| r.publish_date.as_deref()),
                )),
                Arc::new(naive_timestamp_array(rows.iter().map(|r| r.publish_ts))),
                Arc::new(string_array(rows.iter().map(|r| r.extracted_text.as_str()))),
                Arc::new(UInt64Array::from(
                    rows.iter().map(|r| r.text_length).collect::<Vec<_>>(),
                )),
                Arc::new(UInt64Array::from(
                    rows.iter().map(|r| r.word_count).collect::<Vec<_>>(),
                )),
                Arc::new(Float64Array::from(
                    rows.iter().map(|r| r.reading_time_min).collect::<Vec<_>>(),
                )),
                Arc::new(BooleanArray::from(
                    rows.iter().map(|r| r.has_description).collect::<Vec<_>>(),
                )),
                Arc::new(utc_timestamp_array(rows.iter().map(|r| r.processed_at))),
                Arc::new(stage_array(Self::STAGE, rows.len())),
            ],
        )?;
        Ok(batch)
    }

    fn from_batch(batch: &RecordBatch) -> Result<Vec<Self>> {
        let reader = BatchReader::new(batch);
        let mut file_ids = reader.strings("file_id")?;
        let mut raw_filenames = reader.strings("raw_filename")?;
        let mut titles = reader.strings("title")?;
        let mut descriptions = reader.strings("description")?;
        let mut urls = reader.strings("url")?;
        let mut publish_dates = reader.optional_strings("publish_date")?;
        let publish_tss = reader.optional_naive_timestamps("publish_ts")?;
        let mut texts = reader.strings("extracted_text")?;
        let text_lengths = reader.u64s("text_length")?;
        let word_counts = reader.u64s("word_count")?;
        let reading_times = reader.f64s("reading_time_min")?;
        let has_descriptions = reader.bools("has_description")?;
        let processed_ats = reader.utc_timestamps("processed_at")?;

        Ok((0..reader.num_rows())
            .map(|i| Self {
                file_id: mem::take(&mut file_ids[i]),
                raw_filename: mem::take(&mut raw_filenames[i]),
                title: mem::take(&mut titles[i]),
                description: mem::take(&mut descriptions[i]),
                url: mem::take(&mut urls[i]),
                publish_date: publish_dates[i].take(),
                publish_ts: publish_tss[i],
                extracted_text: mem::take(&mut texts[i]),
                text_length: text_lengths[i],
                word_count: word_counts[i],
                reading_time_min: reading_times[i],
                has_description: has_descriptions[i],
                processed_at: processed_ats[i],
            })
            .collect())
    }
}
