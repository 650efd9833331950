// file: src/models/gold.rs
// description: analysis-ready article record with calendar partitions
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

/// Gold rows always carry a publish timestamp; the partition columns are
/// `publish_ts` truncated to the start of its year, month and day.
#[derive(Debug, Clone, PartialEq)]
pub struct GoldRecord {
    pub id: String,
    pub filename: String,
    pub title: String,
    pub description: String,
    pub url: String,
    pub publish_date: Option<String>,
    pub publish_ts: NaiveDateTime,
    pub publish_year: NaiveDateTime,
    pub publish_month: NaiveDateTime,
    pub publish_day: NaiveDateTime,
    pub extracted_text: String,
    pub text_length: u64,
    pub word_count: u64,
    pub reading_time_min: f64,
    pub has_description: bool,
    pub processed_at: DateTime<Utc>,
}

impl ColumnarRecord for GoldRecord {
    const STAGE: &'static str = "gold";

    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("filename", DataType::Utf8, false),
            Field::new("title", DataType::Utf8, false),
            Field::new("description", DataType::Utf8, false),
            Field::new("url", DataType::Utf8, false),
            Field::new("publish_date", DataType::Utf8, true),
            Field::new("publish_ts", naive_timestamp_type(), false),
            Field::new("publish_year", naive_timestamp_type(), false),
            Field::new("publish_month", naive_timestamp_type(), false),
            Field::new("publish_day", naive_timestamp_type(), false),
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
                Arc::new(string_array(rows.iter().map(|r| r.id.as_str()))),
                Arc::new(string_array(rows.iter().map(|r| r.filename.as_str()))),
                Arc::new(string_array(rows.iter().map(|r| r.title.as_str()))),
                Arc::new(string_array(rows.iter().map(|r| r.description.as_str()))),
                Arc::new(string_array(rows.iter().map(|r| r.url.as_str()))),
                Arc::new(optional_string_array(
                    rows.iter().map(|r| r.publish_date.as_deref()),
                )),
                Arc::new(naive_timestamp_array(rows.iter().map(|r| Some(r.publish_ts)))),
                Arc::new(naive_timestamp_array(rows.iter().map(|r| Some(r.publish_year)))),
                Arc::new(naive_timestamp_array(rows.iter().map(|r| Some(r.publish_month)))),
                Arc::new(naive_timestamp_array(rows.iter().map(|r| Some(r.publish_day)))),
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
        let mut ids = reader.strings("id")?;
        let mut filenames = reader.strings("filename")?;
        let mut titles = reader.strings("title")?;
        let mut descriptions = reader.strings("description")?;
        let mut urls = reader.strings("url")?;
        let mut publish_dates = reader.optional_strings("publish_date")?;
        let publish_tss = reader.naive_timestamps("publish_ts")?;
        let years = reader.naive_timestamps("publish_year")?;
        let months = reader.naive_timestamps("publish_month")?;
        let days = reader.naive_timestamps("publish_day")?;
        let mut texts = reader.strings("extracted_text")?;
        let text_lengths = reader.u64s("text_length")?;
        let word_counts = reader.u64s("word_count")?;
        let reading_times = reader.f64s("reading_time_min")?;
        let has_descriptions = reader.bools("has_description")?;
        let processed_ats = reader.utc_timestamps("processed_at")?;

        Ok((0..reader.num_rows())
            .map(|i| Self {
                id: mem::take(&mut ids[i]),
                filename: mem::take(&mut filenames[i]),
                title: mem::take(&mut titles[i]),
                description: mem::take(&mut descriptions[i]),
                url: mem::take(&mut urls[i]),
                publish_date: publish_dates[i].take(),
                publish_ts: publish_tss[i],
                publish_year: years[i],
                publish_month: months[i],
                publish_day: days[i],
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
