// file: src/models/bronze.rs
// description: document record produced by the extraction stage
// reference: internal data structures

use crate::error::Result;
use crate::models::columnar::{
    BatchReader, ColumnarRecord, optional_string_array, stage_array, string_array,
    utc_timestamp_array, utc_timestamp_type,
};
use arrow_array::{RecordBatch, UInt64Array};
use arrow_schema::{DataType, Field, Schema, SchemaRef};
use chrono::{DateTime, Utc};
use std::mem;
use std::sync::Arc;

/// One parsed raw HTML document.
///
/// `text_length` and `word_count` are derived from `extracted_text` by
/// [`BronzeRecord::new`]; nothing rewrites the text afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct BronzeRecord {
    pub file_id: String,
    pub raw_filename: String,
    pub title: String,
    pub description: String,
    pub url: String,
    pub publish_date: Option<String>,
    pub extracted_text: String,
    pub text_length: u64,
    pub word_count: u64,
    pub processed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct PageMetadata {
    pub title: String,
    pub description: String,
    pub url: String,
    pub publish_date: Option<String>,
}

impl BronzeRecord {
    pub fn new(
        raw_filename: &str,
        metadata: PageMetadata,
        extracted_text: String,
        processed_at: DateTime<Utc>,
    ) -> Self {
        let file_id = raw_filename.replace(".html", "");
        let text_length = extracted_text.chars().count() as u64;
        let word_count = extracted_text.split_whitespace().count() as u64;

        Self {
            file_id,
            raw_filename: raw_filename.to_string(),
            title: metadata.title,
            description: metadata.description,
            url: metadata.url,
            publish_date: metadata.publish_date,
            extracted_text,
            text_length,
            word_count,
            processed_at,
        }
    }
}

impl ColumnarRecord for BronzeRecord {
    const STAGE: &'static str = "bronze";

    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("file_id", DataType::Utf8, false),
            Field::new("raw_filename", DataType::Utf8, false),
            Field::new("title", DataType::Utf8, false),
            Field::new("description", DataType::Utf8, false),
            Field::new("url", DataType::Utf8, false),
            Field::new("publish_date", DataType::Utf8, true),
            Field::new("extracted_text", DataType::Utf8, false),
            Field::new("text_length", DataType::UInt64, false),
            Field::new("word_count", DataType::UInt64, false),
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
                Arc::new(string_array(rows.iter().map(|r| r.extracted_text.as_str()))),
                Arc::new(UInt64Array::from(
                    rows.iter().map(|r| r.text_length).collect::<Vec<_>>(),
                )),
                Arc::new(UInt64Array::from(
                    rows.iter().map(|r| r.word_count).collect::<Vec<_>>(),
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
        let mut texts = reader.strings("extracted_text")?;
        let text_lengths = reader.u64s("text_length")?;
        let word_counts = reader.u64s("word_count")?;
        let processed_ats = reader.utc_timestamps("processed_at")?;

        Ok((0..reader.num_rows())
            .map(|i| Self {
                file_id: mem::take(&mut file_ids[i]),
                raw_filename: mem::take(&mut raw_filenames[i]),
                title: mem::take(&mut titles[i]),
                description: mem::take(&mut descriptions[i]),
                url: mem::take(&mut urls[i]),
                publish_date: publish_dates[i].take(),
                extracted_text: mem::take(&mut texts[i]),
                text_length: text_lengths[i],
                word_count: word_counts[i],
                processed_at: processed_ats[i],
            })
            .collect())
    }
}
