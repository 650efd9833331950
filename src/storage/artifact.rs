// file: src/storage/artifact.rs
// description: parquet encoding of stage records and whole-artifact read/write
// reference: https://docs.rs/parquet/latest/parquet/arrow/index.html

use crate::error::Result;
use crate::models::ColumnarRecord;
use crate::stages::Stage;
use crate::storage::object_store::ObjectStore;
use bytes::Bytes;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::fmt;
use tracing::{debug, info};

/// Location of one stage artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    pub bucket: String,
    pub object: String,
}

impl ArtifactRef {
    pub fn new(bucket: impl Into<String>, object: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            object: object.into(),
        }
    }

    /// `<bucket>/<stage>_articles.parquet`; the object name does not follow bucket renames.
    pub fn articles(stage: Stage, bucket: &str) -> Self {
        Self::new(bucket, format!("{}_articles.parquet", stage.name()))
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.object)
    }
}

pub fn encode<T: ColumnarRecord>(rows: &[T]) -> Result<Vec<u8>> {
    let batch = T::to_batch(rows)?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();

    let mut buffer = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buffer, batch.schema(), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(buffer)
}

pub fn decode<T: ColumnarRecord>(data: Vec<u8>) -> Result<Vec<T>> {
    let reader = ParquetRecordBatchReaderBuilder::try_new(Bytes::from(data))?.build()?;

    let mut rows = Vec::new();
    for batch in reader {
        rows.extend(T::from_batch(&batch?)?);
    }
    Ok(rows)
}

/// Encodes the whole batch first, then replaces the artifact in one put.
pub fn write_artifact<T: ColumnarRecord>(
    store: &dyn ObjectStore,
    artifact: &ArtifactRef,
    rows: &[T],
) -> Result<usize> {
    let data = encode(rows)?;
    store.put(&artifact.bucket, &artifact.object, &data)?;
    info!(
        "Saved {} ({} rows, {} bytes)",
        artifact,
        rows.len(),
        data.len()
    );
    Ok(data.len())
}

pub fn read_artifact<T: ColumnarRecord>(
    store: &dyn ObjectStore,
    artifact: &ArtifactRef,
) -> Result<Vec<T>> {
    let data = store.get(&artifact.bucket, &artifact.object)?;
    let rows = decode::<T>(data)?;
    debug!("Loaded {} ({} rows)", artifact, rows.len());
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BronzeRecord, GoldRecord, PageMetadata, SilverRecord};
    use crate::storage::MemoryObjectStore;
    use chrono::{NaiveDate, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn silver(file_id: &str, publish_ts: Option<chrono::NaiveDateTime>) -> SilverRecord {
        SilverRecord {
            file_id: file_id.to_string(),
            raw_filename: format!("{}.html", file_id),
            title: "Title".to_string(),
            description: String::new(),
            url: "https://example.com".to_string(),
            publish_date: publish_ts.map(|ts| ts.to_string()),
            publish_ts,
            extracted_text: "body ".repeat(30),
            text_length: 150,
            word_count: 30,
            reading_time_min: 0.15,
            has_description: false,
            processed_at: Utc.with_ymd_and_hms(2025, 7, 30, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_artifact_ref_naming() {
        let artifact = ArtifactRef::articles(Stage::Silver, "silver");
        assert_eq!(artifact.object, "silver_articles.parquet");
        assert_eq!(artifact.to_string(), "silver/silver_articles.parquet");

        let renamed = ArtifactRef::articles(Stage::Silver, "cleaned");
        assert_eq!(renamed.to_string(), "cleaned/silver_articles.parquet");
    }

    #[test]
    fn test_silver_round_trip_with_null_timestamps() {
        let ts = NaiveDate::from_ymd_opt(2025, 7, 29)
            .unwrap()
            .and_hms_micro_opt(14, 3, 9, 123_456)
            .unwrap();
        let rows = vec![silver("a", Some(ts)), silver("b", None)];

        let decoded: Vec<SilverRecord> = decode(encode(&rows).unwrap()).unwrap();
        assert_eq!(decoded, rows);
    }

    #[test]
    fn test_bronze_round_trip_through_store() {
        let store = MemoryObjectStore::new();
        let artifact = ArtifactRef::articles(Stage::Bronze, "bronze");
        let rows = vec![BronzeRecord::new(
            "20250730_story.html",
            PageMetadata {
                title: "Story".to_string(),
                publish_date: Some("not-a-date".to_string()),
                ..PageMetadata::default()
            },
            "Some extracted text".to_string(),
            Utc.with_ymd_and_hms(2025, 7, 30, 9, 0, 0).unwrap(),
        )];

        write_artifact(&store, &artifact, &rows).unwrap();
        let decoded: Vec<BronzeRecord> = read_artifact(&store, &artifact).unwrap();
        assert_eq!(decoded, rows);
    }

    #[test]
    fn test_empty_gold_round_trip() {
        let rows: Vec<GoldRecord> = Vec::new();
        let decoded: Vec<GoldRecord> = decode(encode(&rows).unwrap()).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let rows = vec![silver("a", None)];
        assert_eq!(encode(&rows).unwrap(), encode(&rows).unwrap());
    }
}
