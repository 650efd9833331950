// file: src/stages/bronze.rs
// description: raw html documents to bronze document records
// reference: parses each raw object, skips undecodable documents, replaces the bronze artifact

use crate::error::Result;
use crate::models::BronzeRecord;
use crate::parser::{HtmlError, HtmlExtractor};
use crate::pipeline::ProgressTracker;
use crate::stages::{Stage, StageReport};
use crate::storage::{ArtifactRef, ObjectStore, write_artifact};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

const RAW_EXTENSION: &str = ".html";

pub fn extract_document(
    extractor: &HtmlExtractor,
    object_name: &str,
    bytes: &[u8],
    processed_at: DateTime<Utc>,
) -> std::result::Result<BronzeRecord, HtmlError> {
    let page = extractor.parse_bytes(bytes)?;
    Ok(BronzeRecord::new(
        object_name,
        page.metadata,
        page.text,
        processed_at,
    ))
}

/// Reads every `.html` object in the raw bucket. Listing failures abort;
/// a single unreadable or undecodable document is logged and counted.
pub fn extract_documents(
    store: &dyn ObjectStore,
    raw_bucket: &str,
    processed_at: DateTime<Utc>,
    progress: &ProgressTracker,
) -> Result<(Vec<BronzeRecord>, usize)> {
    let extractor = HtmlExtractor::new();
    let names: Vec<String> = store
        .list(raw_bucket)?
        .into_iter()
        .filter(|name| name.ends_with(RAW_EXTENSION))
        .collect();

    progress.set_length(names.len() as u64);
    info!("Found {} raw documents in bucket '{}'", names.len(), raw_bucket);

    let mut records = Vec::with_capacity(names.len());
    let mut skipped = 0;

    for name in &names {
        debug!("Processing: {}", name);

        let bytes = match store.get(raw_bucket, name) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Error reading {}: {}", name, e);
                skipped += 1;
                progress.inc_failed();
                continue;
            }
        };

        match extract_document(&extractor, name, &bytes, processed_at) {
            Ok(record) => {
                records.push(record);
                progress.inc_processed();
            }
            Err(e) => {
                warn!("Error processing {}: {}", name, e);
                skipped += 1;
                progress.inc_failed();
            }
        }
    }

    Ok((records, skipped))
}

pub fn run_bronze(
    store: &dyn ObjectStore,
    raw_bucket: &str,
    output: &ArtifactRef,
    processed_at: DateTime<Utc>,
    progress: &ProgressTracker,
) -> Result<StageReport> {
    info!("Starting bronze transformation");

    let (records, skipped) = extract_documents(store, raw_bucket, processed_at, progress)?;
    progress.finish();

    let mut report = StageReport::new(Stage::Bronze);
    report.input_rows = records.len() + skipped;
    report.output_rows = records.len();
    report.skipped = skipped;

    if records.is_empty() {
        info!("No records to process");
        return Ok(report);
    }

    write_artifact(store, output, &records)?;
    report.artifact = Some(output.clone());

    let avg_words =
        records.iter().map(|r| r.word_count).sum::<u64>() as f64 / records.len() as f64;
    info!(
        "Bronze transformation completed: {} records, avg {:.0} words per article, {} skipped",
        records.len(),
        avg_words,
        skipped
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ColumnarRecord;
    use crate::storage::{MemoryObjectStore, read_artifact};
    use chrono::TimeZone;

    fn processed_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 30, 6, 0, 0).unwrap()
    }

    #[test]
    fn test_single_document_scenario() {
        let body = vec!["word"; 150].join(" ");
        let html = format!("<html><head><title>A</title></head><body><p>{}</p></body></html>", body);

        let record = extract_document(
            &HtmlExtractor::new(),
            "20250730060000_A.html",
            html.as_bytes(),
            processed_at(),
        )
        .unwrap();

        assert_eq!(record.title, "A");
        assert_eq!(record.description, "");
        assert_eq!(record.file_id, "20250730060000_A");
        assert_eq!(record.word_count, 150);
    }

    #[test]
    fn test_undecodable_document_is_skipped() {
        let store = MemoryObjectStore::new();
        store.put("raw", "good.html", b"<html><title>Good</title><p>fine</p></html>").unwrap();
        store.put("raw", "bad.html", &[0xff, 0xfe, 0xfd]).unwrap();
        store.put("raw", "notes.txt", b"not html").unwrap();

        let output = ArtifactRef::articles(Stage::Bronze, "bronze");
        let report = run_bronze(
            &store,
            "raw",
            &output,
            processed_at(),
            &ProgressTracker::hidden(),
        )
        .unwrap();

        assert_eq!(report.output_rows, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.input_rows, 2);

        let rows: Vec<BronzeRecord> = read_artifact(&store, &output).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].raw_filename, "good.html");
        assert_eq!(BronzeRecord::STAGE, "bronze");
    }

    #[test]
    fn test_empty_raw_bucket_writes_nothing() {
        let store = MemoryObjectStore::new();
        let output = ArtifactRef::articles(Stage::Bronze, "bronze");

        let report = run_bronze(
            &store,
            "raw",
            &output,
            processed_at(),
            &ProgressTracker::hidden(),
        )
        .unwrap();

        assert_eq!(report.output_rows, 0);
        assert!(report.artifact.is_none());
        assert!(!store.exists("bronze", "bronze_articles.parquet").unwrap());
    }
}
