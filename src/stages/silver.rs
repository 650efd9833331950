// file: src/stages/silver.rs
// description: bronze records to validated, typed and de-duplicated silver records
// reference: internal normalization rules

use crate::error::Result;
use crate::models::{BronzeRecord, SilverRecord};
use crate::parser::collapse_whitespace;
use crate::stages::{Stage, StageReport};
use crate::storage::{ArtifactRef, ObjectStore, read_artifact, write_artifact};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use std::collections::HashSet;
use tracing::{debug, info};

/// Rows whose text is this many characters or fewer are excluded.
pub const MIN_TEXT_CHARS: usize = 100;

const WORDS_PER_MINUTE: f64 = 200.0;

const ZONED_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeStats {
    pub filtered: usize,
    pub duplicates: usize,
    pub null_timestamps: usize,
}

/// Lenient publish date parsing. Zoned values are converted to UTC and the
/// zone dropped; anything unrecognized yields `None`.
pub fn parse_publish_ts(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.naive_utc());
    }

    for format in ZONED_FORMATS {
        if let Ok(ts) = DateTime::parse_from_str(value, format) {
            return Some(ts.naive_utc());
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(value, format) {
            return Some(ts);
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN))
}

pub fn reading_time_min(word_count: u64) -> f64 {
    (word_count as f64 / WORDS_PER_MINUTE * 100.0).round() / 100.0
}

/// Full-row identity used for de-duplication.
#[derive(PartialEq, Eq, Hash)]
struct RowKey<'a> {
    file_id: &'a str,
    raw_filename: &'a str,
    title: &'a str,
    description: &'a str,
    url: &'a str,
    publish_date: Option<&'a str>,
    publish_ts: Option<NaiveDateTime>,
    extracted_text: &'a str,
    text_length: u64,
    word_count: u64,
    reading_time_bits: u64,
    has_description: bool,
    processed_at: DateTime<Utc>,
}

impl<'a> From<&'a SilverRecord> for RowKey<'a> {
    fn from(row: &'a SilverRecord) -> Self {
        Self {
            file_id: &row.file_id,
            raw_filename: &row.raw_filename,
            title: &row.title,
            description: &row.description,
            url: &row.url,
            publish_date: row.publish_date.as_deref(),
            publish_ts: row.publish_ts,
            extracted_text: &row.extracted_text,
            text_length: row.text_length,
            word_count: row.word_count,
            reading_time_bits: row.reading_time_min.to_bits(),
            has_description: row.has_description,
            processed_at: row.processed_at,
        }
    }
}

fn to_silver(row: BronzeRecord) -> Option<SilverRecord> {
    let title = collapse_whitespace(&row.title);
    if title.is_empty() || row.extracted_text.chars().count() <= MIN_TEXT_CHARS {
        return None;
    }

    let description = collapse_whitespace(&row.description);
    let publish_ts = row.publish_date.as_deref().and_then(parse_publish_ts);

    Some(SilverRecord {
        file_id: row.file_id,
        raw_filename: row.raw_filename,
        has_description: !description.is_empty(),
        title,
        description,
        url: row.url,
        publish_date: row.publish_date,
        publish_ts,
        extracted_text: row.extracted_text,
        text_length: row.text_length,
        word_count: row.word_count,
        reading_time_min: reading_time_min(row.word_count),
        processed_at: row.processed_at,
    })
}

/// Filters, cleans and types bronze rows, then drops exact duplicates
/// keeping the first occurrence.
pub fn normalize(rows: Vec<BronzeRecord>) -> (Vec<SilverRecord>, NormalizeStats) {
    let input = rows.len();
    let candidates: Vec<SilverRecord> = rows.into_iter().filter_map(to_silver).collect();

    let mut stats = NormalizeStats {
        filtered: input - candidates.len(),
        ..NormalizeStats::default()
    };

    let keep: Vec<bool> = {
        let mut seen = HashSet::with_capacity(candidates.len());
        candidates
            .iter()
            .map(|row| seen.insert(RowKey::from(row)))
            .collect()
    };

    let unique: Vec<SilverRecord> = candidates
        .into_iter()
        .zip(keep)
        .filter_map(|(row, keep)| keep.then_some(row))
        .collect();

    stats.duplicates = input - stats.filtered - unique.len();
    stats.null_timestamps = unique.iter().filter(|r| r.publish_ts.is_none()).count();

    (unique, stats)
}

pub fn run_silver(
    store: &dyn ObjectStore,
    input: &ArtifactRef,
    output: &ArtifactRef,
) -> Result<StageReport> {
    info!("Starting silver transformation");

    let bronze: Vec<BronzeRecord> = read_artifact(store, input)?;
    info!("Loaded {} records from bronze layer", bronze.len());

    let mut report = StageReport::new(Stage::Silver);
    report.input_rows = bronze.len();

    let (silver, stats) = normalize(bronze);
    debug!(
        "Excluded {} rows by validation, {} duplicates",
        stats.filtered, stats.duplicates
    );

    write_artifact(store, output, &silver)?;

    report.output_rows = silver.len();
    report.filtered = stats.filtered;
    report.duplicates = stats.duplicates;
    report.null_timestamps = stats.null_timestamps;
    report.artifact = Some(output.clone());

    info!(
        "Silver transformation completed: {} records ({} without publish timestamp)",
        silver.len(),
        stats.null_timestamps
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PageMetadata;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn bronze(name: &str, title: &str, text: &str, publish_date: Option<&str>) -> BronzeRecord {
        BronzeRecord::new(
            name,
            PageMetadata {
                title: title.to_string(),
                description: "  A   short\n summary ".to_string(),
                url: "https://example.com/story".to_string(),
                publish_date: publish_date.map(str::to_string),
            },
            text.to_string(),
            Utc.with_ymd_and_hms(2025, 7, 30, 6, 0, 0).unwrap(),
        )
    }

    fn long_text() -> String {
        vec!["lorem"; 40].join(" ")
    }

    #[test]
    fn test_parse_publish_ts_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 7, 30)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();

        assert_eq!(parse_publish_ts("2025-07-30T10:00:00Z"), Some(expected));
        assert_eq!(parse_publish_ts("2025-07-30T12:00:00+02:00"), Some(expected));
        assert_eq!(parse_publish_ts("2025-07-30 10:00:00"), Some(expected));
        assert_eq!(parse_publish_ts("2025-07-30T10:00:00.000"), Some(expected));
        assert_eq!(parse_publish_ts("2025-07-30T10:00"), Some(expected));
        assert_eq!(
            parse_publish_ts("2025-07-30"),
            Some(expected.date().and_time(NaiveTime::MIN))
        );
        assert_eq!(parse_publish_ts("not-a-date"), None);
        assert_eq!(parse_publish_ts(""), None);
    }

    #[test]
    fn test_reading_time_rounding() {
        assert_eq!(reading_time_min(150), 0.75);
        assert_eq!(reading_time_min(0), 0.0);
        assert_eq!(reading_time_min(250), 1.25);
        assert_eq!(reading_time_min(20), 0.1);
    }

    #[test]
    fn test_normalize_cleans_and_types() {
        let (rows, stats) = normalize(vec![bronze(
            "a.html",
            "  Big \n  news ",
            &long_text(),
            Some("2025-07-30T10:00:00Z"),
        )]);

        assert_eq!(stats, NormalizeStats::default());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "Big news");
        assert_eq!(rows[0].description, "A short summary");
        assert!(rows[0].has_description);
        assert!(rows[0].publish_ts.is_some());
        assert_eq!(rows[0].reading_time_min, 0.2);
    }

    #[test]
    fn test_validation_boundaries() {
        let exactly_100 = "x".repeat(100);
        let just_over = "x".repeat(101);

        let (rows, stats) = normalize(vec![
            bronze("short.html", "Title", &exactly_100, None),
            bronze("long.html", "Title", &just_over, None),
            bronze("untitled.html", "   ", &just_over, None),
        ]);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].file_id, "long");
        assert_eq!(stats.filtered, 2);
    }

    #[test]
    fn test_exact_duplicates_collapse() {
        let row = bronze("dup.html", "Title", &long_text(), None);
        let (rows, stats) = normalize(vec![row.clone(), row]);

        assert_eq!(rows.len(), 1);
        assert_eq!(stats.duplicates, 1);
        assert_eq!(stats.null_timestamps, 1);
    }

    #[test]
    fn test_rows_differing_only_by_file_id_are_kept() {
        let (rows, stats) = normalize(vec![
            bronze("one.html", "Title", &long_text(), None),
            bronze("two.html", "Title", &long_text(), None),
        ]);

        assert_eq!(rows.len(), 2);
        assert_eq!(stats.duplicates, 0);
    }

    #[test]
    fn test_unparseable_date_survives_as_null() {
        let (rows, _) = normalize(vec![bronze(
            "a.html",
            "Title",
            &long_text(),
            Some("not-a-date"),
        )]);

        assert_eq!(rows[0].publish_date.as_deref(), Some("not-a-date"));
        assert_eq!(rows[0].publish_ts, None);
    }
}
