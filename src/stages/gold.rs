// file: src/stages/gold.rs
// description: silver records to time-partitioned, newest-first gold records
// reference: internal enrichment rules

use crate::error::Result;
use crate::models::{GoldRecord, SilverRecord};
use crate::stages::{Stage, StageReport};
use crate::storage::{ArtifactRef, ObjectStore, read_artifact, write_artifact};
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use tracing::info;

fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

fn to_gold(row: SilverRecord) -> Option<GoldRecord> {
    let publish_ts = row.publish_ts?;
    let date = publish_ts.date();

    Some(GoldRecord {
        id: row.file_id,
        filename: row.raw_filename.trim().to_string(),
        title: row.title,
        description: row.description,
        url: row.url,
        publish_date: row.publish_date,
        publish_ts,
        publish_year: start_of_day(date.with_ordinal(1).unwrap_or(date)),
        publish_month: start_of_day(date.with_day(1).unwrap_or(date)),
        publish_day: start_of_day(date),
        extracted_text: row.extracted_text.trim().to_string(),
        text_length: row.text_length,
        word_count: row.word_count,
        reading_time_min: row.reading_time_min,
        has_description: row.has_description,
        processed_at: row.processed_at,
    })
}

/// Drops rows without a publish timestamp and orders the rest newest first.
/// Rows with equal timestamps keep their silver order.
pub fn enrich(rows: Vec<SilverRecord>) -> Vec<GoldRecord> {
    let mut gold: Vec<GoldRecord> = rows.into_iter().filter_map(to_gold).collect();
    gold.sort_by(|a, b| b.publish_ts.cmp(&a.publish_ts));
    gold
}

pub fn run_gold(
    store: &dyn ObjectStore,
    input: &ArtifactRef,
    output: &ArtifactRef,
) -> Result<StageReport> {
    info!("Starting gold transformation");

    let silver: Vec<SilverRecord> = read_artifact(store, input)?;
    info!("Loaded {} records from silver layer", silver.len());

    let mut report = StageReport::new(Stage::Gold);
    report.input_rows = silver.len();

    let gold = enrich(silver);
    report.null_timestamps = report.input_rows - gold.len();
    report.filtered = report.null_timestamps;

    write_artifact(store, output, &gold)?;
    report.output_rows = gold.len();
    report.artifact = Some(output.clone());

    info!(
        "Gold transformation completed: {} records ({} dropped without timestamp)",
        gold.len(),
        report.null_timestamps
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn silver(file_id: &str, publish_ts: Option<NaiveDateTime>) -> SilverRecord {
        SilverRecord {
            file_id: file_id.to_string(),
            raw_filename: format!(" {}.html ", file_id),
            title: "Title".to_string(),
            description: String::new(),
            url: String::new(),
            publish_date: publish_ts.map(|ts| ts.to_string()),
            publish_ts,
            extracted_text: "  body text  ".to_string(),
            text_length: 13,
            word_count: 2,
            reading_time_min: 0.01,
            has_description: false,
            processed_at: Utc.with_ymd_and_hms(2025, 7, 30, 6, 0, 0).unwrap(),
        }
    }

    fn ts(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 30, 15)
            .unwrap()
    }

    #[test]
    fn test_calendar_truncation() {
        let gold = enrich(vec![silver("a", Some(ts(2025, 7, 30, 10)))]);

        assert_eq!(gold.len(), 1);
        assert_eq!(gold[0].id, "a");
        assert_eq!(gold[0].filename, "a.html");
        assert_eq!(gold[0].extracted_text, "body text");
        assert_eq!(gold[0].publish_year, start_of_day(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()));
        assert_eq!(gold[0].publish_month, start_of_day(NaiveDate::from_ymd_opt(2025, 7, 1).unwrap()));
        assert_eq!(gold[0].publish_day, start_of_day(NaiveDate::from_ymd_opt(2025, 7, 30).unwrap()));
    }

    #[test]
    fn test_null_timestamps_dropped_and_sorted_desc() {
        let gold = enrich(vec![
            silver("old", Some(ts(2024, 1, 5, 8))),
            silver("undated", None),
            silver("new", Some(ts(2025, 3, 1, 9))),
            silver("tie", Some(ts(2024, 1, 5, 8))),
        ]);

        let ids: Vec<&str> = gold.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old", "tie"]);
    }

    #[test]
    fn test_empty_input_gives_empty_output() {
        assert!(enrich(Vec::new()).is_empty());
    }
}
