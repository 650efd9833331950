// file: src/pipeline/progress.rs
// description: progress tracking and statistics reporting for pipeline runs
// reference: uses indicatif for progress bars and tracks processing metrics

use crate::stages::StageReport;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

/// Totals across the stages of one run.
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    pub reports: Vec<StageReport>,
    pub documents_skipped: usize,
    pub articles_indexed: usize,
    pub duration_secs: u64,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, report: StageReport) {
        match report.stage {
            crate::stages::Stage::Bronze => self.documents_skipped += report.skipped,
            crate::stages::Stage::Embed => self.articles_indexed += report.output_rows,
            _ => {}
        }
        self.reports.push(report);
    }

    pub fn articles_per_second(&self) -> f64 {
        if self.duration_secs == 0 {
            return 0.0;
        }
        self.articles_indexed as f64 / self.duration_secs as f64
    }

    /// Share of raw documents that survived all the way to the index.
    pub fn yield_rate(&self) -> f64 {
        let raw = self
            .reports
            .first()
            .map(|r| r.input_rows)
            .unwrap_or_default();
        if raw == 0 {
            return 0.0;
        }
        (self.articles_indexed as f64 / raw as f64) * 100.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressStats {
    pub processed: usize,
    pub failed: usize,
    pub duration_secs: u64,
}

pub struct ProgressTracker {
    main_bar: ProgressBar,
    detail_bar: ProgressBar,
    processed: Arc<AtomicUsize>,
    failed: Arc<AtomicUsize>,
    start_time: Instant,
}

impl ProgressTracker {
    pub fn new(total: usize) -> Self {
        Self::with_color(total, true)
    }

    pub fn with_color(total: usize, colored: bool) -> Self {
        let multi_progress = MultiProgress::new();

        let main_bar = create_progress_bar(&multi_progress, total as u64, colored);
        let detail_bar = create_detail_bar(&multi_progress);

        Self::from_bars(main_bar, detail_bar)
    }

    /// Counts without drawing anything.
    pub fn hidden() -> Self {
        Self::from_bars(ProgressBar::hidden(), ProgressBar::hidden())
    }

    fn from_bars(main_bar: ProgressBar, detail_bar: ProgressBar) -> Self {
        Self {
            main_bar,
            detail_bar,
            processed: Arc::new(AtomicUsize::new(0)),
            failed: Arc::new(AtomicUsize::new(0)),
            start_time: Instant::now(),
        }
    }

    pub fn set_length(&self, total: u64) {
        self.main_bar.set_length(total);
    }

    pub fn inc_processed(&self) {
        self.processed.fetch_add(1, Ordering::SeqCst);
        self.main_bar.inc(1);
        self.update_detail_bar();
    }

    pub fn inc_processed_by(&self, count: usize) {
        self.processed.fetch_add(count, Ordering::SeqCst);
        self.main_bar.inc(count as u64);
        self.update_detail_bar();
    }

    pub fn inc_failed(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
        self.main_bar.inc(1);
        self.update_detail_bar();
    }

    pub fn finish(&self) {
        if !self.main_bar.is_finished() {
            self.main_bar.finish_with_message("done");
        }
        self.detail_bar.finish_and_clear();
    }

    pub fn get_stats(&self) -> ProgressStats {
        ProgressStats {
            processed: self.processed.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
            duration_secs: self.start_time.elapsed().as_secs(),
        }
    }

    fn update_detail_bar(&self) {
        let processed = self.processed.load(Ordering::SeqCst);
        let failed = self.failed.load(Ordering::SeqCst);

        self.detail_bar
            .set_message(format!("Processed: {} | Skipped: {}", processed, failed));
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        self.finish();
    }
}

fn create_progress_bar(multi_progress: &MultiProgress, total: u64, colored: bool) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(total));
    if colored {
        bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
                )
                .expect("Failed to create progress bar template")
                .progress_chars("█▓▒░"),
        );
    } else {
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({eta}) {msg}")
                .expect("Failed to create progress bar template")
                .progress_chars("=>-"),
        );
    }
    bar
}

fn create_detail_bar(multi_progress: &MultiProgress) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(0));
    let style = ProgressStyle::default_bar()
        .template("{msg}")
        .expect("Failed to create detail bar template");
    bar.set_style(style);
    bar
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::Stage;

    #[test]
    fn test_pipeline_stats_calculations() {
        let mut stats = PipelineStats::new();

        let mut bronze = StageReport::new(Stage::Bronze);
        bronze.input_rows = 10;
        bronze.skipped = 2;
        stats.record(bronze);

        let mut embed = StageReport::new(Stage::Embed);
        embed.output_rows = 5;
        stats.record(embed);

        stats.duration_secs = 5;

        assert_eq!(stats.documents_skipped, 2);
        assert_eq!(stats.articles_per_second(), 1.0);
        assert_eq!(stats.yield_rate(), 50.0);
    }

    #[test]
    fn test_pipeline_stats_zero_duration() {
        let stats = PipelineStats::new();
        assert_eq!(stats.articles_per_second(), 0.0);
        assert_eq!(stats.yield_rate(), 0.0);
    }

    #[test]
    fn test_progress_tracker_counts() {
        let tracker = ProgressTracker::hidden();
        tracker.set_length(4);

        tracker.inc_processed();
        tracker.inc_processed_by(2);
        tracker.inc_failed();

        let stats = tracker.get_stats();
        assert_eq!(stats.processed, 3);
        assert_eq!(stats.failed, 1);
    }
}
