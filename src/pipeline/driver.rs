// file: src/pipeline/driver.rs
// description: sequential stage driver with retry policy and run lock
// reference: bronze -> silver -> gold -> embed, each stage retried on failure

use crate::config::{Config, PipelineConfig};
use crate::database::{EmbeddingModel, LanceDbClient};
use crate::error::{PipelineError, Result};
use crate::pipeline::progress::{PipelineStats, ProgressTracker};
use crate::stages::{self, Stage, StageReport};
use crate::storage::{ArtifactRef, ObjectStore, RunLock};
use chrono::Utc;
use std::future::Future;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.max_retries, config.retry_delay())
    }

    /// Runs `op` until it succeeds or `max_retries` extra attempts are spent.
    pub async fn run<T, F, Fut>(&self, stage: Stage, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempts <= self.max_retries => {
                    warn!(
                        "Stage {} failed (attempt {}): {}; retrying in {:?}",
                        stage, attempts, e, self.delay
                    );
                    tokio::time::sleep(self.delay).await;
                }
                Err(e) => {
                    return Err(PipelineError::StageFailed {
                        stage: stage.name(),
                        attempts,
                        source: Box::new(e),
                    });
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(1, Duration::from_secs(300))
    }
}

/// Artifact handles for every stage boundary.
#[derive(Debug, Clone)]
pub struct ArtifactLayout {
    pub raw_bucket: String,
    pub bronze: ArtifactRef,
    pub silver: ArtifactRef,
    pub gold: ArtifactRef,
}

impl ArtifactLayout {
    pub fn from_config(config: &Config) -> Self {
        Self {
            raw_bucket: config.storage.raw_bucket.clone(),
            bronze: ArtifactRef::articles(Stage::Bronze, &config.storage.bronze_bucket),
            silver: ArtifactRef::articles(Stage::Silver, &config.storage.silver_bucket),
            gold: ArtifactRef::articles(Stage::Gold, &config.storage.gold_bucket),
        }
    }
}

pub struct PipelineRunner<'a> {
    store: &'a dyn ObjectStore,
    index: &'a LanceDbClient,
    model: &'a EmbeddingModel,
    layout: ArtifactLayout,
    retry: RetryPolicy,
    batch_size: usize,
    show_progress: bool,
    color: bool,
    lock_root: PathBuf,
}

impl<'a> PipelineRunner<'a> {
    pub fn new(
        config: &Config,
        store: &'a dyn ObjectStore,
        index: &'a LanceDbClient,
        model: &'a EmbeddingModel,
    ) -> Self {
        Self {
            store,
            index,
            model,
            layout: ArtifactLayout::from_config(config),
            retry: RetryPolicy::from_config(&config.pipeline),
            batch_size: config.embedding.batch_size,
            show_progress: config.pipeline.show_progress,
            color: true,
            lock_root: config.storage.root.clone(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    fn acquire_lock(&self) -> Result<RunLock> {
        RunLock::acquire(&self.lock_root)
    }

    fn progress(&self) -> ProgressTracker {
        if self.show_progress {
            ProgressTracker::with_color(0, self.color)
        } else {
            ProgressTracker::hidden()
        }
    }

    async fn execute(&self, stage: Stage) -> Result<StageReport> {
        match stage {
            Stage::Bronze => {
                let progress = self.progress();
                stages::run_bronze(
                    self.store,
                    &self.layout.raw_bucket,
                    &self.layout.bronze,
                    Utc::now(),
                    &progress,
                )
            }
            Stage::Silver => {
                stages::run_silver(self.store, &self.layout.bronze, &self.layout.silver)
            }
            Stage::Gold => stages::run_gold(self.store, &self.layout.silver, &self.layout.gold),
            Stage::Embed => {
                let progress = self.progress();
                stages::run_embed(
                    self.store,
                    &self.layout.gold,
                    self.index,
                    self.model,
                    self.batch_size,
                    &progress,
                )
                .await
            }
        }
    }

    /// Runs one stage under the run lock and retry policy.
    pub async fn run_stage(&self, stage: Stage) -> Result<StageReport> {
        let _lock = self.acquire_lock()?;
        self.retry.run(stage, || self.execute(stage)).await
    }

    /// Runs every stage in order. Stops after extraction when it produced
    /// no records, since downstream stages would only reprocess old artifacts.
    pub async fn run_all(&self) -> Result<PipelineStats> {
        let lock = self.acquire_lock()?;
        info!("Pipeline run {} started", lock.run_id());

        let start = Instant::now();
        let mut stats = PipelineStats::new();

        for stage in Stage::ALL {
            let report = self.retry.run(stage, || self.execute(stage)).await?;
            let empty_extraction = stage == Stage::Bronze && report.output_rows == 0;
            stats.record(report);

            if empty_extraction {
                warn!("Extraction produced no records; skipping remaining stages");
                break;
            }
        }

        stats.duration_secs = start.elapsed().as_secs();
        info!(
            "Pipeline run completed in {}s: {} articles indexed",
            stats.duration_secs, stats.articles_indexed
        );
        Ok(stats)
    }
}
