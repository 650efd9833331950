// file: src/config.rs
// description: application configuration management with toml support
// reference: https://docs.rs/config

use crate::error::{PipelineError, Result};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub storage: StorageConfig,
    pub index: IndexConfig,
    pub embedding: EmbeddingConfig,
    pub pipeline: PipelineConfig,
    pub ingest: IngestConfig,
}

/// Object store layout. Each bucket is a directory under `root`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    pub root: PathBuf,
    pub raw_bucket: String,
    pub bronze_bucket: String,
    pub silver_bucket: String,
    pub gold_bucket: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndexConfig {
    pub uri: String,
    pub collection: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    Hashing,
    Remote,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProviderKind,
    pub dimension: usize,
    pub model: String,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    #[serde(default = "default_embedding_batch")]
    pub batch_size: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    pub max_retries: u32,
    pub retry_delay_secs: u64,
    #[serde(default)]
    pub show_progress: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IngestConfig {
    pub fetch_timeout_secs: u64,
    pub user_agent: String,
}

fn default_top_k() -> usize {
    3
}

fn default_embedding_batch() -> usize {
    32
}

impl PipelineConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

impl IngestConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        } else {
            builder = builder.add_source(config::File::from(Path::new("config/default.toml")));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("NEWS_MEDALLION")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            storage: StorageConfig {
                root: PathBuf::from("./data/objects"),
                raw_bucket: "raw".to_string(),
                bronze_bucket: "bronze".to_string(),
                silver_bucket: "silver".to_string(),
                gold_bucket: "gold".to_string(),
            },
            index: IndexConfig {
                uri: "data/lancedb".to_string(),
                collection: "articles".to_string(),
                top_k: default_top_k(),
            },
            embedding: EmbeddingConfig {
                provider: EmbeddingProviderKind::Hashing,
                dimension: 384,
                model: "feature-hash".to_string(),
                endpoint: None,
                api_key: None,
                batch_size: default_embedding_batch(),
            },
            pipeline: PipelineConfig {
                max_retries: 1,
                retry_delay_secs: 300,
                show_progress: true,
            },
            ingest: IngestConfig {
                fetch_timeout_secs: 10,
                user_agent: "news_medallion/0.1".to_string(),
            },
        }
    }

    pub fn validate(&self) -> Result<()> {
        let buckets = [
            &self.storage.raw_bucket,
            &self.storage.bronze_bucket,
            &self.storage.silver_bucket,
            &self.storage.gold_bucket,
        ];
        if buckets.iter().any(|b| b.trim().is_empty()) {
            return Err(PipelineError::Config(
                "bucket names must not be empty".to_string(),
            ));
        }

        if self.index.collection.trim().is_empty() {
            return Err(PipelineError::Config(
                "index collection name must not be empty".to_string(),
            ));
        }

        if self.index.top_k == 0 {
            return Err(PipelineError::Config(
                "top_k must be greater than 0".to_string(),
            ));
        }

        if self.embedding.dimension == 0 {
            return Err(PipelineError::Config(
                "embedding dimension must be greater than 0".to_string(),
            ));
        }

        if self.embedding.batch_size == 0 {
            return Err(PipelineError::Config(
                "embedding batch_size must be greater than 0".to_string(),
            ));
        }

        if self.embedding.provider == EmbeddingProviderKind::Remote
            && self.embedding.endpoint.is_none()
        {
            return Err(PipelineError::Config(
                "remote embedding provider requires an endpoint".to_string(),
            ));
        }

        Ok(())
    }
}
