// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
//! Medallion ETL for news articles: raw html is extracted into bronze,
//! normalized into silver, enriched into gold and embedded into a LanceDB
//! similarity index.

pub mod config;
pub mod database;
pub mod error;
pub mod ingest;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod stages;
pub mod storage;
pub mod utils;

pub use config::{
    Config, EmbeddingConfig, EmbeddingProviderKind, IndexConfig, IngestConfig, PipelineConfig,
    StorageConfig,
};
pub use database::{EmbeddingModel, HashingEmbedder, IndexWriter, LanceDbClient, SchemaManager};
pub use error::{PipelineError, Result};
pub use ingest::{Fetcher, import_directory};
pub use models::{BronzeRecord, ColumnarRecord, GoldRecord, PageMetadata, SearchResult, SilverRecord};
pub use parser::{HtmlExtractor, MetadataRules};
pub use pipeline::{ArtifactLayout, PipelineRunner, PipelineStats, ProgressTracker, RetryPolicy};
pub use stages::{Stage, StageReport};
pub use storage::{ArtifactRef, LocalObjectStore, MemoryObjectStore, ObjectStore, RunLock};
pub use utils::Validator;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let config = Config::default_config();
        let layout = ArtifactLayout::from_config(&config);
        assert_eq!(layout.gold, ArtifactRef::articles(Stage::Gold, "gold"));
        assert_eq!(Stage::ALL.len(), 4);
    }
}
