// file: src/stages/mod.rs
// description: medallion stage functions and their typed reports
// reference: internal module structure

pub mod bronze;
pub mod embed;
pub mod gold;
pub mod silver;

use crate::storage::ArtifactRef;
use clap::ValueEnum;
use std::fmt;

pub use bronze::{extract_document, extract_documents, run_bronze};
pub use embed::{embed_articles, run_embed};
pub use gold::{enrich, run_gold};
pub use silver::{normalize, parse_publish_ts, run_silver};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Stage {
    Bronze,
    Silver,
    Gold,
    Embed,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Bronze, Stage::Silver, Stage::Gold, Stage::Embed];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Bronze => "bronze",
            Stage::Silver => "silver",
            Stage::Gold => "gold",
            Stage::Embed => "embed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of one stage run. Exclusions are counts, not errors.
#[derive(Debug, Clone, PartialEq)]
pub struct StageReport {
    pub stage: Stage,
    pub input_rows: usize,
    pub output_rows: usize,
    /// Documents that could not be read or decoded (extraction only).
    pub skipped: usize,
    /// Rows removed by a validation predicate.
    pub filtered: usize,
    pub duplicates: usize,
    pub null_timestamps: usize,
    /// `None` when the stage had nothing to write.
    pub artifact: Option<ArtifactRef>,
}

impl StageReport {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            input_rows: 0,
            output_rows: 0,
            skipped: 0,
            filtered: 0,
            duplicates: 0,
            null_timestamps: 0,
            artifact: None,
        }
    }
}
