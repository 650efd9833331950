// file: src/pipeline/mod.rs
// description: pipeline module exports and public api
// reference: pipeline orchestration

mod driver;
mod progress;

pub use driver::{ArtifactLayout, PipelineRunner, RetryPolicy};
pub use progress::{PipelineStats, ProgressStats, ProgressTracker};
