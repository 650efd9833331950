// file: src/stages/embed.rs
// description: gold articles to vectors in the similarity index
// reference: batches texts through the embedding model, then upserts by id

use crate::database::{EmbeddingModel, IndexWriter, LanceDbClient};
use crate::error::Result;
use crate::models::GoldRecord;
use crate::pipeline::ProgressTracker;
use crate::stages::{Stage, StageReport};
use crate::storage::{ArtifactRef, ObjectStore, read_artifact};
use tracing::{debug, info};

/// One vector per article, in article order.
pub async fn embed_articles(
    model: &EmbeddingModel,
    articles: &[GoldRecord],
    batch_size: usize,
    progress: &ProgressTracker,
) -> Result<Vec<Vec<f32>>> {
    let texts: Vec<String> = articles.iter().map(|a| a.extracted_text.clone()).collect();
    let mut embeddings = Vec::with_capacity(texts.len());

    for chunk in texts.chunks(batch_size.max(1)) {
        debug!("Embedding batch of {} articles", chunk.len());
        embeddings.extend(model.embed_batch(chunk).await?);
        progress.inc_processed_by(chunk.len());
    }

    Ok(embeddings)
}

pub async fn run_embed(
    store: &dyn ObjectStore,
    input: &ArtifactRef,
    client: &LanceDbClient,
    model: &EmbeddingModel,
    batch_size: usize,
    progress: &ProgressTracker,
) -> Result<StageReport> {
    info!("Starting embedding stage");

    let articles: Vec<GoldRecord> = read_artifact(store, input)?;
    info!("Loaded {} records from gold layer", articles.len());

    let mut report = StageReport::new(Stage::Embed);
    report.input_rows = articles.len();

    if articles.is_empty() {
        info!("No articles to index");
        return Ok(report);
    }

    progress.set_length(articles.len() as u64);
    let embeddings = embed_articles(model, &articles, batch_size, progress).await?;
    progress.finish();

    let writer = IndexWriter::new(client, model.dimension());
    report.output_rows = writer.upsert(&articles, &embeddings).await?;

    info!(
        "Embedding stage completed: {} articles in '{}' ({} total, {}s)",
        report.output_rows,
        client.collection(),
        client.get_document_count().await?,
        progress.get_stats().duration_secs
    );

    Ok(report)
}
