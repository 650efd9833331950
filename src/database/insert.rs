// file: src/database/insert.rs
// description: LanceDB upsert of gold articles with their vector embeddings
// reference: https://docs.rs/lancedb

use crate::database::client::LanceDbClient;
use crate::database::schema::SchemaManager;
use crate::error::{PipelineError, Result};
use crate::models::GoldRecord;
use arrow_array::{FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray};
use arrow_schema::Schema;
use lance_arrow::FixedSizeListArrayExt;
use std::sync::Arc;
use tracing::info;

const MERGE_KEY: &str = "id";

pub struct IndexWriter<'a> {
    client: &'a LanceDbClient,
    dimension: usize,
}

impl<'a> IndexWriter<'a> {
    pub fn new(client: &'a LanceDbClient, dimension: usize) -> Self {
        Self { client, dimension }
    }

    /// Creates the collection on first use; afterwards rows matching an
    /// existing `id` are overwritten and new ids appended.
    pub async fn upsert(&self, articles: &[GoldRecord], embeddings: &[Vec<f32>]) -> Result<usize> {
        if articles.is_empty() {
            return Ok(0);
        }

        let schema = SchemaManager::articles_schema(self.dimension);
        let batch = self.create_record_batch(schema.clone(), articles, embeddings)?;
        let collection = self.client.collection();

        if !self.client.table_exists(collection).await? {
            self.client
                .get_connection()
                .create_table(
                    collection,
                    RecordBatchIterator::new(vec![Ok(batch)], schema),
                )
                .execute()
                .await
                .map_err(|e| PipelineError::Database(format!("Failed to create table: {}", e)))?;
            info!("Created new collection: {}", collection);
        } else {
            let table = self.client.get_table(collection).await?;
            let mut merge = table.merge_insert(&[MERGE_KEY]);
            merge
                .when_matched_update_all(None)
                .when_not_matched_insert_all();
            merge
                .execute(Box::new(RecordBatchIterator::new(vec![Ok(batch)], schema)))
                .await
                .map_err(|e| {
                    PipelineError::Database(format!("Failed to upsert articles: {}", e))
                })?;
        }

        info!("Indexed {} articles into '{}'", articles.len(), collection);
        Ok(articles.len())
    }

    fn create_record_batch(
        &self,
        schema: Arc<Schema>,
        articles: &[GoldRecord],
        embeddings: &[Vec<f32>],
    ) -> Result<RecordBatch> {
        if articles.len() != embeddings.len() {
            return Err(PipelineError::Embedding(format!(
                "{} articles but {} embeddings",
                articles.len(),
                embeddings.len()
            )));
        }
        if let Some(bad) = embeddings.iter().find(|e| e.len() != self.dimension) {
            return Err(PipelineError::Embedding(format!(
                "Embedding has dimension {}, index expects {}",
                bad.len(),
                self.dimension
            )));
        }

        let ids: StringArray = articles.iter().map(|a| Some(a.id.as_str())).collect();
        let titles: StringArray = articles.iter().map(|a| Some(a.title.as_str())).collect();
        let urls: StringArray = articles.iter().map(|a| Some(a.url.as_str())).collect();
        let documents: StringArray = articles
            .iter()
            .map(|a| Some(a.extracted_text.as_str()))
            .collect();

        let embedding_values: Float32Array = embeddings
            .iter()
            .flat_map(|emb| emb.iter().copied())
            .collect();

        let embedding_list =
            FixedSizeListArray::try_new_from_values(embedding_values, self.dimension as i32)
                .map_err(|e| {
                    PipelineError::Database(format!("Failed to create embedding array: {}", e))
                })?;

        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(ids),
                Arc::new(titles),
                Arc::new(urls),
                Arc::new(documents),
                Arc::new(embedding_list),
            ],
        )
        .map_err(|e| PipelineError::Database(format!("Failed to create record batch: {}", e)))
    }
}
