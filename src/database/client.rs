// file: src/database/client.rs
// description: LanceDB client wrapper with connection management
// reference: https://docs.rs/lancedb

use crate::config::IndexConfig;
use crate::error::{PipelineError, Result};
use crate::models::SearchResult;
use arrow_array::{Array, Float32Array, RecordBatch, StringArray};
use futures::StreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, Table, connect};
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct LanceDbClient {
    connection: Connection,
    config: IndexConfig,
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .ok_or_else(|| PipelineError::Database(format!("Missing '{}' column", name)))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| PipelineError::Database(format!("Invalid '{}' column type", name)))
}

impl LanceDbClient {
    pub async fn new(config: IndexConfig) -> Result<Self> {
        info!("Connecting to LanceDB at {}", config.uri);

        let connection = connect(&config.uri)
            .execute()
            .await
            .map_err(|e| PipelineError::Database(format!("Failed to connect to LanceDB: {}", e)))?;

        Ok(Self { connection, config })
    }

    pub fn get_connection(&self) -> &Connection {
        &self.connection
    }

    pub fn collection(&self) -> &str {
        &self.config.collection
    }

    pub fn top_k(&self) -> usize {
        self.config.top_k
    }

    pub async fn ping(&self) -> Result<bool> {
        debug!("Checking LanceDB connection");

        // listing tables is the cheapest round trip
        match self.connection.table_names().execute().await {
            Ok(_) => {
                info!("LanceDB connection successful");
                Ok(true)
            }
            Err(e) => Err(PipelineError::Database(format!(
                "LanceDB connection failed: {}",
                e
            ))),
        }
    }

    pub async fn table_exists(&self, table_name: &str) -> Result<bool> {
        let table_names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| PipelineError::Database(format!("Failed to list tables: {}", e)))?;

        Ok(table_names.iter().any(|name| name == table_name))
    }

    pub async fn get_table(&self, table_name: &str) -> Result<Table> {
        self.connection
            .open_table(table_name)
            .execute()
            .await
            .map_err(|e| {
                PipelineError::Database(format!("Failed to open table {}: {}", table_name, e))
            })
    }

    pub async fn get_document_count(&self) -> Result<u64> {
        if !self.table_exists(self.collection()).await? {
            return Ok(0);
        }

        let table = self.get_table(self.collection()).await?;
        let count = table
            .count_rows(None)
            .await
            .map_err(|e| PipelineError::Database(format!("Failed to count rows: {}", e)))?;

        Ok(count as u64)
    }

    /// Nearest articles to `query_embedding`, closest first.
    pub async fn vector_search(
        &self,
        query_embedding: Vec<f32>,
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        if !self.table_exists(self.collection()).await? {
            warn!("Collection does not exist, returning empty results");
            return Ok(Vec::new());
        }

        let table = self.get_table(self.collection()).await?;

        info!("Performing vector search with limit {}", limit);

        let mut results_stream = table
            .vector_search(query_embedding)
            .map_err(|e| PipelineError::Database(format!("Failed to create vector search: {}", e)))?
            .column("embedding")
            .limit(limit)
            .execute()
            .await
            .map_err(|e| PipelineError::Database(format!("Vector search failed: {}", e)))?;

        let mut search_results = Vec::new();

        while let Some(batch_result) = results_stream.next().await {
            let batch = batch_result.map_err(|e| {
                PipelineError::Database(format!("Failed to read result batch: {}", e))
            })?;

            let ids = string_column(&batch, "id")?;
            let titles = string_column(&batch, "title")?;
            let urls = string_column(&batch, "url")?;
            let documents = string_column(&batch, "document")?;

            // LanceDB reports the distance in a synthetic column
            let distances = batch
                .column_by_name("_distance")
                .and_then(|col| col.as_any().downcast_ref::<Float32Array>());

            for i in 0..batch.num_rows() {
                let distance = distances.filter(|d| !d.is_null(i)).map(|d| d.value(i));

                search_results.push(SearchResult::new(
                    ids.value(i).to_string(),
                    titles.value(i).to_string(),
                    urls.value(i).to_string(),
                    documents.value(i).to_string(),
                    distance,
                ));
            }
        }

        // batches may arrive out of order
        search_results.sort_by(|a, b| {
            a.distance
                .unwrap_or(f32::MAX)
                .total_cmp(&b.distance.unwrap_or(f32::MAX))
        });
        search_results.truncate(limit);

        info!("Vector search returned {} results", search_results.len());
        Ok(search_results)
    }
}
