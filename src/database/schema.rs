// file: src/database/schema.rs
// description: LanceDB schema management for the article similarity index
// reference: https://docs.rs/lancedb

use crate::database::client::LanceDbClient;
use crate::error::{PipelineError, Result};
use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;
use tracing::{info, warn};

pub struct SchemaManager<'a> {
    client: &'a LanceDbClient,
}

impl<'a> SchemaManager<'a> {
    pub fn new(client: &'a LanceDbClient) -> Self {
        Self { client }
    }

    /// Arrow schema of the article index with vectors of `embedding_dim`.
    pub fn articles_schema(embedding_dim: usize) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("title", DataType::Utf8, false),
            Field::new("url", DataType::Utf8, false),
            Field::new("document", DataType::Utf8, false),
            Field::new(
                "embedding",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    embedding_dim as i32,
                ),
                false,
            ),
        ]))
    }

    pub async fn drop_collection(&self) -> Result<bool> {
        let collection = self.client.collection();

        if !self.client.table_exists(collection).await? {
            info!("Collection '{}' does not exist, nothing to drop", collection);
            return Ok(false);
        }

        warn!("Dropping collection '{}'", collection);
        self.client
            .get_connection()
            .drop_table(collection)
            .await
            .map_err(|e| {
                PipelineError::Database(format!("Failed to drop table {}: {}", collection, e))
            })?;
        info!("Dropped collection: {}", collection);

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_generation() {
        let schema = SchemaManager::articles_schema(384);
        assert_eq!(schema.fields().len(), 5);

        let embedding_field = schema.field_with_name("embedding").unwrap();
        assert!(matches!(embedding_field.data_type(), DataType::FixedSizeList(_, 384)));
        assert!(schema.field_with_name("id").is_ok());
    }
}
