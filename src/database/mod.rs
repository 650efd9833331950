// file: src/database/mod.rs
// description: similarity index and embedding module exports
// reference: internal module structure

pub mod client;
pub mod embeddings;
pub mod insert;
pub mod schema;

pub use client::LanceDbClient;
pub use embeddings::{EmbeddingModel, HashingEmbedder, RemoteEmbeddingClient};
pub use insert::IndexWriter;
pub use schema::SchemaManager;
