// file: src/database/embeddings.rs
// description: text embedding providers for the article index
// reference: https://platform.openai.com/docs/api-reference/embeddings

use crate::config::{EmbeddingConfig, EmbeddingProviderKind};
use crate::error::{PipelineError, Result};
use crate::parser::patterns::WORD_TOKEN;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::Duration;
use tracing::{debug, info};

const REMOTE_TIMEOUT: Duration = Duration::from_secs(30);
const BIGRAM_WEIGHT: f32 = 0.5;

/// Local deterministic embedder based on signed feature hashing.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        if self.dimension == 0 {
            return vector;
        }

        let tokens: Vec<String> = WORD_TOKEN
            .find_iter(text)
            .map(|m| m.as_str().to_lowercase())
            .collect();

        for token in &tokens {
            self.accumulate(&mut vector, token, 1.0);
        }
        for pair in tokens.windows(2) {
            self.accumulate(&mut vector, &format!("{} {}", pair[0], pair[1]), BIGRAM_WEIGHT);
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }

    fn accumulate(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let digest = Sha256::digest(feature.as_bytes());

        let mut bucket = [0u8; 8];
        bucket.copy_from_slice(&digest[..8]);
        let index = (u64::from_le_bytes(bucket) % self.dimension as u64) as usize;
        let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };

        vector[index] += sign * weight;
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a [String],
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

/// Client for an OpenAI-compatible `/embeddings` endpoint.
pub struct RemoteEmbeddingClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    dimension: usize,
}

impl RemoteEmbeddingClient {
    pub fn new(
        endpoint: String,
        api_key: Option<String>,
        model: String,
        dimension: usize,
    ) -> Result<Self> {
        let client = Client::builder().timeout(REMOTE_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint,
            api_key,
            model,
            dimension,
        })
    }

    pub async fn generate_embeddings(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = EmbeddingRequest {
            input: texts,
            model: &self.model,
        };

        debug!(
            "Requesting {} embeddings from {}",
            texts.len(),
            self.endpoint
        );

        let mut builder = self.client.post(&self.endpoint).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            PipelineError::Embedding(format!("Failed to send embedding request: {}", e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PipelineError::Embedding(format!(
                "Embedding request failed with status {}: {}",
                status, error_text
            )));
        }

        let mut parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            PipelineError::Embedding(format!("Failed to parse embedding response: {}", e))
        })?;

        if parsed.data.len() != texts.len() {
            return Err(PipelineError::Embedding(format!(
                "Expected {} embeddings, received {}",
                texts.len(),
                parsed.data.len()
            )));
        }

        parsed.data.sort_by_key(|d| d.index);

        parsed
            .data
            .into_iter()
            .map(|d| {
                if d.embedding.len() == self.dimension {
                    Ok(d.embedding)
                } else {
                    Err(PipelineError::Embedding(format!(
                        "Endpoint returned dimension {}, expected {}",
                        d.embedding.len(),
                        self.dimension
                    )))
                }
            })
            .collect()
    }
}

pub enum EmbeddingModel {
    Hashing(HashingEmbedder),
    Remote(RemoteEmbeddingClient),
}

impl EmbeddingModel {
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        match config.provider {
            EmbeddingProviderKind::Hashing => {
                info!("Using hashing embedder ({} dimensions)", config.dimension);
                Ok(Self::Hashing(HashingEmbedder::new(config.dimension)))
            }
            EmbeddingProviderKind::Remote => {
                let endpoint = config.endpoint.clone().ok_or_else(|| {
                    PipelineError::Config("remote embedding provider requires an endpoint".into())
                })?;
                info!("Using remote embeddings from {} ({})", endpoint, config.model);
                Ok(Self::Remote(RemoteEmbeddingClient::new(
                    endpoint,
                    config.api_key.clone(),
                    config.model.clone(),
                    config.dimension,
                )?))
            }
        }
    }

    pub fn dimension(&self) -> usize {
        match self {
            Self::Hashing(embedder) => embedder.dimension(),
            Self::Remote(client) => client.dimension,
        }
    }

    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        match self {
            Self::Hashing(embedder) => Ok(texts.iter().map(|t| embedder.embed(t)).collect()),
            Self::Remote(client) => client.generate_embeddings(texts).await,
        }
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| PipelineError::Embedding("No embedding returned".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hashing_embedding_is_deterministic() {
        let embedder = HashingEmbedder::new(128);
        let a = embedder.embed("Markets rally after rate decision");
        let b = embedder.embed("Markets rally after rate decision");
        assert_eq!(a, b);
        assert_eq!(a.len(), 128);
    }

    #[test]
    fn test_hashing_embedding_is_normalized() {
        let embedding = HashingEmbedder::new(64).embed("one two three four");
        let norm: f32 = embedding.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let embedding = HashingEmbedder::new(32).embed("");
        assert_eq!(embedding, vec![0.0; 32]);
    }

    #[test]
    fn test_case_insensitive_tokens() {
        let embedder = HashingEmbedder::new(64);
        assert_eq!(embedder.embed("Breaking News"), embedder.embed("breaking news"));
    }

    #[tokio::test]
    async fn test_model_from_default_config() {
        let config = crate::config::Config::default_config();
        let model = EmbeddingModel::from_config(&config.embedding).unwrap();
        assert_eq!(model.dimension(), 384);

        let vectors = model
            .embed_batch(&["a".to_string(), String::new()])
            .await
            .unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[1], vec![0.0; 384]);
    }
}
