//! Embedding provider interface and the OpenAI-compatible HTTP client.
//!
//! The embedding model is an external collaborator: passages are vectorized
//! once when the index is built, and each incoming question is vectorized
//! at query time. Both paths go through [`EmbeddingProvider`] so tests can
//! substitute a scripted provider.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::EmbeddingConfig;

/// Environment variable holding the provider API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Error type for embedding operations
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("embedding request failed: {0}")]
    Request(String),

    #[error("embedding request timed out after {0} seconds")]
    Timeout(u64),

    #[error("provider returned {got} vectors for {expected} inputs")]
    CountMismatch { expected: usize, got: usize },

    #[error("provider returned an empty embedding")]
    EmptyEmbedding,

    #[error("API key not set: export {API_KEY_ENV}")]
    MissingApiKey,

    #[error("invalid provider configuration: {0}")]
    InvalidConfig(String),
}

/// Source of embedding vectors.
///
/// Implementations must be deterministic for a fixed model version: the
/// same text maps to the same vector, and `model_id()` identifies that
/// version so an index built with one model is never queried with another.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Model identifier recorded in the index for compatibility checks.
    fn model_id(&self) -> &str;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Embed multiple texts. The default loops over `embed`; providers
    /// with a batch endpoint should override it.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    input: &'a [String],
    model: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Deserialize)]
struct EmbeddingRow {
    embedding: Vec<f32>,
}

/// Client for an OpenAI-compatible `/embeddings` endpoint.
///
/// The request timeout is set on the underlying client, so every call is
/// bounded; a timed-out or dropped call leaves no state behind.
pub struct OpenAiEmbeddings {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    timeout_secs: u64,
}

impl OpenAiEmbeddings {
    /// Build a client from config. The API key is read from the
    /// environment, never from the config file.
    pub fn new(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let api_key = std::env::var(API_KEY_ENV).map_err(|_| EmbeddingError::MissingApiKey)?;

        let base = url::Url::parse(&config.api_base)
            .map_err(|e| EmbeddingError::InvalidConfig(format!("api_base: {e}")))?;
        let endpoint = base
            .join("embeddings")
            .map_err(|e| EmbeddingError::InvalidConfig(format!("api_base: {e}")))?
            .to_string();

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EmbeddingError::Request(e.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            api_key,
            model: config.model.clone(),
            timeout_secs: config.timeout_secs,
        })
    }

    async fn request(&self, input: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let body = EmbeddingsRequest {
            input,
            model: &self.model,
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        let resp = resp
            .error_for_status()
            .map_err(|e| EmbeddingError::Request(e.to_string()))?;

        let parsed: EmbeddingsResponse =
            resp.json().await.map_err(|e| self.map_reqwest_error(e))?;

        if parsed.data.len() != input.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: input.len(),
                got: parsed.data.len(),
            });
        }

        let vectors: Vec<Vec<f32>> = parsed.data.into_iter().map(|row| row.embedding).collect();
        if vectors.iter().any(|v| v.is_empty()) {
            return Err(EmbeddingError::EmptyEmbedding);
        }

        Ok(vectors)
    }

    fn map_reqwest_error(&self, err: reqwest::Error) -> EmbeddingError {
        if err.is_timeout() {
            EmbeddingError::Timeout(self.timeout_secs)
        } else {
            EmbeddingError::Request(err.to_string())
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddings {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let input = [text.to_string()];
        let mut vectors = self.request(&input).await?;
        vectors.pop().ok_or(EmbeddingError::EmptyEmbedding)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        self.request(texts).await
    }
}
