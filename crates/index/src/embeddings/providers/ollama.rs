//! Ollama Embedding Provider
//!
//! Neural sentence embeddings served by a local Ollama instance
//! (e.g. `nomic-embed-text`, `mxbai-embed-large`). All texts of a batch are
//! sent in one `/api/embed` request.
//!
//! # Example
//! ```no_run
//! use simsearch_index::embeddings::{EmbeddingConfig, EmbeddingProvider};
//! use simsearch_index::embeddings::providers::ollama::OllamaProvider;
//!
//! # async fn run() -> simsearch_core::AppResult<()> {
//! let config = EmbeddingConfig {
//!     provider: "ollama".to_string(),
//!     model: "nomic-embed-text".to_string(),
//!     dimensions: 768,
//!     ..Default::default()
//! };
//!
//! let provider = OllamaProvider::new(&config).await?;
//! let embedding = provider.embed("Hello world").await?;
//! assert_eq!(embedding.len(), 768);
//! # Ok(())
//! # }
//! ```

use crate::embeddings::{normalize, EmbeddingConfig, EmbeddingProvider};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use simsearch_core::{AppError, AppResult};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Default Ollama API base URL
const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const EMBED_ENDPOINT: &str = "/api/embed";

/// Connection establishment timeout. Embedding calls themselves are unbounded.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Ollama embedding provider using the local HTTP API
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    model: String,
    dimensions: usize,
    normalize: bool,
}

/// Request payload for the Ollama embed API
#[derive(Debug, Clone, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

/// Response from the Ollama embed API
#[derive(Debug, Clone, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Error response from the Ollama API
#[derive(Debug, Clone, Deserialize)]
struct ErrorResponse {
    error: String,
}

impl OllamaProvider {
    /// Create a provider and verify that the model answers with the
    /// configured dimensions.
    ///
    /// # Errors
    /// * `AppError::Embedding` - Ollama unreachable, model missing or
    ///   dimension mismatch
    pub async fn new(config: &EmbeddingConfig) -> AppResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                AppError::Embedding(format!("Failed to create HTTP client for Ollama: {}", e))
            })?;

        let base_url = config
            .endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let provider = Self {
            client,
            base_url,
            model: config.model.clone(),
            dimensions: config.dimensions,
            normalize: config.normalize,
        };

        provider.verify_connection().await?;

        Ok(provider)
    }

    /// Verify Ollama connection and model availability
    #[instrument(skip(self), fields(model = %self.model))]
    async fn verify_connection(&self) -> AppResult<()> {
        debug!("Verifying Ollama connection at {}", self.base_url);

        self.request_embeddings(&["test connection"]).await.map_err(|e| {
            AppError::Embedding(format!(
                "Ollama not available at {} ({}). Ensure Ollama is running and run: ollama pull {}",
                self.base_url, e, self.model
            ))
        })?;

        debug!("Ollama connection verified, model '{}' ready", self.model);
        Ok(())
    }

    /// Send one embed request for all `inputs`.
    #[instrument(skip(self, inputs), fields(batch_size = inputs.len()))]
    async fn request_embeddings(&self, inputs: &[&str]) -> AppResult<Vec<Vec<f32>>> {
        let url = format!("{}{}", self.base_url, EMBED_ENDPOINT);
        let request = EmbedRequest {
            model: &self.model,
            input: inputs.to_vec(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Embedding(format!("Failed to send request to Ollama: {}", e)))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            let detail = serde_json::from_str::<ErrorResponse>(&error_text)
                .map(|e| e.error)
                .unwrap_or(error_text);

            return Err(AppError::Embedding(format!(
                "Ollama API error ({}): {}",
                status, detail
            )));
        }

        let body: EmbedResponse = response
            .json()
            .await
            .map_err(|e| AppError::Embedding(format!("Failed to parse Ollama response: {}", e)))?;

        self.check_response(inputs.len(), body.embeddings)
    }

    fn check_response(&self, expected: usize, mut embeddings: Vec<Vec<f32>>) -> AppResult<Vec<Vec<f32>>> {
        if embeddings.len() != expected {
            return Err(AppError::Embedding(format!(
                "Ollama returned {} embeddings for {} inputs",
                embeddings.len(),
                expected
            )));
        }

        for embedding in &mut embeddings {
            if embedding.len() != self.dimensions {
                return Err(AppError::Embedding(format!(
                    "Ollama model '{}' returned {} dimensions, expected {}",
                    self.model,
                    embedding.len(),
                    self.dimensions
                )));
            }
            if self.normalize {
                normalize(embedding);
            }
        }

        Ok(embeddings)
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaProvider {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    #[instrument(skip(self, texts), fields(batch_size = texts.len(), provider = "ollama", model = %self.model))]
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        // Blank texts get zero vectors locally; Ollama rejects empty input.
        let non_blank: Vec<(usize, &str)> = texts
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.trim().is_empty())
            .map(|(i, t)| (i, t.as_str()))
            .collect();

        if non_blank.len() < texts.len() {
            warn!(
                "{} blank texts embedded as zero vectors",
                texts.len() - non_blank.len()
            );
        }

        let mut embeddings = vec![vec![0.0; self.dimensions]; texts.len()];
        if non_blank.is_empty() {
            return Ok(embeddings);
        }

        let inputs: Vec<&str> = non_blank.iter().map(|(_, t)| *t).collect();
        let vectors = self.request_embeddings(&inputs).await?;

        for ((idx, _), vector) in non_blank.into_iter().zip(vectors) {
            embeddings[idx] = vector;
        }

        Ok(embeddings)
    }
}
