//! Shared service state.

use simsearch_core::{AppConfig, AppResult};
use simsearch_index::{open_retriever, EmbeddingConfig, Retriever, DEFAULT_TOP_K};
use std::sync::Arc;

/// Whether the retriever could be loaded at startup.
#[derive(Clone)]
pub enum RetrieverHealth {
    Ready(Arc<dyn Retriever>),
    Unavailable { reason: String },
}

impl std::fmt::Debug for RetrieverHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetrieverHealth::Ready(_) => write!(f, "Ready"),
            RetrieverHealth::Unavailable { reason } => write!(f, "Unavailable({})", reason),
        }
    }
}

/// Immutable state shared by all request handlers.
#[derive(Debug)]
pub struct ServiceState {
    api_key: String,
    retriever: RetrieverHealth,
}

impl ServiceState {
    pub fn new(api_key: impl Into<String>, retriever: RetrieverHealth) -> Self {
        Self {
            api_key: api_key.into(),
            retriever,
        }
    }

    /// Load the retriever described by `config`.
    ///
    /// A missing API key is an error. Failing to load the index or the
    /// embedding provider is not: the service starts with the retriever
    /// marked unavailable and answers searches with 503.
    pub async fn initialize(config: &AppConfig) -> AppResult<Self> {
        let api_key = config.require_api_key()?.to_string();

        let index_dir = config.index_path();
        let embedding = EmbeddingConfig::from(&config.embedding);

        let retriever = match open_retriever(&index_dir, &embedding, DEFAULT_TOP_K).await {
            Ok(retriever) => {
                tracing::info!("Retriever ready (top_k={})", retriever.top_k());
                RetrieverHealth::Ready(Arc::new(retriever))
            }
            Err(e) => {
                tracing::error!("Failed to initialize retriever from {:?}: {}", index_dir, e);
                RetrieverHealth::Unavailable {
                    reason: e.to_string(),
                }
            }
        };

        Ok(Self::new(api_key, retriever))
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn retriever(&self) -> &RetrieverHealth {
        &self.retriever
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.retriever, RetrieverHealth::Ready(_))
    }
}
