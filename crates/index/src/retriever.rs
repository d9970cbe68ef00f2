//! Query-time retrieval over a persisted index.

use crate::embeddings::{create_provider, EmbeddingConfig, EmbeddingProvider};
use crate::lancedb_index::LanceDbIndex;
use crate::manifest::IndexManifest;
use crate::types::{IndexStats, ScoredDocument};
use crate::vector_index::VectorIndex;
use async_trait::async_trait;
use simsearch_core::{AppError, AppResult};
use std::path::Path;
use std::sync::Arc;

/// Number of documents returned per query.
pub const DEFAULT_TOP_K: usize = 3;

/// Finds the documents most similar to a text query.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Return at most `top_k` documents, best match first.
    async fn retrieve(&self, query: &str) -> AppResult<Vec<ScoredDocument>>;
}

/// Retriever that embeds the query and searches a vector index.
pub struct VectorRetriever {
    provider: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    top_k: usize,
}

impl VectorRetriever {
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        top_k: usize,
    ) -> AppResult<Self> {
        if provider.dimensions() != index.dimensions() {
            return Err(AppError::Embedding(format!(
                "Provider produces {} dimensions but the index holds {}",
                provider.dimensions(),
                index.dimensions()
            )));
        }

        Ok(Self {
            provider,
            index,
            top_k,
        })
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }
}

#[async_trait]
impl Retriever for VectorRetriever {
    async fn retrieve(&self, query: &str) -> AppResult<Vec<ScoredDocument>> {
        let embedding = self.provider.embed(query).await?;
        let results = self.index.search(&embedding, self.top_k).await?;

        if let Some(best) = results.first() {
            tracing::debug!(
                "Top match {} (score {:.3}) of {} results",
                best.document.metadata.source,
                best.score,
                results.len()
            );
        }

        Ok(results)
    }
}

/// Open the index in `index_dir` for querying with `config`.
///
/// Fails when the index was built with a different embedding configuration.
pub async fn open_retriever(
    index_dir: &Path,
    config: &EmbeddingConfig,
    top_k: usize,
) -> AppResult<VectorRetriever> {
    let manifest = IndexManifest::load(index_dir)?;
    manifest.embedding.validate_consistency(config)?;

    let provider = create_provider(config).await?;
    let index = LanceDbIndex::open(index_dir, config.dimensions).await?;

    tracing::info!(
        "Loaded index from {:?}: {} documents, provider={}, model={}",
        index_dir,
        manifest.documents_count,
        config.provider,
        config.model
    );

    VectorRetriever::new(provider, Arc::new(index), top_k)
}

/// Read statistics for the index in `index_dir`.
pub async fn index_stats(index_dir: &Path) -> AppResult<IndexStats> {
    let manifest = IndexManifest::load(index_dir)?;
    let index = LanceDbIndex::open(index_dir, manifest.embedding.dimensions).await?;

    Ok(IndexStats {
        documents_count: index.len().await?,
        provider: manifest.embedding.provider,
        model: manifest.embedding.model,
        dimensions: manifest.embedding.dimensions,
        built_at: manifest.built_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::trigram::TrigramProvider;
    use crate::types::{Document, EmbeddedDocument};
    use crate::vector_index::InMemoryIndex;

    async fn in_memory_retriever(texts: &[(&str, &str)], top_k: usize) -> VectorRetriever {
        let provider = Arc::new(TrigramProvider::new(64, true));
        let contents: Vec<String> = texts.iter().map(|(_, c)| c.to_string()).collect();
        let embeddings = provider.embed_batch(&contents).await.unwrap();

        let entries = texts
            .iter()
            .zip(embeddings)
            .map(|((name, content), embedding)| EmbeddedDocument {
                document: Document::from_text_file(*name, *content),
                embedding,
            })
            .collect();

        let index = InMemoryIndex::new(64, entries).unwrap();
        VectorRetriever::new(provider, Arc::new(index), top_k).unwrap()
    }

    #[tokio::test]
    async fn test_retrieve_ranks_matching_document_first() {
        let retriever = in_memory_retriever(
            &[
                ("cats.txt", "Cats purr and chase mice around the house"),
                ("rust.txt", "Rust ownership and borrowing rules"),
                ("tea.txt", "Green tea steeping temperature"),
                ("bread.txt", "Sourdough bread needs a starter"),
            ],
            DEFAULT_TOP_K,
        )
        .await;

        let results = retriever.retrieve("borrowing rules in rust").await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].document.metadata.source, "rust.txt");
    }

    #[tokio::test]
    async fn test_retrieve_never_exceeds_document_count() {
        let retriever = in_memory_retriever(&[("only.txt", "single document")], 3).await;
        let results = retriever.retrieve("anything").await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let provider = Arc::new(TrigramProvider::new(32, true));
        let index = Arc::new(InMemoryIndex::new(16, Vec::new()).unwrap());
        assert!(VectorRetriever::new(provider, index, 3).is_err());
    }
}
