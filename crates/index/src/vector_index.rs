//! Vector index abstraction.
//!
//! The query path only reads from an index; writes happen once, when the
//! builder creates it.

use crate::types::{EmbeddedDocument, ScoredDocument};
use async_trait::async_trait;
use simsearch_core::{AppError, AppResult};

/// Read-only similarity search over embedded documents.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Search for the top-k most similar documents to the query embedding.
    ///
    /// Returns at most `top_k` documents ordered by descending similarity.
    async fn search(&self, query_embedding: &[f32], top_k: usize) -> AppResult<Vec<ScoredDocument>>;

    /// Number of documents in the index.
    async fn len(&self) -> AppResult<u64>;

    /// Embedding dimensions the index was built with.
    fn dimensions(&self) -> usize;
}

/// Index held entirely in memory, scored by cosine similarity.
///
/// Useful for tests and tiny corpora; nothing is persisted.
#[derive(Debug, Default)]
pub struct InMemoryIndex {
    dimensions: usize,
    entries: Vec<EmbeddedDocument>,
}

impl InMemoryIndex {
    /// Build an index from embedded documents.
    pub fn new(dimensions: usize, entries: Vec<EmbeddedDocument>) -> AppResult<Self> {
        if let Some(bad) = entries.iter().find(|e| e.embedding.len() != dimensions) {
            return Err(AppError::Index(format!(
                "Embedding dimension mismatch for '{}': expected {}, got {}",
                bad.document.id,
                dimensions,
                bad.embedding.len()
            )));
        }
        Ok(Self { dimensions, entries })
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn search(&self, query_embedding: &[f32], top_k: usize) -> AppResult<Vec<ScoredDocument>> {
        if query_embedding.len() != self.dimensions {
            return Err(AppError::Index(format!(
                "Query embedding dimension mismatch: expected {}, got {}",
                self.dimensions,
                query_embedding.len()
            )));
        }

        let mut scored: Vec<ScoredDocument> = self
            .entries
            .iter()
            .map(|entry| ScoredDocument {
                document: entry.document.clone(),
                score: cosine_similarity(query_embedding, &entry.embedding),
            })
            .collect();

        // Stable sort keeps insertion order for equal scores.
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn len(&self) -> AppResult<u64> {
        Ok(self.entries.len() as u64)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Calculate cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Document;

    fn entry(name: &str, embedding: Vec<f32>) -> EmbeddedDocument {
        EmbeddedDocument {
            document: Document::from_text_file(name, format!("content of {}", name)),
            embedding,
        }
    }

    #[tokio::test]
    async fn test_search_orders_by_similarity() {
        let index = InMemoryIndex::new(
            3,
            vec![
                entry("far.txt", vec![0.0, 0.0, 1.0]),
                entry("near.txt", vec![1.0, 0.1, 0.0]),
                entry("mid.txt", vec![0.7, 0.7, 0.0]),
            ],
        )
        .unwrap();

        let results = index.search(&[1.0, 0.0, 0.0], 2).await.unwrap();
        let ids: Vec<_> = results.iter().map(|r| r.document.id.as_str()).collect();
        assert_eq!(ids, vec!["near.txt", "mid.txt"]);
        assert!(results[0].score >= results[1].score);
    }

    #[tokio::test]
    async fn test_search_fewer_than_k() {
        let index = InMemoryIndex::new(2, vec![entry("only.txt", vec![1.0, 0.0])]).unwrap();
        let results = index.search(&[1.0, 0.0], 3).await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_zero_query_keeps_insertion_order() {
        let index = InMemoryIndex::new(
            2,
            vec![
                entry("a.txt", vec![0.0, 1.0]),
                entry("b.txt", vec![1.0, 0.0]),
                entry("c.txt", vec![0.6, 0.8]),
            ],
        )
        .unwrap();

        let results = index.search(&[0.0, 0.0], 2).await.unwrap();
        let ids: Vec<_> = results.iter().map(|r| r.document.id.as_str()).collect();
        assert_eq!(ids, vec!["a.txt", "b.txt"]);
        assert!(results.iter().all(|r| r.score == 0.0));
    }

    #[tokio::test]
    async fn test_search_empty_index() {
        let index = InMemoryIndex::new(2, Vec::new()).unwrap();
        assert!(index.search(&[1.0, 0.0], 3).await.unwrap().is_empty());
        assert_eq!(index.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_query_dimension_mismatch() {
        let index = InMemoryIndex::new(2, vec![entry("a.txt", vec![1.0, 0.0])]).unwrap();
        assert!(index.search(&[1.0, 0.0, 0.0], 3).await.is_err());
    }

    #[test]
    fn test_rejects_mismatched_entries() {
        let result = InMemoryIndex::new(3, vec![entry("a.txt", vec![1.0])]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }
}
