//! Document indexing and similarity retrieval.
//!
//! The builder turns a directory of pre-chunked `.txt` files into a LanceDB
//! vector index; the retriever answers top-k queries against it.

pub mod builder;
pub mod embeddings;
pub mod lancedb_index;
pub mod manifest;
pub mod parser;
pub mod progress;
pub mod retriever;
pub mod types;
pub mod vector_index;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use builder::{build_index, load_documents};
pub use embeddings::{create_provider, EmbeddingConfig, EmbeddingProvider};
pub use manifest::IndexManifest;
pub use progress::{ProgressEvent, ProgressReporter};
pub use retriever::{index_stats, open_retriever, Retriever, VectorRetriever, DEFAULT_TOP_K};
pub use types::{BuildStats, Document, DocumentMetadata, IndexStats, ScoredDocument};
pub use vector_index::{InMemoryIndex, VectorIndex};
