//! Index type definitions.

use serde::{Deserialize, Serialize};

/// Metadata `type` tag attached to every document built from a text file.
pub const TEXT_DOCUMENT_TYPE: &str = "text";

/// One retrievable unit: the full contents of one pre-chunked text file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier (the source file name)
    pub id: String,

    /// Raw text content
    pub content: String,

    /// Source metadata
    pub metadata: DocumentMetadata,
}

/// Metadata stored alongside each document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Source file name
    pub source: String,

    /// Constant document type tag
    #[serde(rename = "type")]
    pub doc_type: String,
}

impl Document {
    /// Create a text document for a source file.
    pub fn from_text_file(file_name: impl Into<String>, content: impl Into<String>) -> Self {
        let source = file_name.into();
        Self {
            id: source.clone(),
            content: content.into(),
            metadata: DocumentMetadata {
                source,
                doc_type: TEXT_DOCUMENT_TYPE.to_string(),
            },
        }
    }
}

/// A document paired with its embedding, ready to be written to an index.
#[derive(Debug, Clone)]
pub struct EmbeddedDocument {
    pub document: Document,
    pub embedding: Vec<f32>,
}

/// A document returned by a similarity search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredDocument {
    /// Retrieved document
    pub document: Document,

    /// Similarity score (higher is closer)
    pub score: f32,
}

/// Statistics from a build operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildStats {
    /// Number of documents indexed
    pub documents_count: u32,

    /// Total bytes read from input files
    pub bytes_processed: u64,

    /// Duration in seconds
    pub duration_secs: f64,
}

/// Statistics for a persisted index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    /// Number of rows in the vector table
    pub documents_count: u64,

    /// Embedding provider recorded at build time
    pub provider: String,

    /// Embedding model recorded at build time
    pub model: String,

    /// Embedding dimensions
    pub dimensions: usize,

    /// Build timestamp
    pub built_at: chrono::DateTime<chrono::Utc>,
}
