//! Build manifest stored next to the vector table.

use crate::embeddings::EmbeddingConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use simsearch_core::{AppError, AppResult};
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the manifest inside the index directory.
pub const MANIFEST_FILE: &str = "manifest.yaml";

/// Describes how an index was built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    /// Embedding configuration used to embed the documents
    pub embedding: EmbeddingConfig,

    /// Number of documents written
    pub documents_count: u64,

    /// Build timestamp
    pub built_at: DateTime<Utc>,
}

impl IndexManifest {
    pub fn new(embedding: &EmbeddingConfig, documents_count: u64) -> Self {
        // The endpoint is where the provider ran, not part of the embedding space.
        let embedding = EmbeddingConfig {
            endpoint: None,
            ..embedding.clone()
        };

        Self {
            embedding,
            documents_count,
            built_at: Utc::now(),
        }
    }

    /// Write the manifest into `index_dir`.
    pub fn save(&self, index_dir: &Path) -> AppResult<()> {
        let path = manifest_path(index_dir);

        let yaml = serde_yaml::to_string(self)
            .map_err(|e| AppError::Index(format!("Failed to serialize manifest: {}", e)))?;

        fs::write(&path, yaml).map_err(|e| {
            AppError::Index(format!("Failed to write manifest to {:?}: {}", path, e))
        })?;

        tracing::debug!("Saved index manifest to {:?}", path);
        Ok(())
    }

    /// Load the manifest from `index_dir`.
    pub fn load(index_dir: &Path) -> AppResult<Self> {
        let path = manifest_path(index_dir);

        if !path.exists() {
            return Err(AppError::Index(format!(
                "No index manifest at {:?}. Run 'simsearch build' first.",
                path
            )));
        }

        let content = fs::read_to_string(&path).map_err(|e| {
            AppError::Index(format!("Failed to read manifest at {:?}: {}", path, e))
        })?;

        serde_yaml::from_str(&content).map_err(|e| {
            AppError::Index(format!("Failed to parse manifest at {:?}: {}", path, e))
        })
    }
}

/// Get the manifest path for an index directory.
pub fn manifest_path(index_dir: &Path) -> PathBuf {
    index_dir.join(MANIFEST_FILE)
}
