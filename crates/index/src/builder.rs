//! Offline index build: text files in, persisted vector index out.

use crate::embeddings::{EmbeddingConfig, EmbeddingProvider};
use crate::lancedb_index::LanceDbIndex;
use crate::manifest::IndexManifest;
use crate::parser::{self, ContentType};
use crate::progress::ProgressReporter;
use crate::types::{BuildStats, Document, EmbeddedDocument};
use simsearch_core::{AppError, AppResult};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;
use walkdir::WalkDir;

/// Load every `.txt` file directly inside `input_dir` as one document.
///
/// Subdirectories are not descended into. Documents come back in file-name
/// order so repeated builds over the same directory are identical.
pub fn load_documents(input_dir: &Path, progress: &ProgressReporter) -> AppResult<Vec<Document>> {
    if !input_dir.is_dir() {
        return Err(AppError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("Input directory {:?} does not exist", input_dir),
        )));
    }

    let listing = WalkDir::new(input_dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .map(|entry| entry.map(|e| (e.file_type().is_file(), e.into_path())));
    let paths = select_text_files(listing)?;

    let total = paths.len() as u64;
    progress.discover(total, &input_dir.display().to_string());

    let mut documents = Vec::with_capacity(paths.len());
    for (i, path) in paths.iter().enumerate() {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        progress.parse(i as u64 + 1, total, &file_name);

        let content = parser::read_text_lossy(path)?;
        tracing::debug!("Loaded {} ({} bytes)", file_name, content.len());

        documents.push(Document::from_text_file(file_name, content));
    }

    Ok(documents)
}

/// Keep the regular `.txt` files of a directory listing, sorted by path.
///
/// A listing error aborts the scan: an unreadable directory must not look
/// like an empty one, or the build would replace a good index with nothing.
fn select_text_files<I, E>(listing: I) -> AppResult<Vec<PathBuf>>
where
    I: IntoIterator<Item = Result<(bool, PathBuf), E>>,
    E: Into<io::Error>,
{
    let mut paths = Vec::new();
    for entry in listing {
        let (is_file, path) = entry.map_err(|e| AppError::Io(e.into()))?;
        if is_file && ContentType::from_path(&path) == ContentType::PlainText {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Build the vector index for `input_dir` into `index_dir`.
///
/// Any previous contents of `index_dir` are removed. All documents are
/// embedded with a single batch call to `provider`.
pub async fn build_index(
    input_dir: &Path,
    index_dir: &Path,
    config: &EmbeddingConfig,
    provider: &dyn EmbeddingProvider,
    progress: &ProgressReporter,
) -> AppResult<BuildStats> {
    let start = Instant::now();

    tracing::info!(
        "Building index from {:?} into {:?} (provider={}, model={})",
        input_dir,
        index_dir,
        provider.provider_name(),
        provider.model_name()
    );

    let documents = load_documents(input_dir, progress)?;
    let total = documents.len() as u64;
    let bytes_processed: u64 = documents.iter().map(|d| d.content.len() as u64).sum();

    if documents.is_empty() {
        tracing::warn!("No .txt files found in {:?}; writing an empty index", input_dir);
    }

    let texts: Vec<String> = documents.iter().map(|d| d.content.clone()).collect();
    let embeddings = if texts.is_empty() {
        Vec::new()
    } else {
        provider.embed_batch(&texts).await?
    };
    progress.embed(total, total, provider.model_name());

    if embeddings.len() != documents.len() {
        return Err(AppError::Index(format!(
            "Embedding count mismatch: {} documents, {} embeddings",
            documents.len(),
            embeddings.len()
        )));
    }

    let entries: Vec<EmbeddedDocument> = documents
        .into_iter()
        .zip(embeddings)
        .map(|(document, embedding)| EmbeddedDocument {
            document,
            embedding,
        })
        .collect();

    if index_dir.exists() {
        tracing::debug!("Removing previous index at {:?}", index_dir);
        std::fs::remove_dir_all(index_dir).map_err(|e| {
            AppError::Index(format!("Failed to remove old index {:?}: {}", index_dir, e))
        })?;
    }

    LanceDbIndex::create(index_dir, config.dimensions, &entries).await?;
    IndexManifest::new(config, total).save(index_dir)?;
    progress.index(total, total, &index_dir.display().to_string());

    let duration = start.elapsed();

    tracing::info!(
        "Build completed: {} documents, {} bytes in {:.2}s",
        total,
        bytes_processed,
        duration.as_secs_f64()
    );

    Ok(BuildStats {
        documents_count: total as u32,
        bytes_processed,
        duration_secs: duration.as_secs_f64(),
    })
}
