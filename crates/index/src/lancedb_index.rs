//! LanceDB-backed vector index.
//!
//! The builder writes one table of documents and embeddings; the query
//! service opens it read-only. The directory layout belongs to LanceDB.

use crate::types::{Document, DocumentMetadata, EmbeddedDocument, ScoredDocument};
use crate::vector_index::VectorIndex;
use arrow_array::{
    Array, FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray,
};
use arrow_schema::{DataType, Field, Schema, SchemaRef};
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, DistanceType, Table};
use simsearch_core::{AppError, AppResult};
use std::path::Path;
use std::sync::Arc;

/// Name of the LanceDB table holding the documents.
pub const TABLE_NAME: &str = "documents";

const EMBEDDING_COLUMN: &str = "embedding";

/// Column appended by LanceDB to vector search results.
const DISTANCE_COLUMN: &str = "_distance";

/// LanceDB-backed vector index.
pub struct LanceDbIndex {
    table: Table,
    dimensions: usize,
    rows: u64,
}

impl std::fmt::Debug for LanceDbIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanceDbIndex")
            .field("table", &TABLE_NAME)
            .field("dimensions", &self.dimensions)
            .field("rows", &self.rows)
            .finish()
    }
}

impl LanceDbIndex {
    /// Write a new index at `db_path` containing `entries`.
    ///
    /// The directory must not already hold a `documents` table; the builder
    /// clears it first. An empty `entries` slice produces an empty table.
    pub async fn create(
        db_path: &Path,
        dimensions: usize,
        entries: &[EmbeddedDocument],
    ) -> AppResult<Self> {
        std::fs::create_dir_all(db_path).map_err(|e| {
            AppError::Index(format!("Failed to create index directory {:?}: {}", db_path, e))
        })?;

        let conn = connect(db_path).await?;
        let schema = create_schema(dimensions);
        let batch = entries_to_batch(schema.clone(), dimensions, entries)?;

        let table = conn
            .create_table(
                TABLE_NAME,
                RecordBatchIterator::new(vec![Ok(batch)], schema),
            )
            .execute()
            .await
            .map_err(|e| AppError::Index(format!("Failed to create table: {}", e)))?;

        tracing::debug!(
            "Created LanceDB table '{}' at {:?} with {} rows",
            TABLE_NAME,
            db_path,
            entries.len()
        );

        Ok(Self {
            table,
            dimensions,
            rows: entries.len() as u64,
        })
    }

    /// Open an existing index for searching.
    pub async fn open(db_path: &Path, dimensions: usize) -> AppResult<Self> {
        if !db_path.is_dir() {
            return Err(AppError::Index(format!(
                "Index directory {:?} does not exist. Run 'simsearch build' first.",
                db_path
            )));
        }

        let conn = connect(db_path).await?;

        let table_names = conn
            .table_names()
            .execute()
            .await
            .map_err(|e| AppError::Index(format!("Failed to list tables: {}", e)))?;

        if !table_names.iter().any(|name| name == TABLE_NAME) {
            return Err(AppError::Index(format!(
                "Index at {:?} has no '{}' table",
                db_path, TABLE_NAME
            )));
        }

        let table = conn
            .open_table(TABLE_NAME)
            .execute()
            .await
            .map_err(|e| AppError::Index(format!("Failed to open table: {}", e)))?;

        let schema = table
            .schema()
            .await
            .map_err(|e| AppError::Index(format!("Failed to read table schema: {}", e)))?;
        let stored = stored_dimensions(&schema)?;
        if stored != dimensions {
            return Err(AppError::Index(format!(
                "Index embedding dimension mismatch: table has {}, expected {}",
                stored, dimensions
            )));
        }

        let rows = table
            .count_rows(None)
            .await
            .map_err(|e| AppError::Index(format!("Failed to count rows: {}", e)))?;

        tracing::debug!("Opened LanceDB index at {:?} ({} rows)", db_path, rows);

        Ok(Self {
            table,
            dimensions,
            rows: rows as u64,
        })
    }
}

impl LanceDbIndex {
    /// First `top_k` documents in file-name order, each scored 0.
    ///
    /// A zero query vector has no direction, so cosine similarity is 0 for
    /// every document. Matches `InMemoryIndex`, which keeps insertion order
    /// on ties.
    async fn first_documents(&self, top_k: usize) -> AppResult<Vec<ScoredDocument>> {
        let batches: Vec<RecordBatch> = self
            .table
            .query()
            .execute()
            .await
            .map_err(|e| AppError::Index(format!("Failed to execute scan: {}", e)))?
            .try_collect()
            .await
            .map_err(|e| AppError::Index(format!("Failed to collect results: {}", e)))?;

        let mut results = Vec::new();
        for batch in &batches {
            results.extend(batch_to_scored(batch)?);
        }

        results.sort_by(|a, b| a.document.id.cmp(&b.document.id));
        results.truncate(top_k);
        for result in &mut results {
            result.score = 0.0;
        }

        tracing::debug!(
            "Zero query vector; returning the first {} documents",
            results.len()
        );

        Ok(results)
    }
}

#[async_trait]
impl VectorIndex for LanceDbIndex {
    async fn search(&self, query_embedding: &[f32], top_k: usize) -> AppResult<Vec<ScoredDocument>> {
        if query_embedding.len() != self.dimensions {
            return Err(AppError::Index(format!(
                "Query embedding dimension mismatch: expected {}, got {}",
                self.dimensions,
                query_embedding.len()
            )));
        }

        if self.rows == 0 || top_k == 0 {
            return Ok(Vec::new());
        }

        if is_zero_vector(query_embedding) {
            return self.first_documents(top_k).await;
        }

        let batches: Vec<RecordBatch> = self
            .table
            .query()
            .nearest_to(query_embedding.to_vec())
            .map_err(|e| AppError::Index(format!("Failed to create query: {}", e)))?
            .column(EMBEDDING_COLUMN)
            .distance_type(DistanceType::Cosine)
            .limit(top_k)
            .execute()
            .await
            .map_err(|e| AppError::Index(format!("Failed to execute search: {}", e)))?
            .try_collect()
            .await
            .map_err(|e| AppError::Index(format!("Failed to collect results: {}", e)))?;

        let mut results = Vec::new();
        for batch in &batches {
            results.extend(batch_to_scored(batch)?);
        }

        // Batches arrive ranked; the stable sort only merges them.
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(top_k);

        tracing::debug!(
            "Retrieved {} documents (requested top-{})",
            results.len(),
            top_k
        );

        Ok(results)
    }

    async fn len(&self) -> AppResult<u64> {
        Ok(self.rows)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

async fn connect(db_path: &Path) -> AppResult<Connection> {
    let uri = db_path.to_string_lossy().to_string();
    lancedb::connect(&uri)
        .execute()
        .await
        .map_err(|e| AppError::Index(format!("Failed to connect to LanceDB at {}: {}", uri, e)))
}

fn is_zero_vector(vector: &[f32]) -> bool {
    vector.iter().all(|x| *x == 0.0)
}

fn item_field() -> Arc<Field> {
    Arc::new(Field::new("item", DataType::Float32, true))
}

/// Arrow schema of the documents table.
fn create_schema(dimensions: usize) -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("source", DataType::Utf8, false),
        Field::new("doc_type", DataType::Utf8, false),
        Field::new("content", DataType::Utf8, false),
        Field::new(
            EMBEDDING_COLUMN,
            DataType::FixedSizeList(item_field(), dimensions as i32),
            false,
        ),
    ]))
}

fn stored_dimensions(schema: &Schema) -> AppResult<usize> {
    let field = schema
        .field_with_name(EMBEDDING_COLUMN)
        .map_err(|e| AppError::Index(format!("Index has no embedding column: {}", e)))?;

    match field.data_type() {
        DataType::FixedSizeList(_, size) => Ok(*size as usize),
        other => Err(AppError::Index(format!(
            "Unexpected embedding column type: {}",
            other
        ))),
    }
}

/// Convert embedded documents to a single Arrow RecordBatch.
fn entries_to_batch(
    schema: SchemaRef,
    dimensions: usize,
    entries: &[EmbeddedDocument],
) -> AppResult<RecordBatch> {
    let mut flat = Vec::with_capacity(entries.len() * dimensions);
    for entry in entries {
        if entry.embedding.len() != dimensions {
            return Err(AppError::Index(format!(
                "Embedding dimension mismatch for '{}': expected {}, got {}",
                entry.document.id,
                dimensions,
                entry.embedding.len()
            )));
        }
        flat.extend_from_slice(&entry.embedding);
    }

    let ids = StringArray::from_iter_values(entries.iter().map(|e| e.document.id.as_str()));
    let sources =
        StringArray::from_iter_values(entries.iter().map(|e| e.document.metadata.source.as_str()));
    let doc_types = StringArray::from_iter_values(
        entries.iter().map(|e| e.document.metadata.doc_type.as_str()),
    );
    let contents =
        StringArray::from_iter_values(entries.iter().map(|e| e.document.content.as_str()));

    let embeddings = FixedSizeListArray::try_new(
        item_field(),
        dimensions as i32,
        Arc::new(Float32Array::from(flat)),
        None,
    )
    .map_err(|e| AppError::Index(format!("Failed to build embedding column: {}", e)))?;

    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(ids),
            Arc::new(sources),
            Arc::new(doc_types),
            Arc::new(contents),
            Arc::new(embeddings),
        ],
    )
    .map_err(|e| AppError::Index(format!("Failed to create RecordBatch: {}", e)))
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> AppResult<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| AppError::Index(format!("Invalid {} column", name)))
}

/// Convert search result rows to scored documents.
fn batch_to_scored(batch: &RecordBatch) -> AppResult<Vec<ScoredDocument>> {
    let ids = string_column(batch, "id")?;
    let sources = string_column(batch, "source")?;
    let doc_types = string_column(batch, "doc_type")?;
    let contents = string_column(batch, "content")?;
    let distances = batch
        .column_by_name(DISTANCE_COLUMN)
        .and_then(|c| c.as_any().downcast_ref::<Float32Array>());

    let scored = (0..batch.num_rows())
        .map(|row| {
            // Cosine distance is 1 - cosine similarity. A stored zero vector
            // yields NaN; score it 0 like `cosine_similarity` does.
            let score = distances
                .filter(|d| !d.is_null(row))
                .map(|d| 1.0 - d.value(row))
                .filter(|s| s.is_finite())
                .unwrap_or(0.0);

            ScoredDocument {
                document: Document {
                    id: ids.value(row).to_string(),
                    content: contents.value(row).to_string(),
                    metadata: DocumentMetadata {
                        source: sources.value(row).to_string(),
                        doc_type: doc_types.value(row).to_string(),
                    },
                },
                score,
            }
        })
        .collect();

    Ok(scored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(name: &str, content: &str, embedding: Vec<f32>) -> EmbeddedDocument {
        EmbeddedDocument {
            document: Document::from_text_file(name, content),
            embedding,
        }
    }

    #[test]
    fn test_entries_to_batch() {
        let schema = create_schema(2);
        let batch = entries_to_batch(
            schema,
            2,
            &[
                entry("a.txt", "alpha", vec![1.0, 0.0]),
                entry("b.txt", "beta", vec![0.0, 1.0]),
            ],
        )
        .unwrap();

        assert_eq!(batch.num_rows(), 2);
        assert_eq!(string_column(&batch, "source").unwrap().value(1), "b.txt");
        assert_eq!(string_column(&batch, "doc_type").unwrap().value(0), "text");
    }

    #[test]
    fn test_entries_to_batch_rejects_bad_dimensions() {
        let result = entries_to_batch(create_schema(3), 3, &[entry("a.txt", "x", vec![1.0])]);
        assert!(result.is_err());
    }

    #[test]
    fn test_stored_dimensions() {
        assert_eq!(stored_dimensions(&create_schema(384)).unwrap(), 384);
    }

    #[tokio::test]
    async fn test_create_open_search() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("db");

        LanceDbIndex::create(
            &path,
            3,
            &[
                entry("x.txt", "about x", vec![1.0, 0.0, 0.0]),
                entry("y.txt", "about y", vec![0.0, 1.0, 0.0]),
                entry("xy.txt", "about x and y", vec![0.8, 0.6, 0.0]),
                entry("z.txt", "about z", vec![0.0, 0.0, 1.0]),
            ],
        )
        .await
        .unwrap();

        let index = LanceDbIndex::open(&path, 3).await.unwrap();
        assert_eq!(index.len().await.unwrap(), 4);

        let results = index.search(&[1.0, 0.0, 0.0], 3).await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].document.metadata.source, "x.txt");
        assert_eq!(results[0].document.content, "about x");
        assert_eq!(results[1].document.metadata.source, "xy.txt");
        assert!(results[0].score > results[1].score);
    }

    #[tokio::test]
    async fn test_zero_query_returns_first_documents() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("db");

        LanceDbIndex::create(
            &path,
            2,
            &[
                entry("a.txt", "alpha", vec![1.0, 0.0]),
                entry("b.txt", "beta", vec![0.0, 1.0]),
                entry("c.txt", "gamma", vec![0.6, 0.8]),
                entry("d.txt", "delta", vec![0.8, 0.6]),
            ],
        )
        .await
        .unwrap();
        let index = LanceDbIndex::open(&path, 2).await.unwrap();

        let results = index.search(&[0.0, 0.0], 3).await.unwrap();

        let sources: Vec<&str> = results
            .iter()
            .map(|r| r.document.metadata.source.as_str())
            .collect();
        assert_eq!(sources, vec!["a.txt", "b.txt", "c.txt"]);
        assert!(results.iter().all(|r| r.score == 0.0));
    }

    #[tokio::test]
    async fn test_stored_zero_vector_scores_zero() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("db");

        LanceDbIndex::create(
            &path,
            2,
            &[
                entry("blank.txt", "", vec![0.0, 0.0]),
                entry("x.txt", "about x", vec![1.0, 0.0]),
            ],
        )
        .await
        .unwrap();
        let index = LanceDbIndex::open(&path, 2).await.unwrap();

        let results = index.search(&[1.0, 0.0], 3).await.unwrap();

        assert_eq!(results[0].document.metadata.source, "x.txt");
        assert!(results.iter().all(|r| r.score.is_finite()));
        assert!(results
            .iter()
            .filter(|r| r.document.metadata.source == "blank.txt")
            .all(|r| r.score == 0.0));
    }

    #[test]
    fn test_is_zero_vector() {
        assert!(is_zero_vector(&[0.0, 0.0, -0.0]));
        assert!(!is_zero_vector(&[0.0, 1e-6]));
    }

    #[tokio::test]
    async fn test_empty_index_returns_nothing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("db");

        LanceDbIndex::create(&path, 4, &[]).await.unwrap();
        let index = LanceDbIndex::open(&path, 4).await.unwrap();

        assert_eq!(index.len().await.unwrap(), 0);
        assert!(index.search(&[1.0, 0.0, 0.0, 0.0], 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_open_with_wrong_dimensions() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("db");

        LanceDbIndex::create(&path, 2, &[entry("a.txt", "a", vec![1.0, 0.0])])
            .await
            .unwrap();

        let result = LanceDbIndex::open(&path, 8).await;
        assert!(result.unwrap_err().to_string().contains("dimension mismatch"));
    }

    #[tokio::test]
    async fn test_open_missing_directory() {
        let temp = TempDir::new().unwrap();
        let result = LanceDbIndex::open(&temp.path().join("missing"), 2).await;
        assert!(matches!(result, Err(AppError::Index(_))));
    }
}
