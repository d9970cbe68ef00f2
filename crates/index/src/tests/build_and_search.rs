//! Build an index from text files and query it back.

use crate::builder::build_index;
use crate::embeddings::providers::trigram::TrigramProvider;
use crate::embeddings::EmbeddingConfig;
use crate::progress::ProgressReporter;
use crate::retriever::{index_stats, open_retriever, Retriever, DEFAULT_TOP_K};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_corpus(dir: &Path) {
    fs::create_dir_all(dir).unwrap();
    fs::write(
        dir.join("invoice_001.txt"),
        "Invoice total amount due 1,250 USD payable within thirty days",
    )
    .unwrap();
    fs::write(
        dir.join("lease_agreement.txt"),
        "The tenant shall pay monthly rent and maintain the apartment",
    )
    .unwrap();
    fs::write(
        dir.join("medical_report.txt"),
        "Patient blood pressure measured normal during the examination",
    )
    .unwrap();
    fs::write(
        dir.join("shipping_manifest.txt"),
        "Container shipment of electronics departing harbor on Monday",
    )
    .unwrap();
    fs::write(dir.join("summary.md"), "Invoice invoice invoice").unwrap();
}

async fn build(input: &Path, index: &Path, config: &EmbeddingConfig) {
    let provider = TrigramProvider::new(config.dimensions, config.normalize);
    build_index(input, index, config, &provider, &ProgressReporter::noop())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_query_returns_top_three_in_rank_order() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("landingai_output");
    let index = temp.path().join("vector_db");
    write_corpus(&input);

    let config = EmbeddingConfig::default();
    build(&input, &index, &config).await;

    let retriever = open_retriever(&index, &config, DEFAULT_TOP_K).await.unwrap();
    let results = retriever.retrieve("invoice amount due").await.unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].document.metadata.source, "invoice_001.txt");
    assert!(results[0].document.content.starts_with("Invoice total"));
    assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    assert!(results
        .iter()
        .all(|r| r.document.metadata.source.ends_with(".txt")));
}

#[tokio::test]
async fn test_identical_queries_return_identical_results() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("input");
    let index = temp.path().join("index");
    write_corpus(&input);

    let config = EmbeddingConfig::default();
    build(&input, &index, &config).await;

    let retriever = open_retriever(&index, &config, DEFAULT_TOP_K).await.unwrap();
    let first = retriever.retrieve("monthly rent").await.unwrap();
    let second = retriever.retrieve("monthly rent").await.unwrap();

    let sources = |r: &[crate::types::ScoredDocument]| -> Vec<String> {
        r.iter().map(|d| d.document.metadata.source.clone()).collect()
    };
    assert_eq!(sources(&first), sources(&second));
    assert_eq!(first[0].document.metadata.source, "lease_agreement.txt");
}

fn sources(results: &[crate::types::ScoredDocument]) -> Vec<&str> {
    results
        .iter()
        .map(|r| r.document.metadata.source.as_str())
        .collect()
}

#[tokio::test]
async fn test_empty_prompt_returns_first_three_by_file_name() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("input");
    let index = temp.path().join("index");
    write_corpus(&input);

    let config = EmbeddingConfig::default();
    build(&input, &index, &config).await;

    let retriever = open_retriever(&index, &config, DEFAULT_TOP_K).await.unwrap();
    let first = retriever.retrieve("").await.unwrap();
    let second = retriever.retrieve("").await.unwrap();

    assert_eq!(
        sources(&first),
        vec!["invoice_001.txt", "lease_agreement.txt", "medical_report.txt"]
    );
    assert_eq!(sources(&first), sources(&second));
    assert!(first.iter().all(|r| r.score == 0.0));
}

#[tokio::test]
async fn test_stop_word_prompt_behaves_like_empty_prompt() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("input");
    let index = temp.path().join("index");
    write_corpus(&input);

    let config = EmbeddingConfig::default();
    build(&input, &index, &config).await;

    let retriever = open_retriever(&index, &config, DEFAULT_TOP_K).await.unwrap();
    let results = retriever.retrieve("the is a of").await.unwrap();

    assert_eq!(
        sources(&results),
        vec!["invoice_001.txt", "lease_agreement.txt", "medical_report.txt"]
    );
    assert!(results.iter().all(|r| r.score.is_finite()));
}

#[tokio::test]
async fn test_stop_word_document_never_outranks_a_match() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("input");
    let index = temp.path().join("index");
    write_corpus(&input);
    fs::write(input.join("aaa_blank.txt"), "it is a the").unwrap();

    let config = EmbeddingConfig::default();
    build(&input, &index, &config).await;

    let retriever = open_retriever(&index, &config, DEFAULT_TOP_K).await.unwrap();
    let results = retriever.retrieve("container shipment harbor").await.unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].document.metadata.source, "shipping_manifest.txt");
    assert!(results.iter().all(|r| r.score.is_finite()));
}

#[tokio::test]
async fn test_small_corpus_returns_all_documents() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("input");
    let index = temp.path().join("index");
    fs::create_dir_all(&input).unwrap();
    fs::write(input.join("a.txt"), "apples and pears").unwrap();
    fs::write(input.join("b.txt"), "bananas").unwrap();

    let config = EmbeddingConfig::default();
    build(&input, &index, &config).await;

    let retriever = open_retriever(&index, &config, DEFAULT_TOP_K).await.unwrap();
    let results = retriever.retrieve("fruit").await.unwrap();
    assert_eq!(results.len(), 2);
}

#[tokio::test]
async fn test_empty_index_returns_no_results() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("input");
    let index = temp.path().join("index");
    fs::create_dir_all(&input).unwrap();

    let config = EmbeddingConfig::default();
    build(&input, &index, &config).await;

    let retriever = open_retriever(&index, &config, DEFAULT_TOP_K).await.unwrap();
    assert!(retriever.retrieve("anything").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_open_with_different_config_fails() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("input");
    let index = temp.path().join("index");
    write_corpus(&input);

    let config = EmbeddingConfig::default();
    build(&input, &index, &config).await;

    let other = EmbeddingConfig {
        dimensions: 128,
        ..config
    };
    let err = open_retriever(&index, &other, DEFAULT_TOP_K)
        .await
        .err()
        .unwrap();
    assert!(err.to_string().contains("Dimension mismatch"));
}

#[tokio::test]
async fn test_stats_reflect_build() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("input");
    let index = temp.path().join("index");
    write_corpus(&input);

    build(&input, &index, &EmbeddingConfig::default()).await;

    let stats = index_stats(&index).await.unwrap();
    assert_eq!(stats.documents_count, 4);
    assert_eq!(stats.provider, "trigram");
    assert_eq!(stats.model, "trigram-v1");
    assert_eq!(stats.dimensions, 384);
}
