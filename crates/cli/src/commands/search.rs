//! Search command handler.
//!
//! Queries the persisted index locally, without going through the API.

use clap::Args;
use simsearch_core::{config::AppConfig, AppResult};
use simsearch_index::{open_retriever, EmbeddingConfig, Retriever, DEFAULT_TOP_K};

/// Query the index from the command line
#[derive(Args, Debug)]
pub struct SearchCommand {
    /// Query text
    pub prompt: String,

    /// Number of documents to retrieve
    #[arg(short = 'k', long, default_value_t = DEFAULT_TOP_K)]
    pub top_k: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SearchCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing search command");

        let embedding = EmbeddingConfig::from(&config.embedding);
        let retriever = open_retriever(&config.index_path(), &embedding, self.top_k).await?;
        let results = retriever.retrieve(&self.prompt).await?;

        if self.json {
            let output: Vec<_> = results
                .iter()
                .map(|r| {
                    serde_json::json!({
                        "source": r.document.metadata.source,
                        "content": r.document.content,
                        "score": r.score,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else if results.is_empty() {
            println!("No documents found.");
        } else {
            for (rank, result) in results.iter().enumerate() {
                println!(
                    "{}. {} (score {:.3})",
                    rank + 1,
                    result.document.metadata.source,
                    result.score
                );
                println!("   {}", preview(&result.document.content, 160));
            }
        }

        Ok(())
    }
}

/// First `max_chars` characters of `text` on one line.
fn preview(text: &str, max_chars: usize) -> String {
    let flat: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let cut: String = flat.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_flattens_whitespace() {
        assert_eq!(preview("a\n  b\tc", 10), "a b c");
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        assert_eq!(preview("héllo wörld", 4), "héll...");
    }
}
