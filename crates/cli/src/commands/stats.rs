//! Stats command handler.
//!
//! Shows how the persisted index was built.

use clap::Args;
use simsearch_core::{config::AppConfig, AppResult};

/// Show index statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing stats command");

        let index_dir = config.index_path();
        let stats = simsearch_index::index_stats(&index_dir).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        } else {
            println!("Index: {}", index_dir.display());
            println!("Documents: {}", stats.documents_count);
            println!("Embedding: {} / {} ({} dims)", stats.provider, stats.model, stats.dimensions);
            println!("Built at: {}", stats.built_at.to_rfc3339());
        }

        Ok(())
    }
}
