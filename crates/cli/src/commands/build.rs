//! Build command handler.
//!
//! Embeds every `.txt` file of the input directory into the vector index.

use clap::Args;
use simsearch_core::{config::AppConfig, AppResult};
use simsearch_index::{build_index, create_provider, EmbeddingConfig, ProgressReporter};
use std::path::PathBuf;
use std::sync::Arc;

/// Build the vector index from text files
#[derive(Args, Debug)]
pub struct BuildCommand {
    /// Directory containing the .txt files (default: landingai_output)
    #[arg(long)]
    pub input_dir: Option<PathBuf>,

    /// Directory to write the index to (default: vector_db)
    #[arg(long)]
    pub index_dir: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl BuildCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing build command");

        let mut config = config.clone();
        if let Some(dir) = &self.input_dir {
            config.input_dir = dir.clone();
        }
        if let Some(dir) = &self.index_dir {
            config.index_dir = dir.clone();
        }

        let input_dir = config.input_path();
        let index_dir = config.index_path();
        let embedding = EmbeddingConfig::from(&config.embedding);

        let provider = create_provider(&embedding).await?;

        let reporter = if self.json {
            ProgressReporter::noop()
        } else {
            ProgressReporter::new(Arc::new(|event| println!("{}", event.format_simple())))
        };

        let stats =
            build_index(&input_dir, &index_dir, &embedding, provider.as_ref(), &reporter).await?;

        if self.json {
            let output = serde_json::json!({
                "inputDir": input_dir,
                "indexDir": index_dir,
                "documentsCount": stats.documents_count,
                "bytesProcessed": stats.bytes_processed,
                "durationSecs": stats.duration_secs,
                "provider": embedding.provider,
                "model": embedding.model,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!(
                "Indexed {} documents ({} bytes) into {} in {:.2}s",
                stats.documents_count,
                stats.bytes_processed,
                index_dir.display(),
                stats.duration_secs
            );
        }

        Ok(())
    }
}
