//! Serve command handler.

use clap::Args;
use simsearch_core::{config::AppConfig, AppResult};

/// Run the similarity search API
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Address to bind (default: 127.0.0.1)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (default: 8000)
    #[arg(short, long)]
    pub port: Option<u16>,
}

impl ServeCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing serve command");

        let mut config = config.clone();
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }

        simsearch_server::serve(&config).await
    }
}
