//! simsearch CLI
//!
//! Main entry point for the simsearch command-line tool.
//! Builds the vector index offline and serves similarity search over it.

mod commands;

use clap::{Parser, Subcommand};
use commands::{BuildCommand, SearchCommand, ServeCommand, StatsCommand};
use simsearch_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// simsearch - similarity search over pre-chunked text files
#[derive(Parser, Debug)]
#[command(name = "simsearch")]
#[command(about = "Similarity search over pre-chunked text files", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "SIMSEARCH_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file (default: <workspace>/simsearch.yaml)
    #[arg(short, long, global = true, env = "SIMSEARCH_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log line format (text, json)
    #[arg(long, global = true)]
    log_format: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the vector index from text files
    Build(BuildCommand),

    /// Run the similarity search API
    Serve(ServeCommand),

    /// Query the index from the command line
    Search(SearchCommand),

    /// Show index statistics
    Stats(StatsCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Defaults, config file and environment
    let config = AppConfig::load(cli.workspace, cli.config)?;

    // Apply CLI overrides
    let log_format = cli
        .log_format
        .as_deref()
        .map(str::parse::<logging::LogFormat>)
        .transpose()?;
    let config = config.with_overrides(cli.log_level, log_format, cli.verbose, cli.no_color);

    // Initialize logging with final configuration
    logging::init_logging(
        config.log_level.as_deref(),
        config.log_format,
        config.no_color,
    )?;

    tracing::info!("simsearch starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!(
        "Embedding: provider={}, model={}, dimensions={}",
        config.embedding.provider,
        config.embedding.model,
        config.embedding.dimensions
    );

    config.validate()?;

    let command_name = match &cli.command {
        Commands::Build(_) => "build",
        Commands::Serve(_) => "serve",
        Commands::Search(_) => "search",
        Commands::Stats(_) => "stats",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    // Route to command handlers
    let result = match cli.command {
        Commands::Build(cmd) => cmd.execute(&config).await,
        Commands::Serve(cmd) => cmd.execute(&config).await,
        Commands::Search(cmd) => cmd.execute(&config).await,
        Commands::Stats(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
