//! Configuration management for simsearch.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Built-in defaults
//! - Config file (`simsearch.yaml` in the workspace, or an explicit path)
//! - Environment variables
//! - Command-line flags
//!
//! Later sources override earlier ones. Relative directories resolve against
//! the workspace root.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};
use crate::logging::LogFormat;

/// Default directory scanned by the index builder.
pub const DEFAULT_INPUT_DIR: &str = "landingai_output";

/// Default directory holding the persisted vector index.
pub const DEFAULT_INDEX_DIR: &str = "vector_db";

/// Default config file name, looked up in the workspace root.
pub const DEFAULT_CONFIG_FILE: &str = "simsearch.yaml";

/// Environment variable carrying the shared API key.
pub const API_KEY_ENV: &str = "RAG_API_KEY";

/// Embedding providers understood by the index crate.
pub const KNOWN_PROVIDERS: [&str; 2] = ["trigram", "ollama"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Directory of pre-chunked `.txt` files
    pub input_dir: PathBuf,

    /// Directory the vector index is written to and loaded from
    pub index_dir: PathBuf,

    /// Embedding function shared by builder and service
    pub embedding: EmbeddingSettings,

    /// HTTP service settings
    pub server: ServerSettings,

    /// Log level override
    pub log_level: Option<String>,

    /// Log line format
    pub log_format: LogFormat,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Embedding function settings.
///
/// Builder and service must agree on these; the index manifest records the
/// values used at build time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingSettings {
    /// Provider name: "trigram" or "ollama"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Whether to L2-normalize embeddings
    pub normalize: bool,

    /// Provider endpoint (Ollama base URL)
    pub endpoint: Option<String>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 384,
            normalize: true,
            endpoint: None,
        }
    }
}

/// HTTP service settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Bind address
    pub host: String,

    /// Bind port
    pub port: u16,

    /// Pre-shared key expected in the `X-API-Key` header
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            api_key: None,
        }
    }
}

// Keeps the secret out of debug logs.
impl fmt::Debug for ServerSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    input_dir: Option<String>,
    index_dir: Option<String>,
    embedding: Option<EmbeddingFile>,
    server: Option<ServerFile>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct EmbeddingFile {
    provider: Option<String>,
    model: Option<String>,
    dimensions: Option<usize>,
    normalize: Option<bool>,
    endpoint: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ServerFile {
    host: Option<String>,
    port: Option<u16>,
    api_key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    format: Option<LogFormat>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            index_dir: PathBuf::from(DEFAULT_INDEX_DIR),
            embedding: EmbeddingSettings::default(),
            server: ServerSettings::default(),
            log_level: None,
            log_format: LogFormat::default(),
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the config file and the environment.
    ///
    /// `workspace` and `config_file` come from the command line when given;
    /// otherwise `SIMSEARCH_WORKSPACE` and `SIMSEARCH_CONFIG` are consulted.
    ///
    /// Environment variables:
    /// - `SIMSEARCH_WORKSPACE`: Override workspace path
    /// - `SIMSEARCH_CONFIG`: Path to config file
    /// - `SIMSEARCH_INPUT_DIR`, `SIMSEARCH_INDEX_DIR`: Builder/service directories
    /// - `SIMSEARCH_EMBEDDING_PROVIDER`, `SIMSEARCH_EMBEDDING_MODEL`: Embedding function
    /// - `OLLAMA_URL`: Ollama endpoint
    /// - `SIMSEARCH_HOST`, `SIMSEARCH_PORT`: Bind address
    /// - `RAG_API_KEY`: Shared API key
    /// - `RUST_LOG`: Log level
    /// - `SIMSEARCH_LOG_FORMAT`: `text` or `json`
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use simsearch_core::config::AppConfig;
    ///
    /// let config = AppConfig::load(None, None).expect("Failed to load config");
    /// println!("Index: {:?}", config.index_path());
    /// ```
    pub fn load(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        Self::load_with(workspace, config_file, |key| std::env::var(key).ok())
    }

    /// Same as [`AppConfig::load`] with an explicit environment lookup.
    pub fn load_with<F>(
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        env: F,
    ) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(workspace) = workspace.or_else(|| env("SIMSEARCH_WORKSPACE").map(PathBuf::from))
        {
            config.workspace = workspace;
        }

        config.config_file = config_file.or_else(|| env("SIMSEARCH_CONFIG").map(PathBuf::from));

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.workspace.join(DEFAULT_CONFIG_FILE),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file not found: {:?}",
                config_path
            )));
        }

        // Environment variables override YAML config
        if let Some(dir) = env("SIMSEARCH_INPUT_DIR") {
            config.input_dir = PathBuf::from(dir);
        }

        if let Some(dir) = env("SIMSEARCH_INDEX_DIR") {
            config.index_dir = PathBuf::from(dir);
        }

        if let Some(provider) = env("SIMSEARCH_EMBEDDING_PROVIDER") {
            config.embedding.provider = provider;
        }

        if let Some(model) = env("SIMSEARCH_EMBEDDING_MODEL") {
            config.embedding.model = model;
        }

        if let Some(url) = env("OLLAMA_URL") {
            config.embedding.endpoint = Some(url);
        }

        if let Some(host) = env("SIMSEARCH_HOST") {
            config.server.host = host;
        }

        if let Some(port) = env("SIMSEARCH_PORT") {
            config.server.port = port
                .parse()
                .map_err(|e| AppError::Config(format!("Invalid SIMSEARCH_PORT '{}': {}", port, e)))?;
        }

        if let Some(key) = env(API_KEY_ENV) {
            config.server.api_key = Some(key);
        }

        if let Some(level) = env("RUST_LOG") {
            config.log_level = Some(level);
        }

        if let Some(format) = env("SIMSEARCH_LOG_FORMAT") {
            config.log_format = format.parse()?;
        }

        if env("NO_COLOR").is_some() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(dir) = config_file.input_dir {
            result.input_dir = PathBuf::from(dir);
        }

        if let Some(dir) = config_file.index_dir {
            result.index_dir = PathBuf::from(dir);
        }

        if let Some(embedding) = config_file.embedding {
            if let Some(provider) = embedding.provider {
                result.embedding.provider = provider;
            }
            if let Some(model) = embedding.model {
                result.embedding.model = model;
            }
            if let Some(dimensions) = embedding.dimensions {
                result.embedding.dimensions = dimensions;
            }
            if let Some(normalize) = embedding.normalize {
                result.embedding.normalize = normalize;
            }
            if embedding.endpoint.is_some() {
                result.embedding.endpoint = embedding.endpoint;
            }
        }

        if let Some(server) = config_file.server {
            if let Some(host) = server.host {
                result.server.host = host;
            }
            if let Some(port) = server.port {
                result.server.port = port;
            }
            if server.api_key.is_some() {
                result.server.api_key = server.api_key;
            }
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(format) = logging.format {
                result.log_format = format;
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        tracing::debug!("Merged config file {:?}", path);
        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over environment variables and
    /// the config file.
    pub fn with_overrides(
        mut self,
        log_level: Option<String>,
        log_format: Option<LogFormat>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if let Some(log_format) = log_format {
            self.log_format = log_format;
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Input directory, resolved against the workspace.
    pub fn input_path(&self) -> PathBuf {
        self.resolve(&self.input_dir)
    }

    /// Index directory, resolved against the workspace.
    pub fn index_path(&self) -> PathBuf {
        self.resolve(&self.index_dir)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace.join(path)
        }
    }

    /// Return the configured API key, failing when none is set.
    ///
    /// There is no fallback value; `serve` refuses to start without one.
    pub fn require_api_key(&self) -> AppResult<&str> {
        match self.server.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(AppError::Config(format!(
                "API key is not configured. Set {} or server.api_key in {}",
                API_KEY_ENV, DEFAULT_CONFIG_FILE
            ))),
        }
    }

    /// Validate the embedding and server settings.
    pub fn validate(&self) -> AppResult<()> {
        let provider = self.embedding.provider.as_str();
        if !KNOWN_PROVIDERS.contains(&provider) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if self.embedding.dimensions == 0 {
            return Err(AppError::Config(
                "Embedding dimensions must be greater than zero".to_string(),
            ));
        }

        if self.embedding.model.trim().is_empty() {
            return Err(AppError::Config("Embedding model must not be empty".to_string()));
        }

        Ok(())
    }
}
