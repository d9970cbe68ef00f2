//! Error types for simsearch.
//!
//! This module defines a unified error enum covering configuration, I/O,
//! embedding, vector index and server failures.

use thiserror::Error;

/// Unified error type for simsearch.
///
/// Library functions return `Result<T, AppError>`; errors are represented
/// and propagated, never turned into panics.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Embedding provider errors
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Vector index errors (build, load, search)
    #[error("Index error: {0}")]
    Index(String),

    /// HTTP server errors
    #[error("Server error: {0}")]
    Server(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing dir");
        let err: AppError = io.into();
        assert!(matches!(err, AppError::Io(_)));
        assert!(err.to_string().contains("missing dir"));
    }

    #[test]
    fn test_yaml_error_conversion() {
        let parse: Result<Vec<u32>, _> = serde_yaml::from_str("not: [a list");
        let err: AppError = parse.unwrap_err().into();
        assert!(err.to_string().starts_with("Serialization error"));
    }
}
