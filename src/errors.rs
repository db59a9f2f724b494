//! Error types for commrag
//!
//! Central error enum with context propagation. Pipeline orchestration code
//! uses `anyhow::Context` on top of these variants.

use thiserror::Error;

/// Main error type for the commrag pipeline
#[derive(Error, Debug)]
pub enum RagError {
    /// Document extraction errors (PDF parsing, unreadable files)
    #[error("Failed to extract {path}: {reason}")]
    Extraction { path: String, reason: String },

    /// Embedding model errors
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Vector database errors
    #[error("Vector store error: {0}")]
    VectorStore(String),

    /// Ollama API errors
    #[error("Ollama API error: {0}")]
    OllamaApi(String),

    /// Query blocked by safety screening
    #[error("Query blocked by safety screening: {0}")]
    SafetyBlocked(String),

    /// Evaluation harness errors
    #[error("Evaluation error: {0}")]
    Eval(String),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic errors with context
    #[error("{0}")]
    Generic(String),
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, RagError>;

impl From<anyhow::Error> for RagError {
    fn from(err: anyhow::Error) -> Self {
        RagError::Generic(err.to_string())
    }
}
