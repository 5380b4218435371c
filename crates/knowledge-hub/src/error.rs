//! Error types for ingestion, storage and retrieval

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for knowledge-hub operations
pub type Result<T> = std::result::Result<T, Error>;

/// Knowledge hub errors
#[derive(Debug, Error)]
pub enum Error {
    /// Input path is neither a file nor a directory
    #[error("Path not found: {}", .0.display())]
    PathNotFound(PathBuf),

    /// Input path has no final segment to name a collection after
    #[error("Cannot derive a collection name from {}", .0.display())]
    NoCollectionName(PathBuf),

    /// No loader is registered for the extension
    #[error("Unsupported file format: '{extension}'")]
    UnsupportedFormat { extension: String },

    /// A loader failed to read the file
    #[error("Failed to parse file '{path}': {message}")]
    FileParse { path: String, message: String },

    /// Embedding error
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Vector index read or write failure
    #[error("Vector index error: {0}")]
    VectorIndex(String),

    /// Record log read or write failure
    #[error("Record log error: {0}")]
    RecordLog(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an unsupported format error
    pub fn unsupported(extension: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            extension: extension.into(),
        }
    }

    /// Create a file parse error
    pub fn file_parse(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FileParse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create a vector index error
    pub fn vector_index(message: impl Into<String>) -> Self {
        Self::VectorIndex(message.into())
    }

    /// Create a record log error
    pub fn record_log(message: impl Into<String>) -> Self {
        Self::RecordLog(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether this error must abort a directory ingestion.
    ///
    /// Format and parse failures only affect the file being loaded; anything
    /// touching the embedding service, the vector index or the record log
    /// means the collection itself is unhealthy.
    pub fn is_fatal_for_directory(&self) -> bool {
        !matches!(self, Error::UnsupportedFormat { .. } | Error::FileParse { .. })
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}
