//! Error types for index generation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while generating indexes.
#[derive(Debug, Error)]
pub enum IndexerError {
    /// Invalid or incomplete configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// A glob pattern could not be compiled
    #[error("Invalid glob pattern '{pattern}': {source}")]
    Glob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// Walking or reading the source tree failed
    #[error("Discovery failed under {root}: {message}")]
    Discovery { root: PathBuf, message: String },

    /// Creating a directory or replacing an index file failed
    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// I/O error outside of index writes
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The decision provider could not answer
    #[error("Prompt failed: {0}")]
    Prompt(String),
}

impl IndexerError {
    pub fn config(message: impl Into<String>) -> Self {
        IndexerError::Config(message.into())
    }
}

pub type Result<T> = std::result::Result<T, IndexerError>;
