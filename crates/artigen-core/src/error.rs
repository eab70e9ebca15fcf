//! Centralized error types for Artigen.

use thiserror::Error;

/// Main error type for Artigen operations.
#[derive(Error, Debug)]
pub enum ArtigenError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("No prompt template found for artifact type '{artifact_type}'")]
    NoTemplate { artifact_type: String },

    #[error("No context found for artifact type '{artifact_type}'")]
    NoContext { artifact_type: String },

    #[error("Storage error: {0}")]
    Storage(#[from] artigen_store::StoreError),

    #[error("Generation service error: {0}")]
    Transport(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for Artigen operations.
pub type ArtigenResult<T> = Result<T, ArtigenError>;

impl ArtigenError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create a transport error.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }
}
