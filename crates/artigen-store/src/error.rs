//! Storage error types.

use thiserror::Error;

/// Errors raised by any [`DocumentStore`](crate::DocumentStore) backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt document '{id}': {reason}")]
    Corrupt { id: String, reason: String },

    #[error("Store lock poisoned: {0}")]
    Poisoned(String),
}

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Whether the failure came from the backing medium (disk or database)
    /// rather than from the caller's input.
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            Self::Io(_) | Self::Sqlite(_) | Self::Migration(_) | Self::Poisoned(_)
        )
    }
}
