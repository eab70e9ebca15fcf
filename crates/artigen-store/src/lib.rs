//! Artigen Storage Layer
//!
//! A keyed document repository with two interchangeable backends: one JSON
//! file per document, or one SQLite row per document. Projects and prompt
//! templates each get their own namespace through [`StoreFactory`].

pub mod document;
pub mod error;
pub mod json;
pub mod migrations;
pub mod namespace;
pub mod sqlite;

pub use document::{Criteria, Document, WILDCARD};
pub use error::{StoreError, StoreResult};
pub use json::JsonDocumentStore;
pub use namespace::{StoreFactory, PROMPT_NAMESPACE};
pub use sqlite::{SqliteDb, SqliteDocumentStore};

/// Backend-agnostic repository contract.
///
/// Every backend guarantees that a failed `save` leaves the previously
/// stored document readable and unchanged.
pub trait DocumentStore: Send + Sync {
    /// Namespace (project name or `prompts`) this store is scoped to.
    fn namespace(&self) -> &str;

    /// Write or fully replace `doc`, returning its id.
    fn save(&self, doc: &Document) -> StoreResult<String>;

    /// Load a document. A missing id is `Ok(None)`, not an error.
    fn load(&self, id: &str) -> StoreResult<Option<Document>>;

    /// Remove a document, returning whether one existed.
    fn delete(&self, id: &str) -> StoreResult<bool>;

    /// Every document currently stored, ordered by id.
    fn list(&self) -> StoreResult<Vec<Document>>;

    /// Documents satisfying all `criteria`. Empty criteria is equivalent to [`list`](Self::list).
    fn find_by(&self, criteria: &Criteria) -> StoreResult<Vec<Document>>;

    fn exists(&self, id: &str) -> StoreResult<bool> {
        Ok(self.load(id)?.is_some())
    }
}
