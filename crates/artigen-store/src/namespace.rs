//! Namespaced store construction.
//!
//! A project's content store and the global prompt store are both plain
//! [`DocumentStore`]s scoped to a namespace. The factory hands out one shared
//! instance per namespace, so repeated requests reuse the same directory or
//! table partition and the same writer lock.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::document::validate_key;
use crate::error::{StoreError, StoreResult};
use crate::json::JsonDocumentStore;
use crate::sqlite::{SqliteDb, SqliteDocumentStore};
use crate::DocumentStore;

/// Namespace reserved for prompt templates.
pub const PROMPT_NAMESPACE: &str = "prompts";

#[derive(Clone)]
enum Backend {
    Json { base_dir: PathBuf },
    Sqlite { db: SqliteDb },
}

/// Creates and caches namespaced stores for one backend.
#[derive(Clone)]
pub struct StoreFactory {
    backend: Backend,
    stores: Arc<Mutex<HashMap<String, Arc<dyn DocumentStore>>>>,
}

impl StoreFactory {
    /// File-backed stores under `base_dir/<namespace>/`.
    pub fn json(base_dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(&base_dir)?;
        Ok(Self::with_backend(Backend::Json { base_dir }))
    }

    /// SQLite-backed stores partitioned by namespace.
    pub fn sqlite(db: SqliteDb) -> Self {
        Self::with_backend(Backend::Sqlite { db })
    }

    fn with_backend(backend: Backend) -> Self {
        Self {
            backend,
            stores: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Base directory, for the file backend.
    pub fn base_dir(&self) -> Option<&Path> {
        match &self.backend {
            Backend::Json { base_dir } => Some(base_dir.as_path()),
            Backend::Sqlite { .. } => None,
        }
    }

    /// Store for an arbitrary namespace, created on first use.
    pub fn namespace(&self, name: &str) -> StoreResult<Arc<dyn DocumentStore>> {
        validate_key("namespace", name)?;

        let mut stores = self
            .stores
            .lock()
            .map_err(|_| StoreError::Poisoned("store registry".to_string()))?;

        if let Some(store) = stores.get(name) {
            return Ok(Arc::clone(store));
        }

        let store: Arc<dyn DocumentStore> = match &self.backend {
            Backend::Json { base_dir } => Arc::new(JsonDocumentStore::open(base_dir.join(name))?),
            Backend::Sqlite { db } => Arc::new(SqliteDocumentStore::new(db.clone(), name)?),
        };
        debug!(namespace = name, "Opened document store");

        stores.insert(name.to_string(), Arc::clone(&store));
        Ok(store)
    }

    /// Content store owned by the project called `project_name`.
    pub fn content_store(&self, project_name: &str) -> StoreResult<Arc<dyn DocumentStore>> {
        if project_name.trim().is_empty() {
            return Err(StoreError::validation("project name is required"));
        }
        if project_name == PROMPT_NAMESPACE {
            return Err(StoreError::validation(format!(
                "'{}' is reserved and cannot be used as a project name",
                PROMPT_NAMESPACE
            )));
        }
        self.namespace(project_name)
    }

    /// The process-wide prompt template store.
    pub fn prompt_store(&self) -> StoreResult<Arc<dyn DocumentStore>> {
        self.namespace(PROMPT_NAMESPACE)
    }

    /// Project namespaces that exist in the backend.
    ///
    /// For SQLite a namespace only exists once it holds a document.
    pub fn list_projects(&self) -> StoreResult<Vec<String>> {
        let mut names = match &self.backend {
            Backend::Json { base_dir } => {
                let mut names = Vec::new();
                for entry in std::fs::read_dir(base_dir)? {
                    let entry = entry?;
                    if entry.file_type()?.is_dir() {
                        names.push(entry.file_name().to_string_lossy().into_owned());
                    }
                }
                names
            }
            Backend::Sqlite { db } => db.namespaces()?,
        };

        names.retain(|name| name != PROMPT_NAMESPACE && !name.starts_with('.'));
        names.sort();
        Ok(names)
    }

    /// Whether a project namespace already exists. Never creates one.
    pub fn project_exists(&self, project_name: &str) -> StoreResult<bool> {
        Ok(self.list_projects()?.iter().any(|name| name == project_name))
    }
}
