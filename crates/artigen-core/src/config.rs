//! Configuration loaded from `artigen.toml`.
//!
//! ```toml
//! data_dir = "db"
//! backend = "sqlite"            # or "json" (default)
//! sqlite_path = "db/artigen.db" # optional
//!
//! [generation]
//! base_url = "https://llm.example.com"
//! endpoint = "/v1/generate"
//! auth = { type = "bearer", token = "..." }
//! ```
//!
//! `ARTIGEN_DATA_DIR` and `ARTIGEN_BACKEND` override the file.

use std::path::{Path, PathBuf};

use artigen_store::{SqliteDb, StoreFactory};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ArtigenError, ArtigenResult};
use crate::generation::client::{HttpGenerationClient, ServiceConfig};

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "artigen.toml";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Json,
    Sqlite,
}

impl StorageBackend {
    pub fn parse(s: &str) -> ArtigenResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" | "file" => Ok(Self::Json),
            "sqlite" | "sql" => Ok(Self::Sqlite),
            other => Err(ArtigenError::Config(format!("Unknown storage backend: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtigenConfig {
    pub data_dir: PathBuf,
    pub backend: StorageBackend,
    pub sqlite_path: Option<PathBuf>,
    pub generation: Option<ServiceConfig>,
}

impl Default for ArtigenConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("db"),
            backend: StorageBackend::default(),
            sqlite_path: None,
            generation: None,
        }
    }
}

impl ArtigenConfig {
    /// Load from `path`, or from `artigen.toml` if it exists, then apply
    /// environment overrides. An explicit path must exist.
    pub fn load(path: Option<&Path>) -> ArtigenResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(CONFIG_FILE).is_file() => Self::from_file(Path::new(CONFIG_FILE))?,
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> ArtigenResult<Self> {
        let text = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), "Loaded configuration");
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> ArtigenResult<Self> {
        toml::from_str(text).map_err(|e| ArtigenError::Config(e.to_string()))
    }

    /// Apply `ARTIGEN_*` overrides read through `get`.
    pub fn apply_overrides(&mut self, get: impl Fn(&str) -> Option<String>) -> ArtigenResult<()> {
        if let Some(dir) = get("ARTIGEN_DATA_DIR").filter(|v| !v.is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(backend) = get("ARTIGEN_BACKEND").filter(|v| !v.is_empty()) {
            self.backend = StorageBackend::parse(&backend)?;
        }
        Ok(())
    }

    /// SQLite database file.
    pub fn sqlite_path(&self) -> PathBuf {
        self.sqlite_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join("artigen.db"))
    }

    /// Store factory for the configured backend.
    pub fn open_stores(&self) -> ArtigenResult<StoreFactory> {
        let factory = match self.backend {
            StorageBackend::Json => StoreFactory::json(&self.data_dir)?,
            StorageBackend::Sqlite => StoreFactory::sqlite(SqliteDb::open(self.sqlite_path())?),
        };
        Ok(factory)
    }

    /// HTTP client for the `[generation]` section.
    pub fn generation_client(&self) -> ArtigenResult<HttpGenerationClient> {
        let service = self.generation.clone().ok_or_else(|| {
            ArtigenError::Config("No [generation] service configured".to_string())
        })?;
        HttpGenerationClient::new(service)
    }
}
