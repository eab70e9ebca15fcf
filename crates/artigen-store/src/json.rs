//! File-backed document store.
//!
//! Layout: one directory per namespace, one pretty-printed `<id>.json` file
//! per document. `list` and `find_by` read every file in the directory;
//! there is no index, so queries are O(n) in the number of documents.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::Value;
use tracing::debug;

use crate::document::{validate_key, Criteria, Document};
use crate::error::{StoreError, StoreResult};
use crate::DocumentStore;

/// A namespace stored as a directory of JSON files.
#[derive(Debug)]
pub struct JsonDocumentStore {
    dir: PathBuf,
    namespace: String,
    write_lock: Mutex<()>,
}

impl JsonDocumentStore {
    /// Open (creating if needed) the store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let namespace = dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            dir,
            namespace,
            write_lock: Mutex::new(()),
        })
    }

    /// Directory holding this namespace's files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> StoreResult<PathBuf> {
        validate_key("document id", id)?;
        Ok(self.dir.join(format!("{}.json", id)))
    }

    fn temp_path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!(".{}.json.tmp", id))
    }

    fn read_document(path: &Path, id: &str) -> StoreResult<Option<Document>> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let value: Value = serde_json::from_str(&text).map_err(|e| StoreError::Corrupt {
            id: id.to_string(),
            reason: e.to_string(),
        })?;

        Document::from_value(value)
            .map(Some)
            .map_err(|e| StoreError::Corrupt {
                id: id.to_string(),
                reason: e.to_string(),
            })
    }

    /// Write to a hidden sibling, flush, then rename over the target.
    fn atomic_write(&self, id: &str, target: &Path, data: &[u8]) -> StoreResult<()> {
        let tmp = self.temp_path_for(id);

        let result = (|| -> std::io::Result<()> {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(data)?;
            file.sync_all()?;
            fs::rename(&tmp, target)
        })();

        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        result.map_err(StoreError::from)
    }

    fn lock(&self) -> StoreResult<std::sync::MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| StoreError::Poisoned(self.namespace.clone()))
    }
}

impl DocumentStore for JsonDocumentStore {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn save(&self, doc: &Document) -> StoreResult<String> {
        doc.validate()?;
        let path = self.path_for(&doc.id)?;
        let json = serde_json::to_string_pretty(doc)?;

        let _guard = self.lock()?;
        self.atomic_write(&doc.id, &path, json.as_bytes())?;

        debug!(namespace = %self.namespace, id = %doc.id, "Saved document");
        Ok(doc.id.clone())
    }

    fn load(&self, id: &str) -> StoreResult<Option<Document>> {
        let path = self.path_for(id)?;
        Self::read_document(&path, id)
    }

    fn delete(&self, id: &str) -> StoreResult<bool> {
        let path = self.path_for(id)?;
        let _guard = self.lock()?;

        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(namespace = %self.namespace, id, "Deleted document");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self) -> StoreResult<Vec<Document>> {
        let mut docs = Vec::new();

        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }

            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with('.') {
                continue;
            }
            let Some(id) = name.strip_suffix(".json") else {
                continue;
            };

            if let Some(doc) = Self::read_document(&entry.path(), id)? {
                docs.push(doc);
            }
        }

        docs.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(docs)
    }

    fn find_by(&self, criteria: &Criteria) -> StoreResult<Vec<Document>> {
        let mut docs = self.list()?;
        docs.retain(|doc| criteria.matches(doc));
        Ok(docs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn store() -> (TempDir, JsonDocumentStore) {
        let tmp = TempDir::new().unwrap();
        let store = JsonDocumentStore::open(tmp.path().join("demo")).unwrap();
        (tmp, store)
    }

    #[test]
    fn test_round_trip() {
        let (_tmp, store) = store();
        let doc = Document::keyed("Questionnaire", vec![json!({"purpose": "x"})]);

        let id = store.save(&doc).unwrap();
        assert_eq!(id, "Questionnaire");
        assert_eq!(store.load("Questionnaire").unwrap(), Some(doc));
        assert_eq!(store.namespace(), "demo");
    }

    #[test]
    fn test_save_overwrites() {
        let (_tmp, store) = store();
        store
            .save(&Document::keyed("Documentation", vec![json!({"v": 1})]))
            .unwrap();
        let second = Document::keyed("Documentation", vec![json!({"v": 2})]);
        store.save(&second).unwrap();

        assert_eq!(store.load("Documentation").unwrap(), Some(second));
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn test_file_format() {
        let (_tmp, store) = store();
        store
            .save(&Document::keyed("Documentation", vec![json!({"text": "t"})]))
            .unwrap();

        let text = fs::read_to_string(store.dir().join("Documentation.json")).unwrap();
        assert!(text.contains('\n'), "expected pretty-printed JSON");
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            value,
            json!({"id": "Documentation", "type": "Documentation", "content": [{"text": "t"}]})
        );
    }

    #[test]
    fn test_missing_key_is_none() {
        let (_tmp, store) = store();
        assert_eq!(store.load("Architecture").unwrap(), None);
        assert!(!store.exists("Architecture").unwrap());
    }

    #[test]
    fn test_save_rejects_missing_id() {
        let (_tmp, store) = store();
        let doc = Document::keyed("", vec![]);
        assert!(matches!(store.save(&doc), Err(StoreError::Validation(_))));
    }

    #[test]
    fn test_delete() {
        let (_tmp, store) = store();
        store.save(&Document::keyed("Requirements", vec![])).unwrap();

        assert!(store.delete("Requirements").unwrap());
        assert!(!store.delete("Requirements").unwrap());
        assert_eq!(store.load("Requirements").unwrap(), None);
    }

    #[test]
    fn test_find_by() {
        let (_tmp, store) = store();
        store.save(&Document::keyed("Questionnaire", vec![])).unwrap();
        store.save(&Document::keyed("Documentation", vec![])).unwrap();
        let mut template = Document::keyed("doc-1", vec![]);
        template.doc_type = "Documentation".to_string();
        store.save(&template).unwrap();

        assert_eq!(store.find_by(&Criteria::new()).unwrap(), store.list().unwrap());

        let found = store.find_by(&Criteria::by_type("Documentation")).unwrap();
        let ids: Vec<_> = found.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["Documentation", "doc-1"]);
    }

    #[test]
    fn test_list_skips_foreign_files() {
        let (_tmp, store) = store();
        store.save(&Document::keyed("Questionnaire", vec![])).unwrap();
        fs::write(store.dir().join("notes.txt"), "hello").unwrap();
        fs::write(store.dir().join(".Documentation.json.tmp"), "{").unwrap();

        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let (_tmp, store) = store();
        fs::write(store.dir().join("Documentation.json"), "{ not json").unwrap();

        assert!(matches!(
            store.load("Documentation"),
            Err(StoreError::Corrupt { .. })
        ));
        assert!(store.list().is_err());
    }

    #[test]
    fn test_failed_write_keeps_previous_document() {
        let (_tmp, store) = store();
        let original = Document::keyed("Documentation", vec![json!({"v": 1})]);
        store.save(&original).unwrap();

        // A directory squatting on the temp path makes the write fail.
        fs::create_dir(store.dir().join(".Documentation.json.tmp")).unwrap();

        let err = store
            .save(&Document::keyed("Documentation", vec![json!({"v": 2})]))
            .unwrap_err();
        assert!(err.is_io());
        assert_eq!(store.load("Documentation").unwrap(), Some(original));
    }
}
