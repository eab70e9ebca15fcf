//! SQLite-backed document store.
//!
//! All namespaces share one `documents` table; the `namespace` column is the
//! partition. Criteria on `id` and `type` map to columns, scalar criteria on
//! other fields map to `json_extract` over the stored body. Results are then
//! re-checked with [`Criteria::matches`] so both backends agree exactly.

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde_json::Value;
use tracing::debug;

use crate::document::{validate_key, Criteria, Document};
use crate::error::{StoreError, StoreResult};
use crate::migrations::run_migrations;
use crate::DocumentStore;

/// Shared SQLite connection. Cloning shares the connection; it is closed
/// when the last clone is dropped.
#[derive(Clone)]
pub struct SqliteDb {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDb {
    /// Open (creating if needed) a database file and run migrations.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// In-memory database, used by tests and throwaway runs.
    pub fn in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(mut conn: Connection) -> StoreResult<Self> {
        run_migrations(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` with the connection locked.
    pub fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> StoreResult<T>) -> StoreResult<T> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::Poisoned("sqlite connection".to_string()))?;
        f(&conn)
    }

    /// Run `f` with the connection locked mutably (needed for transactions).
    pub fn with_conn_mut<T>(
        &self,
        f: impl FnOnce(&mut Connection) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::Poisoned("sqlite connection".to_string()))?;
        f(&mut conn)
    }

    /// Distinct namespaces that currently hold at least one document.
    pub fn namespaces(&self) -> StoreResult<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT DISTINCT namespace FROM documents ORDER BY namespace")?;
            let rows = stmt.query_map([], |row| row.get(0))?;
            rows.collect::<Result<Vec<String>, _>>().map_err(StoreError::from)
        })
    }
}

/// One namespace within a [`SqliteDb`].
#[derive(Clone)]
pub struct SqliteDocumentStore {
    db: SqliteDb,
    namespace: String,
}

impl SqliteDocumentStore {
    pub fn new(db: SqliteDb, namespace: impl Into<String>) -> StoreResult<Self> {
        let namespace = namespace.into();
        validate_key("namespace", &namespace)?;
        Ok(Self { db, namespace })
    }

    /// Store over a private in-memory database.
    pub fn in_memory(namespace: impl Into<String>) -> StoreResult<Self> {
        Self::new(SqliteDb::in_memory()?, namespace)
    }

    pub fn db(&self) -> &SqliteDb {
        &self.db
    }

    fn decode(id: String, body: String) -> StoreResult<Document> {
        let value: Value = serde_json::from_str(&body).map_err(|e| StoreError::Corrupt {
            id: id.clone(),
            reason: e.to_string(),
        })?;
        Document::from_value(value).map_err(|e| StoreError::Corrupt {
            id,
            reason: e.to_string(),
        })
    }

    /// Translate criteria into a WHERE clause with positional parameters.
    fn where_clause(&self, criteria: &Criteria) -> (String, Vec<SqlValue>) {
        let mut sql = String::from("namespace = ?1");
        let mut params = vec![SqlValue::Text(self.namespace.clone())];

        for (field, expected) in criteria.effective() {
            let column = match field {
                "id" => Some("id"),
                "type" => Some("doc_type"),
                _ => None,
            };

            if let Some(column) = column {
                if let Value::String(s) = expected {
                    params.push(SqlValue::Text(s.clone()));
                    sql.push_str(&format!(" AND {} = ?{}", column, params.len()));
                }
                continue;
            }

            // Unusual keys are left to the in-memory re-check.
            if field.contains(['"', '\\']) {
                continue;
            }
            let path = format!("$.\"{}\"", field);

            if expected.is_null() {
                params.push(SqlValue::Text(path));
                sql.push_str(&format!(" AND json_extract(body, ?{}) IS NULL", params.len()));
            } else if let Some(bound) = scalar(expected) {
                params.push(SqlValue::Text(path));
                let path_idx = params.len();
                params.push(bound);
                sql.push_str(&format!(
                    " AND json_extract(body, ?{}) = ?{}",
                    path_idx,
                    params.len()
                ));
            }
        }

        (sql, params)
    }
}

/// SQL value comparable with what `json_extract` returns for a JSON scalar.
fn scalar(value: &Value) -> Option<SqlValue> {
    match value {
        Value::String(s) => Some(SqlValue::Text(s.clone())),
        Value::Bool(b) => Some(SqlValue::Integer(i64::from(*b))),
        Value::Number(n) => n
            .as_i64()
            .map(SqlValue::Integer)
            .or_else(|| n.as_f64().map(SqlValue::Real)),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

impl DocumentStore for SqliteDocumentStore {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn save(&self, doc: &Document) -> StoreResult<String> {
        doc.validate()?;
        let body = serde_json::to_string(doc)?;
        let now = chrono::Utc::now().to_rfc3339();

        self.db.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO documents (namespace, id, doc_type, body, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(namespace, id) DO UPDATE SET
                    doc_type = excluded.doc_type,
                    body = excluded.body,
                    updated_at = excluded.updated_at",
                params![self.namespace, doc.id, doc.doc_type, body, now],
            )?;
            tx.commit()?;
            Ok(())
        })?;

        debug!(namespace = %self.namespace, id = %doc.id, "Saved document");
        Ok(doc.id.clone())
    }

    fn load(&self, id: &str) -> StoreResult<Option<Document>> {
        validate_key("document id", id)?;
        let row = self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT id, body FROM documents WHERE namespace = ?1 AND id = ?2",
                params![self.namespace, id],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()
            .map_err(StoreError::from)
        })?;

        row.map(|(id, body)| Self::decode(id, body)).transpose()
    }

    fn delete(&self, id: &str) -> StoreResult<bool> {
        validate_key("document id", id)?;
        let removed = self.db.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let removed = tx.execute(
                "DELETE FROM documents WHERE namespace = ?1 AND id = ?2",
                params![self.namespace, id],
            )?;
            tx.commit()?;
            Ok(removed)
        })?;

        if removed > 0 {
            debug!(namespace = %self.namespace, id, "Deleted document");
        }
        Ok(removed > 0)
    }

    fn list(&self) -> StoreResult<Vec<Document>> {
        self.find_by(&Criteria::new())
    }

    fn find_by(&self, criteria: &Criteria) -> StoreResult<Vec<Document>> {
        let (clause, params) = self.where_clause(criteria);
        let sql = format!(
            "SELECT id, body FROM documents WHERE {} ORDER BY id",
            clause
        );

        let rows = self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(params), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;
            rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
        })?;

        let mut docs = rows
            .into_iter()
            .map(|(id, body)| Self::decode(id, body))
            .collect::<StoreResult<Vec<_>>>()?;
        docs.retain(|doc| criteria.matches(doc));
        Ok(docs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn template(id: &str, doc_type: &str, project: Option<&str>) -> Document {
        let mut value = json!({"id": id, "type": doc_type, "template": "Write about {{ purpose }}"});
        if let Some(project) = project {
            value["project_id"] = json!(project);
        }
        Document::from_value(value).unwrap()
    }

    #[test]
    fn test_round_trip_and_overwrite() {
        let store = SqliteDocumentStore::in_memory("demo").unwrap();
        let first = Document::keyed("Documentation", vec![json!({"v": 1})]);
        let second = Document::keyed("Documentation", vec![json!({"v": 2})]);

        store.save(&first).unwrap();
        assert_eq!(store.load("Documentation").unwrap(), Some(first));

        store.save(&second).unwrap();
        assert_eq!(store.load("Documentation").unwrap(), Some(second));
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn test_missing_key_is_none() {
        let store = SqliteDocumentStore::in_memory("demo").unwrap();
        assert_eq!(store.load("Questionnaire").unwrap(), None);
        assert!(!store.delete("Questionnaire").unwrap());
    }

    #[test]
    fn test_invalid_ids_are_rejected() {
        let store = SqliteDocumentStore::in_memory("demo").unwrap();
        for id in ["", "../escape", ".hidden"] {
            assert!(matches!(store.load(id), Err(StoreError::Validation(_))));
            assert!(matches!(store.delete(id), Err(StoreError::Validation(_))));
        }
    }

    #[test]
    fn test_namespaces_are_isolated() {
        let db = SqliteDb::in_memory().unwrap();
        let a = SqliteDocumentStore::new(db.clone(), "alpha").unwrap();
        let b = SqliteDocumentStore::new(db.clone(), "beta").unwrap();

        a.save(&Document::keyed("Questionnaire", vec![json!({"p": "a"})])).unwrap();

        assert_eq!(b.load("Questionnaire").unwrap(), None);
        assert!(b.list().unwrap().is_empty());
        assert_eq!(db.namespaces().unwrap(), vec!["alpha".to_string()]);
    }

    #[test]
    fn test_find_by_translates_criteria() {
        let store = SqliteDocumentStore::in_memory("prompts").unwrap();
        store.save(&template("doc-general", "Documentation", None)).unwrap();
        store.save(&template("doc-demo", "Documentation", Some("demo"))).unwrap();
        store.save(&template("req-demo", "Requirements", Some("demo"))).unwrap();

        assert_eq!(store.find_by(&Criteria::new()).unwrap(), store.list().unwrap());

        let docs = store.find_by(&Criteria::by_type("Documentation")).unwrap();
        assert_eq!(docs.len(), 2);

        let docs = store
            .find_by(&Criteria::by_type("Documentation").and("project_id", "demo"))
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "doc-demo");

        let docs = store.find_by(&Criteria::new().and("project_id", Value::Null)).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "doc-general");

        let docs = store.find_by(&Criteria::by_type(crate::WILDCARD)).unwrap();
        assert_eq!(docs.len(), 3);
    }

    #[test]
    fn test_find_by_non_scalar_criteria() {
        let store = SqliteDocumentStore::in_memory("prompts").unwrap();
        let mut doc = template("doc-1", "Documentation", None);
        doc.extra.insert("objects".to_string(), json!(["Questionnaire"]));
        store.save(&doc).unwrap();
        store.save(&template("doc-2", "Documentation", None)).unwrap();

        let docs = store
            .find_by(&Criteria::new().and("objects", json!(["Questionnaire"])))
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "doc-1");
    }

    #[test]
    fn test_failed_write_rolls_back() {
        let store = SqliteDocumentStore::in_memory("demo").unwrap();
        let original = Document::keyed("Documentation", vec![json!({"v": 1})]);
        store.save(&original).unwrap();

        store
            .db()
            .with_conn(|conn| {
                conn.execute_batch(
                    "CREATE TRIGGER reject_updates BEFORE UPDATE ON documents
                     BEGIN SELECT RAISE(ABORT, 'simulated write failure'); END;",
                )?;
                Ok(())
            })
            .unwrap();

        let err = store
            .save(&Document::keyed("Documentation", vec![json!({"v": 2})]))
            .unwrap_err();
        assert!(err.is_io());
        assert_eq!(store.load("Documentation").unwrap(), Some(original));
    }

    #[test]
    fn test_save_rejects_missing_id() {
        let store = SqliteDocumentStore::in_memory("demo").unwrap();
        assert!(matches!(
            store.save(&Document::keyed("", vec![])),
            Err(StoreError::Validation(_))
        ));
    }
}
