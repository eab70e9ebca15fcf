//! Project domain model.

use std::fmt;
use std::sync::Arc;

use artigen_store::{Document, DocumentStore, StoreFactory};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::artifact::model::ArtifactType;
use crate::error::ArtigenResult;

/// A project and the content store it owns.
///
/// Content is keyed by artifact type: a document's id and type are both the
/// type's storage key, so each type has exactly one live snapshot.
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    content_store: Arc<dyn DocumentStore>,
}

impl fmt::Debug for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Project")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("description", &self.description)
            .field("namespace", &self.content_store.namespace())
            .finish()
    }
}

impl Project {
    /// Bind to the project's namespace, creating it if needed.
    pub fn open(name: &str, description: &str, factory: &StoreFactory) -> ArtigenResult<Self> {
        let content_store = factory.content_store(name)?;
        Ok(Self::with_store(name, description, content_store))
    }

    /// Bind to an existing project, or `None` if it has never been created.
    pub fn find(name: &str, factory: &StoreFactory) -> ArtigenResult<Option<Self>> {
        if !factory.project_exists(name)? {
            return Ok(None);
        }
        Self::open(name, "", factory).map(Some)
    }

    /// Bind to an explicit content store.
    pub fn with_store(name: &str, description: &str, content_store: Arc<dyn DocumentStore>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: description.to_string(),
            content_store,
        }
    }

    /// Store the questionnaire as a one-record list, replacing any previous one.
    pub fn initialize_with_questionnaire(&self, questionnaire: Value) -> ArtigenResult<()> {
        self.update_content(vec![questionnaire], ArtifactType::Questionnaire)
    }

    /// Stored content for `artifact_type`; `None` when nothing was generated yet.
    pub fn get_content(&self, artifact_type: ArtifactType) -> ArtigenResult<Option<Vec<Value>>> {
        Ok(self
            .content_store
            .load(artifact_type.as_str())?
            .map(|doc| doc.content))
    }

    /// Replace the snapshot for `artifact_type`.
    pub fn update_content(&self, content: Vec<Value>, artifact_type: ArtifactType) -> ArtigenResult<()> {
        let records = content.len();
        self.content_store
            .save(&Document::keyed(artifact_type.as_str(), content))?;

        debug!(
            project = %self.name,
            artifact_type = %artifact_type,
            records,
            "Updated project content"
        );
        Ok(())
    }

    /// Remove the snapshot for `artifact_type`, returning whether it existed.
    pub fn delete_content(&self, artifact_type: ArtifactType) -> ArtigenResult<bool> {
        Ok(self.content_store.delete(artifact_type.as_str())?)
    }

    /// Artifact types that currently have content.
    pub fn artifact_types(&self) -> ArtigenResult<Vec<ArtifactType>> {
        let docs = self.content_store.list()?;
        Ok(ArtifactType::ALL
            .into_iter()
            .filter(|t| docs.iter().any(|doc| doc.id == t.as_str()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use artigen_store::SqliteDb;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_questionnaire_round_trip() {
        let tmp = TempDir::new().unwrap();
        let factory = StoreFactory::json(tmp.path()).unwrap();
        let project = Project::open("demo", "", &factory).unwrap();

        project.initialize_with_questionnaire(json!({"purpose": "x"})).unwrap();
        assert_eq!(
            project.get_content(ArtifactType::Questionnaire).unwrap(),
            Some(vec![json!({"purpose": "x"})])
        );

        project.initialize_with_questionnaire(json!({"purpose": "y"})).unwrap();
        assert_eq!(
            project.get_content(ArtifactType::Questionnaire).unwrap(),
            Some(vec![json!({"purpose": "y"})])
        );
    }

    #[test]
    fn test_missing_content_is_none() {
        let factory = StoreFactory::sqlite(SqliteDb::in_memory().unwrap());
        let project = Project::open("demo", "", &factory).unwrap();
        assert_eq!(project.get_content(ArtifactType::Documentation).unwrap(), None);
    }

    #[test]
    fn test_update_content_replaces_snapshot() {
        let factory = StoreFactory::sqlite(SqliteDb::in_memory().unwrap());
        let project = Project::open("demo", "", &factory).unwrap();

        project
            .update_content(vec![json!({"a": 1}), json!({"a": 2})], ArtifactType::Documentation)
            .unwrap();
        project
            .update_content(vec![json!({"b": 1})], ArtifactType::Documentation)
            .unwrap();

        assert_eq!(
            project.get_content(ArtifactType::Documentation).unwrap(),
            Some(vec![json!({"b": 1})])
        );
        assert_eq!(project.artifact_types().unwrap(), vec![ArtifactType::Documentation]);

        assert!(project.delete_content(ArtifactType::Documentation).unwrap());
        assert!(project.artifact_types().unwrap().is_empty());
    }

    #[test]
    fn test_find_leaves_unknown_projects_alone() {
        let tmp = TempDir::new().unwrap();
        let factory = StoreFactory::json(tmp.path()).unwrap();
        Project::open("demo", "", &factory)
            .unwrap()
            .initialize_with_questionnaire(json!({"purpose": "x"}))
            .unwrap();

        let found = Project::find("demo", &factory).unwrap().unwrap();
        assert!(found.get_content(ArtifactType::Questionnaire).unwrap().is_some());

        assert!(Project::find("typo", &factory).unwrap().is_none());
        assert!(!tmp.path().join("typo").exists());
        assert_eq!(factory.list_projects().unwrap(), vec!["demo".to_string()]);
    }

    #[test]
    fn test_projects_share_namespace_by_name() {
        let factory = StoreFactory::sqlite(SqliteDb::in_memory().unwrap());
        let first = Project::open("demo", "", &factory).unwrap();
        first.initialize_with_questionnaire(json!({"purpose": "x"})).unwrap();

        let second = Project::open("demo", "", &factory).unwrap();
        assert_ne!(first.id, second.id);
        assert!(second.get_content(ArtifactType::Questionnaire).unwrap().is_some());
    }
}
