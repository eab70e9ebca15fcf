//! Project initialization.

pub mod model;

use artigen_store::StoreFactory;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::error::{ArtigenError, ArtigenResult};
use model::Project;

/// User input for creating a project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InitRequest {
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub questionnaire: Option<Value>,
}

/// Create a project and, when one is provided, store its questionnaire.
pub fn initialize_project(factory: &StoreFactory, request: InitRequest) -> ArtigenResult<Project> {
    let name = request.project_name.trim();
    if name.is_empty() {
        return Err(ArtigenError::validation("Project name is required"));
    }

    let project = Project::open(name, request.description.as_deref().unwrap_or(""), factory)?;

    match request.questionnaire {
        Some(questionnaire) if !is_blank(&questionnaire) => {
            project.initialize_with_questionnaire(questionnaire)?;
            info!(project = %project.name, "Initialized project with questionnaire");
        }
        _ => info!(project = %project.name, "Initialized project"),
    }

    Ok(project)
}

/// Null, or an empty object, array or string.
pub(crate) fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::model::ArtifactType;
    use artigen_store::SqliteDb;
    use serde_json::json;

    fn factory() -> StoreFactory {
        StoreFactory::sqlite(SqliteDb::in_memory().unwrap())
    }

    #[test]
    fn test_requires_name() {
        let err = initialize_project(&factory(), InitRequest::default()).unwrap_err();
        assert!(matches!(err, ArtigenError::ValidationError(_)));

        let request = InitRequest {
            project_name: "   ".to_string(),
            ..Default::default()
        };
        assert!(initialize_project(&factory(), request).is_err());
    }

    #[test]
    fn test_with_questionnaire() {
        let request = InitRequest {
            project_name: "demo".to_string(),
            description: Some("A demo".to_string()),
            questionnaire: Some(json!({"purpose": "x"})),
        };
        let project = initialize_project(&factory(), request).unwrap();

        assert_eq!(project.name, "demo");
        assert_eq!(project.description, "A demo");
        assert_eq!(
            project.get_content(ArtifactType::Questionnaire).unwrap(),
            Some(vec![json!({"purpose": "x"})])
        );
    }

    #[test]
    fn test_without_questionnaire() {
        let request = InitRequest {
            project_name: "demo".to_string(),
            questionnaire: Some(json!({})),
            ..Default::default()
        };
        let project = initialize_project(&factory(), request).unwrap();
        assert_eq!(project.get_content(ArtifactType::Questionnaire).unwrap(), None);
    }

    #[test]
    fn test_request_from_json() {
        let request: InitRequest =
            serde_json::from_value(json!({"project_name": "demo", "questionnaire": {"purpose": "x"}}))
                .unwrap();
        assert_eq!(request.project_name, "demo");
        assert!(request.description.is_none());
    }
}
