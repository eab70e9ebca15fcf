//! Artifact domain models.

use std::fmt;
use std::str::FromStr;

use artigen_store::Document;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ArtigenError, ArtigenResult};

/// Category of generated content.
///
/// The string form is also the storage key: a project holds exactly one
/// content snapshot per type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArtifactType {
    Questionnaire,
    Requirements,
    Documentation,
    Architecture,
    UserStories,
    TestPlan,
}

impl ArtifactType {
    pub const ALL: [ArtifactType; 6] = [
        Self::Questionnaire,
        Self::Requirements,
        Self::Documentation,
        Self::Architecture,
        Self::UserStories,
        Self::TestPlan,
    ];

    /// Canonical storage key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Questionnaire => "Questionnaire",
            Self::Requirements => "Requirements",
            Self::Documentation => "Documentation",
            Self::Architecture => "Architecture",
            Self::UserStories => "UserStories",
            Self::TestPlan => "TestPlan",
        }
    }
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactType {
    type Err = ArtigenError;

    /// Accepts the storage key in any case, plus snake/kebab spellings
    /// such as `user_stories` or `test-plan`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_lowercase();

        Self::ALL
            .into_iter()
            .find(|t| t.as_str().to_lowercase() == normalized)
            .ok_or_else(|| ArtigenError::validation(format!("Unknown artifact type: {}", s)))
    }
}

/// A stored prompt template.
///
/// `template` is Tera source rendered against one context record.
/// `objects` lists the artifact types whose stored content is the template's
/// context; it is consumed while resolving context and never sent onward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub id: String,
    #[serde(rename = "type")]
    pub artifact_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default)]
    pub template: String,
    #[serde(default)]
    pub objects: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PromptTemplate {
    pub fn new(id: impl Into<String>, artifact_type: ArtifactType, template: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            artifact_type: artifact_type.as_str().to_string(),
            project_id: None,
            name: None,
            system: None,
            template: template.into(),
            objects: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Restrict the template to one project.
    pub fn for_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// Set the artifact types whose content feeds this template.
    pub fn with_objects(mut self, objects: impl IntoIterator<Item = ArtifactType>) -> Self {
        self.objects = objects.into_iter().map(|t| t.as_str().to_string()).collect();
        self
    }

    /// Parsed `objects`. Unknown type names are a validation error.
    pub fn context_types(&self) -> ArtigenResult<Vec<ArtifactType>> {
        self.objects.iter().map(|o| o.parse()).collect()
    }

    /// Template fields as sent with a prompt: everything except `objects`.
    pub fn fields(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("id".to_string(), Value::String(self.id.clone()));
        map.insert("type".to_string(), Value::String(self.artifact_type.clone()));
        if let Some(project_id) = &self.project_id {
            map.insert("project_id".to_string(), Value::String(project_id.clone()));
        }
        if let Some(name) = &self.name {
            map.insert("name".to_string(), Value::String(name.clone()));
        }
        if let Some(system) = &self.system {
            map.insert("system".to_string(), Value::String(system.clone()));
        }
        map.insert("template".to_string(), Value::String(self.template.clone()));
        for (key, value) in &self.extra {
            map.entry(key.clone()).or_insert_with(|| value.clone());
        }
        map
    }

    /// Decode a template from its stored document.
    pub fn from_document(doc: Document) -> ArtigenResult<Self> {
        let mut map = doc.extra;
        map.insert("id".to_string(), Value::String(doc.id.clone()));
        map.insert("type".to_string(), Value::String(doc.doc_type));

        serde_json::from_value(Value::Object(map)).map_err(|e| {
            ArtigenError::validation(format!("Malformed prompt template '{}': {}", doc.id, e))
        })
    }

    /// Encode as a storable document. Templates carry no `content`.
    pub fn to_document(&self) -> Document {
        let mut extra = self.fields();
        extra.remove("id");
        extra.remove("type");
        extra.insert(
            "objects".to_string(),
            Value::Array(self.objects.iter().cloned().map(Value::String).collect()),
        );

        Document {
            id: self.id.clone(),
            doc_type: self.artifact_type.clone(),
            content: Vec::new(),
            extra,
        }
    }
}

/// One template paired with one context record, ready to send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    pub template: Map<String, Value>,
    pub context: Value,
}

impl Prompt {
    /// Render the template text against the context.
    ///
    /// Top-level keys of an object context are available directly
    /// (`{{ purpose }}`), and the whole record as `{{ context }}`.
    pub fn render(&self) -> ArtigenResult<String> {
        let source = match self.template.get("template").and_then(Value::as_str) {
            Some(source) if !source.is_empty() => source,
            _ => return Ok(String::new()),
        };

        let mut ctx = tera::Context::new();
        if let Value::Object(fields) = &self.context {
            for (key, value) in fields {
                ctx.insert(key.as_str(), value);
            }
        }
        ctx.insert("context", &self.context);

        tera::Tera::one_off(source, &ctx, false).map_err(|e| ArtigenError::Template(e.to_string()))
    }
}
