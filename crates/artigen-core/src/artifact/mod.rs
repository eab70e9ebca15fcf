//! Artifacts: prompt template lookup and prompt construction.
//!
//! An [`Artifact`] is a transient view created per generation request. It
//! owns no content (that belongs to the project, keyed by type) and its id
//! is not a stable identity.

pub mod model;

use std::sync::Arc;

use artigen_store::{Criteria, DocumentStore, WILDCARD};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::error::ArtigenResult;
use model::{ArtifactType, Prompt, PromptTemplate};

pub struct Artifact {
    pub id: Uuid,
    pub artifact_type: ArtifactType,
    prompt_store: Arc<dyn DocumentStore>,
}

impl Artifact {
    pub fn new(artifact_type: ArtifactType, prompt_store: Arc<dyn DocumentStore>) -> Self {
        Self {
            id: Uuid::new_v4(),
            artifact_type,
            prompt_store,
        }
    }

    /// Templates registered for `artifact_type`, or for every type when `None`.
    ///
    /// An empty result is not an error here; callers decide what it means.
    pub fn get_prompts(&self, artifact_type: Option<ArtifactType>) -> ArtigenResult<Vec<PromptTemplate>> {
        let type_key = artifact_type.map(|t| t.as_str()).unwrap_or(WILDCARD);
        self.find_prompts(&Criteria::by_type(type_key))
    }

    /// Templates for this artifact's type that apply to `project_name`.
    ///
    /// Templates scoped to the project win; otherwise the unscoped ones are
    /// used. Templates scoped to other projects are never returned.
    pub fn prompts_for_project(&self, project_name: &str) -> ArtigenResult<Vec<PromptTemplate>> {
        let by_type = Criteria::by_type(self.artifact_type.as_str());

        let scoped = self.find_prompts(&by_type.clone().and("project_id", project_name))?;
        if !scoped.is_empty() {
            return Ok(scoped);
        }
        self.find_prompts(&by_type.and("project_id", Value::Null))
    }

    /// Templates matching arbitrary criteria (e.g. `type` plus `project_id`).
    pub fn find_prompts(&self, criteria: &Criteria) -> ArtigenResult<Vec<PromptTemplate>> {
        let templates = find_templates(self.prompt_store.as_ref(), criteria)?;

        debug!(
            artifact_type = %self.artifact_type,
            templates = templates.len(),
            "Loaded prompt templates"
        );
        Ok(templates)
    }

    /// Register or replace a template in the prompt store.
    pub fn save_prompt(&self, template: &PromptTemplate) -> ArtigenResult<String> {
        Ok(self.prompt_store.save(&template.to_document())?)
    }

    /// One prompt per context record, each carrying the template without
    /// its `objects` field.
    pub fn create_prompt(&self, template: &PromptTemplate, contexts: &[Value]) -> Vec<Prompt> {
        let fields = template.fields();
        contexts
            .iter()
            .map(|context| Prompt {
                template: fields.clone(),
                context: context.clone(),
            })
            .collect()
    }
}

/// Decode every template in `store` matching `criteria`.
pub fn find_templates(
    store: &dyn DocumentStore,
    criteria: &Criteria,
) -> ArtigenResult<Vec<PromptTemplate>> {
    store
        .find_by(criteria)?
        .into_iter()
        .map(PromptTemplate::from_document)
        .collect()
}
