//! Artifact generation workflow.
//!
//! Steps, each run to completion before the next:
//! 1. load the prompt templates for the target type, preferring those scoped
//!    to the project over unscoped ones (first one wins),
//! 2. resolve context from stored project content, falling back to the
//!    caller's additional context,
//! 3. build one prompt per context record,
//! 4. send the prompts to the generation service,
//! 5. replace the project's content for the target type with the reply.
//!
//! There are no retries: a transport failure ends the request.

pub mod client;

use std::sync::Arc;

use artigen_store::StoreFactory;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::artifact::model::{ArtifactType, PromptTemplate};
use crate::artifact::Artifact;
use crate::error::{ArtigenError, ArtigenResult};
use crate::project::is_blank;
use crate::project::model::Project;
use client::GenerationClient;

/// A single generation request.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub project_name: String,
    pub artifact_type: ArtifactType,
    pub additional_context: Option<Value>,
}

impl GenerationRequest {
    pub fn new(project_name: impl Into<String>, artifact_type: ArtifactType) -> Self {
        Self {
            project_name: project_name.into(),
            artifact_type,
            additional_context: None,
        }
    }

    pub fn with_context(mut self, context: Value) -> Self {
        self.additional_context = Some(context);
        self
    }
}

/// Outcome of a successful generation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationReport {
    pub project: String,
    pub artifact_type: ArtifactType,
    pub template_id: String,
    pub prompts: usize,
    pub records: usize,
}

/// Runs generation requests against one store backend and one client.
pub struct GenerationWorkflow {
    factory: StoreFactory,
    client: Arc<dyn GenerationClient>,
}

impl GenerationWorkflow {
    pub fn new(factory: StoreFactory, client: Arc<dyn GenerationClient>) -> Self {
        Self { factory, client }
    }

    pub async fn generate_artifact(&self, request: GenerationRequest) -> ArtigenResult<GenerationReport> {
        let artifact_type = request.artifact_type;
        if request.project_name.trim().is_empty() {
            return Err(ArtigenError::validation("Project name is required"));
        }

        let artifact = Artifact::new(artifact_type, self.factory.prompt_store()?);
        let templates = artifact.prompts_for_project(&request.project_name)?;
        if templates.len() > 1 {
            debug!(
                artifact_type = %artifact_type,
                ignored = templates.len() - 1,
                "Multiple templates found, using the first"
            );
        }
        let template = templates
            .into_iter()
            .next()
            .ok_or_else(|| ArtigenError::NoTemplate {
                artifact_type: artifact_type.to_string(),
            })?;

        let project = Project::open(&request.project_name, "", &self.factory)?;
        let context = resolve_context(
            &project,
            &template,
            artifact_type,
            request.additional_context.as_ref(),
        )?;

        let prompts = artifact.create_prompt(&template, &context);
        info!(
            project = %project.name,
            artifact_type = %artifact_type,
            template = %template.id,
            prompts = prompts.len(),
            "Sending prompts to generation service"
        );

        let content = self.client.generate(&prompts).await?;
        let records = content.len();
        project.update_content(content, artifact_type)?;

        info!(
            project = %project.name,
            artifact_type = %artifact_type,
            records,
            "Artifact generated"
        );

        Ok(GenerationReport {
            project: project.name,
            artifact_type,
            template_id: template.id,
            prompts: prompts.len(),
            records,
        })
    }
}

/// Context records for `template`.
///
/// Stored content comes from the types listed in the template's `objects`
/// or, when it lists none, from `artifact_type` itself. If nothing is
/// stored, a non-empty `additional` record is used instead. No context at
/// all is a [`ArtigenError::NoContext`] failure.
pub fn resolve_context(
    project: &Project,
    template: &PromptTemplate,
    artifact_type: ArtifactType,
    additional: Option<&Value>,
) -> ArtigenResult<Vec<Value>> {
    let mut sources = template.context_types()?;
    if sources.is_empty() {
        sources.push(artifact_type);
    }

    let mut context = Vec::new();
    for source in sources {
        if let Some(records) = project.get_content(source)? {
            context.extend(records);
        }
    }

    if context.is_empty() {
        if let Some(extra) = additional.filter(|v| !is_blank(v)) {
            info!(
                project = %project.name,
                artifact_type = %artifact_type,
                "No stored context, using additional context"
            );
            context.push(extra.clone());
        }
    }

    if context.is_empty() {
        return Err(ArtigenError::NoContext {
            artifact_type: artifact_type.to_string(),
        });
    }
    Ok(context)
}

/// Run one generation request, reporting plain success.
pub async fn generate_artifact(
    factory: &StoreFactory,
    project_name: &str,
    artifact_type: ArtifactType,
    client: Arc<dyn GenerationClient>,
    additional_context: Option<Value>,
) -> ArtigenResult<bool> {
    let workflow = GenerationWorkflow::new(factory.clone(), client);
    let request = GenerationRequest {
        project_name: project_name.to_string(),
        artifact_type,
        additional_context,
    };
    workflow.generate_artifact(request).await.map(|_| true)
}
