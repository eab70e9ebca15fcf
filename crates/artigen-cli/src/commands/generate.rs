//! Artifact generation command.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use artigen_core::{
    ArtifactType, ArtigenConfig, GenerationRequest, GenerationWorkflow, HttpGenerationClient,
    ServiceConfig,
};

use super::parse_json_arg;

#[derive(Args)]
pub struct GenerateArgs {
    /// Project name
    pub project: String,

    /// Artifact type (e.g. documentation, requirements)
    pub artifact_type: String,

    /// Fallback context when the project has none stored (JSON or @file.json)
    #[arg(long)]
    pub context: Option<String>,

    /// Generation service description (JSON); defaults to [generation] in the config
    #[arg(long)]
    pub service: Option<PathBuf>,
}

pub async fn execute(args: GenerateArgs, config: &ArtigenConfig) -> Result<()> {
    let artifact_type: ArtifactType = args.artifact_type.parse()?;
    let additional_context = args.context.as_deref().map(parse_json_arg).transpose()?;

    let client = match &args.service {
        Some(path) => HttpGenerationClient::new(ServiceConfig::from_file(path)?)?,
        None => config.generation_client()?,
    };
    debug!(url = %client.config().url(), "Using generation service");

    let workflow = GenerationWorkflow::new(config.open_stores()?, Arc::new(client));

    println!(
        "{} Generating {} for {}",
        "→".blue().bold(),
        artifact_type.to_string().cyan(),
        args.project.cyan()
    );

    let report = workflow
        .generate_artifact(GenerationRequest {
            project_name: args.project,
            artifact_type,
            additional_context,
        })
        .await?;

    println!(
        "{} Generated {} ({} prompts, {} records, template {})",
        "✓".green().bold(),
        report.artifact_type.to_string().cyan(),
        report.prompts,
        report.records,
        report.template_id.dimmed()
    );

    Ok(())
}
