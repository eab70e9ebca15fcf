//! Prompt template commands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use artigen_core::artifact::find_templates;
use artigen_core::{Artifact, ArtifactType, ArtigenConfig, PromptTemplate};
use artigen_store::{Criteria, Document, WILDCARD};

use super::read_json;
use crate::output;

#[derive(Subcommand)]
pub enum PromptCommands {
    /// Register (or replace) a template from a JSON file
    Add(AddArgs),

    /// List templates
    List(ListArgs),
}

#[derive(Args)]
pub struct AddArgs {
    /// Template file: {"id": ..., "type": ..., "template": ..., "objects": [...]}
    pub file: PathBuf,
}

#[derive(Args)]
pub struct ListArgs {
    /// Only templates for this artifact type
    #[arg(short = 't', long = "type")]
    pub artifact_type: Option<String>,
}

pub fn execute(cmd: PromptCommands, config: &ArtigenConfig) -> Result<()> {
    let prompt_store = config.open_stores()?.prompt_store()?;

    match cmd {
        PromptCommands::Add(args) => {
            let doc = Document::from_value(read_json(&args.file)?)
                .with_context(|| format!("Invalid template in {}", args.file.display()))?;
            let template = PromptTemplate::from_document(doc)?;
            let artifact_type: ArtifactType = template.artifact_type.parse()?;
            template.context_types()?;

            let artifact = Artifact::new(artifact_type, prompt_store);
            let id = artifact.save_prompt(&template)?;

            println!(
                "{} Saved template {} for {}",
                "✓".green().bold(),
                id.cyan(),
                artifact_type.to_string().cyan()
            );
        }

        PromptCommands::List(args) => {
            let artifact_type = args
                .artifact_type
                .as_deref()
                .map(str::parse::<ArtifactType>)
                .transpose()?;

            let type_key = artifact_type.map(|t| t.as_str()).unwrap_or(WILDCARD);
            let templates = find_templates(prompt_store.as_ref(), &Criteria::by_type(type_key))?;
            output::print_templates(&templates);
        }
    }

    Ok(())
}
