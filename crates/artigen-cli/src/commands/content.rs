//! Project content commands.

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use colored::Colorize;

use artigen_core::{ArtifactType, ArtigenConfig, Project};
use artigen_store::StoreFactory;

use crate::output;

#[derive(Subcommand)]
pub enum ContentCommands {
    /// Print the stored content for one artifact type
    Show(ContentArgs),

    /// List artifact types that have content
    List(ProjectArgs),

    /// Delete the stored content for one artifact type
    Delete(ContentArgs),
}

#[derive(Args)]
pub struct ProjectArgs {
    /// Project name
    pub project: String,
}

#[derive(Args)]
pub struct ContentArgs {
    /// Project name
    pub project: String,

    /// Artifact type
    pub artifact_type: String,
}

/// Look up a project without creating its namespace.
fn existing_project(name: &str, factory: &StoreFactory) -> Result<Project> {
    Project::find(name, factory)?.ok_or_else(|| anyhow!("Project '{}' not found", name))
}

pub fn execute(cmd: ContentCommands, config: &ArtigenConfig) -> Result<()> {
    let factory = config.open_stores()?;

    match cmd {
        ContentCommands::Show(args) => {
            let artifact_type: ArtifactType = args.artifact_type.parse()?;
            let project = existing_project(&args.project, &factory)?;

            match project.get_content(artifact_type)? {
                Some(records) => output::print_content(artifact_type, &records)?,
                None => println!(
                    "{}",
                    format!("No {} content for {}.", artifact_type, project.name).dimmed()
                ),
            }
        }

        ContentCommands::List(args) => {
            let project = existing_project(&args.project, &factory)?;
            output::print_artifact_types(&project.name, &project.artifact_types()?);
        }

        ContentCommands::Delete(args) => {
            let artifact_type: ArtifactType = args.artifact_type.parse()?;
            let project = existing_project(&args.project, &factory)?;

            if project.delete_content(artifact_type)? {
                println!(
                    "{} Deleted {} content for {}",
                    "✓".green().bold(),
                    artifact_type.to_string().cyan(),
                    project.name.cyan()
                );
            } else {
                println!("{}", format!("No {} content to delete.", artifact_type).dimmed());
            }
        }
    }

    Ok(())
}
