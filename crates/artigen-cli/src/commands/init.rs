//! Project initialization command.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use artigen_core::{initialize_project, ArtigenConfig, InitRequest};

use super::read_json;

#[derive(Args)]
pub struct InitArgs {
    /// Project name
    pub name: String,

    /// Short description
    #[arg(short, long)]
    pub description: Option<String>,

    /// Questionnaire answers (JSON object)
    #[arg(short, long)]
    pub questionnaire: Option<PathBuf>,
}

pub fn execute(args: InitArgs, config: &ArtigenConfig) -> Result<()> {
    let factory = config.open_stores()?;

    let questionnaire = args
        .questionnaire
        .as_deref()
        .map(read_json)
        .transpose()?;
    let has_questionnaire = questionnaire.is_some();

    let project = initialize_project(
        &factory,
        InitRequest {
            project_name: args.name,
            description: args.description,
            questionnaire,
        },
    )?;

    println!(
        "{} Project initialized: {} ({})",
        "✓".green().bold(),
        project.name.cyan(),
        project.id.to_string().dimmed()
    );
    if has_questionnaire {
        println!("  Questionnaire stored");
    }
    println!();
    println!("{}", "Next steps:".bold());
    println!("  artigen prompt add <template.json>");
    println!("  artigen generate {} documentation", project.name);

    Ok(())
}
