//! CLI command definitions and handlers.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

use artigen_core::ArtigenConfig;

use crate::output;

pub mod content;
pub mod generate;
pub mod init;
pub mod prompt;

/// Artigen - versioned artifact generation for software projects
#[derive(Parser)]
#[command(name = "artigen")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to artigen.toml (defaults to ./artigen.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a project, optionally with its questionnaire
    Init(init::InitArgs),

    /// Generate an artifact for a project
    Generate(generate::GenerateArgs),

    /// Inspect or remove stored project content
    #[command(subcommand)]
    Content(content::ContentCommands),

    /// Manage prompt templates
    #[command(subcommand)]
    Prompt(prompt::PromptCommands),

    /// List known projects
    Projects,
}

impl Commands {
    /// Subcommand name, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Init(_) => "init",
            Self::Generate(_) => "generate",
            Self::Content(_) => "content",
            Self::Prompt(_) => "prompt",
            Self::Projects => "projects",
        }
    }
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let config = ArtigenConfig::load(self.config.as_deref())?;
        debug!(
            command = self.command.name(),
            backend = ?config.backend,
            data_dir = %config.data_dir.display(),
            "Running command"
        );

        match self.command {
            Commands::Init(args) => init::execute(args, &config),
            Commands::Generate(args) => generate::execute(args, &config).await,
            Commands::Content(cmd) => content::execute(cmd, &config),
            Commands::Prompt(cmd) => prompt::execute(cmd, &config),
            Commands::Projects => {
                let factory = config.open_stores()?;
                output::print_projects(&factory.list_projects()?);
                Ok(())
            }
        }
    }
}

/// Read and parse a JSON file.
pub fn read_json(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// Parse a JSON argument given inline, or as `@file.json`.
pub fn parse_json_arg(arg: &str) -> Result<Value> {
    match arg.strip_prefix('@') {
        Some(path) => read_json(Path::new(path)),
        None => serde_json::from_str(arg).context("Invalid inline JSON"),
    }
}
