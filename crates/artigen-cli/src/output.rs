//! Terminal output formatting.

use anyhow::Result;
use colored::Colorize;
use serde_json::Value;

use artigen_core::{ArtifactType, PromptTemplate};

/// Print stored content as pretty JSON, one record at a time.
pub fn print_content(artifact_type: ArtifactType, records: &[Value]) -> Result<()> {
    println!(
        "{} {}",
        artifact_type.to_string().cyan().bold(),
        format!("({} records)", records.len()).dimmed()
    );
    println!();

    for record in records {
        println!("{}", serde_json::to_string_pretty(record)?);
    }
    Ok(())
}

/// Print the artifact types a project has content for.
pub fn print_artifact_types(project: &str, types: &[ArtifactType]) {
    if types.is_empty() {
        println!("{}", format!("No content stored for {}.", project).dimmed());
        return;
    }

    println!("{}", project.cyan().bold());
    for artifact_type in types {
        println!("  - {}", artifact_type);
    }
}

/// Print prompt templates as a table.
pub fn print_templates(templates: &[PromptTemplate]) {
    if templates.is_empty() {
        println!("{}", "No prompt templates found.".dimmed());
        return;
    }

    println!("{:<24} {:<16} {:<16} {}", "ID", "Type", "Project", "Context");
    println!("{}", "-".repeat(80));

    for template in templates {
        let context = if template.objects.is_empty() {
            "(own type)".dimmed().to_string()
        } else {
            template.objects.join(", ")
        };

        println!(
            "{:<24} {:<16} {:<16} {}",
            truncate(&template.id, 22),
            template.artifact_type,
            template.project_id.as_deref().unwrap_or("-"),
            context
        );
    }
}

/// Print known project names.
pub fn print_projects(projects: &[String]) {
    if projects.is_empty() {
        println!("{}", "No projects found. Run 'artigen init <name>' first.".dimmed());
        return;
    }

    for project in projects {
        println!("  {}", project.cyan());
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
