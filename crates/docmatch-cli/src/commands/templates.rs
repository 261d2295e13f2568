//! Templates command - list and validate template definitions.

use std::fs;
use std::path::PathBuf;

use clap::{Args, Subcommand};
use console::style;

use docmatch_core::Template;

use super::load_registry;

/// Arguments for the templates command.
#[derive(Args)]
pub struct TemplatesArgs {
    #[command(subcommand)]
    command: TemplatesCommand,
}

#[derive(Subcommand)]
enum TemplatesCommand {
    /// List available templates
    List(ListArgs),

    /// Check template definition files
    Validate {
        /// Template definition files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[derive(Args)]
struct ListArgs {
    /// Directory of template definition files
    #[arg(short, long)]
    templates: Option<PathBuf>,

    /// Include the built-in templates
    #[arg(long)]
    builtin: bool,

    /// Only list templates for this document type
    #[arg(long)]
    document_type: Option<String>,

    /// Print registry statistics as JSON
    #[arg(long)]
    stats: bool,
}

pub fn run(args: TemplatesArgs) -> anyhow::Result<()> {
    match args.command {
        TemplatesCommand::List(list_args) => list_templates(list_args),
        TemplatesCommand::Validate { files } => validate_templates(&files),
    }
}

fn list_templates(args: ListArgs) -> anyhow::Result<()> {
    if args.templates.is_none() && !args.builtin {
        anyhow::bail!("Nothing to list. Pass --templates <dir> and/or --builtin.");
    }

    let registry = load_registry(args.templates.as_deref(), args.builtin)?;

    if args.stats {
        println!("{}", serde_json::to_string_pretty(&registry.stats())?);
        return Ok(());
    }

    let templates: Vec<&Template> = match &args.document_type {
        Some(document_type) => registry.by_document_type(document_type).collect(),
        None => registry.iter().collect(),
    };

    if templates.is_empty() {
        println!("{} No templates found.", style("ℹ").blue());
        return Ok(());
    }

    println!(
        "{:<28} {:<10} {:<8} {:>6}  {}",
        style("ID").bold(),
        style("TYPE").bold(),
        style("VERSION").bold(),
        style("FIELDS").bold(),
        style("NAME").bold()
    );
    for template in templates {
        println!(
            "{:<28} {:<10} {:<8} {:>6}  {}",
            template.id,
            template.document_type,
            template.version,
            template.fields().len(),
            template.name
        );
    }

    Ok(())
}

fn validate_templates(files: &[PathBuf]) -> anyhow::Result<()> {
    let mut failures = 0;

    for path in files {
        let outcome = fs::read_to_string(path)
            .map_err(anyhow::Error::from)
            .and_then(|content| Template::from_json(&content).map_err(anyhow::Error::from));

        match outcome {
            Ok(template) => {
                let skipped: Vec<String> = template
                    .fields()
                    .iter()
                    .filter(|f| f.skipped_patterns() > 0)
                    .map(|f| format!("{} ({})", f.name, f.skipped_patterns()))
                    .collect();

                if skipped.is_empty() {
                    println!(
                        "{} {}: {} ({} fields)",
                        style("✓").green(),
                        path.display(),
                        template.id,
                        template.fields().len()
                    );
                } else {
                    println!(
                        "{} {}: {} has invalid patterns in {}",
                        style("⚠").yellow(),
                        path.display(),
                        template.id,
                        skipped.join(", ")
                    );
                }
            }
            Err(e) => {
                failures += 1;
                println!("{} {}: {}", style("✗").red(), path.display(), e);
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} template files are invalid", failures, files.len());
    }
    Ok(())
}
