//! Match command - select a template for one parsed document.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Args;
use console::style;
use tracing::{debug, info, warn};

use docmatch_core::{
    Document, StrategyKind, TemplateMatchResult, TemplateRegistry, TemplateSelector,
    derive_template,
};

use super::{load_config, load_registry};

/// Arguments for the match command.
#[derive(Args)]
pub struct MatchArgs {
    /// Parsed document (JSON)
    #[arg(required = true)]
    document: PathBuf,

    /// Directory of template definition files
    #[arg(short, long)]
    templates: Option<PathBuf>,

    /// Include the built-in templates
    #[arg(long)]
    builtin: bool,

    /// Only consider the template with this id
    #[arg(long)]
    template: Option<String>,

    /// Evaluate a single strategy on --template instead of selecting
    #[arg(long, value_parser = parse_strategy, requires = "template")]
    strategy: Option<StrategyKind>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write a template derived from the result to this file
    #[arg(long)]
    derive_template: Option<PathBuf>,

    /// Show confidence summary on stderr
    #[arg(long)]
    show_confidence: bool,
}

fn parse_strategy(s: &str) -> Result<StrategyKind, String> {
    StrategyKind::from_str(s)
        .ok_or_else(|| format!("unknown strategy '{s}' (expected exact, fuzzy, position or combined)"))
}

pub fn run(args: MatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.document.exists() {
        anyhow::bail!("Document not found: {}", args.document.display());
    }
    let content = fs::read_to_string(&args.document)?;
    let document = Document::from_json(&content)
        .with_context(|| format!("Invalid document {}", args.document.display()))?;

    let mut registry = load_registry(args.templates.as_deref(), args.builtin)?;
    if let Some(id) = &args.template {
        let template = registry
            .get(id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Template not found: {}", id))?;
        registry = TemplateRegistry::from_templates(vec![template])?;
    }
    if registry.is_empty() {
        warn!("No templates loaded, only the fallback result is possible");
    }

    info!(
        "Matching {} against {} templates",
        args.document.display(),
        registry.len()
    );

    let selector = TemplateSelector::new(config);
    let result = match (args.strategy, registry.iter().next()) {
        (Some(kind), Some(template)) => selector.evaluate(&document, template, kind),
        _ => selector.select(&document, &registry),
    };

    let output = serde_json::to_string_pretty(&result)?;
    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        eprintln!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if let Some(path) = &args.derive_template {
        write_derived_template(&result, &registry, &args.document, path)?;
    }

    if args.show_confidence {
        print_summary(&result);
    }

    debug!("Total matching time: {:?}", start.elapsed());

    Ok(())
}

fn write_derived_template(
    result: &TemplateMatchResult,
    registry: &TemplateRegistry,
    document: &std::path::Path,
    path: &std::path::Path,
) -> anyhow::Result<()> {
    let document_name = document
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document");
    let document_type = registry
        .get(&result.template_id)
        .map(|t| t.document_type.as_str())
        .unwrap_or("unknown");

    let template = derive_template(result, document_name, document_type)?;
    let json = serde_json::to_string_pretty(&template.to_definition())?;
    fs::write(path, json)?;

    eprintln!(
        "{} Derived template {} written to {}",
        style("✓").green(),
        template.id,
        path.display()
    );
    Ok(())
}

fn print_summary(result: &TemplateMatchResult) {
    eprintln!();
    eprintln!(
        "{} Template: {} ({})",
        style("ℹ").blue(),
        result.template_id,
        result.strategy_used
    );
    eprintln!(
        "{} Confidence: {:.1}%",
        style("ℹ").blue(),
        result.confidence * 100.0
    );
    eprintln!(
        "{} Bounding box accuracy: {:.1}%",
        style("ℹ").blue(),
        result.bbox_accuracy * 100.0
    );
    for (name, field) in &result.matched_fields {
        eprintln!(
            "  {} {:<24} {:>5.1}%  {}",
            style("✓").green(),
            name,
            field.confidence * 100.0,
            field.value
        );
    }
    for name in &result.missing_fields {
        eprintln!("  {} {}", style("✗").red(), name);
    }
}
