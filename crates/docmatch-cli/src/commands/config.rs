//! Config command - inspect and create the matching configuration.

use std::fs;
use std::path::PathBuf;

use clap::{Args, Subcommand};
use console::style;

use docmatch_core::DocmatchConfig;

use super::load_config;

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration as JSON
    Show,

    /// Write the default weights and thresholds to a file
    Init(InitArgs),

    /// Show which configuration file is in effect
    Path,
}

#[derive(Args)]
struct InitArgs {
    /// Target file (default: --config, else the user config directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Overwrite existing file
    #[arg(long)]
    force: bool,
}

pub fn run(args: ConfigArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let source = ConfigSource::resolve(config_path);
    match args.command {
        ConfigCommand::Show => show_config(&source),
        ConfigCommand::Init(init_args) => init_config(init_args, &source),
        ConfigCommand::Path => show_path(&source),
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("docmatch")
        .join("config.json")
}

/// The configuration file a command reads, given the global `--config` flag.
struct ConfigSource {
    path: PathBuf,
    explicit: bool,
}

impl ConfigSource {
    fn resolve(config_path: Option<&str>) -> Self {
        match config_path {
            Some(path) => Self {
                path: PathBuf::from(path),
                explicit: true,
            },
            None => Self {
                path: default_config_path(),
                explicit: false,
            },
        }
    }

    fn origin(&self) -> &'static str {
        if self.explicit { "--config" } else { "default location" }
    }

    fn flag(&self) -> Option<&str> {
        self.explicit.then(|| self.path.to_str()).flatten()
    }
}

fn show_config(source: &ConfigSource) -> anyhow::Result<()> {
    if !source.explicit && !source.path.exists() {
        eprintln!(
            "{} No config file at {}, showing built-in weights.",
            style("ℹ").blue(),
            source.path.display()
        );
    }

    let config = load_config(source.flag())?;
    println!("{}", serde_json::to_string_pretty(&config)?);

    Ok(())
}

fn init_config(args: InitArgs, source: &ConfigSource) -> anyhow::Result<()> {
    let output_path = args.output.unwrap_or_else(|| source.path.clone());

    if output_path.exists() && !args.force {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            output_path.display()
        );
    }

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let config = DocmatchConfig::default();
    config.save(&output_path)?;

    eprintln!(
        "{} Wrote default config to {} (confidence floor {}, fallback below it)",
        style("✓").green(),
        output_path.display(),
        config.selection.confidence_floor
    );

    Ok(())
}

fn show_path(source: &ConfigSource) -> anyhow::Result<()> {
    println!("Configuration file: {}", source.path.display());
    println!("Source: {}", source.origin());

    if !source.path.exists() {
        println!("Status: {}", style("not created").yellow());
        println!();
        println!("Run 'docmatch config init' to create it; built-in weights apply until then.");
        return Ok(());
    }

    match DocmatchConfig::from_file(&source.path) {
        Ok(_) => println!("Status: {}", style("valid").green()),
        Err(e) => println!("Status: {} ({})", style("invalid").red(), e),
    }

    Ok(())
}
