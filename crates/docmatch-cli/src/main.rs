//! CLI application for matching parsed documents against templates.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{config, match_cmd, templates};

/// docmatch - Find the template a document follows and extract its fields
#[derive(Parser)]
#[command(name = "docmatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Match a parsed document against templates
    Match(match_cmd::MatchArgs),

    /// Inspect template definitions
    Templates(templates::TemplatesArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    // stdout carries JSON only
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Match(args) => match_cmd::run(args, cli.config.as_deref()),
        Commands::Templates(args) => templates::run(args),
        Commands::Config(args) => config::run(args, cli.config.as_deref()),
    }
}
