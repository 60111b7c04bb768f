//! HeaderProbe CLI - Main Entry Point
//!
//! Builds the response corpus, writes test plans for the browser runner,
//! imports results, and computes repeat rounds.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod output;

use commands::{artifact, browsers, config, corpus, plan, repeat, results, Context};

/// HeaderProbe - security header test planning
#[derive(Parser)]
#[command(name = "headerprobe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Harness configuration file (TOML); built-in defaults when omitted
    #[arg(short, long, global = true, env = "HEADERPROBE_CONFIG")]
    config: Option<PathBuf>,

    /// Database path, overriding the configured one
    #[arg(long, global = true, env = "HEADERPROBE_DB")]
    db: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build and inspect the response corpus
    #[command(subcommand)]
    Corpus(corpus::CorpusCommands),

    /// Synthesize test URLs
    Plan(plan::PlanArgs),

    /// Compute the retry URLs for incomplete tests
    Repeat(repeat::RepeatArgs),

    /// Inspect a retry artifact
    #[command(subcommand)]
    Artifact(artifact::ArtifactCommands),

    /// Manage tested browsers
    #[command(subcommand)]
    Browsers(browsers::BrowserCommands),

    /// Manage collected results
    #[command(subcommand)]
    Results(results::ResultCommands),

    /// Manage the harness configuration
    #[command(subcommand)]
    Config(config::ConfigCommands),

    /// Show version information
    Version,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let ctx = Context::load(cli.config.as_deref(), cli.db, cli.format)?;

    match cli.command {
        Commands::Corpus(cmd) => corpus::execute(cmd, &ctx)?,
        Commands::Plan(args) => plan::execute(args, &ctx)?,
        Commands::Repeat(args) => repeat::execute(args, &ctx)?,
        Commands::Artifact(cmd) => artifact::execute(cmd, &ctx)?,
        Commands::Browsers(cmd) => browsers::execute(cmd, &ctx)?,
        Commands::Results(cmd) => results::execute(cmd, &ctx)?,
        Commands::Config(cmd) => config::execute(cmd, &ctx)?,
        Commands::Version => {
            println!("HeaderProbe CLI v{}", headerprobe_common::VERSION);
            println!("Test plan synthesis and repeat reconciliation for security headers");
        }
    }

    Ok(())
}
