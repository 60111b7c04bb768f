//! Retry artifact commands

use anyhow::{Context as _, Result};
use clap::Subcommand;
use colored::Colorize;
use headerprobe_common::Scheme;
use headerprobe_planner::{batches, RetryArtifact};
use std::path::PathBuf;

use super::Context;
use crate::output::{print_info, OutputFormat};

#[derive(Subcommand)]
pub enum ArtifactCommands {
    /// Print one browser's retry URLs for a scheme, in runner batches
    Urls {
        /// Path to the retry artifact
        path: PathBuf,

        /// Browser id
        #[arg(short, long)]
        browser_id: i64,

        /// Scheme the runner is visiting
        #[arg(short, long, default_value = "https")]
        scheme: Scheme,
    },
}

pub fn execute(cmd: ArtifactCommands, ctx: &Context) -> Result<()> {
    match cmd {
        ArtifactCommands::Urls {
            path,
            browser_id,
            scheme,
        } => {
            let artifact = RetryArtifact::load(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let urls = artifact.urls_for(browser_id, scheme);
            let batches = batches(&urls, ctx.config.plan.max_urls_until_restart);

            if ctx.format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&batches)?);
                return Ok(());
            }

            if batches.is_empty() {
                print_info(&format!("No {} URLs to repeat for browser {}", scheme, browser_id));
            }
            for (i, batch) in batches.iter().enumerate() {
                println!("{}", format!("# batch {} ({} URLs)", i + 1, batch.len()).dimmed());
                for url in batch {
                    println!("{}", url);
                }
            }
        }
    }

    Ok(())
}
