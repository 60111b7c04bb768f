//! Config Commands

use anyhow::{Context as _, Result};
use clap::Subcommand;
use headerprobe_planner::HarnessConfig;
use std::path::PathBuf;

use super::Context;
use crate::output::{print_success, print_warning};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write the default configuration to a file
    Init {
        /// Destination path
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration as JSON
    Show,
}

pub fn execute(cmd: ConfigCommands, ctx: &Context) -> Result<()> {
    match cmd {
        ConfigCommands::Init { path, force } => {
            if path.exists() && !force {
                print_warning(&format!("{} exists; pass --force to overwrite", path.display()));
                return Ok(());
            }
            HarnessConfig::default()
                .save(&path)
                .with_context(|| format!("writing {}", path.display()))?;
            print_success(&format!("Default configuration written to {}", path.display()));
        }

        ConfigCommands::Show => {
            println!("{}", serde_json::to_string_pretty(&ctx.config)?);
        }
    }

    Ok(())
}
