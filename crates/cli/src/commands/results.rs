//! Result Commands

use anyhow::{Context as _, Result};
use clap::Subcommand;
use headerprobe_common::{ResultRecord, Store};
use std::path::PathBuf;
use tracing::info;

use super::Context;
use crate::output::print_success;

#[derive(Subcommand)]
pub enum ResultCommands {
    /// Import a JSON array of result records produced by the browser runner
    Import {
        /// Path to the JSON file
        path: PathBuf,
    },
}

pub fn execute(cmd: ResultCommands, ctx: &Context) -> Result<()> {
    match cmd {
        ResultCommands::Import { path } => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let records: Vec<ResultRecord> = serde_json::from_str(&content)
                .with_context(|| format!("parsing {}", path.display()))?;

            let db = ctx.open_db()?;
            for (i, record) in records.iter().enumerate() {
                db.insert_result(record)
                    .with_context(|| format!("importing record {} ({})", i, record.full_url))?;
            }
            info!("Imported {} results from {:?}", records.len(), path);
            print_success(&format!("{} results imported", records.len()));
        }
    }

    Ok(())
}
