//! CLI Commands

pub mod artifact;
pub mod browsers;
pub mod config;
pub mod corpus;
pub mod plan;
pub mod repeat;
pub mod results;

use anyhow::{Context as _, Result};
use headerprobe_common::Database;
use headerprobe_planner::HarnessConfig;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::output::OutputFormat;

/// Resolved configuration shared by every command
pub struct Context {
    pub config: HarnessConfig,
    pub db_path: PathBuf,
    pub format: OutputFormat,
}

impl Context {
    pub fn load(config_path: Option<&Path>, db: Option<PathBuf>, format: OutputFormat) -> Result<Self> {
        let config = match config_path {
            Some(path) => HarnessConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => HarnessConfig::default(),
        };
        let db_path = db.unwrap_or_else(|| config.db_path.clone());
        debug!("Using database {:?}", db_path);
        Ok(Self {
            config,
            db_path,
            format,
        })
    }

    /// Open the store, creating its directory on first use
    pub fn open_db(&self) -> Result<Database> {
        if let Some(parent) = self.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }
        Database::open(&self.db_path)
            .with_context(|| format!("opening database {}", self.db_path.display()))
    }
}
