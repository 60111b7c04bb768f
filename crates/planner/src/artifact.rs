//! Retry artifact: the repeat set as a JSON object of browser id to URLs
//!
//! ```json
//! { "2": ["https://sub.web-platform.test/...", "..."], "3": [] }
//! ```

use crate::error::Result;
use crate::reconciler::RepeatOutcome;
use headerprobe_common::Scheme;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Retry URLs keyed by browser id (as a string, matching the JSON form)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RetryArtifact {
    pub urls: BTreeMap<String, Vec<String>>,
}

impl From<&RepeatOutcome> for RetryArtifact {
    fn from(outcome: &RepeatOutcome) -> Self {
        let urls = outcome
            .repeat
            .iter()
            .map(|(browser_id, urls)| (browser_id.to_string(), urls.iter().cloned().collect()))
            .collect();
        Self { urls }
    }
}

impl RetryArtifact {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let artifact: Self = serde_json::from_str(&content)?;
        debug!("Loaded retry artifact from {:?}", path);
        Ok(artifact)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        debug!("Saved retry artifact to {:?}", path);
        Ok(())
    }

    /// One browser's retry URLs served over `scheme`
    pub fn urls_for(&self, browser_id: i64, scheme: Scheme) -> Vec<String> {
        let prefix = format!("{}://", scheme);
        self.urls
            .get(&browser_id.to_string())
            .map(|urls| urls.iter().filter(|u| u.starts_with(&prefix)).cloned().collect())
            .unwrap_or_default()
    }

    pub fn total(&self) -> usize {
        self.urls.values().map(Vec::len).sum()
    }
}

/// Split URLs into runner batches; the browser restarts between batches
pub fn batches(urls: &[String], max_urls_until_restart: usize) -> Vec<Vec<String>> {
    urls.chunks(max_urls_until_restart.max(1))
        .map(<[String]>::to_vec)
        .collect()
}
