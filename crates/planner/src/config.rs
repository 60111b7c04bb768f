//! Harness configuration
//!
//! One TOML file, passed explicitly. Every section has defaults so a partial
//! file (or none at all) yields a usable configuration.

use crate::error::{Error, Result};
use crate::template::{builtin_templates, TestTemplate};
use headerprobe_common::{BrowserEntry, Scheme};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Harness configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// SQLite database path
    pub db_path: PathBuf,

    /// Hosts the response server answers on
    pub hosts: HostConfig,

    /// Plan synthesis limits
    pub plan: PlanConfig,

    /// Repeat reconciliation settings
    pub repeat: RepeatConfig,

    /// Corpus building settings
    pub corpus: CorpusConfig,

    /// Test templates
    pub templates: Vec<TestTemplate>,

    /// Browsers to register
    pub browsers: Vec<BrowserEntry>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            db_path: headerprobe_common::default_db_path(),
            hosts: HostConfig::default(),
            plan: PlanConfig::default(),
            repeat: RepeatConfig::default(),
            corpus: CorpusConfig::default(),
            templates: builtin_templates(),
            browsers: Vec::new(),
        }
    }
}

/// Host names used in URLs and URL-like header values
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Primary host; test pages live on `sub.<base_host>`
    pub base_host: String,

    /// Cross-site host
    pub alt_host: String,

    /// Directory of the test pages on the response server
    pub test_dir: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            base_host: "web-platform.test".to_string(),
            alt_host: "not-web-platform.test".to_string(),
            test_dir: "_hp/tests".to_string(),
        }
    }
}

impl HostConfig {
    /// Host test pages are served from
    pub fn test_host(&self) -> String {
        format!("sub.{}", self.base_host)
    }

    /// The `location` header redirecting to the empty page
    pub fn redirect_empty(&self) -> (String, String) {
        (
            "location".to_string(),
            format!("https://sub.{}/_hp/common/empty.html", self.base_host),
        )
    }
}

/// Plan synthesis limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanConfig {
    /// Upper bound on response ids grouped into one parsing URL
    pub max_resps_per_url: u32,

    /// Upper bound on popups opened by one URL
    pub max_popups_per_url: u32,

    /// Per-test timeout carried in every URL (seconds)
    pub timeout_secs: u32,

    /// Schemes to plan for, in order
    pub schemes: Vec<Scheme>,

    /// URLs a browser visits before it is restarted
    pub max_urls_until_restart: usize,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            max_resps_per_url: 10,
            max_popups_per_url: 100,
            timeout_secs: 5,
            schemes: vec![Scheme::Http, Scheme::Https],
            max_urls_until_restart: 100,
        }
    }
}

/// Repeat reconciliation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepeatConfig {
    /// Records per (identity, browser) needed to count as complete
    pub required_runs: u32,

    /// Factor applied to the original timeout in retry URLs
    pub timeout_multiplier: u32,

    /// Keep the original id range instead of one response id per retry URL
    pub mult_resp_ids: bool,
}

impl Default for RepeatConfig {
    fn default() -> Self {
        Self {
            required_runs: 5,
            timeout_multiplier: 2,
            mult_resp_ids: false,
        }
    }
}

/// Corpus building settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    /// Attempts per response before an upsert failure is surfaced
    pub upsert_retries: u32,

    /// External value lists keyed by family label
    pub value_lists: BTreeMap<String, Vec<ValueListSource>>,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            upsert_retries: 3,
            value_lists: BTreeMap::new(),
        }
    }
}

/// A crawler statistics file ("value count" per line)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueListSource {
    pub path: PathBuf,
    #[serde(default)]
    pub min_count: u64,
}

impl HarnessConfig {
    /// Load configuration from an explicit path
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject limits that would make planning or reconciliation meaningless
    pub fn validate(&self) -> Result<()> {
        if self.plan.max_resps_per_url == 0 {
            return Err(Error::InvalidConfig("plan.max_resps_per_url must be at least 1".into()));
        }
        if self.plan.max_popups_per_url == 0 {
            return Err(Error::InvalidConfig("plan.max_popups_per_url must be at least 1".into()));
        }
        if self.plan.max_urls_until_restart == 0 {
            return Err(Error::InvalidConfig(
                "plan.max_urls_until_restart must be at least 1".into(),
            ));
        }
        if self.plan.schemes.is_empty() {
            return Err(Error::InvalidConfig("plan.schemes must not be empty".into()));
        }
        if self.repeat.required_runs == 0 {
            return Err(Error::InvalidConfig("repeat.required_runs must be at least 1".into()));
        }
        if self.repeat.timeout_multiplier == 0 {
            return Err(Error::InvalidConfig("repeat.timeout_multiplier must be at least 1".into()));
        }
        if self.corpus.upsert_retries == 0 {
            return Err(Error::InvalidConfig("corpus.upsert_retries must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HarnessConfig::default();
        assert_eq!(config.plan.max_resps_per_url, 10);
        assert_eq!(config.plan.max_popups_per_url, 100);
        assert_eq!(config.repeat.required_runs, 5);
        assert_eq!(config.repeat.timeout_multiplier, 2);
        assert_eq!(config.corpus.upsert_retries, 3);
        assert_eq!(config.hosts.test_host(), "sub.web-platform.test");
        assert!(!config.templates.is_empty());
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("harness.toml");
        std::fs::write(
            &path,
            r#"
db_path = "/tmp/hp.db"

[plan]
max_resps_per_url = 4
schemes = ["http"]

[hosts]
base_host = "headers.example"
"#,
        )
        .unwrap();

        let config = HarnessConfig::load(&path).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/hp.db"));
        assert_eq!(config.plan.max_resps_per_url, 4);
        assert_eq!(config.plan.max_popups_per_url, 100);
        assert_eq!(config.plan.schemes, vec![Scheme::Http]);
        assert_eq!(config.hosts.base_host, "headers.example");
        assert_eq!(config.hosts.alt_host, "not-web-platform.test");
        assert_eq!(config.templates.len(), builtin_templates().len());
    }

    #[test]
    fn test_save_and_reload() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("harness.toml");

        let mut config = HarnessConfig::default();
        config.repeat.timeout_multiplier = 3;
        config.corpus.value_lists.insert(
            "XFO".to_string(),
            vec![ValueListSource {
                path: PathBuf::from("xfo-values.txt"),
                min_count: 2,
            }],
        );
        config.save(&path).unwrap();

        let loaded = HarnessConfig::load(&path).unwrap();
        assert_eq!(loaded.repeat.timeout_multiplier, 3);
        assert_eq!(loaded.corpus.value_lists["XFO"][0].min_count, 2);
        assert_eq!(loaded.templates, config.templates);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        assert!(HarnessConfig::load(&tmp.path().join("absent.toml")).is_err());
    }

    #[test]
    fn test_rejects_zero_limits() {
        let mut config = HarnessConfig::default();
        config.plan.max_popups_per_url = 0;
        assert!(config.validate().is_err());

        let mut config = HarnessConfig::default();
        config.plan.schemes.clear();
        assert!(config.validate().is_err());
    }
}
