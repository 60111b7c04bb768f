//! Core types for HeaderProbe

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Browser id reserved for the "Unknown" browser seeded into every store.
///
/// Clean URLs carry this id in place of the concrete browser id.
pub const UNKNOWN_BROWSER_ID: i64 = 1;

/// A single response header as an ordered (name, value) pair
pub type Header = (String, String);

/// Response type / planning mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RespType {
    /// Minimal allow/deny set
    Debug,
    /// Small well-defined combination set
    Basic,
    /// Large fuzz corpus, never fully combined
    Parsing,
}

impl RespType {
    pub const ALL: [RespType; 3] = [RespType::Debug, RespType::Basic, RespType::Parsing];

    pub fn as_str(&self) -> &'static str {
        match self {
            RespType::Debug => "debug",
            RespType::Basic => "basic",
            RespType::Parsing => "parsing",
        }
    }
}

impl fmt::Display for RespType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RespType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "debug" => Ok(RespType::Debug),
            "basic" => Ok(RespType::Basic),
            "parsing" => Ok(RespType::Parsing),
            other => Err(Error::UnknownRespType(other.to_string())),
        }
    }
}

/// URL scheme a test page is served over
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }

    pub fn is_secure(&self) -> bool {
        matches!(self, Scheme::Https)
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "http" => Ok(Scheme::Http),
            "https" => Ok(Scheme::Https),
            other => Err(Error::InvalidConfig(format!("unknown scheme: {}", other))),
        }
    }
}

// ============================================================================
// Responses
// ============================================================================

/// A candidate unit of test input.
///
/// Header order is significant and preserved through persistence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResponseSpec {
    pub headers: Vec<Header>,
    pub status_code: u16,
    pub label: String,
    pub resp_type: RespType,
}

impl ResponseSpec {
    pub fn new(headers: Vec<Header>, label: impl Into<String>) -> Self {
        Self {
            headers,
            status_code: 200,
            label: label.into(),
            resp_type: RespType::Parsing,
        }
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }

    pub fn with_resp_type(mut self, resp_type: RespType) -> Self {
        self.resp_type = resp_type;
        self
    }

    /// Serialized header list: a JSON array of `[name, value]` pairs.
    ///
    /// This is the exact byte sequence persisted as the raw header.
    pub fn raw_header(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.headers)?)
    }

    /// Parse a persisted raw header back into ordered pairs
    pub fn parse_raw_header(raw: &[u8]) -> Result<Vec<Header>> {
        Ok(serde_json::from_slice(raw)?)
    }

    /// SHA-256 over the dedup key (raw header, status, label, type)
    pub fn digest(&self) -> Result<String> {
        let raw = self.raw_header()?;
        let mut hasher = Sha256::new();
        hasher.update(&raw);
        hasher.update([0u8]);
        hasher.update(self.status_code.to_be_bytes());
        hasher.update([0u8]);
        hasher.update(self.label.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.resp_type.as_str().as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }
}

/// A persisted response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredResponse {
    pub id: i64,
    pub spec: ResponseSpec,
    pub digest: String,
    pub created_at: i64,
}

// ============================================================================
// Browsers
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HeadlessMode {
    Real,
    Xvfb,
    Headless,
    HeadlessNew,
}

impl HeadlessMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            HeadlessMode::Real => "real",
            HeadlessMode::Xvfb => "xvfb",
            HeadlessMode::Headless => "headless",
            HeadlessMode::HeadlessNew => "headless-new",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "real" => Some(HeadlessMode::Real),
            "xvfb" => Some(HeadlessMode::Xvfb),
            "headless" => Some(HeadlessMode::Headless),
            "headless-new" => Some(HeadlessMode::HeadlessNew),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutomationMode {
    Manual,
    Intent,
    Selenium,
    Playwright,
    Other,
}

impl AutomationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AutomationMode::Manual => "manual",
            AutomationMode::Intent => "intent",
            AutomationMode::Selenium => "selenium",
            AutomationMode::Playwright => "playwright",
            AutomationMode::Other => "other",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "manual" => Some(AutomationMode::Manual),
            "intent" => Some(AutomationMode::Intent),
            "selenium" => Some(AutomationMode::Selenium),
            "playwright" => Some(AutomationMode::Playwright),
            "other" => Some(AutomationMode::Other),
            _ => None,
        }
    }
}

/// One tested browser configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserEntry {
    pub name: String,
    pub version: String,
    pub os: String,
    pub headless_mode: HeadlessMode,
    pub automation_mode: AutomationMode,
    #[serde(default)]
    pub add_info: String,
}

impl BrowserEntry {
    /// The placeholder browser every store is seeded with
    pub fn unknown() -> Self {
        Self {
            name: "Unknown".to_string(),
            version: "Unknown".to_string(),
            os: "Unknown".to_string(),
            headless_mode: HeadlessMode::Real,
            automation_mode: AutomationMode::Manual,
            add_info: String::new(),
        }
    }

    pub(crate) fn from_columns(
        name: String,
        version: String,
        os: String,
        headless_mode: &str,
        automation_mode: &str,
        add_info: String,
    ) -> Result<Self> {
        let headless_mode = HeadlessMode::parse(headless_mode)
            .ok_or_else(|| Error::Internal(format!("bad headless_mode column: {}", headless_mode)))?;
        let automation_mode = AutomationMode::parse(automation_mode).ok_or_else(|| {
            Error::Internal(format!("bad automation_mode column: {}", automation_mode))
        })?;
        Ok(Self {
            name,
            version,
            os,
            headless_mode,
            automation_mode,
            add_info,
        })
    }
}

/// A registered browser
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Browser {
    pub id: i64,
    #[serde(flatten)]
    pub entry: BrowserEntry,
}

// ============================================================================
// Results
// ============================================================================

/// One executed sub-test as reported by the browser runner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    #[serde(default)]
    pub id: Option<i64>,
    pub test_name: String,
    pub test_status: i64,
    #[serde(default)]
    pub relation_info: String,
    pub org_scheme: String,
    pub org_host: String,
    pub resp_scheme: String,
    pub resp_host: String,
    pub response_id: i64,
    pub resp_type: RespType,
    pub browser_id: i64,
    pub full_url: String,
    #[serde(default)]
    pub outcome_value: Option<serde_json::Value>,
}

impl ResultRecord {
    pub fn identity(&self) -> TestIdentity {
        TestIdentity {
            test_name: self.test_name.clone(),
            relation_info: self.relation_info.clone(),
            org_scheme: self.org_scheme.clone(),
            org_host: self.org_host.clone(),
            resp_scheme: self.resp_scheme.clone(),
            resp_host: self.resp_host.clone(),
            response_id: self.response_id,
            resp_type: self.resp_type,
        }
    }
}

/// Composite key grouping results that belong to the same logical test case
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TestIdentity {
    pub test_name: String,
    pub relation_info: String,
    pub org_scheme: String,
    pub org_host: String,
    pub resp_scheme: String,
    pub resp_host: String,
    pub response_id: i64,
    pub resp_type: RespType,
}

impl fmt::Display for TestIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}_{}_{}_{}_{}",
            self.test_name,
            self.relation_info,
            self.org_scheme,
            self.org_host,
            self.resp_scheme,
            self.resp_host,
            self.response_id,
            self.resp_type
        )
    }
}

/// Selection applied when loading results for reconciliation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultFilter {
    /// Only keep results with this test status (0 = completed)
    pub test_status: Option<i64>,
    /// Response types to leave out
    pub exclude_resp_types: Vec<RespType>,
    /// Drop results reported by the placeholder browser
    pub exclude_unknown_browser: bool,
    /// Restrict to these browser ids
    pub browser_ids: Option<Vec<i64>>,
    /// Restrict to browsers on this OS
    pub os: Option<String>,
}

impl Default for ResultFilter {
    fn default() -> Self {
        Self {
            test_status: Some(0),
            exclude_resp_types: vec![RespType::Debug],
            exclude_unknown_browser: true,
            browser_ids: None,
            os: None,
        }
    }
}
