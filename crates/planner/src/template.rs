//! Test templates: static metadata per logical test surface

use crate::config::PlanConfig;
use crate::error::TemplateError;
use headerprobe_common::{RespType, Scheme};
use serde::{Deserialize, Serialize};

/// Which response types a template runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeFilter {
    /// Every mode
    #[default]
    All,
    /// debug and basic only
    NonParsing,
    /// parsing only
    ParsingOnly,
}

impl ModeFilter {
    pub fn allows(&self, mode: RespType) -> bool {
        match self {
            ModeFilter::All => true,
            ModeFilter::NonParsing => mode != RespType::Parsing,
            ModeFilter::ParsingOnly => mode == RespType::Parsing,
        }
    }
}

/// One test page and the response label it exercises
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestTemplate {
    /// Test page file under the test directory
    pub file: String,

    /// Response label the page loads
    pub label: String,

    /// Maximum response ids grouped into one parsing URL
    pub num_resp_ids: u32,

    /// Popups opened per response id in parsing mode
    #[serde(default)]
    pub popups_parsing: u32,

    /// Popups opened per response id in basic and debug mode
    #[serde(default)]
    pub popups_basic: u32,

    /// Skip the secure scheme
    #[serde(default)]
    pub http_only: bool,

    /// Modes this template runs in
    #[serde(default)]
    pub modes: ModeFilter,
}

impl TestTemplate {
    fn new(file: &str, label: &str) -> Self {
        Self {
            file: file.to_string(),
            label: label.to_string(),
            num_resp_ids: 10,
            popups_parsing: 0,
            popups_basic: 0,
            http_only: false,
            modes: ModeFilter::All,
        }
    }

    fn with_popups(mut self, parsing: u32, basic: u32) -> Self {
        self.popups_parsing = parsing;
        self.popups_basic = basic;
        self
    }

    fn http_only(mut self) -> Self {
        self.http_only = true;
        self
    }

    fn modes(mut self, modes: ModeFilter) -> Self {
        self.modes = modes;
        self
    }

    /// Whether the template is planned for this mode
    pub fn runs_in(&self, mode: RespType) -> bool {
        self.modes.allows(mode)
    }

    /// Whether the template is planned over this scheme
    pub fn runs_over(&self, scheme: Scheme) -> bool {
        !(self.http_only && scheme.is_secure())
    }

    /// Popups per response id for a mode
    pub fn popups_per_id(&self, mode: RespType) -> u32 {
        match mode {
            RespType::Parsing => self.popups_parsing,
            RespType::Basic | RespType::Debug => self.popups_basic,
        }
    }

    /// Longest id run one URL may carry; only parsing mode groups
    pub fn id_group_limit(&self, mode: RespType, plan: &PlanConfig) -> u32 {
        match mode {
            RespType::Parsing => self.num_resp_ids.min(plan.max_resps_per_url).max(1),
            RespType::Basic | RespType::Debug => 1,
        }
    }

    /// Check the metadata against the plan limits for one mode.
    ///
    /// Buckets must never cut one response id's popups in two: once a URL's
    /// popup total can exceed `max_popups_per_url`, the per-id count has to
    /// divide the bucket size (or be a multiple of it).
    pub fn validate(&self, mode: RespType, plan: &PlanConfig) -> Result<(), TemplateError> {
        let fail = |reason: String| TemplateError {
            file: self.file.clone(),
            label: self.label.clone(),
            reason,
        };

        if self.file.is_empty() || self.label.is_empty() {
            return Err(fail("file and label must be set".to_string()));
        }
        if self.num_resp_ids == 0 {
            return Err(fail("num_resp_ids must be at least 1".to_string()));
        }

        let popups = u64::from(self.popups_per_id(mode));
        if popups == 0 {
            return Ok(());
        }
        let max = u64::from(plan.max_popups_per_url);
        if max == 0 {
            return Err(fail(format!("{} popups declared but max_popups_per_url is 0", mode)));
        }
        if popups * u64::from(self.id_group_limit(mode, plan)) <= max {
            return Ok(());
        }
        let aligned = if popups <= max {
            max % popups == 0
        } else {
            popups % max == 0
        };
        if !aligned {
            return Err(fail(format!(
                "{} popups per id ({}) cannot be split evenly into buckets of {}",
                mode, popups, max
            )));
        }

        Ok(())
    }
}

/// The built-in template table
pub fn builtin_templates() -> Vec<TestTemplate> {
    vec![
        TestTemplate::new("fetch-cors.sub.html", "CORS").modes(ModeFilter::NonParsing),
        TestTemplate::new("fetch-cors.sub.html", "CORS-ACAO").modes(ModeFilter::ParsingOnly),
        TestTemplate::new("fetch-cors.sub.html", "CORS-ACAC").modes(ModeFilter::ParsingOnly),
        TestTemplate::new("fetch-cors.sub.html", "CORS-ACAM").modes(ModeFilter::ParsingOnly),
        TestTemplate::new("fetch-cors.sub.html", "CORS-ACAH").modes(ModeFilter::ParsingOnly),
        TestTemplate::new("fetch-cors.sub.html", "CORS-ACEH").modes(ModeFilter::ParsingOnly),
        TestTemplate::new("framing.sub.html", "XFO"),
        TestTemplate::new("framing.sub.html", "CSP-FA"),
        TestTemplate::new("framing.sub.html", "CSPvsXFO"),
        TestTemplate::new("fullscreen-api-pp.sub.html", "PP"),
        TestTemplate::new("originAgentCluster-oac.sub.html", "OAC"),
        TestTemplate::new("perfAPI-tao.sub.html", "TAO"),
        TestTemplate::new("referrer-access-rp.sub.html", "RP"),
        TestTemplate::new("script-execution-csp.sub.html", "CSP-SCRIPT"),
        TestTemplate::new("subresource-loading-coep.sub.html", "COEP"),
        TestTemplate::new("subresource-loading-corp.sub.html", "CORP"),
        TestTemplate::new("subresource-loading-csp.sub.html", "CSP-IMG"),
        TestTemplate::new("upgrade-hsts.sub.html", "HSTS").http_only(),
        TestTemplate::new("window-references-coop.sub.html", "COOP").with_popups(2, 12),
    ]
}
