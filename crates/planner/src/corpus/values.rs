//! URL placeholder expansion and external value lists

use crate::config::HostConfig;
use crate::error::Result;
use regex::Regex;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

/// Placeholder for an origin, site or URL inside a header value
pub const URL_REP: &str = "<!URL!>";

/// Consecutive URL groups kept per crawler value
const MAX_URL_GROUPS: usize = 4;

/// The origin, site and URL forms substituted for [`URL_REP`]
#[derive(Debug, Clone)]
pub struct UrlForms {
    forms: Vec<String>,
    origin_s: String,
}

impl UrlForms {
    pub fn new(hosts: &HostConfig) -> Self {
        let base = &hosts.base_host;
        let origin_s = format!("https://sub.{}", base);
        let origin_sp = format!("{}:443", origin_s);

        let forms = vec![
            format!("sub.{}", base),
            origin_s.clone(),
            format!("HTTPS://SUB.{}", base.to_uppercase()),
            format!("{}/abc/", origin_s),
            format!("{}/?a=a", origin_s),
            format!("http://sub.{}", base),
            origin_sp.clone(),
            format!("{}/", origin_s),
            format!("{}/", origin_sp),
            format!("https://{}", base),
            format!("https://sub.sub.{}", base),
            format!("*.{}", base),
            format!("*.sub.{}", base),
            format!("https://*.sub.{}", base),
            format!("https://{}", hosts.alt_host),
        ];

        Self { forms, origin_s }
    }

    /// All substitution forms, in fixed order
    pub fn forms(&self) -> &[String] {
        &self.forms
    }

    /// The secure origin of the test host
    pub fn origin_s(&self) -> &str {
        &self.origin_s
    }

    /// Fan every value containing [`URL_REP`] out over all forms.
    ///
    /// All occurrences inside one value get the same form. Values without the
    /// placeholder pass through unchanged; order is preserved.
    pub fn expand(&self, values: &[String]) -> Vec<String> {
        let mut out = Vec::with_capacity(values.len());
        for value in values {
            if value.contains(URL_REP) {
                out.extend(self.forms.iter().map(|form| value.replace(URL_REP, form)));
            } else {
                out.push(value.clone());
            }
        }
        out
    }
}

/// Normalizations applied to every crawler value
struct Normalizer {
    runs: Regex,
    groups: Regex,
    sha: Regex,
    digits: Regex,
}

impl Normalizer {
    fn new() -> Result<Self> {
        let rep = regex::escape(URL_REP);
        Ok(Self {
            runs: Regex::new(&format!(r"({}\s*){{3,}}", rep))?,
            groups: Regex::new(&format!(
                r"{rep}(?:(\s|,)*(ALLOW-FROM )?(allow-from )?{rep})+",
                rep = rep
            ))?,
            sha: Regex::new(r"sha256-\S+")?,
            digits: Regex::new(r"\d{4,}")?,
        })
    }

    fn apply(&self, value: &str) -> String {
        let value = self.runs.replace_all(value, format!("{} ", URL_REP).as_str());
        let groups = self.groups.find_iter(&value).count();
        // replacen treats a limit of 0 as "all"
        let value = if groups > MAX_URL_GROUPS {
            self.groups.replacen(&value, groups - MAX_URL_GROUPS, "")
        } else {
            value.clone()
        };
        let value = self.sha.replace_all(&value, "sha256-default");
        self.digits.replace_all(&value, "60").into_owned()
    }
}

/// Parse crawler statistics text: a header line, then `value count` rows.
///
/// URLs are replaced by [`URL_REP`] before splitting. Rows whose count is
/// below `min_count` or unparsable are dropped.
pub fn parse_value_list(content: &str, min_count: u64) -> Result<BTreeSet<String>> {
    let url_like = Regex::new(
        r"(http(s)?|HTTP(S)?)://[\w.*/\-:?=]*|([\w*\-/]+\.)+[\w*\-:/?=]+",
    )?;
    let normalizer = Normalizer::new()?;
    let content = url_like.replace_all(content, URL_REP);

    let mut values = BTreeSet::new();
    for row in content.lines().skip(1) {
        let Some((value, count)) = row.rsplit_once(' ') else {
            continue;
        };
        let Ok(count) = count.trim().replace(',', "").parse::<u64>() else {
            continue;
        };
        if count >= min_count {
            values.insert(normalizer.apply(value));
        }
    }
    Ok(values)
}

/// Load a crawler statistics file
pub fn load_value_list(path: &Path, min_count: u64) -> Result<BTreeSet<String>> {
    let bytes = std::fs::read(path)?;
    let content = String::from_utf8_lossy(&bytes);
    let values = parse_value_list(&content, min_count)?;
    debug!("Loaded {} values from {:?}", values.len(), path);
    Ok(values)
}
