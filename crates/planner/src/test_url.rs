//! Test plan entries and their URL form
//!
//! `scheme://host/path?resp_type=&browser_id=&label=&first_id=&last_id=&scheme=&timeout=[&first_popup=&last_popup=&run_no_popup=]`
//!
//! Parameter order is fixed so identical entries always render to identical
//! bytes. The browser runner may append `run_id`; parsing accepts and drops it.

use crate::chunker::IdRange;
use crate::popups::PopupBucket;
use headerprobe_common::{Error, RespType, Result, Scheme, UNKNOWN_BROWSER_ID};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use url::form_urlencoded;
use url::Url;

/// One executable unit of the plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestPlanEntry {
    pub scheme: Scheme,
    pub host: String,
    /// Path of the test page without leading slash
    pub path: String,
    pub resp_type: RespType,
    pub browser_id: i64,
    pub label: String,
    pub ids: IdRange,
    pub timeout: u32,
    pub popups: Option<PopupBucket>,
}

impl TestPlanEntry {
    /// Render the URL handed to the browser runner
    pub fn to_url(&self) -> String {
        self.render(self.browser_id, true, true)
    }

    /// Canonical URL with volatile fields removed.
    ///
    /// The browser id becomes the placeholder id; popup fields and the
    /// timeout are dropped.
    pub fn clean_url(&self) -> String {
        self.render(UNKNOWN_BROWSER_ID, false, false)
    }

    fn render(&self, browser_id: i64, with_timeout: bool, with_popups: bool) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query
            .append_pair("resp_type", self.resp_type.as_str())
            .append_pair("browser_id", &browser_id.to_string())
            .append_pair("label", &self.label)
            .append_pair("first_id", &self.ids.first.to_string())
            .append_pair("last_id", &self.ids.last.to_string())
            .append_pair("scheme", self.scheme.as_str());
        if with_timeout {
            query.append_pair("timeout", &self.timeout.to_string());
        }
        if with_popups {
            if let Some(popups) = &self.popups {
                query
                    .append_pair("first_popup", &popups.first_popup.to_string())
                    .append_pair("last_popup", &popups.last_popup.to_string())
                    .append_pair("run_no_popup", popups.run_no_popup_str());
            }
        }

        format!(
            "{}://{}/{}?{}",
            self.scheme,
            self.host,
            self.path,
            query.finish()
        )
    }

    /// Parse a URL produced by [`TestPlanEntry::to_url`]
    pub fn parse(raw: &str) -> Result<Self> {
        let url = Url::parse(raw).map_err(|e| Error::invalid_url(raw, e.to_string()))?;

        let scheme: Scheme = url
            .scheme()
            .parse()
            .map_err(|_| Error::invalid_url(raw, "unsupported scheme"))?;
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => return Err(Error::invalid_url(raw, "missing host")),
        };
        let path = url.path().trim_start_matches('/').to_string();

        let params = QueryParams {
            raw,
            pairs: url.query_pairs().into_owned().collect(),
        };

        let echoed: Scheme = params.get("scheme")?
            .parse()
            .map_err(|_| Error::invalid_url(raw, "invalid scheme parameter"))?;
        if echoed != scheme {
            return Err(Error::invalid_url(raw, "scheme parameter does not match URL"));
        }

        let ids = IdRange::new(params.number("first_id")?, params.number("last_id")?);
        if ids.is_empty() {
            return Err(Error::invalid_url(raw, "first_id is after last_id"));
        }

        let timeout = u32::try_from(params.number("timeout")?)
            .map_err(|_| Error::invalid_url(raw, "timeout out of range"))?;

        let popups = match (
            params.pairs.get("first_popup"),
            params.pairs.get("last_popup"),
            params.pairs.get("run_no_popup"),
        ) {
            (None, None, None) => None,
            (Some(_), Some(_), Some(flag)) => {
                let first_popup = u64::try_from(params.number("first_popup")?)
                    .map_err(|_| Error::invalid_url(raw, "first_popup out of range"))?;
                let last_popup = u64::try_from(params.number("last_popup")?)
                    .map_err(|_| Error::invalid_url(raw, "last_popup out of range"))?;
                let run_no_popup = match flag.as_str() {
                    "yes" => true,
                    "no" => false,
                    _ => return Err(Error::invalid_url(raw, "run_no_popup must be yes or no")),
                };
                Some(PopupBucket {
                    first_popup,
                    last_popup,
                    run_no_popup,
                })
            }
            _ => return Err(Error::invalid_url(raw, "incomplete popup parameters")),
        };

        Ok(Self {
            scheme,
            host,
            path,
            resp_type: params.get("resp_type")?.parse()?,
            browser_id: params.number("browser_id")?,
            label: params.get("label")?.clone(),
            ids,
            timeout,
            popups,
        })
    }
}

/// Query pairs of one URL, with errors naming that URL
struct QueryParams<'a> {
    raw: &'a str,
    pairs: HashMap<String, String>,
}

impl QueryParams<'_> {
    fn get(&self, key: &str) -> Result<&String> {
        self.pairs
            .get(key)
            .ok_or_else(|| Error::invalid_url(self.raw, format!("missing {}", key)))
    }

    fn number(&self, key: &str) -> Result<i64> {
        self.get(key)?
            .parse()
            .map_err(|_| Error::invalid_url(self.raw, format!("{} is not a number", key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> TestPlanEntry {
        TestPlanEntry {
            scheme: Scheme::Https,
            host: "sub.web-platform.test".to_string(),
            path: "_hp/tests/window-references-coop.sub.html".to_string(),
            resp_type: RespType::Parsing,
            browser_id: 7,
            label: "COOP".to_string(),
            ids: IdRange::new(40, 44),
            timeout: 5,
            popups: Some(PopupBucket {
                first_popup: 1,
                last_popup: 8,
                run_no_popup: true,
            }),
        }
    }

    #[test]
    fn test_url_layout() {
        assert_eq!(
            entry().to_url(),
            "https://sub.web-platform.test/_hp/tests/window-references-coop.sub.html\
             ?resp_type=parsing&browser_id=7&label=COOP&first_id=40&last_id=44&scheme=https\
             &timeout=5&first_popup=1&last_popup=8&run_no_popup=yes"
        );
    }

    #[test]
    fn test_clean_url_strips_volatile_fields() {
        assert_eq!(
            entry().clean_url(),
            "https://sub.web-platform.test/_hp/tests/window-references-coop.sub.html\
             ?resp_type=parsing&browser_id=1&label=COOP&first_id=40&last_id=44&scheme=https"
        );
    }

    #[test]
    fn test_parse_roundtrip_and_run_id() {
        let original = entry();
        let with_run_id = format!("{}&run_id=a1b2c3", original.to_url());
        assert_eq!(TestPlanEntry::parse(&with_run_id).unwrap(), original);

        let mut plain = entry();
        plain.popups = None;
        assert_eq!(TestPlanEntry::parse(&plain.to_url()).unwrap(), plain);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        let base = "http://sub.web-platform.test/_hp/tests/framing.sub.html";
        assert!(TestPlanEntry::parse("not a url").is_err());
        // Missing first_id
        assert!(TestPlanEntry::parse(&format!(
            "{}?resp_type=basic&browser_id=2&label=XFO&last_id=3&scheme=http&timeout=5",
            base
        ))
        .is_err());
        // Half of the popup triple
        assert!(TestPlanEntry::parse(&format!(
            "{}?resp_type=basic&browser_id=2&label=XFO&first_id=3&last_id=3&scheme=http&timeout=5&first_popup=1",
            base
        ))
        .is_err());
        // Scheme echo disagrees
        assert!(TestPlanEntry::parse(&format!(
            "{}?resp_type=basic&browser_id=2&label=XFO&first_id=3&last_id=3&scheme=https&timeout=5",
            base
        ))
        .is_err());
    }
}
