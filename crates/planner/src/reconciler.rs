//! Repeat reconciliation
//!
//! Groups result records by test identity, counts records per browser, and
//! rewrites the representative URL of every incomplete (identity, browser)
//! pair into a narrower retry URL with a longer timeout. Reconciliation only
//! reads: the same records always produce the same repeat set.

use crate::config::RepeatConfig;
use crate::error::Result;
use crate::popups::PopupBucket;
use crate::test_url::TestPlanEntry;
use headerprobe_common::{ResultFilter, ResultRecord, Store, TestIdentity, UNKNOWN_BROWSER_ID};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::{debug, info, warn};

/// Reconciliation settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepeatOptions {
    /// Records per (identity, browser) needed to count as complete
    pub required_runs: u32,
    pub timeout_multiplier: u32,
    /// Keep the original id range instead of narrowing to one response id
    pub mult_resp_ids: bool,
    /// Browsers expected to report every identity; defaults to the browsers
    /// seen in the records
    pub browser_ids: Option<Vec<i64>>,
}

impl From<&RepeatConfig> for RepeatOptions {
    fn from(config: &RepeatConfig) -> Self {
        Self {
            required_runs: config.required_runs,
            timeout_multiplier: config.timeout_multiplier,
            mult_resp_ids: config.mult_resp_ids,
            browser_ids: None,
        }
    }
}

impl Default for RepeatOptions {
    fn default() -> Self {
        Self::from(&RepeatConfig::default())
    }
}

/// An identity left out of the repeat set because its rows are ambiguous
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReconcileWarning {
    /// Rows of one identity disagree on their popup bucket
    InconsistentPopups { identity: String },
    /// A row's URL cannot be parsed back into a plan entry
    UnparsableUrl {
        identity: String,
        url: String,
        reason: String,
    },
    /// Narrowing a grouped range would misalign its popup bucket
    PopupsOnGroupedRange { identity: String, url: String },
    /// Rows of one identity reduce to different clean URLs
    ConflictingUrls {
        identity: String,
        urls: Vec<String>,
    },
}

impl fmt::Display for ReconcileWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileWarning::InconsistentPopups { identity } => {
                write!(f, "{}: inconsistent popup configuration across rows", identity)
            }
            ReconcileWarning::UnparsableUrl { identity, url, reason } => {
                write!(f, "{}: cannot parse {}: {}", identity, url, reason)
            }
            ReconcileWarning::PopupsOnGroupedRange { identity, url } => {
                write!(f, "{}: popups on grouped range {}", identity, url)
            }
            ReconcileWarning::ConflictingUrls { identity, urls } => {
                write!(f, "{}: rows point at {} different tests", identity, urls.len())
            }
        }
    }
}

/// Result of one reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepeatOutcome {
    /// Browser id to retry URLs
    pub repeat: BTreeMap<i64, BTreeSet<String>>,
    pub warnings: Vec<ReconcileWarning>,
    /// Identities seen
    pub identities: usize,
    /// (identity, browser) pairs below the threshold
    pub incomplete: usize,
}

impl RepeatOutcome {
    /// Total retry URLs over all browsers
    pub fn url_count(&self) -> usize {
        self.repeat.values().map(BTreeSet::len).sum()
    }
}

/// Computes the repeat set for a batch of results
pub struct RepeatReconciler {
    options: RepeatOptions,
}

impl RepeatReconciler {
    pub fn new(options: RepeatOptions) -> Self {
        Self { options }
    }

    /// Load results through `filter` and reconcile them
    pub fn run<S: Store + ?Sized>(&self, store: &S, filter: &ResultFilter) -> Result<RepeatOutcome> {
        let records = store.query_results(filter)?;
        debug!("Loaded {} result records", records.len());
        Ok(self.reconcile(&records))
    }

    /// Reconcile an in-memory batch of results
    pub fn reconcile(&self, records: &[ResultRecord]) -> RepeatOutcome {
        let mut groups: BTreeMap<TestIdentity, Vec<&ResultRecord>> = BTreeMap::new();
        for record in records {
            groups.entry(record.identity()).or_default().push(record);
        }

        let browsers: BTreeSet<i64> = match &self.options.browser_ids {
            Some(ids) => ids.iter().copied().collect(),
            None => records
                .iter()
                .map(|r| r.browser_id)
                .filter(|&id| id != UNKNOWN_BROWSER_ID)
                .collect(),
        };

        let mut outcome = RepeatOutcome {
            identities: groups.len(),
            ..RepeatOutcome::default()
        };

        for (identity, rows) in &groups {
            let mut counts: BTreeMap<i64, u32> = BTreeMap::new();
            for row in rows {
                *counts.entry(row.browser_id).or_default() += 1;
            }
            let missing: Vec<i64> = browsers
                .iter()
                .copied()
                .filter(|b| counts.get(b).copied().unwrap_or(0) < self.options.required_runs)
                .collect();
            if missing.is_empty() {
                continue;
            }

            let representative = match self.representative(identity, rows) {
                Ok(entry) => entry,
                Err(warning) => {
                    warn!("Excluding identity from repeat: {}", warning);
                    outcome.warnings.push(warning);
                    continue;
                }
            };

            outcome.incomplete += missing.len();
            for browser_id in missing {
                let retry = TestPlanEntry {
                    browser_id,
                    ..representative.clone()
                };
                outcome
                    .repeat
                    .entry(browser_id)
                    .or_default()
                    .insert(retry.to_url());
            }
        }

        for (browser_id, urls) in &outcome.repeat {
            info!("Browser {}: {} URLs to repeat", browser_id, urls.len());
        }
        if !outcome.warnings.is_empty() {
            warn!("{} identities excluded from repeat", outcome.warnings.len());
        }
        outcome
    }

    /// Parse every row, rewrite it into the retry form, and check that all
    /// rows agree on popups and on the clean URL; the first row is kept
    fn representative(
        &self,
        identity: &TestIdentity,
        rows: &[&ResultRecord],
    ) -> std::result::Result<TestPlanEntry, ReconcileWarning> {
        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let mut entry = TestPlanEntry::parse(&row.full_url).map_err(|e| {
                ReconcileWarning::UnparsableUrl {
                    identity: identity.to_string(),
                    url: row.full_url.clone(),
                    reason: e.to_string(),
                }
            })?;
            if !self.options.mult_resp_ids {
                if entry.popups.is_some() && entry.ids.first != entry.ids.last {
                    return Err(ReconcileWarning::PopupsOnGroupedRange {
                        identity: identity.to_string(),
                        url: row.full_url.clone(),
                    });
                }
                entry.ids = (identity.response_id, identity.response_id).into();
            }
            entries.push(entry);
        }

        let popups: BTreeSet<Option<(u64, u64, bool)>> = entries
            .iter()
            .map(|e| e.popups.map(|p: PopupBucket| (p.first_popup, p.last_popup, p.run_no_popup)))
            .collect();
        if popups.len() > 1 {
            return Err(ReconcileWarning::InconsistentPopups {
                identity: identity.to_string(),
            });
        }

        let clean: BTreeSet<String> = entries.iter().map(TestPlanEntry::clean_url).collect();
        if clean.len() > 1 {
            return Err(ReconcileWarning::ConflictingUrls {
                identity: identity.to_string(),
                urls: clean.into_iter().collect(),
            });
        }

        let mut entry = entries.swap_remove(0);
        entry.timeout = entry.timeout.saturating_mul(self.options.timeout_multiplier);
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use headerprobe_common::RespType;

    const URL: &str = "https://sub.web-platform.test/_hp/tests/framing.sub.html?resp_type=parsing&browser_id=2&label=XFO&first_id=40&last_id=45&scheme=https&timeout=5";

    fn record(browser_id: i64, response_id: i64, url: &str) -> ResultRecord {
        ResultRecord {
            id: None,
            test_name: "framing".to_string(),
            test_status: 0,
            relation_info: "iframe".to_string(),
            org_scheme: "https".to_string(),
            org_host: "sub.web-platform.test".to_string(),
            resp_scheme: "https".to_string(),
            resp_host: "sub.web-platform.test".to_string(),
            response_id,
            resp_type: RespType::Parsing,
            browser_id,
            full_url: url.to_string(),
            outcome_value: None,
        }
    }

    fn runs(browser_id: i64, response_id: i64, n: usize) -> Vec<ResultRecord> {
        (0..n).map(|_| record(browser_id, response_id, URL)).collect()
    }

    #[test]
    fn test_threshold_selects_incomplete_browser() {
        let mut records = runs(2, 42, 5);
        records.extend(runs(3, 42, 3));

        let outcome = RepeatReconciler::new(RepeatOptions::default()).reconcile(&records);
        assert_eq!(outcome.identities, 1);
        assert_eq!(outcome.incomplete, 1);
        assert_eq!(outcome.repeat.keys().copied().collect::<Vec<_>>(), vec![3]);
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_retry_url_is_narrowed() {
        let outcome = RepeatReconciler::new(RepeatOptions::default()).reconcile(&runs(3, 42, 1));
        let urls: Vec<&String> = outcome.repeat[&3].iter().collect();
        assert_eq!(
            urls,
            vec!["https://sub.web-platform.test/_hp/tests/framing.sub.html?resp_type=parsing&browser_id=3&label=XFO&first_id=42&last_id=42&scheme=https&timeout=10"]
        );

        let options = RepeatOptions {
            mult_resp_ids: true,
            timeout_multiplier: 3,
            ..RepeatOptions::default()
        };
        let outcome = RepeatReconciler::new(options).reconcile(&runs(3, 42, 1));
        let url = outcome.repeat[&3].iter().next().unwrap();
        assert!(url.contains("first_id=40&last_id=45&scheme=https&timeout=15"));
    }

    #[test]
    fn test_missing_browser_counts_as_zero() {
        let mut records = runs(2, 42, 5);
        records.extend(runs(3, 43, 5));

        let outcome = RepeatReconciler::new(RepeatOptions::default()).reconcile(&records);
        assert_eq!(outcome.identities, 2);
        assert_eq!(outcome.incomplete, 2);
        assert!(outcome.repeat[&2].iter().all(|u| u.contains("first_id=43&last_id=43")));
        assert!(outcome.repeat[&3].iter().all(|u| u.contains("first_id=42&last_id=42")));

        let options = RepeatOptions {
            browser_ids: Some(vec![2, 3, 4]),
            ..RepeatOptions::default()
        };
        let outcome = RepeatReconciler::new(options).reconcile(&records);
        assert_eq!(outcome.repeat[&4].len(), 2);
    }

    #[test]
    fn test_popups_are_reattached() {
        let url = "http://sub.web-platform.test/_hp/tests/window-references-coop.sub.html?resp_type=basic&browser_id=2&label=COOP&first_id=7&last_id=7&scheme=http&timeout=5&first_popup=1&last_popup=10&run_no_popup=yes";
        let outcome = RepeatReconciler::new(RepeatOptions::default()).reconcile(&[record(2, 7, url)]);
        let retry = outcome.repeat[&2].iter().next().unwrap();
        assert!(retry.ends_with("timeout=10&first_popup=1&last_popup=10&run_no_popup=yes"));
    }

    #[test]
    fn test_ambiguous_identities_are_excluded() {
        let grouped = "http://sub.web-platform.test/_hp/tests/window-references-coop.sub.html?resp_type=parsing&browser_id=2&label=COOP&first_id=7&last_id=8&scheme=http&timeout=5&first_popup=1&last_popup=10&run_no_popup=yes";
        let single = grouped.replace("last_id=8", "last_id=7");
        let other_bucket = single.replace("first_popup=1&last_popup=10&run_no_popup=yes", "first_popup=11&last_popup=20&run_no_popup=no");

        let inconsistent = vec![record(2, 7, &single), record(2, 7, &other_bucket)];
        let outcome = RepeatReconciler::new(RepeatOptions::default()).reconcile(&inconsistent);
        assert!(outcome.repeat.is_empty());
        assert!(matches!(outcome.warnings[0], ReconcileWarning::InconsistentPopups { .. }));

        let outcome = RepeatReconciler::new(RepeatOptions::default()).reconcile(&[record(2, 7, grouped)]);
        assert!(matches!(outcome.warnings[0], ReconcileWarning::PopupsOnGroupedRange { .. }));

        let outcome = RepeatReconciler::new(RepeatOptions::default()).reconcile(&[record(2, 7, "not a url")]);
        assert!(matches!(outcome.warnings[0], ReconcileWarning::UnparsableUrl { .. }));
    }

    #[test]
    fn test_rows_joined_on_clean_url() {
        // an earlier retry round narrowed the range; both rows reduce to one test
        let narrowed = URL
            .replace("first_id=40&last_id=45", "first_id=42&last_id=42")
            .replace("timeout=5", "timeout=10");
        let records = vec![record(2, 42, URL), record(3, 42, &narrowed)];
        let outcome = RepeatReconciler::new(RepeatOptions::default()).reconcile(&records);
        assert!(outcome.warnings.is_empty());
        assert_eq!(outcome.url_count(), 2);

        let other_page = URL.replace("framing.sub.html", "framing-embed.sub.html");
        let records = vec![record(2, 42, URL), record(3, 42, &other_page)];
        let outcome = RepeatReconciler::new(RepeatOptions::default()).reconcile(&records);
        assert!(outcome.repeat.is_empty());
        match &outcome.warnings[0] {
            ReconcileWarning::ConflictingUrls { urls, .. } => {
                assert_eq!(urls.len(), 2);
                assert!(urls.iter().all(|u| u.contains("browser_id=1&") && !u.contains("timeout")));
            }
            other => panic!("unexpected warning: {}", other),
        }

        // keeping the original ranges leaves the two rounds distinct
        let options = RepeatOptions {
            mult_resp_ids: true,
            ..RepeatOptions::default()
        };
        let records = vec![record(2, 42, URL), record(3, 42, &narrowed)];
        let outcome = RepeatReconciler::new(options).reconcile(&records);
        assert!(matches!(outcome.warnings[0], ReconcileWarning::ConflictingUrls { .. }));
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let mut records = runs(2, 42, 2);
        records.extend(runs(3, 42, 4));
        records.extend(runs(2, 43, 5));
        let reconciler = RepeatReconciler::new(RepeatOptions::default());
        assert_eq!(reconciler.reconcile(&records), reconciler.reconcile(&records));
    }

    #[test]
    fn test_run_reads_filtered_results() {
        use headerprobe_common::{AutomationMode, BrowserEntry, Database, HeadlessMode, ResponseSpec};

        let db = Database::open_memory().unwrap();
        let (response_id, _) = db
            .upsert_response(&ResponseSpec::new(Vec::new(), "XFO"))
            .unwrap();
        let (browser_id, _) = db
            .get_or_create_browser(&BrowserEntry {
                name: "chrome".to_string(),
                version: "120".to_string(),
                os: "Ubuntu 22.04".to_string(),
                headless_mode: HeadlessMode::Headless,
                automation_mode: AutomationMode::Playwright,
                add_info: String::new(),
            })
            .unwrap();
        for _ in 0..2 {
            db.insert_result(&record(browser_id, response_id, URL)).unwrap();
        }

        let outcome = RepeatReconciler::new(RepeatOptions::default())
            .run(&db, &ResultFilter::default())
            .unwrap();
        assert_eq!(outcome.url_count(), 1);
        assert!(outcome.repeat[&browser_id]
            .iter()
            .all(|u| u.contains(&format!("first_id={id}&last_id={id}", id = response_id))));
    }
}
