//! Test plan synthesis
//!
//! For every scheme, template and browser: look up the template's response
//! ids, chunk them into contiguous runs, split each run's popups into
//! buckets, and emit one [`TestPlanEntry`] per (run, bucket). The output is a
//! pure function of the store snapshot, the template table, the mode and the
//! browser ids.

use crate::chunker::chunk_contiguous;
use crate::config::{HostConfig, PlanConfig};
use crate::error::TemplateError;
use crate::index::ResponseIndex;
use crate::popups::bucket_popups;
use crate::template::TestTemplate;
use crate::test_url::TestPlanEntry;
use headerprobe_common::{RespType, Store};
use tracing::{debug, info, warn};

/// Entries of one planning run plus the templates that were rejected
#[derive(Debug, Clone, Default)]
pub struct PlanOutcome {
    pub entries: Vec<TestPlanEntry>,
    pub errors: Vec<TemplateError>,
}

impl PlanOutcome {
    /// Rendered URLs in plan order
    pub fn urls(&self) -> Vec<String> {
        self.entries.iter().map(TestPlanEntry::to_url).collect()
    }
}

/// Test plan synthesizer
pub struct Synthesizer<'a, S: Store + ?Sized> {
    index: ResponseIndex<'a, S>,
    templates: &'a [TestTemplate],
    hosts: &'a HostConfig,
    plan: &'a PlanConfig,
}

impl<'a, S: Store + ?Sized> Synthesizer<'a, S> {
    pub fn new(
        store: &'a S,
        templates: &'a [TestTemplate],
        hosts: &'a HostConfig,
        plan: &'a PlanConfig,
    ) -> Self {
        Self {
            index: ResponseIndex::new(store),
            templates,
            hosts,
            plan,
        }
    }

    /// Build the plan for one mode and a set of browsers
    pub fn plan(&mut self, mode: RespType, browser_ids: &[i64]) -> PlanOutcome {
        let mut outcome = PlanOutcome::default();

        let mut valid = Vec::with_capacity(self.templates.len());
        for template in self.templates.iter().filter(|t| t.runs_in(mode)) {
            match template.validate(mode, self.plan) {
                Ok(()) => valid.push(template),
                Err(e) => {
                    warn!("Skipping template: {}", e);
                    outcome.errors.push(e);
                }
            }
        }

        for &scheme in &self.plan.schemes {
            for template in valid.iter().filter(|t| t.runs_over(scheme)) {
                let ids = self.index.get_resp_ids(&template.label, mode);
                if ids.is_empty() {
                    debug!("No {} responses for {}, skipping {}", mode, template.label, template.file);
                    continue;
                }

                let limit = template.id_group_limit(mode, self.plan) as usize;
                let ranges = chunk_contiguous(ids, limit);
                let popups_per_id = u64::from(template.popups_per_id(mode));
                let path = format!("{}/{}", self.hosts.test_dir, template.file);

                for &browser_id in browser_ids {
                    for range in &ranges {
                        let entry = TestPlanEntry {
                            scheme,
                            host: self.hosts.test_host(),
                            path: path.clone(),
                            resp_type: mode,
                            browser_id,
                            label: template.label.clone(),
                            ids: *range,
                            timeout: self.plan.timeout_secs,
                            popups: None,
                        };

                        let total = popups_per_id * range.len();
                        let buckets = bucket_popups(total, u64::from(self.plan.max_popups_per_url));
                        if buckets.is_empty() {
                            outcome.entries.push(entry);
                        } else {
                            outcome.entries.extend(buckets.into_iter().map(|bucket| TestPlanEntry {
                                popups: Some(bucket),
                                ..entry.clone()
                            }));
                        }
                    }
                }
            }
        }

        info!(
            "Planned {} {} URLs for {} browsers ({} templates rejected, {} store lookups)",
            outcome.entries.len(),
            mode,
            browser_ids.len(),
            outcome.errors.len(),
            self.index.store_lookups()
        );
        outcome
    }
}
