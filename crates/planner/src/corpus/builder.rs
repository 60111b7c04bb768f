//! Corpus builder: generate, deduplicate and persist responses

use super::family::{
    builtin_basic_corpora, builtin_families, builtin_multi_families, BasicCorpus, HeaderFamily,
    MultiHeaderFamily,
};
use super::values::{load_value_list, UrlForms};
use crate::config::HarnessConfig;
use crate::error::{Error, Result};
use headerprobe_common::{ResponseSpec, Store};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Outcome of persisting one label's responses
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusReport {
    pub label: String,
    /// Responses produced by the strategies, duplicates included
    pub generated: usize,
    /// Distinct responses after in-memory deduplication
    pub unique: usize,
    /// Rows newly written to the store
    pub created: usize,
}

/// Builds and persists the response corpus
pub struct CorpusBuilder<'a, S: Store + ?Sized> {
    store: &'a S,
    config: &'a HarnessConfig,
}

impl<'a, S: Store + ?Sized> CorpusBuilder<'a, S> {
    pub fn new(store: &'a S, config: &'a HarnessConfig) -> Self {
        Self { store, config }
    }

    /// Built-in families with configured external value lists appended
    pub fn families(&self) -> Result<Vec<HeaderFamily>> {
        let forms = UrlForms::new(&self.config.hosts);
        let mut families = builtin_families(&self.config.hosts);

        for (label, sources) in &self.config.corpus.value_lists {
            let Some(family) = families.iter_mut().find(|f| &f.label == label) else {
                return Err(Error::UnknownFamily(label.clone()));
            };
            for source in sources {
                let values: Vec<String> = load_value_list(&source.path, source.min_count)?
                    .into_iter()
                    .collect();
                info!("Adding {} external values from {:?} to {}", values.len(), source.path, label);
                family.extend_other_values(&values, &forms);
            }
        }

        Ok(families)
    }

    /// Names of every buildable label
    pub fn labels(&self) -> Result<Vec<String>> {
        let families = self.families()?;
        let mut labels: Vec<String> = families.iter().map(|f| f.label.clone()).collect();
        labels.extend(builtin_multi_families(&families).into_iter().map(|f| f.label));
        for corpus in builtin_basic_corpora(&self.config.hosts) {
            if !labels.contains(&corpus.label) {
                labels.push(corpus.label);
            }
        }
        Ok(labels)
    }

    /// Build the parsing corpus, optionally restricted to one label
    pub fn build_parsing(&self, only: Option<&str>) -> Result<Vec<CorpusReport>> {
        let families = self.families()?;
        let multi = builtin_multi_families(&families);
        let wanted = |label: &str| only.map_or(true, |o| o == label);

        let mut reports = Vec::new();
        for family in families.iter().filter(|f| wanted(&f.label)) {
            reports.push(self.build_family(family)?);
        }
        for family in multi.iter().filter(|f| wanted(&f.label)) {
            reports.push(self.build_multi(family)?);
        }

        if let Some(label) = only {
            if reports.is_empty() {
                return Err(Error::UnknownFamily(label.to_string()));
            }
        }
        Ok(reports)
    }

    /// Build the debug and basic corpora, optionally restricted to one label
    pub fn build_basic(&self, only: Option<&str>) -> Result<Vec<CorpusReport>> {
        let mut reports = Vec::new();
        for corpus in builtin_basic_corpora(&self.config.hosts) {
            if only.map_or(true, |o| o == corpus.label) {
                reports.push(self.build_basic_corpus(&corpus)?);
            }
        }
        if let Some(label) = only {
            if reports.is_empty() {
                return Err(Error::UnknownFamily(label.to_string()));
            }
        }
        Ok(reports)
    }

    pub fn build_family(&self, family: &HeaderFamily) -> Result<CorpusReport> {
        let redirect = self.config.hosts.redirect_empty();
        self.persist(&family.label, family.all_tests(&redirect))
    }

    pub fn build_multi(&self, family: &MultiHeaderFamily) -> Result<CorpusReport> {
        self.persist(&family.label, family.all_tests())
    }

    pub fn build_basic_corpus(&self, corpus: &BasicCorpus) -> Result<CorpusReport> {
        let redirect = self.config.hosts.redirect_empty();
        self.persist(&corpus.label, corpus.specs(&redirect))
    }

    /// Deduplicate in generation order, then upsert every response.
    ///
    /// Each upsert is attempted up to `corpus.upsert_retries` times; the
    /// last failure is returned and nothing is skipped silently.
    pub fn persist(&self, label: &str, specs: Vec<ResponseSpec>) -> Result<CorpusReport> {
        let generated = specs.len();
        let mut seen = HashSet::with_capacity(generated);
        let unique: Vec<ResponseSpec> = specs
            .into_iter()
            .filter(|spec| seen.insert(spec.clone()))
            .collect();

        let mut created = 0;
        for spec in &unique {
            if self.upsert_with_retry(label, spec)? {
                created += 1;
            }
        }

        info!(
            "Corpus {}: generated {}, unique {}, created {}",
            label,
            generated,
            unique.len(),
            created
        );

        Ok(CorpusReport {
            label: label.to_string(),
            generated,
            unique: unique.len(),
            created,
        })
    }

    fn upsert_with_retry(&self, label: &str, spec: &ResponseSpec) -> Result<bool> {
        let attempts = self.config.corpus.upsert_retries.max(1);
        let mut attempt = 1;
        loop {
            match self.store.upsert_response(spec) {
                Ok((id, created)) => {
                    if created {
                        debug!("Stored response {} for {}", id, label);
                    }
                    return Ok(created);
                }
                Err(e) if attempt < attempts => {
                    warn!("Upsert for {} failed (attempt {}/{}): {}", label, attempt, attempts, e);
                    attempt += 1;
                }
                Err(e) => {
                    return Err(Error::UpsertExhausted {
                        label: label.to_string(),
                        attempts,
                        source: e,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use headerprobe_common::{
        Browser, BrowserEntry, Database, RespType, ResultFilter, ResultRecord, StoredResponse,
    };
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails the first `failures` upserts, then delegates
    struct FlakyStore {
        inner: Database,
        failures: AtomicU32,
    }

    impl Store for FlakyStore {
        fn lookup_response_ids(&self, label: &str, resp_type: RespType) -> headerprobe_common::Result<Vec<i64>> {
            self.inner.lookup_response_ids(label, resp_type)
        }
        fn upsert_response(&self, spec: &ResponseSpec) -> headerprobe_common::Result<(i64, bool)> {
            let remaining = self.failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures.store(remaining - 1, Ordering::SeqCst);
                return Err(headerprobe_common::Error::StoreUnavailable("busy".to_string()));
            }
            self.inner.upsert_response(spec)
        }
        fn get_response(&self, id: i64) -> headerprobe_common::Result<Option<StoredResponse>> {
            self.inner.get_response(id)
        }
        fn count_responses(&self, label: Option<&str>, resp_type: Option<RespType>) -> headerprobe_common::Result<u64> {
            self.inner.count_responses(label, resp_type)
        }
        fn query_results(&self, filter: &ResultFilter) -> headerprobe_common::Result<Vec<ResultRecord>> {
            self.inner.query_results(filter)
        }
        fn insert_result(&self, record: &ResultRecord) -> headerprobe_common::Result<i64> {
            self.inner.insert_result(record)
        }
        fn get_or_create_browser(&self, entry: &BrowserEntry) -> headerprobe_common::Result<(i64, bool)> {
            self.inner.get_or_create_browser(entry)
        }
        fn list_browsers(&self) -> headerprobe_common::Result<Vec<Browser>> {
            self.inner.list_browsers()
        }
    }

    fn spec(value: &str) -> ResponseSpec {
        ResponseSpec::new(vec![("x-frame-options".to_string(), value.to_string())], "XFO")
    }

    #[test]
    fn test_persist_dedups_and_is_idempotent() {
        let db = Database::open_memory().unwrap();
        let config = HarnessConfig::default();
        let builder = CorpusBuilder::new(&db, &config);

        let specs = vec![spec("DENY"), spec("DENY"), spec("SAMEORIGIN")];
        let first = builder.persist("XFO", specs.clone()).unwrap();
        assert_eq!((first.generated, first.unique, first.created), (3, 2, 2));

        let second = builder.persist("XFO", specs).unwrap();
        assert_eq!(second.created, 0);
        assert_eq!(db.count_responses(Some("XFO"), None).unwrap(), 2);
    }

    #[test]
    fn test_upsert_is_retried() {
        let store = FlakyStore {
            inner: Database::open_memory().unwrap(),
            failures: AtomicU32::new(2),
        };
        let config = HarnessConfig::default();
        let report = CorpusBuilder::new(&store, &config)
            .persist("XFO", vec![spec("DENY")])
            .unwrap();
        assert_eq!(report.created, 1);
    }

    #[test]
    fn test_exhausted_retries_surface() {
        let store = FlakyStore {
            inner: Database::open_memory().unwrap(),
            failures: AtomicU32::new(10),
        };
        let config = HarnessConfig::default();
        let err = CorpusBuilder::new(&store, &config)
            .persist("XFO", vec![spec("DENY")])
            .unwrap_err();
        assert!(matches!(err, Error::UpsertExhausted { attempts: 3, .. }));
    }

    #[test]
    fn test_build_basic_for_one_label() {
        let db = Database::open_memory().unwrap();
        let config = HarnessConfig::default();
        let builder = CorpusBuilder::new(&db, &config);

        let reports = builder.build_basic(Some("XFO")).unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(db.lookup_response_ids("XFO", RespType::Debug).unwrap().len(), 2);
        // 7 single values, the empty response, one joined value, 2 redirects
        assert_eq!(db.lookup_response_ids("XFO", RespType::Basic).unwrap().len(), 11);

        assert!(matches!(
            builder.build_basic(Some("NOPE")),
            Err(Error::UnknownFamily(_))
        ));
    }

    #[test]
    fn test_build_parsing_for_one_label() {
        let db = Database::open_memory().unwrap();
        let config = HarnessConfig::default();
        let builder = CorpusBuilder::new(&db, &config);

        let reports = builder.build_parsing(Some("TAO")).unwrap();
        assert_eq!(reports.len(), 1);
        let report = &reports[0];
        assert!(report.unique <= report.generated);
        assert_eq!(report.created, report.unique);
        assert_eq!(
            db.count_responses(Some("TAO"), Some(RespType::Parsing)).unwrap(),
            report.unique as u64
        );
    }

    #[test]
    fn test_external_values_are_added() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("rp-values.txt");
        std::fs::write(&path, "value count\nsame-origin, origin 40\nrare 1\n").unwrap();

        let mut config = HarnessConfig::default();
        config.corpus.value_lists.insert(
            "RP".to_string(),
            vec![crate::config::ValueListSource { path, min_count: 2 }],
        );
        let db = Database::open_memory().unwrap();
        let builder = CorpusBuilder::new(&db, &config);
        let rp = builder
            .families()
            .unwrap()
            .into_iter()
            .find(|f| f.label == "RP")
            .unwrap();
        assert!(rp.other_values.contains(&"same-origin, origin".to_string()));
        assert!(!rp.other_values.contains(&"rare".to_string()));

        config.corpus.value_lists.insert("NOPE".to_string(), Vec::new());
        let builder = CorpusBuilder::new(&db, &config);
        assert!(matches!(builder.families(), Err(Error::UnknownFamily(_))));
    }
}
