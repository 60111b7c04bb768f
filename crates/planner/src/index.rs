//! Response index: memoized (label, response type) -> sorted ids
//!
//! One index lives for one planning run. Lookups hit the store once per key;
//! a failed lookup is logged and cached as empty so the affected templates
//! are skipped for the rest of the run instead of aborting the plan.

use headerprobe_common::{RespType, Store};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Read-through cache over [`Store::lookup_response_ids`]
pub struct ResponseIndex<'a, S: Store + ?Sized> {
    store: &'a S,
    cache: HashMap<(String, RespType), Vec<i64>>,
    store_lookups: usize,
}

impl<'a, S: Store + ?Sized> ResponseIndex<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            cache: HashMap::new(),
            store_lookups: 0,
        }
    }

    /// Sorted response ids for a label and response type
    pub fn get_resp_ids(&mut self, label: &str, resp_type: RespType) -> &[i64] {
        let key = (label.to_string(), resp_type);
        if !self.cache.contains_key(&key) {
            self.store_lookups += 1;
            let ids = match self.store.lookup_response_ids(label, resp_type) {
                Ok(mut ids) => {
                    ids.sort_unstable();
                    ids.dedup();
                    debug!("Indexed {} {} responses for {}", ids.len(), resp_type, label);
                    ids
                }
                Err(e) => {
                    warn!("Response lookup for {} ({}) failed, using no ids: {}", label, resp_type, e);
                    Vec::new()
                }
            };
            self.cache.insert(key.clone(), ids);
        }
        self.cache.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of store queries issued so far
    pub fn store_lookups(&self) -> usize {
        self.store_lookups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use headerprobe_common::{
        Browser, BrowserEntry, Database, Error, ResponseSpec, ResultFilter, ResultRecord,
        StoredResponse,
    };

    struct UnavailableStore;

    impl Store for UnavailableStore {
        fn lookup_response_ids(&self, _: &str, _: RespType) -> headerprobe_common::Result<Vec<i64>> {
            Err(Error::StoreUnavailable("connection refused".to_string()))
        }
        fn upsert_response(&self, _: &ResponseSpec) -> headerprobe_common::Result<(i64, bool)> {
            Err(Error::StoreUnavailable("connection refused".to_string()))
        }
        fn get_response(&self, _: i64) -> headerprobe_common::Result<Option<StoredResponse>> {
            Ok(None)
        }
        fn count_responses(&self, _: Option<&str>, _: Option<RespType>) -> headerprobe_common::Result<u64> {
            Ok(0)
        }
        fn query_results(&self, _: &ResultFilter) -> headerprobe_common::Result<Vec<ResultRecord>> {
            Ok(Vec::new())
        }
        fn insert_result(&self, _: &ResultRecord) -> headerprobe_common::Result<i64> {
            Err(Error::StoreUnavailable("connection refused".to_string()))
        }
        fn get_or_create_browser(&self, _: &BrowserEntry) -> headerprobe_common::Result<(i64, bool)> {
            Err(Error::StoreUnavailable("connection refused".to_string()))
        }
        fn list_browsers(&self) -> headerprobe_common::Result<Vec<Browser>> {
            Ok(Vec::new())
        }
    }

    fn xfo(value: &str) -> ResponseSpec {
        ResponseSpec::new(vec![("x-frame-options".to_string(), value.to_string())], "XFO")
    }

    #[test]
    fn test_lookup_is_memoized() {
        let db = Database::open_memory().unwrap();
        let (a, _) = db.upsert_response(&xfo("DENY")).unwrap();

        let mut index = ResponseIndex::new(&db);
        assert_eq!(index.get_resp_ids("XFO", RespType::Parsing), &[a]);

        // Later inserts are invisible to this run
        db.upsert_response(&xfo("SAMEORIGIN")).unwrap();
        assert_eq!(index.get_resp_ids("XFO", RespType::Parsing), &[a]);
        assert_eq!(index.store_lookups(), 1);

        // A new index sees the new snapshot
        let mut fresh = ResponseIndex::new(&db);
        assert_eq!(fresh.get_resp_ids("XFO", RespType::Parsing).len(), 2);
    }

    #[test]
    fn test_keys_are_separate() {
        let db = Database::open_memory().unwrap();
        db.upsert_response(&xfo("DENY")).unwrap();

        let mut index = ResponseIndex::new(&db);
        assert_eq!(index.get_resp_ids("XFO", RespType::Parsing).len(), 1);
        assert!(index.get_resp_ids("XFO", RespType::Basic).is_empty());
        assert!(index.get_resp_ids("COEP", RespType::Parsing).is_empty());
        assert_eq!(index.store_lookups(), 3);
    }

    #[test]
    fn test_store_failure_degrades_to_empty() {
        let store = UnavailableStore;
        let mut index = ResponseIndex::new(&store);
        assert!(index.get_resp_ids("XFO", RespType::Parsing).is_empty());
        assert!(index.get_resp_ids("XFO", RespType::Parsing).is_empty());
        assert_eq!(index.store_lookups(), 1);
    }
}
