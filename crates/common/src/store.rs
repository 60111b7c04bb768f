//! Store query surface consumed by the planner and the reconciler

use crate::types::{Browser, BrowserEntry, RespType, ResponseSpec, ResultFilter, ResultRecord, StoredResponse};
use crate::Result;

/// Keyed queries over the response corpus, browsers, and results.
///
/// The corpus is append-only: `upsert_response` never modifies an existing
/// row and returns the existing id when the dedup key is already present.
pub trait Store {
    /// All response ids for a label and response type, ascending
    fn lookup_response_ids(&self, label: &str, resp_type: RespType) -> Result<Vec<i64>>;

    /// Insert a response unless its dedup key exists; returns (id, created)
    fn upsert_response(&self, spec: &ResponseSpec) -> Result<(i64, bool)>;

    /// Fetch a single response
    fn get_response(&self, id: i64) -> Result<Option<StoredResponse>>;

    /// Count responses, optionally restricted by label and type
    fn count_responses(&self, label: Option<&str>, resp_type: Option<RespType>) -> Result<u64>;

    /// Results matching a filter, in insertion order
    fn query_results(&self, filter: &ResultFilter) -> Result<Vec<ResultRecord>>;

    /// Append one result record; returns its id
    fn insert_result(&self, record: &ResultRecord) -> Result<i64>;

    /// Register a browser configuration; returns (id, created)
    fn get_or_create_browser(&self, entry: &BrowserEntry) -> Result<(i64, bool)>;

    /// All registered browsers
    fn list_browsers(&self) -> Result<Vec<Browser>>;
}
