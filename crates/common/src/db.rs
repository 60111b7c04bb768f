//! SQLite database backing the response corpus and collected results

use crate::store::Store;
use crate::types::{
    Browser, BrowserEntry, RespType, ResponseSpec, ResultFilter, ResultRecord, StoredResponse,
    UNKNOWN_BROWSER_ID,
};
use crate::{Error, Result};
use parking_lot::Mutex;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Database wrapper for corpus and result persistence
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;

        // WAL lets several planning processes read while a builder writes
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.init_schema()?;

        info!("Opened database at {:?}", path.as_ref());
        Ok(db)
    }

    /// Open in-memory database (for testing)
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            -- Response corpus (append-only)
            CREATE TABLE IF NOT EXISTS responses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                raw_header BLOB NOT NULL,
                status_code INTEGER NOT NULL DEFAULT 200,
                label TEXT NOT NULL,
                resp_type TEXT NOT NULL,
                digest TEXT NOT NULL UNIQUE,
                created_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_responses_label_type ON responses(label, resp_type, id);

            -- Tested browser configurations
            CREATE TABLE IF NOT EXISTS browsers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                version TEXT NOT NULL,
                os TEXT NOT NULL,
                headless_mode TEXT NOT NULL,
                automation_mode TEXT NOT NULL,
                add_info TEXT NOT NULL DEFAULT '',
                created_at INTEGER NOT NULL,
                UNIQUE (name, version, os, headless_mode, automation_mode)
            );

            -- Results reported by the browser runner (append-only)
            CREATE TABLE IF NOT EXISTS results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                test_name TEXT NOT NULL,
                test_status INTEGER NOT NULL,
                relation_info TEXT NOT NULL DEFAULT '',
                org_scheme TEXT NOT NULL,
                org_host TEXT NOT NULL,
                resp_scheme TEXT NOT NULL,
                resp_host TEXT NOT NULL,
                outcome_value TEXT,
                full_url TEXT NOT NULL,
                browser_id INTEGER NOT NULL REFERENCES browsers(id),
                response_id INTEGER NOT NULL REFERENCES responses(id),
                created_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_results_browser ON results(browser_id);
            CREATE INDEX IF NOT EXISTS idx_results_response ON results(response_id);
            "#,
        )?;

        drop(conn);

        // The placeholder browser must own id 1
        let (id, _) = self.get_or_create_browser(&BrowserEntry::unknown())?;
        if id != UNKNOWN_BROWSER_ID {
            return Err(Error::Internal(format!(
                "placeholder browser has id {}, expected {}",
                id, UNKNOWN_BROWSER_ID
            )));
        }

        debug!("Database schema initialized");
        Ok(())
    }

    fn row_to_response(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawResponseRow> {
        Ok(RawResponseRow {
            id: row.get(0)?,
            raw_header: row.get(1)?,
            status_code: row.get(2)?,
            label: row.get(3)?,
            resp_type: row.get(4)?,
            digest: row.get(5)?,
            created_at: row.get(6)?,
        })
    }
}

impl Store for Database {
    fn lookup_response_ids(&self, label: &str, resp_type: RespType) -> Result<Vec<i64>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT id FROM responses WHERE label = ?1 AND resp_type = ?2 ORDER BY id",
        )?;
        let ids = stmt
            .query_map(params![label, resp_type.as_str()], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<i64>>>()?;
        Ok(ids)
    }

    fn upsert_response(&self, spec: &ResponseSpec) -> Result<(i64, bool)> {
        let raw_header = spec.raw_header()?;
        let digest = spec.digest()?;
        let conn = self.conn.lock();
        let now = chrono::Utc::now().timestamp();

        let inserted = conn.execute(
            "INSERT INTO responses (raw_header, status_code, label, resp_type, digest, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(digest) DO NOTHING",
            params![
                raw_header,
                spec.status_code,
                spec.label,
                spec.resp_type.as_str(),
                digest,
                now,
            ],
        )?;

        let id: i64 = conn.query_row(
            "SELECT id FROM responses WHERE digest = ?1",
            params![digest],
            |row| row.get(0),
        )?;

        if inserted > 0 {
            debug!("Inserted response {} ({}/{})", id, spec.label, spec.resp_type);
        }

        Ok((id, inserted > 0))
    }

    fn get_response(&self, id: i64) -> Result<Option<StoredResponse>> {
        let conn = self.conn.lock();

        let row = conn
            .query_row(
                "SELECT id, raw_header, status_code, label, resp_type, digest, created_at
                 FROM responses WHERE id = ?1",
                params![id],
                Self::row_to_response,
            )
            .optional()?;

        match row {
            Some(raw) => Ok(Some(raw.parse()?)),
            None => Ok(None),
        }
    }

    fn count_responses(&self, label: Option<&str>, resp_type: Option<RespType>) -> Result<u64> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM responses
             WHERE (?1 IS NULL OR label = ?1) AND (?2 IS NULL OR resp_type = ?2)",
            params![label, resp_type.map(|t| t.as_str())],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn query_results(&self, filter: &ResultFilter) -> Result<Vec<ResultRecord>> {
        let mut clauses: Vec<String> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(status) = filter.test_status {
            values.push(Value::Integer(status));
            clauses.push(format!("r.test_status = ?{}", values.len()));
        }
        for resp_type in &filter.exclude_resp_types {
            values.push(Value::Text(resp_type.as_str().to_string()));
            clauses.push(format!("resp.resp_type != ?{}", values.len()));
        }
        if filter.exclude_unknown_browser {
            values.push(Value::Integer(UNKNOWN_BROWSER_ID));
            clauses.push(format!("r.browser_id != ?{}", values.len()));
        }
        if let Some(browser_ids) = &filter.browser_ids {
            if browser_ids.is_empty() {
                return Ok(Vec::new());
            }
            let mut placeholders = Vec::with_capacity(browser_ids.len());
            for id in browser_ids {
                values.push(Value::Integer(*id));
                placeholders.push(format!("?{}", values.len()));
            }
            clauses.push(format!("r.browser_id IN ({})", placeholders.join(", ")));
        }
        if let Some(os) = &filter.os {
            values.push(Value::Text(os.clone()));
            clauses.push(format!("b.os = ?{}", values.len()));
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT r.id, r.test_name, r.test_status, r.relation_info, r.org_scheme, r.org_host,
                    r.resp_scheme, r.resp_host, r.response_id, resp.resp_type, r.browser_id,
                    r.full_url, r.outcome_value
             FROM results r
             JOIN responses resp ON r.response_id = resp.id
             JOIN browsers b ON r.browser_id = b.id
             {}
             ORDER BY r.id",
            where_clause
        ))?;

        let rows = stmt.query_map(params_from_iter(values.iter()), |row| {
            Ok(RawResultRow {
                id: row.get(0)?,
                test_name: row.get(1)?,
                test_status: row.get(2)?,
                relation_info: row.get(3)?,
                org_scheme: row.get(4)?,
                org_host: row.get(5)?,
                resp_scheme: row.get(6)?,
                resp_host: row.get(7)?,
                response_id: row.get(8)?,
                resp_type: row.get(9)?,
                browser_id: row.get(10)?,
                full_url: row.get(11)?,
                outcome_value: row.get(12)?,
            })
        })?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?.parse()?);
        }

        debug!("Loaded {} result rows", results.len());
        Ok(results)
    }

    fn insert_result(&self, record: &ResultRecord) -> Result<i64> {
        let conn = self.conn.lock();
        let now = chrono::Utc::now().timestamp();
        let outcome = match &record.outcome_value {
            Some(value) => Some(serde_json::to_string(value)?),
            None => None,
        };

        conn.execute(
            "INSERT INTO results (test_name, test_status, relation_info, org_scheme, org_host,
                                  resp_scheme, resp_host, outcome_value, full_url, browser_id,
                                  response_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                record.test_name,
                record.test_status,
                record.relation_info,
                record.org_scheme,
                record.org_host,
                record.resp_scheme,
                record.resp_host,
                outcome,
                record.full_url,
                record.browser_id,
                record.response_id,
                now,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    fn get_or_create_browser(&self, entry: &BrowserEntry) -> Result<(i64, bool)> {
        let conn = self.conn.lock();
        let now = chrono::Utc::now().timestamp();

        let inserted = conn.execute(
            "INSERT INTO browsers (name, version, os, headless_mode, automation_mode, add_info, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(name, version, os, headless_mode, automation_mode) DO NOTHING",
            params![
                entry.name,
                entry.version,
                entry.os,
                entry.headless_mode.as_str(),
                entry.automation_mode.as_str(),
                entry.add_info,
                now,
            ],
        )?;

        let id: i64 = conn.query_row(
            "SELECT id FROM browsers
             WHERE name = ?1 AND version = ?2 AND os = ?3 AND headless_mode = ?4 AND automation_mode = ?5",
            params![
                entry.name,
                entry.version,
                entry.os,
                entry.headless_mode.as_str(),
                entry.automation_mode.as_str(),
            ],
            |row| row.get(0),
        )?;

        if inserted > 0 {
            info!("Registered browser {} {} ({}) as id {}", entry.name, entry.version, entry.os, id);
        }

        Ok((id, inserted > 0))
    }

    fn list_browsers(&self) -> Result<Vec<Browser>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, name, version, os, headless_mode, automation_mode, add_info
             FROM browsers ORDER BY id",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
            ))
        })?;

        let mut browsers = Vec::new();
        for row in rows {
            let (id, name, version, os, headless, automation, add_info) = row?;
            browsers.push(Browser {
                id,
                entry: BrowserEntry::from_columns(name, version, os, &headless, &automation, add_info)?,
            });
        }

        Ok(browsers)
    }
}

/// Raw response row before parsing
struct RawResponseRow {
    id: i64,
    raw_header: Vec<u8>,
    status_code: u16,
    label: String,
    resp_type: String,
    digest: String,
    created_at: i64,
}

impl RawResponseRow {
    fn parse(self) -> Result<StoredResponse> {
        Ok(StoredResponse {
            id: self.id,
            spec: ResponseSpec {
                headers: ResponseSpec::parse_raw_header(&self.raw_header)?,
                status_code: self.status_code,
                label: self.label,
                resp_type: self.resp_type.parse()?,
            },
            digest: self.digest,
            created_at: self.created_at,
        })
    }
}

/// Raw result row before parsing
struct RawResultRow {
    id: i64,
    test_name: String,
    test_status: i64,
    relation_info: String,
    org_scheme: String,
    org_host: String,
    resp_scheme: String,
    resp_host: String,
    response_id: i64,
    resp_type: String,
    browser_id: i64,
    full_url: String,
    outcome_value: Option<String>,
}

impl RawResultRow {
    fn parse(self) -> Result<ResultRecord> {
        let outcome_value = match self.outcome_value {
            Some(raw) => Some(serde_json::from_str(&raw)?),
            None => None,
        };
        Ok(ResultRecord {
            id: Some(self.id),
            test_name: self.test_name,
            test_status: self.test_status,
            relation_info: self.relation_info,
            org_scheme: self.org_scheme,
            org_host: self.org_host,
            resp_scheme: self.resp_scheme,
            resp_host: self.resp_host,
            response_id: self.response_id,
            resp_type: self.resp_type.parse()?,
            browser_id: self.browser_id,
            full_url: self.full_url,
            outcome_value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AutomationMode, HeadlessMode};

    fn xfo(value: &str) -> ResponseSpec {
        ResponseSpec::new(vec![("x-frame-options".to_string(), value.to_string())], "XFO")
    }

    fn chrome() -> BrowserEntry {
        BrowserEntry {
            name: "chrome".to_string(),
            version: "122".to_string(),
            os: "Ubuntu 22.04".to_string(),
            headless_mode: HeadlessMode::HeadlessNew,
            automation_mode: AutomationMode::Selenium,
            add_info: String::new(),
        }
    }

    fn result(browser_id: i64, response_id: i64, status: i64) -> ResultRecord {
        ResultRecord {
            id: None,
            test_name: "framing".to_string(),
            test_status: status,
            relation_info: "direct".to_string(),
            org_scheme: "http".to_string(),
            org_host: "sub.web-platform.test".to_string(),
            resp_scheme: "http".to_string(),
            resp_host: "sub.web-platform.test".to_string(),
            response_id,
            resp_type: RespType::Parsing,
            browser_id,
            full_url: "http://sub.web-platform.test/_hp/tests/framing.sub.html".to_string(),
            outcome_value: Some(serde_json::json!("loaded")),
        }
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let db = Database::open_memory().unwrap();

        let (id1, created1) = db.upsert_response(&xfo("DENY")).unwrap();
        let (id2, created2) = db.upsert_response(&xfo("DENY")).unwrap();

        assert!(created1);
        assert!(!created2);
        assert_eq!(id1, id2);
        assert_eq!(db.count_responses(None, None).unwrap(), 1);
    }

    #[test]
    fn test_lookup_is_sorted_and_scoped() {
        let db = Database::open_memory().unwrap();
        let (a, _) = db.upsert_response(&xfo("DENY")).unwrap();
        let (_, _) = db
            .upsert_response(&xfo("DENY").with_resp_type(RespType::Basic))
            .unwrap();
        let (b, _) = db.upsert_response(&xfo("SAMEORIGIN")).unwrap();

        assert_eq!(db.lookup_response_ids("XFO", RespType::Parsing).unwrap(), vec![a, b]);
        assert_eq!(db.lookup_response_ids("XFO", RespType::Basic).unwrap().len(), 1);
        assert!(db.lookup_response_ids("COEP", RespType::Parsing).unwrap().is_empty());
        assert_eq!(db.count_responses(Some("XFO"), Some(RespType::Parsing)).unwrap(), 2);
    }

    #[test]
    fn test_get_response_roundtrip() {
        let db = Database::open_memory().unwrap();
        let spec = ResponseSpec::new(
            vec![
                ("x-frame-options".to_string(), "DENY".to_string()),
                ("location".to_string(), "https://sub.web-platform.test/".to_string()),
            ],
            "XFO",
        )
        .with_status(302);
        let (id, _) = db.upsert_response(&spec).unwrap();

        let stored = db.get_response(id).unwrap().unwrap();
        assert_eq!(stored.spec, spec);
        assert_eq!(stored.digest, spec.digest().unwrap());
        assert!(db.get_response(id + 100).unwrap().is_none());
    }

    #[test]
    fn test_unknown_browser_is_seeded() {
        let db = Database::open_memory().unwrap();
        let browsers = db.list_browsers().unwrap();
        assert_eq!(browsers.len(), 1);
        assert_eq!(browsers[0].id, UNKNOWN_BROWSER_ID);

        let (id, created) = db.get_or_create_browser(&chrome()).unwrap();
        assert!(created);
        assert_eq!(db.get_or_create_browser(&chrome()).unwrap(), (id, false));
    }

    #[test]
    fn test_query_results_filter() {
        let db = Database::open_memory().unwrap();
        let (browser, _) = db.get_or_create_browser(&chrome()).unwrap();
        let (resp, _) = db.upsert_response(&xfo("DENY")).unwrap();
        let (debug_resp, _) = db
            .upsert_response(&xfo("DENY").with_resp_type(RespType::Debug))
            .unwrap();

        db.insert_result(&result(browser, resp, 0)).unwrap();
        db.insert_result(&result(browser, resp, 1)).unwrap();
        db.insert_result(&result(UNKNOWN_BROWSER_ID, resp, 0)).unwrap();
        db.insert_result(&result(browser, debug_resp, 0)).unwrap();

        let rows = db.query_results(&ResultFilter::default()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].browser_id, browser);
        assert_eq!(rows[0].outcome_value, Some(serde_json::json!("loaded")));

        let everything = ResultFilter {
            test_status: None,
            exclude_resp_types: Vec::new(),
            exclude_unknown_browser: false,
            browser_ids: None,
            os: None,
        };
        assert_eq!(db.query_results(&everything).unwrap().len(), 4);

        let other_os = ResultFilter {
            os: Some("macOS 14.5".to_string()),
            ..ResultFilter::default()
        };
        assert!(db.query_results(&other_os).unwrap().is_empty());
    }

    #[test]
    fn test_result_requires_existing_response() {
        let db = Database::open_memory().unwrap();
        assert!(db.insert_result(&result(UNKNOWN_BROWSER_ID, 999, 0)).is_err());
    }

    #[test]
    fn test_open_file_database() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("corpus.db");
        let id = {
            let db = Database::open(&path).unwrap();
            db.upsert_response(&xfo("DENY")).unwrap().0
        };
        let db = Database::open(&path).unwrap();
        assert_eq!(db.upsert_response(&xfo("DENY")).unwrap(), (id, false));
    }
}
