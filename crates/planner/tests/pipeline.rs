use headerprobe_common::{
    AutomationMode, BrowserEntry, Database, HeadlessMode, RespType, ResultFilter, ResultRecord,
    Scheme, Store,
};
use headerprobe_planner::{
    batches, CorpusBuilder, HarnessConfig, RepeatOptions, RepeatReconciler, RetryArtifact,
    Synthesizer, TestPlanEntry,
};
use tempfile::TempDir;

fn browser(name: &str) -> BrowserEntry {
    BrowserEntry {
        name: name.to_string(),
        version: "1".to_string(),
        os: "Ubuntu 22.04".to_string(),
        headless_mode: HeadlessMode::Xvfb,
        automation_mode: AutomationMode::Playwright,
        add_info: String::new(),
    }
}

/// One result per response id of a visited URL, as the runner reports them
fn simulate(url: &str) -> Vec<ResultRecord> {
    let entry = TestPlanEntry::parse(url).expect("planned URL parses");
    (entry.ids.first..=entry.ids.last)
        .map(|response_id| ResultRecord {
            id: None,
            test_name: entry.path.clone(),
            test_status: 0,
            relation_info: "iframe".to_string(),
            org_scheme: entry.scheme.to_string(),
            org_host: entry.host.clone(),
            resp_scheme: entry.scheme.to_string(),
            resp_host: entry.host.clone(),
            response_id,
            resp_type: entry.resp_type,
            browser_id: entry.browser_id,
            full_url: url.to_string(),
            outcome_value: Some(serde_json::json!({ "loaded": true })),
        })
        .collect()
}

#[test]
fn corpus_plan_results_repeat() {
    let tmp = TempDir::new().unwrap();
    let db = Database::open(tmp.path().join("corpus.db")).unwrap();
    let config = HarnessConfig::default();

    let reports = CorpusBuilder::new(&db, &config).build_basic(Some("XFO")).unwrap();
    assert_eq!(reports[0].created, reports[0].unique);

    let (complete, _) = db.get_or_create_browser(&browser("chromium")).unwrap();
    let (flaky, _) = db.get_or_create_browser(&browser("firefox")).unwrap();

    let outcome = Synthesizer::new(&db, &config.templates, &config.hosts, &config.plan)
        .plan(RespType::Basic, &[complete, flaky]);
    assert!(outcome.errors.is_empty());
    let basic_ids = db.lookup_response_ids("XFO", RespType::Basic).unwrap();
    // one URL per basic response, per scheme, per browser
    assert_eq!(outcome.entries.len(), basic_ids.len() * 2 * 2);

    for entry in &outcome.entries {
        let url = entry.to_url();
        let rounds = if entry.browser_id == flaky && entry.ids.first == basic_ids[0] {
            3
        } else {
            5
        };
        for _ in 0..rounds {
            for record in simulate(&url) {
                db.insert_result(&record).unwrap();
            }
        }
    }

    let reconciler = RepeatReconciler::new(RepeatOptions::from(&config.repeat));
    let repeat = reconciler.run(&db, &ResultFilter::default()).unwrap();
    assert!(repeat.warnings.is_empty());
    assert_eq!(repeat.repeat.keys().copied().collect::<Vec<_>>(), vec![flaky]);
    assert_eq!(repeat.url_count(), 2);

    let artifact = RetryArtifact::from(&repeat);
    let path = tmp.path().join("repeat.json");
    artifact.save(&path).unwrap();
    let artifact = RetryArtifact::load(&path).unwrap();

    let https = artifact.urls_for(flaky, Scheme::Https);
    assert_eq!(https.len(), 1);
    let retry = TestPlanEntry::parse(&https[0]).unwrap();
    assert_eq!((retry.ids.first, retry.ids.last), (basic_ids[0], basic_ids[0]));
    assert_eq!(retry.timeout, config.plan.timeout_secs * config.repeat.timeout_multiplier);
    assert_eq!(batches(&https, config.plan.max_urls_until_restart).len(), 1);

    // Reconciling the same records again yields the same repeat set
    assert_eq!(reconciler.run(&db, &ResultFilter::default()).unwrap(), repeat);
}
