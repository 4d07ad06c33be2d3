//! Integration tests for the complete coursemap pipeline
//!
//! These tests verify end-to-end behavior across crates:
//! - intercepted exchanges → dedup → crawl report
//! - crawl report → persisted records → registry join
//!
//! Run with: cargo test --test integration_tests

use coursemap_crawl::{
    store, CaptureFrame, CrawlConfig, DedupAccumulator, Exchange, ReplaySession, ResponseFilter,
    ScrollCrawler, StopReason,
};
use coursemap_resolve::{EntityJoiner, JoinOptions, Registry, RegistryEntry};
use serde_json::{json, Value};
use std::time::Duration;
use tempfile::tempdir;
use url::Url;

fn results_exchange(results: Value) -> Exchange {
    Exchange::json(
        "https://www.educations.com/_next/data/build/study-in-poland.json",
        json!({"pageProps": {"data": {"searchResult": {"results": results}}}}).to_string(),
    )
}

fn crawl_config() -> CrawlConfig {
    let mut config = CrawlConfig::new(Url::parse("https://www.educations.com/study-in-poland").unwrap());
    config.settle_interval = Duration::ZERO;
    config
}

// ============================================================================
// Join scenarios
// ============================================================================

#[test]
fn test_reversed_word_order_matches_registry() {
    let registry = Registry::new(vec![RegistryEntry::new(1, "University of Warsaw")]).unwrap();
    let records = vec![json!({"id": "c1", "institution": {"title": "Warsaw University"}})];

    let outcome = EntityJoiner::new(&registry, JoinOptions::default()).join(&records);

    assert_eq!(outcome.matched.len(), 1);
    assert_eq!(outcome.matched[0]["universityId"], 1);
    assert!(outcome.unmatched.is_empty());
}

#[test]
fn test_unknown_institution_reported_once() {
    let registry = Registry::new(vec![
        RegistryEntry::new(1, "University of Warsaw"),
        RegistryEntry::new(2, "Jagiellonian University"),
    ])
    .unwrap();
    let records = vec![
        json!({"id": "c1", "institution": {"title": "Unknown Polytechnic XYZ"}}),
        json!({"id": "c2", "institution": {"title": "Jagiellonian University"}}),
        json!({"id": "c3", "institution": {"title": "Unknown Polytechnic XYZ"}}),
    ];

    let outcome = EntityJoiner::new(&registry, JoinOptions::default()).join(&records);

    assert_eq!(outcome.unmatched, vec!["Unknown Polytechnic XYZ"]);
    assert_eq!(outcome.matched.len(), 1);
    assert_eq!(outcome.matched[0]["id"], "c2");
    assert_eq!(outcome.matched[0]["universityId"], 2);
}

// ============================================================================
// Crawl scenarios
// ============================================================================

#[test]
fn test_overlapping_batches_keep_first_payload() {
    let filter = ResponseFilter::default();
    let acc = DedupAccumulator::new();

    let first = results_exchange(json!([{"id": "c1", "title": "first"}, {"id": "c2"}]));
    let second = results_exchange(json!([{"id": "c1", "title": "second"}, {"id": "c3"}]));

    assert_eq!(acc.absorb(filter.inspect(&first).into_records()), 2);
    assert_eq!(acc.absorb(filter.inspect(&second).into_records()), 1);

    let snapshot = acc.snapshot();
    let c1: Vec<_> = snapshot.iter().filter(|r| r.id().as_text() == Some("c1")).collect();
    assert_eq!(c1.len(), 1);
    assert_eq!(c1[0].payload()["title"], "first");
}

#[test]
fn test_crawl_converges_after_repeated_extent() {
    let session = ReplaySession::new(vec![
        CaptureFrame::new(100, vec![results_exchange(json!([{"id": "c1"}]))]),
        CaptureFrame::new(200, vec![results_exchange(json!([{"id": "c2"}]))]),
        CaptureFrame::new(200, vec![results_exchange(json!([{"id": "c2"}]))]),
    ]);

    let report = ScrollCrawler::new(session, crawl_config()).run().unwrap();

    assert_eq!(report.stop_reason, StopReason::ExtentConverged);
    assert_eq!(report.cycles, 2);
    assert_eq!(report.records.len(), 2);
}

#[test]
fn test_noise_exchanges_do_not_disturb_crawl() {
    let mut analytics = Exchange::json("https://t.example/collect", r#"{"ok": true}"#);
    analytics.status = 204;
    let mut html = Exchange::json("https://www.educations.com/study-in-poland", "<html></html>");
    html.content_type = Some("text/html".to_string());
    let broken = Exchange::json("https://www.educations.com/api", "{\"pageProps\":");

    let session = ReplaySession::new(vec![
        CaptureFrame::new(100, vec![html, results_exchange(json!([{"id": "c1"}]))]),
        CaptureFrame::new(150, vec![analytics, broken, results_exchange(json!([{"id": "c2"}]))]),
        CaptureFrame::new(150, vec![]),
    ]);

    let report = ScrollCrawler::new(session, crawl_config()).run().unwrap();
    let ids: Vec<String> = report.records.iter().map(|r| r.id().to_string()).collect();
    assert_eq!(ids, vec!["c1", "c2"]);
}

// ============================================================================
// Full pipeline
// ============================================================================

#[test]
fn test_crawl_persist_join_pipeline() {
    let dir = tempdir().unwrap();
    let records_path = dir.path().join("courses.json");
    let joined_path = dir.path().join("assets/data/courses.json");

    let session = ReplaySession::new(vec![
        CaptureFrame::new(
            800,
            vec![results_exchange(json!([
                {"id": 101, "title": "Computer Science", "institution": {"title": "Warsaw University of Technology"}},
                {"id": 102, "title": "Medicine", "institution": {"title": "Medical University of Gdansk"}}
            ]))],
        ),
        CaptureFrame::new(
            1600,
            vec![results_exchange(json!([
                {"id": 102, "title": "Medicine (dup)", "institution": {"title": "Medical University of Gdansk"}},
                {"id": 103, "title": "Film", "institution": {}}
            ]))],
        ),
        CaptureFrame::new(1600, vec![]),
    ]);
    let report = ScrollCrawler::new(session, crawl_config()).run().unwrap();
    store::save_records(&records_path, &report.records).unwrap();

    let registry = Registry::new(vec![
        RegistryEntry::new(10, "Medical University of Gdansk"),
        RegistryEntry::new(20, "Warsaw University of Technology"),
    ])
    .unwrap();

    let payloads = store::load_record_payloads(&records_path).unwrap();
    assert_eq!(payloads.len(), 3);

    let joiner = EntityJoiner::new(&registry, JoinOptions::default());
    let outcome = joiner.join(&payloads);
    coursemap_resolve::save_joined(&joined_path, &outcome, "courses").unwrap();

    let joined: Value =
        serde_json::from_str(&std::fs::read_to_string(&joined_path).unwrap()).unwrap();
    let courses = joined["courses"].as_array().unwrap();
    // 103 has no institution title and is skipped entirely.
    assert_eq!(outcome.skipped, 1);
    assert!(outcome.unmatched.is_empty());
    assert_eq!(courses.len(), 2);
    assert_eq!(courses[0]["id"], 101);
    assert_eq!(courses[0]["universityId"], 20);
    assert_eq!(courses[1]["title"], "Medicine");
    assert_eq!(courses[1]["universityId"], 10);
}
