//! End-to-end visit tests against mock HTTP servers

use chrono::{TimeZone, Utc};
use link_cadence::config::{SchedulerConfig, UserAgentConfig};
use link_cadence::manager::{LinkManager, ManagerSettings};
use link_cadence::storage::{JsonFileStorage, Storage};
use link_cadence::visitor::{Coordinator, Fetcher, HttpFetcher};
use link_cadence::{Cadence, CategoryPolicy, LinkStatus, ManualClock, Priority};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_user_agent() -> UserAgentConfig {
    UserAgentConfig {
        crawler_name: "TestVisitor".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: "https://example.com/contact".to_string(),
        contact_email: "test@example.com".to_string(),
        request_timeout_secs: 1,
    }
}

#[tokio::test]
async fn test_fetcher_classifies_responses() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ok"))
        .and(header(
            "user-agent",
            "TestVisitor/1.0.0 (+https://example.com/contact; test@example.com)",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::new(&create_user_agent()).unwrap();

    let ok = fetcher.visit(&format!("{}/ok", mock_server.uri())).await;
    assert!(ok.success);
    assert!(ok.error_kind.is_none());
    assert!(ok.latency_seconds > 0.0);

    let missing = fetcher.visit(&format!("{}/missing", mock_server.uri())).await;
    assert!(!missing.success);
    assert_eq!(missing.error_kind.as_deref(), Some("http_404"));

    let slow = fetcher.visit(&format!("{}/slow", mock_server.uri())).await;
    assert!(!slow.success);
    assert_eq!(slow.error_kind.as_deref(), Some("timeout"));
}

#[tokio::test]
async fn test_cycles_feed_outcomes_back_into_registry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/healthy"))
        .respond_with(ResponseTemplate::new(200).set_body_string("fine"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("links.json");
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap(),
    ));
    let manager = Arc::new(LinkManager::new(
        Box::new(JsonFileStorage::new(&store_path)),
        clock,
        ManagerSettings::default(),
    ));

    let mut policy = CategoryPolicy::new("probes", Priority::High, Cadence::Frequent);
    policy.delay_range.min = 0.0;
    policy.delay_range.max = 0.0;
    manager.upsert_category(policy);

    let healthy = format!("{}/healthy", mock_server.uri());
    let broken = format!("{}/broken", mock_server.uri());
    manager.add_link(&healthy, "probes", Priority::High, "");
    manager.add_link(&broken, "probes", Priority::High, "");

    let fetcher = Arc::new(HttpFetcher::new(&create_user_agent()).unwrap());
    let config = SchedulerConfig {
        max_concurrent_visits: 2,
        sweep_every_cycles: 0,
        ..SchedulerConfig::default()
    };
    let coordinator = Coordinator::new(Arc::clone(&manager), fetcher, config);

    let reports = coordinator.run(3).await;
    assert_eq!(reports.len(), 3);
    assert!(reports.iter().all(|r| r.planned == 2));

    let healthy_link = manager.get(&healthy).unwrap();
    assert_eq!(healthy_link.visit_count, 3);
    assert_eq!(healthy_link.success_count, 3);
    assert!(healthy_link.avg_load_time > 0.0);
    assert_eq!(healthy_link.status, LinkStatus::Active);

    let broken_link = manager.get(&broken).unwrap();
    assert_eq!(broken_link.failure_count, 3);
    assert_eq!(broken_link.status, LinkStatus::Failed);

    // Failed links are no longer planned
    let next = coordinator.run_cycle(None, 10).await;
    assert_eq!(next.planned, 1);
    assert_eq!(next.succeeded, 1);

    // Each cycle ends with a save
    let stored = JsonFileStorage::new(&store_path).load().unwrap();
    assert_eq!(stored.links[&healthy].visit_count, 4);
    assert_eq!(stored.metadata.active_links, 1);
}
