//! Registry lifecycle tests against both storage backends

use chrono::{Duration, TimeZone, Utc};
use link_cadence::config::{parse_config, StorageBackend, StorageConfig};
use link_cadence::manager::{LinkManager, LoadOutcome, ManagerSettings};
use link_cadence::storage::open_storage;
use link_cadence::{Cadence, LinkStatus, ManualClock, Priority, VisitResult};
use std::path::Path;
use std::sync::Arc;

const CONFIG: &str = r#"
[storage]
path = "unused"

[user-agent]
crawler-name = "TestVisitor"
crawler-version = "1.0"
contact-url = "https://example.com/about"
contact-email = "admin@example.com"

[categories.status]
urls = ["https://status.example.com/", "https://health.example.org/", "https://status.example.com/"]
priority = "high"
visit-frequency = "frequent"
delay-range = { min = 0, max = 0 }

[categories.archive]
urls = ["https://archive.example.net/"]
priority = "low"
visit-frequency = "rare"
"#;

fn open_manager(backend: StorageBackend, path: &Path, clock: Arc<ManualClock>) -> LinkManager {
    let config = parse_config(CONFIG).unwrap();
    let storage = open_storage(&StorageConfig {
        backend,
        path: path.to_string_lossy().into_owned(),
    })
    .unwrap();

    LinkManager::open(
        storage,
        clock,
        ManagerSettings::from_config(&config),
        &config.categories,
        Some("config-hash"),
    )
}

fn exercise_lifecycle(backend: StorageBackend, file_name: &str) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join(file_name);
    let start = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
    let clock = Arc::new(ManualClock::new(start));

    let manager = open_manager(backend, &path, clock.clone());
    assert_eq!(manager.registry().len(), 3, "duplicate bootstrap URL imported once");
    assert_eq!(manager.due_links(None).len(), 3);

    manager.record_outcome("https://status.example.com/", &VisitResult::success(2.0));
    manager.record_outcome("https://status.example.com/", &VisitResult::success(4.0));
    for _ in 0..3 {
        manager.record_outcome("https://health.example.org/", &VisitResult::failure("timeout"));
    }
    clock.advance(Duration::minutes(30));
    manager.add_link("https://docs.example.com/", "docs", Priority::Medium, "added later");
    manager.set_status("https://archive.example.net/", LinkStatus::Disabled);
    assert!(manager.save());
    let before = manager.registry();
    drop(manager);

    // A second process sees exactly the saved state
    let reopened = open_manager(backend, &path, clock.clone());
    let after = reopened.registry();
    assert_eq!(after.len(), 4);
    for link in before.links() {
        assert_eq!(after.get(&link.url), Some(link));
    }
    assert_eq!(after.config_hash(), Some("config-hash"));
    assert_eq!(
        after.category("status").unwrap().visit_frequency,
        Cadence::Frequent
    );

    let status = after.get("https://status.example.com/").unwrap();
    assert_eq!(status.avg_load_time, 3.0);
    assert_eq!(status.last_visited, Some(start));

    let health = after.get("https://health.example.org/").unwrap();
    assert_eq!(health.status, LinkStatus::Failed);

    // Frequent cadence: due again an hour after the visit
    assert!(reopened
        .due_links(Some("status"))
        .iter()
        .all(|l| l.url != "https://status.example.com/"));
    clock.advance(Duration::minutes(30));
    assert!(reopened
        .due_links(Some("status"))
        .iter()
        .any(|l| l.url == "https://status.example.com/"));

    // Explicit reset returns a failed link to scheduling
    assert!(reopened.set_status("https://health.example.org/", LinkStatus::Active));
    assert!(reopened
        .due_links(None)
        .iter()
        .any(|l| l.url == "https://health.example.org/"));

    let stats = reopened.statistics();
    assert_eq!(stats.total_links, 4);
    assert_eq!(stats.disabled_links, 1);
    assert_eq!(stats.visit_stats.total_visits, 5);
    assert_eq!(stats.visit_stats.avg_success_rate, 40.0);
}

#[test]
fn test_json_registry_lifecycle() {
    exercise_lifecycle(StorageBackend::Json, "links.json");
}

#[test]
fn test_sqlite_registry_lifecycle() {
    exercise_lifecycle(StorageBackend::Sqlite, "links.db");
}

#[test]
fn test_json_document_layout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("links.json");
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()));
    open_manager(StorageBackend::Json, &path, clock);

    let document: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();

    let link = &document["links"]["https://archive.example.net/"];
    assert_eq!(link["url"], "https://archive.example.net/");
    assert_eq!(link["category"], "archive");
    assert_eq!(link["priority"], "low");
    assert_eq!(link["status"], "active");
    assert_eq!(link["visit_count"], 0);
    assert!(link["last_visited"].is_null());

    assert_eq!(document["categories"]["archive"]["visit_frequency"], "rare");
    assert_eq!(document["metadata"]["total_links"], 3);
    assert_eq!(document["metadata"]["active_links"], 3);
    assert_eq!(document["metadata"]["config_hash"], "config-hash");
}

#[test]
fn test_unreadable_store_is_not_overwritten_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("links.json");
    std::fs::write(&path, "{ not json").unwrap();

    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()));
    let config = parse_config(CONFIG).unwrap();
    let storage = open_storage(&StorageConfig {
        backend: StorageBackend::Json,
        path: path.to_string_lossy().into_owned(),
    })
    .unwrap();
    let manager = LinkManager::new(storage, clock, ManagerSettings::from_config(&config));

    let outcome = manager.load(&config.categories, None);

    assert_eq!(outcome, LoadOutcome::Fallback { links: 3 });
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
}
