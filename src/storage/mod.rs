//! Storage module for persisting the link registry
//!
//! This module handles durable storage of the registry, including:
//! - The snapshot shape shared by every backend
//! - A JSON file backend mirroring the `links` / `categories` / `metadata` layout
//! - A SQLite backend storing the same fields in tables
//! - Skipping malformed records on load instead of failing the whole load

mod json;
mod schema;
mod sqlite;
mod traits;

pub use json::JsonFileStorage;
pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::config::{StorageBackend, StorageConfig};
use crate::state::{CategoryPolicy, LinkRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Full registry contents as persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub links: BTreeMap<String, LinkRecord>,
    pub categories: BTreeMap<String, CategoryPolicy>,
    pub metadata: SnapshotMetadata,
}

/// Summary written alongside every snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    #[serde(deserialize_with = "crate::state::timestamp::deserialize")]
    pub last_updated: DateTime<Utc>,
    pub total_links: usize,
    pub active_links: usize,

    /// Hash of the configuration the registry was bootstrapped from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_hash: Option<String>,
}

/// Opens the storage backend selected by the configuration
///
/// # Arguments
///
/// * `config` - The storage section of the configuration
///
/// # Returns
///
/// * `Ok(Box<dyn Storage>)` - Backend ready for load/save
/// * `Err(StorageError)` - The SQLite database could not be opened
pub fn open_storage(config: &StorageConfig) -> StorageResult<Box<dyn Storage>> {
    let path = Path::new(&config.path);
    match config.backend {
        StorageBackend::Json => Ok(Box::new(JsonFileStorage::new(path))),
        StorageBackend::Sqlite => Ok(Box::new(SqliteStorage::new(path)?)),
    }
}

/// Checks that a link decoded from storage is internally consistent
///
/// `key` is the identity the record was stored under. The error names the problem.
pub(crate) fn validate_link(key: &str, link: &LinkRecord) -> Result<(), String> {
    if link.url != key {
        return Err(format!("stored under '{}' but url is '{}'", key, link.url));
    }
    if link.category.is_empty() {
        return Err("empty category".to_string());
    }
    if !link.counters_consistent() {
        return Err(format!(
            "success_count {} + failure_count {} != visit_count {}",
            link.success_count, link.failure_count, link.visit_count
        ));
    }
    if !link.avg_load_time.is_finite() || link.avg_load_time < 0.0 {
        return Err(format!("invalid avg_load_time {}", link.avg_load_time));
    }
    Ok(())
}
