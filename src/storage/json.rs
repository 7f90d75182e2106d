//! JSON file storage backend
//!
//! Writes the registry as a single pretty-printed document:
//!
//! ```text
//! { "links": { "<url>": {...} }, "categories": { "<name>": {...} }, "metadata": {...} }
//! ```

use crate::state::{CategoryPolicy, LinkRecord};
use crate::storage::traits::{Storage, StorageResult};
use crate::storage::{validate_link, RegistrySnapshot, SnapshotMetadata};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Document shape used for loading, with every entry left undecoded so that one
/// bad record cannot fail the whole file
#[derive(Debug, Default, Deserialize)]
struct RawDocument {
    #[serde(default)]
    links: BTreeMap<String, Value>,

    #[serde(default)]
    categories: BTreeMap<String, Value>,

    #[serde(default)]
    metadata: Option<Value>,
}

/// Stores the registry in a JSON file
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl Storage for JsonFileStorage {
    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn load(&self) -> StorageResult<RegistrySnapshot> {
        let content = fs::read_to_string(&self.path)?;
        let raw: RawDocument = serde_json::from_str(&content)?;
        Ok(decode_document(raw))
    }

    fn save(&mut self, snapshot: &RegistrySnapshot) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(snapshot)?;

        // Write then rename so a crash mid-write never truncates the registry
        let temp = self.temp_path();
        fs::write(&temp, content)?;
        fs::rename(&temp, &self.path)?;

        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

fn decode_document(raw: RawDocument) -> RegistrySnapshot {
    let mut links = BTreeMap::new();
    for (key, value) in raw.links {
        match serde_json::from_value::<LinkRecord>(value) {
            Ok(link) => match validate_link(&key, &link) {
                Ok(()) => {
                    links.insert(key, link);
                }
                Err(reason) => tracing::warn!("Skipping malformed link {}: {}", key, reason),
            },
            Err(e) => tracing::warn!("Skipping malformed link {}: {}", key, e),
        }
    }

    let mut categories = BTreeMap::new();
    for (name, value) in raw.categories {
        match serde_json::from_value::<CategoryPolicy>(value) {
            Ok(mut policy) => {
                policy.name = name.clone();
                categories.insert(name, policy);
            }
            Err(e) => tracing::warn!("Skipping malformed category {}: {}", name, e),
        }
    }

    let metadata = raw
        .metadata
        .and_then(|value| match serde_json::from_value::<SnapshotMetadata>(value) {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                tracing::warn!("Ignoring malformed metadata: {}", e);
                None
            }
        })
        .unwrap_or_else(|| SnapshotMetadata {
            last_updated: DateTime::<Utc>::default(),
            total_links: links.len(),
            active_links: links.values().filter(|l| l.status.is_active()).count(),
            config_hash: None,
        });

    RegistrySnapshot {
        links,
        categories,
        metadata,
    }
}
