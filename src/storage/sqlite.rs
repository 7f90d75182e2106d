//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.
//! Rows are read as raw column values and converted afterwards, so a row with an
//! unknown status or an unparseable timestamp is skipped rather than failing the
//! load.

use crate::state::{
    parse_timestamp, Cadence, CategoryPolicy, DelayRange, LinkRecord, LinkStatus, Priority,
};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageResult};
use crate::storage::{validate_link, RegistrySnapshot, SnapshotMetadata};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
    location: String,
}

/// A `links` row before validation
struct LinkRow {
    url: String,
    category: String,
    priority: String,
    last_visited: Option<String>,
    visit_count: i64,
    success_count: i64,
    failure_count: i64,
    avg_load_time: f64,
    status: String,
    notes: String,
    added_date: String,
}

/// A `categories` row before validation
struct CategoryRow {
    name: String,
    priority: String,
    visit_frequency: String,
    delay_min: f64,
    delay_max: f64,
    human_simulation: bool,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn,
            location: path.display().to_string(),
        })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn,
            location: ":memory:".to_string(),
        })
    }

    fn load_links(&self) -> StorageResult<BTreeMap<String, LinkRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT url, category, priority, last_visited, visit_count, success_count,
             failure_count, avg_load_time, status, notes, added_date
             FROM links",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(LinkRow {
                url: row.get(0)?,
                category: row.get(1)?,
                priority: row.get(2)?,
                last_visited: row.get(3)?,
                visit_count: row.get(4)?,
                success_count: row.get(5)?,
                failure_count: row.get(6)?,
                avg_load_time: row.get(7)?,
                status: row.get(8)?,
                notes: row.get(9)?,
                added_date: row.get(10)?,
            })
        })?;

        let mut links = BTreeMap::new();
        for row in rows {
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    tracing::warn!("Skipping unreadable link row: {}", e);
                    continue;
                }
            };

            let url = row.url.clone();
            match link_from_row(row) {
                Ok(link) => {
                    links.insert(url, link);
                }
                Err(reason) => tracing::warn!("Skipping malformed link {}: {}", url, reason),
            }
        }

        Ok(links)
    }

    fn load_categories(&self) -> StorageResult<BTreeMap<String, CategoryPolicy>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, priority, visit_frequency, delay_min, delay_max, human_simulation
             FROM categories",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(CategoryRow {
                name: row.get(0)?,
                priority: row.get(1)?,
                visit_frequency: row.get(2)?,
                delay_min: row.get(3)?,
                delay_max: row.get(4)?,
                human_simulation: row.get(5)?,
            })
        })?;

        let mut categories = BTreeMap::new();
        for row in rows {
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    tracing::warn!("Skipping unreadable category row: {}", e);
                    continue;
                }
            };

            match Priority::from_db_string(&row.priority) {
                Some(priority) => {
                    let policy = CategoryPolicy {
                        name: row.name.clone(),
                        priority,
                        visit_frequency: Cadence::from(row.visit_frequency),
                        delay_range: DelayRange {
                            min: row.delay_min,
                            max: row.delay_max,
                        },
                        human_simulation: row.human_simulation,
                    };
                    categories.insert(row.name, policy);
                }
                None => tracing::warn!(
                    "Skipping malformed category {}: unknown priority '{}'",
                    row.name,
                    row.priority
                ),
            }
        }

        Ok(categories)
    }

    fn load_metadata(&self) -> StorageResult<Option<(String, i64, i64, Option<String>)>> {
        let metadata = self
            .conn
            .query_row(
                "SELECT last_updated, total_links, active_links, config_hash FROM metadata WHERE id = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()?;
        Ok(metadata)
    }
}

impl Storage for SqliteStorage {
    fn exists(&self) -> bool {
        matches!(self.load_metadata(), Ok(Some(_)))
    }

    fn load(&self) -> StorageResult<RegistrySnapshot> {
        let links = self.load_links()?;
        let categories = self.load_categories()?;

        let stored = self.load_metadata()?;
        let (last_updated, config_hash) = match stored {
            Some((last_updated, _, _, config_hash)) => {
                let last_updated = parse_timestamp(&last_updated).unwrap_or_else(|e| {
                    tracing::warn!("Ignoring malformed metadata timestamp: {}", e);
                    DateTime::<Utc>::default()
                });
                (last_updated, config_hash)
            }
            None => (DateTime::<Utc>::default(), None),
        };

        let metadata = SnapshotMetadata {
            last_updated,
            total_links: links.len(),
            active_links: links.values().filter(|l| l.status.is_active()).count(),
            config_hash,
        };

        Ok(RegistrySnapshot {
            links,
            categories,
            metadata,
        })
    }

    fn save(&mut self, snapshot: &RegistrySnapshot) -> StorageResult<()> {
        let tx = self.conn.transaction()?;

        tx.execute("DELETE FROM links", [])?;
        tx.execute("DELETE FROM categories", [])?;

        {
            let mut insert_link = tx.prepare(
                "INSERT INTO links (url, category, priority, last_visited, visit_count,
                 success_count, failure_count, avg_load_time, status, notes, added_date)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            )?;

            for link in snapshot.links.values() {
                insert_link.execute(params![
                    link.url,
                    link.category,
                    link.priority.to_db_string(),
                    link.last_visited.map(|t| t.to_rfc3339()),
                    to_db_count(link.visit_count),
                    to_db_count(link.success_count),
                    to_db_count(link.failure_count),
                    link.avg_load_time,
                    link.status.to_db_string(),
                    link.notes,
                    link.added_date.to_rfc3339(),
                ])?;
            }

            let mut insert_category = tx.prepare(
                "INSERT INTO categories (name, priority, visit_frequency, delay_min, delay_max,
                 human_simulation)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;

            for (name, policy) in &snapshot.categories {
                insert_category.execute(params![
                    name,
                    policy.priority.to_db_string(),
                    policy.visit_frequency.as_str(),
                    policy.delay_range.min,
                    policy.delay_range.max,
                    policy.human_simulation,
                ])?;
            }
        }

        tx.execute(
            "INSERT INTO metadata (id, last_updated, total_links, active_links, config_hash)
             VALUES (1, ?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                last_updated = excluded.last_updated,
                total_links = excluded.total_links,
                active_links = excluded.active_links,
                config_hash = excluded.config_hash",
            params![
                snapshot.metadata.last_updated.to_rfc3339(),
                to_db_count(snapshot.metadata.total_links as u64),
                to_db_count(snapshot.metadata.active_links as u64),
                snapshot.metadata.config_hash,
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.location.clone()
    }
}

fn to_db_count(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn from_db_count(value: i64, column: &str) -> Result<u64, String> {
    u64::try_from(value).map_err(|_| format!("negative {} {}", column, value))
}

fn link_from_row(row: LinkRow) -> Result<LinkRecord, String> {
    let priority = Priority::from_db_string(&row.priority)
        .ok_or_else(|| format!("unknown priority '{}'", row.priority))?;
    let status = LinkStatus::from_db_string(&row.status)
        .ok_or_else(|| format!("unknown status '{}'", row.status))?;
    let last_visited = row
        .last_visited
        .as_deref()
        .map(parse_timestamp)
        .transpose()?;

    let link = LinkRecord {
        url: row.url,
        category: row.category,
        priority,
        last_visited,
        visit_count: from_db_count(row.visit_count, "visit_count")?,
        success_count: from_db_count(row.success_count, "success_count")?,
        failure_count: from_db_count(row.failure_count, "failure_count")?,
        avg_load_time: row.avg_load_time,
        status,
        notes: row.notes,
        added_date: parse_timestamp(&row.added_date)?,
    };

    validate_link(&link.url, &link)?;
    Ok(link)
}
