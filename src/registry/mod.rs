//! Link registry
//!
//! The registry owns every [`LinkRecord`] and [`CategoryPolicy`]. All mutation goes
//! through the methods here; planning code only ever sees shared references or
//! clones.
//!
//! - `outcome`: applying visit results and the failure auto-flip rule
//! - `maintenance`: sweeping out chronically failing links

mod maintenance;
mod outcome;

pub use maintenance::SweepPolicy;
pub use outcome::FailurePolicy;

use crate::config::CategoryConfig;
use crate::state::{CategoryPolicy, LinkRecord, LinkStatus, Priority};
use crate::storage::{RegistrySnapshot, SnapshotMetadata};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// In-memory collection of links and category policies, keyed by URL and name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Registry {
    links: BTreeMap<String, LinkRecord>,
    categories: BTreeMap<String, CategoryPolicy>,
    config_hash: Option<String>,
}

impl Registry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a registry from a persisted snapshot
    pub fn from_snapshot(snapshot: RegistrySnapshot) -> Self {
        let categories = snapshot
            .categories
            .into_iter()
            .map(|(name, mut policy)| {
                policy.name = name.clone();
                (name, policy)
            })
            .collect();

        Self {
            links: snapshot.links,
            categories,
            config_hash: snapshot.metadata.config_hash,
        }
    }

    /// Captures the full registry state for persistence
    pub fn snapshot(&self, now: DateTime<Utc>) -> RegistrySnapshot {
        RegistrySnapshot {
            links: self.links.clone(),
            categories: self.categories.clone(),
            metadata: SnapshotMetadata {
                last_updated: now,
                total_links: self.links.len(),
                active_links: self.active_count(),
                config_hash: self.config_hash.clone(),
            },
        }
    }

    /// Imports categories and their URLs from the static configuration
    ///
    /// Every category becomes a policy and every non-blank URL goes through
    /// [`Registry::add_link`], so URLs listed twice are only added once.
    ///
    /// # Returns
    ///
    /// The number of links actually added
    pub fn import_categories(
        &mut self,
        source: &BTreeMap<String, CategoryConfig>,
        now: DateTime<Utc>,
    ) -> usize {
        let mut added = 0;

        for (name, entry) in source {
            self.upsert_category(entry.to_policy(name));

            for url in &entry.urls {
                let url = url.trim();
                if url.is_empty() {
                    continue;
                }
                if self.add_link(url, name, entry.priority, "", now) {
                    added += 1;
                }
            }
        }

        added
    }

    /// Adds a new active link with zeroed counters
    ///
    /// # Returns
    ///
    /// * `true` - The link was added
    /// * `false` - A link with this URL already exists; nothing was changed
    pub fn add_link(
        &mut self,
        url: &str,
        category: &str,
        priority: Priority,
        notes: &str,
        now: DateTime<Utc>,
    ) -> bool {
        if self.links.contains_key(url) {
            tracing::warn!("Link already exists: {}", url);
            return false;
        }

        self.links.insert(
            url.to_string(),
            LinkRecord::new(url, category, priority, notes, now),
        );
        tracing::info!(
            "Added link: {} (category: {}, priority: {})",
            url,
            category,
            priority
        );
        true
    }

    /// Removes a link
    ///
    /// Returns false if the URL was not registered.
    pub fn remove_link(&mut self, url: &str) -> bool {
        if self.links.remove(url).is_some() {
            tracing::info!("Removed link: {}", url);
            true
        } else {
            tracing::debug!("Remove requested for unknown link: {}", url);
            false
        }
    }

    /// Explicitly changes the status of a link
    ///
    /// This is the only way to disable a link, and the only way back to `Active`
    /// for a link that was failed or disabled.
    pub fn set_status(&mut self, url: &str, status: LinkStatus) -> bool {
        match self.links.get_mut(url) {
            Some(link) => {
                if link.status != status {
                    tracing::info!("Link {} status: {} -> {}", url, link.status, status);
                    link.status = status;
                }
                true
            }
            None => {
                tracing::debug!("Status change requested for unknown link: {}", url);
                false
            }
        }
    }

    /// Inserts or replaces a category policy
    pub fn upsert_category(&mut self, policy: CategoryPolicy) {
        self.categories.insert(policy.name.clone(), policy);
    }

    /// Gets a link by URL
    pub fn get(&self, url: &str) -> Option<&LinkRecord> {
        self.links.get(url)
    }

    pub fn contains(&self, url: &str) -> bool {
        self.links.contains_key(url)
    }

    /// Iterates over all links in URL order
    pub fn links(&self) -> impl Iterator<Item = &LinkRecord> {
        self.links.values()
    }

    /// Iterates over active links, optionally restricted to one category
    pub fn active_links<'a>(
        &'a self,
        category: Option<&'a str>,
    ) -> impl Iterator<Item = &'a LinkRecord> + 'a {
        self.links.values().filter(move |link| {
            link.status.is_active() && category.map_or(true, |c| link.category == c)
        })
    }

    /// Gets all category policies
    pub fn categories(&self) -> &BTreeMap<String, CategoryPolicy> {
        &self.categories
    }

    /// Gets the policy for a category
    pub fn category(&self, name: &str) -> Option<&CategoryPolicy> {
        self.categories.get(name)
    }

    /// Links of one category in the given status
    pub fn links_by_category(&self, category: &str, status: LinkStatus) -> Vec<&LinkRecord> {
        self.links
            .values()
            .filter(|link| link.category == category && link.status == status)
            .collect()
    }

    /// Links of one priority in the given status
    pub fn links_by_priority(&self, priority: Priority, status: LinkStatus) -> Vec<&LinkRecord> {
        self.links
            .values()
            .filter(|link| link.priority == priority && link.status == status)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Number of links currently eligible for planning
    pub fn active_count(&self) -> usize {
        self.links.values().filter(|l| l.status.is_active()).count()
    }

    /// Hash of the configuration this registry was bootstrapped from
    pub fn config_hash(&self) -> Option<&str> {
        self.config_hash.as_deref()
    }

    pub fn set_config_hash(&mut self, hash: impl Into<String>) {
        self.config_hash = Some(hash.into());
    }

    pub(crate) fn get_mut(&mut self, url: &str) -> Option<&mut LinkRecord> {
        self.links.get_mut(url)
    }

    pub(crate) fn retain_links<F>(&mut self, keep: F) -> Vec<LinkRecord>
    where
        F: Fn(&LinkRecord) -> bool,
    {
        let doomed: Vec<String> = self
            .links
            .values()
            .filter(|link| !keep(link))
            .map(|link| link.url.clone())
            .collect();

        doomed
            .into_iter()
            .filter_map(|url| self.links.remove(&url))
            .collect()
    }
}
