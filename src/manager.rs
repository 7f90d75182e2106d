//! Thread-safe link manager
//!
//! [`LinkManager`] is the entry point used by orchestration code. It wraps the
//! [`Registry`] in a single reader/writer lock so that outcomes reported by
//! concurrent visits are applied one at a time, while planning runs under the
//! shared lock. Persistence runs under its own mutex on a snapshot and never
//! holds the registry lock while doing I/O.

use crate::clock::{Clock, SystemClock};
use crate::config::{CategoryConfig, Config};
use crate::output::LinkStatistics;
use crate::registry::{FailurePolicy, Registry, SweepPolicy};
use crate::scheduler::{self, VisitPlanner};
use crate::state::{CategoryPolicy, LinkRecord, LinkStatus, Priority, VisitResult};
use crate::storage::{open_storage, Storage};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Tunables the manager applies on every operation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManagerSettings {
    pub planner: VisitPlanner,
    pub failure_policy: FailurePolicy,
    pub sweep_policy: SweepPolicy,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            planner: VisitPlanner::default(),
            failure_policy: FailurePolicy::default(),
            sweep_policy: SweepPolicy::default(),
        }
    }
}

impl ManagerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            planner: VisitPlanner::new(config.scheduler.staleness()),
            failure_policy: config.maintenance.failure_policy(),
            sweep_policy: config.maintenance.sweep_policy(),
        }
    }
}

/// How the registry was populated by [`LinkManager::load`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A stored registry was loaded
    Loaded { links: usize },

    /// Nothing was stored; the static categories were imported and saved
    Bootstrapped { links: usize },

    /// The stored registry could not be read; the static categories were imported
    /// in memory only, leaving the unreadable store untouched until the next save
    Fallback { links: usize },
}

/// Shared, lock-protected owner of the registry and its storage
pub struct LinkManager {
    registry: RwLock<Registry>,
    storage: Mutex<Box<dyn Storage>>,
    clock: Arc<dyn Clock>,
    settings: ManagerSettings,
}

impl LinkManager {
    /// Creates a manager around an empty registry
    pub fn new(storage: Box<dyn Storage>, clock: Arc<dyn Clock>, settings: ManagerSettings) -> Self {
        Self {
            registry: RwLock::new(Registry::new()),
            storage: Mutex::new(storage),
            clock,
            settings,
        }
    }

    /// Creates a manager and immediately loads (or bootstraps) the registry
    pub fn open(
        storage: Box<dyn Storage>,
        clock: Arc<dyn Clock>,
        settings: ManagerSettings,
        bootstrap: &BTreeMap<String, CategoryConfig>,
        config_hash: Option<&str>,
    ) -> Self {
        let manager = Self::new(storage, clock, settings);
        manager.load(bootstrap, config_hash);
        manager
    }

    /// Opens the configured storage and loads the registry using the system clock
    ///
    /// # Returns
    ///
    /// * `Ok(LinkManager)` - Storage opened; the registry was loaded or bootstrapped
    /// * `Err(CadenceError)` - The storage backend could not be opened
    pub fn from_config(config: &Config, config_hash: Option<&str>) -> crate::Result<Self> {
        let storage = open_storage(&config.storage)?;
        Ok(Self::open(
            storage,
            Arc::new(SystemClock),
            ManagerSettings::from_config(config),
            &config.categories,
            config_hash,
        ))
    }

    fn read(&self) -> RwLockReadGuard<'_, Registry> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Registry> {
        self.registry.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn settings(&self) -> &ManagerSettings {
        &self.settings
    }

    /// Loads the stored registry, or bootstraps it from the static categories
    ///
    /// # Arguments
    ///
    /// * `bootstrap` - Static category configuration used when nothing is stored
    /// * `config_hash` - Hash of the configuration, recorded on bootstrap
    pub fn load(
        &self,
        bootstrap: &BTreeMap<String, CategoryConfig>,
        config_hash: Option<&str>,
    ) -> LoadOutcome {
        let (loaded, location) = {
            let storage = self.storage.lock().unwrap_or_else(PoisonError::into_inner);
            let loaded = storage.exists().then(|| storage.load());
            (loaded, storage.describe())
        };

        match loaded {
            Some(Ok(snapshot)) => {
                let registry = Registry::from_snapshot(snapshot);
                let links = registry.len();
                *self.write() = registry;
                tracing::info!("Loaded {} links from {}", links, location);
                LoadOutcome::Loaded { links }
            }
            Some(Err(e)) => {
                tracing::error!("Failed to load links from {}: {}", location, e);
                let links = self.replace_with_bootstrap(bootstrap, config_hash);
                LoadOutcome::Fallback { links }
            }
            None => {
                tracing::info!("No existing registry at {}, starting fresh", location);
                let links = self.replace_with_bootstrap(bootstrap, config_hash);
                self.save();
                tracing::info!("Initialized {} links from static categories", links);
                LoadOutcome::Bootstrapped { links }
            }
        }
    }

    fn replace_with_bootstrap(
        &self,
        bootstrap: &BTreeMap<String, CategoryConfig>,
        config_hash: Option<&str>,
    ) -> usize {
        let mut registry = Registry::new();
        registry.import_categories(bootstrap, self.clock.now());
        if let Some(hash) = config_hash {
            registry.set_config_hash(hash);
        }
        let links = registry.len();
        *self.write() = registry;
        links
    }

    /// Persists the current registry
    ///
    /// Failures are logged and reported as `false`; in-memory state is unaffected.
    pub fn save(&self) -> bool {
        let mut storage = self.storage.lock().unwrap_or_else(PoisonError::into_inner);
        let snapshot = self.read().snapshot(self.clock.now());

        match storage.save(&snapshot) {
            Ok(()) => {
                tracing::info!(
                    "Saved {} links to {}",
                    snapshot.metadata.total_links,
                    storage.describe()
                );
                true
            }
            Err(e) => {
                tracing::error!("Failed to save links to {}: {}", storage.describe(), e);
                false
            }
        }
    }

    /// Adds a link; returns false if the URL is already registered
    pub fn add_link(&self, url: &str, category: &str, priority: Priority, notes: &str) -> bool {
        let now = self.clock.now();
        self.write().add_link(url, category, priority, notes, now)
    }

    /// Removes a link; returns false if the URL is unknown
    pub fn remove_link(&self, url: &str) -> bool {
        self.write().remove_link(url)
    }

    /// Explicitly sets a link's status; returns false if the URL is unknown
    pub fn set_status(&self, url: &str, status: LinkStatus) -> bool {
        self.write().set_status(url, status)
    }

    /// Inserts or replaces a category policy
    pub fn upsert_category(&self, policy: CategoryPolicy) {
        self.write().upsert_category(policy);
    }

    /// Applies a visit outcome; returns false if the URL is unknown
    pub fn record_outcome(&self, url: &str, result: &VisitResult) -> bool {
        let now = self.clock.now();
        self.write()
            .record_outcome(url, result, now, &self.settings.failure_policy)
    }

    /// Removes links with at least `min_failures` failures and a failure rate at or
    /// above the configured sweep rate, saving if anything was removed
    ///
    /// # Returns
    ///
    /// The number of links removed
    pub fn sweep(&self, min_failures: u64) -> usize {
        let policy = SweepPolicy {
            min_failures,
            ..self.settings.sweep_policy
        };
        let removed = self.write().sweep(&policy).len();

        if removed > 0 {
            self.save();
            tracing::info!("Cleaned up {} failed links", removed);
        }

        removed
    }

    /// Runs a sweep with the configured thresholds
    pub fn maintenance_sweep(&self) -> usize {
        self.sweep(self.settings.sweep_policy.min_failures)
    }

    /// Builds a bounded, shuffled visit plan
    pub fn plan_visits(&self, category: Option<&str>, max_links: usize) -> Vec<LinkRecord> {
        let now = self.clock.now();
        let registry = self.read();
        self.settings
            .planner
            .plan(&registry, now, category, max_links, &mut rand::thread_rng())
    }

    /// Active links that are due right now
    pub fn due_links(&self, category: Option<&str>) -> Vec<LinkRecord> {
        let now = self.clock.now();
        let registry = self.read();
        scheduler::due_links(&registry, now, category)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Active links ordered by priority, ties in random order
    pub fn priority_sorted(&self, category: Option<&str>) -> Vec<LinkRecord> {
        scheduler::priority_sorted(&self.read(), category, &mut rand::thread_rng())
    }

    /// Random sample of active links
    pub fn random_links(
        &self,
        count: usize,
        category: Option<&str>,
        priority: Option<Priority>,
    ) -> Vec<LinkRecord> {
        scheduler::random_links(
            &self.read(),
            count,
            category,
            priority,
            &mut rand::thread_rng(),
        )
    }

    /// Aggregate counts computed from the current registry
    pub fn statistics(&self) -> LinkStatistics {
        LinkStatistics::from_registry(&self.read())
    }

    pub fn get(&self, url: &str) -> Option<LinkRecord> {
        self.read().get(url).cloned()
    }

    pub fn category(&self, name: &str) -> Option<CategoryPolicy> {
        self.read().category(name).cloned()
    }

    /// A copy of the whole registry
    pub fn registry(&self) -> Registry {
        self.read().clone()
    }

    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }
}
