use crate::registry::{FailurePolicy, SweepPolicy};
use crate::state::{Cadence, CategoryPolicy, DelayRange, Priority};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Main configuration structure for Link-Cadence
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub maintenance: MaintenanceConfig,

    pub storage: StorageConfig,

    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,

    /// Static category configuration, imported once when no registry is stored yet
    #[serde(default)]
    pub categories: BTreeMap<String, CategoryConfig>,
}

/// Visit planning and loop configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Maximum number of links in one visit plan
    #[serde(rename = "max-links")]
    pub max_links: usize,

    /// Hours after which an unvisited high-priority link is back-filled
    #[serde(rename = "staleness-hours")]
    pub staleness_hours: i64,

    /// Maximum number of visits in flight at once
    #[serde(rename = "max-concurrent-visits")]
    pub max_concurrent_visits: u32,

    /// Run a maintenance sweep after this many cycles (0 disables)
    #[serde(rename = "sweep-every-cycles")]
    pub sweep_every_cycles: u32,

    /// Pause between consecutive cycles, in seconds
    #[serde(rename = "cycle-pause-secs")]
    pub cycle_pause_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_links: 50,
            staleness_hours: 12,
            max_concurrent_visits: 4,
            sweep_every_cycles: 10,
            cycle_pause_secs: 0,
        }
    }
}

/// Upper bound on `staleness-hours` (one hundred years)
pub const MAX_STALENESS_HOURS: i64 = 24 * 365 * 100;

impl SchedulerConfig {
    /// Staleness window, clamped to `1..=MAX_STALENESS_HOURS` hours
    pub fn staleness(&self) -> chrono::Duration {
        chrono::Duration::hours(self.staleness_hours.clamp(1, MAX_STALENESS_HOURS))
    }
}

/// Failure handling thresholds
///
/// The auto-flip and the sweep are tuned separately.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MaintenanceConfig {
    /// Visits required before a failing link can be marked failed
    #[serde(rename = "failure-min-visits")]
    pub failure_min_visits: u64,

    /// Failure rate that marks a link failed
    #[serde(rename = "failure-rate")]
    pub failure_rate: f64,

    /// Failures (and visits) required before a link can be swept
    #[serde(rename = "sweep-min-failures")]
    pub sweep_min_failures: u64,

    /// Failure rate that gets a link swept
    #[serde(rename = "sweep-failure-rate")]
    pub sweep_failure_rate: f64,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        let failure = FailurePolicy::default();
        let sweep = SweepPolicy::default();
        Self {
            failure_min_visits: failure.min_visits,
            failure_rate: failure.failure_rate,
            sweep_min_failures: sweep.min_failures,
            sweep_failure_rate: sweep.failure_rate,
        }
    }
}

impl MaintenanceConfig {
    pub fn failure_policy(&self) -> FailurePolicy {
        FailurePolicy {
            min_visits: self.failure_min_visits,
            failure_rate: self.failure_rate,
        }
    }

    pub fn sweep_policy(&self) -> SweepPolicy {
        SweepPolicy {
            min_failures: self.sweep_min_failures,
            failure_rate: self.sweep_failure_rate,
        }
    }
}

/// Which persistence backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Json,
    Sqlite,
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::Json
    }
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Path to the JSON file or SQLite database
    pub path: String,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the visitor
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the visitor
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the visitor
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for visitor-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,

    /// Per-request timeout in seconds
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    30
}

/// One category of the static bootstrap configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryConfig {
    /// URLs imported into the registry on first run
    #[serde(default)]
    pub urls: Vec<String>,

    #[serde(default)]
    pub priority: Priority,

    #[serde(rename = "visit-frequency", default)]
    pub visit_frequency: Cadence,

    #[serde(rename = "delay-range", default)]
    pub delay_range: DelayRange,

    #[serde(rename = "human-simulation", default = "default_true")]
    pub human_simulation: bool,
}

fn default_true() -> bool {
    true
}

impl CategoryConfig {
    /// Builds the category policy stored in the registry
    pub fn to_policy(&self, name: &str) -> CategoryPolicy {
        CategoryPolicy {
            name: name.to_string(),
            priority: self.priority,
            visit_frequency: self.visit_frequency.clone(),
            delay_range: self.delay_range,
            human_simulation: self.human_simulation,
        }
    }
}
