use crate::state::Priority;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How often links in a category should be revisited
///
/// Unrecognized values are kept verbatim so they survive a save/load cycle, and
/// are scheduled like `Normal`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Cadence {
    Frequent,
    Normal,
    Rare,
    Unrecognized(String),
}

impl Cadence {
    /// Minimum time between two visits of the same link
    pub fn interval(&self) -> Duration {
        match self {
            Self::Frequent => Duration::hours(1),
            Self::Normal => Duration::hours(6),
            Self::Rare => Duration::hours(24),
            Self::Unrecognized(_) => Duration::hours(6),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Frequent => "frequent",
            Self::Normal => "normal",
            Self::Rare => "rare",
            Self::Unrecognized(other) => other,
        }
    }
}

impl Default for Cadence {
    fn default() -> Self {
        Self::Normal
    }
}

impl From<String> for Cadence {
    fn from(value: String) -> Self {
        match value.as_str() {
            "frequent" => Self::Frequent,
            "normal" => Self::Normal,
            "rare" => Self::Rare,
            _ => Self::Unrecognized(value),
        }
    }
}

impl From<&str> for Cadence {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<Cadence> for String {
    fn from(value: Cadence) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pause bounds, in seconds, applied after visiting a link of a category
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DelayRange {
    pub min: f64,
    pub max: f64,
}

impl Default for DelayRange {
    fn default() -> Self {
        Self { min: 2.0, max: 5.0 }
    }
}

/// Cadence and priority configuration shared by all links of a category
///
/// The name is the map key in persisted form and is not serialized with the body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryPolicy {
    #[serde(skip)]
    pub name: String,

    #[serde(default)]
    pub priority: Priority,

    #[serde(default)]
    pub visit_frequency: Cadence,

    #[serde(default)]
    pub delay_range: DelayRange,

    #[serde(default = "default_human_simulation")]
    pub human_simulation: bool,
}

fn default_human_simulation() -> bool {
    true
}

impl CategoryPolicy {
    pub fn new(name: impl Into<String>, priority: Priority, visit_frequency: Cadence) -> Self {
        Self {
            name: name.into(),
            priority,
            visit_frequency,
            delay_range: DelayRange::default(),
            human_simulation: default_human_simulation(),
        }
    }

    /// Revisit interval for links of this category
    pub fn cadence_interval(&self) -> Duration {
        self.visit_frequency.interval()
    }
}
