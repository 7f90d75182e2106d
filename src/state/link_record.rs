/// Per-URL scheduling state
///
/// This module defines the link record kept for every target URL along with its
/// priority and status enumerations.
use crate::state::timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scheduling priority of a link (or the default priority of a category)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Ordering weight used by priority sorting (higher visits first)
    pub fn rank(&self) -> u8 {
        match self {
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
        }
    }

    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::Medium
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}

/// Lifecycle status of a link
///
/// Only `Active` links are ever planned. `Failed` is set by the outcome recorder,
/// `Disabled` only by an explicit caller; neither is ever left automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    Active,
    Disabled,
    Failed,
}

impl LinkStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Disabled => "disabled",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "disabled" => Some(Self::Disabled),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl Default for LinkStatus {
    fn default() -> Self {
        Self::Active
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}

/// A target URL and its rolling visit statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub url: String,
    pub category: String,
    pub priority: Priority,

    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub last_visited: Option<DateTime<Utc>>,

    #[serde(default)]
    pub visit_count: u64,

    #[serde(default)]
    pub success_count: u64,

    #[serde(default)]
    pub failure_count: u64,

    /// Mean latency in seconds over successful visits that reported one
    #[serde(default)]
    pub avg_load_time: f64,

    #[serde(default)]
    pub status: LinkStatus,

    #[serde(default)]
    pub notes: String,

    #[serde(deserialize_with = "timestamp::deserialize")]
    pub added_date: DateTime<Utc>,
}

impl LinkRecord {
    /// Creates a fresh, never-visited active record
    pub fn new(
        url: impl Into<String>,
        category: impl Into<String>,
        priority: Priority,
        notes: impl Into<String>,
        added_date: DateTime<Utc>,
    ) -> Self {
        Self {
            url: url.into(),
            category: category.into(),
            priority,
            last_visited: None,
            visit_count: 0,
            success_count: 0,
            failure_count: 0,
            avg_load_time: 0.0,
            status: LinkStatus::Active,
            notes: notes.into(),
            added_date,
        }
    }

    /// Fraction of visits that failed, 0.0 for a never-visited link
    pub fn failure_rate(&self) -> f64 {
        if self.visit_count == 0 {
            0.0
        } else {
            self.failure_count as f64 / self.visit_count as f64
        }
    }

    /// Returns true if the counters add up
    pub fn counters_consistent(&self) -> bool {
        self.success_count.checked_add(self.failure_count) == Some(self.visit_count)
    }

    /// Returns true if the record has been visited at least once
    pub fn was_visited(&self) -> bool {
        self.last_visited.is_some()
    }
}
