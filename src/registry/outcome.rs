//! Applying visit outcomes to link records

use crate::registry::Registry;
use crate::state::{LinkRecord, LinkStatus, VisitResult};
use chrono::{DateTime, Utc};

/// Thresholds for flipping an active link to `Failed` after a failed visit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FailurePolicy {
    /// Minimum number of visits before the rule applies
    pub min_visits: u64,

    /// Failure rate at or above which the link is marked failed
    pub failure_rate: f64,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        Self {
            min_visits: 3,
            failure_rate: 0.8,
        }
    }
}

impl FailurePolicy {
    /// Returns true if the record's history warrants marking it failed
    pub fn is_triggered(&self, link: &LinkRecord) -> bool {
        link.visit_count >= self.min_visits && link.failure_rate() >= self.failure_rate
    }
}

impl LinkRecord {
    /// Folds one visit result into the record's counters
    ///
    /// Returns true if this outcome flipped the record from `Active` to `Failed`.
    /// Records that are already failed or disabled keep counting, but their status
    /// is left alone.
    pub fn apply_outcome(
        &mut self,
        result: &VisitResult,
        now: DateTime<Utc>,
        policy: &FailurePolicy,
    ) -> bool {
        self.visit_count += 1;
        self.last_visited = Some(now);

        if result.success {
            self.success_count += 1;
            if result.latency_seconds > 0.0 {
                // Incremental mean; the first sample lands exactly on its latency.
                self.avg_load_time +=
                    (result.latency_seconds - self.avg_load_time) / self.success_count as f64;
            }
            return false;
        }

        self.failure_count += 1;

        if self.status == LinkStatus::Active && policy.is_triggered(self) {
            self.status = LinkStatus::Failed;
            return true;
        }

        false
    }
}

impl Registry {
    /// Records the outcome of a visit
    ///
    /// # Returns
    ///
    /// * `true` - The outcome was applied
    /// * `false` - The URL is not registered; nothing changed
    pub fn record_outcome(
        &mut self,
        url: &str,
        result: &VisitResult,
        now: DateTime<Utc>,
        policy: &FailurePolicy,
    ) -> bool {
        let Some(link) = self.get_mut(url) else {
            tracing::debug!("Ignoring outcome for unknown link: {}", url);
            return false;
        };

        let flipped = link.apply_outcome(result, now, policy);

        tracing::trace!(
            "Recorded {} for {} ({} visits, {} failures)",
            if result.success { "success" } else { "failure" },
            url,
            link.visit_count,
            link.failure_count
        );

        if flipped {
            tracing::warn!(
                "Marked link as failed due to high failure rate: {} ({}/{} visits failed)",
                url,
                link.failure_count,
                link.visit_count
            );
        }

        true
    }
}
