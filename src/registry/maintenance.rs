//! Batch removal of chronically failing links

use crate::registry::Registry;
use crate::state::LinkRecord;

/// Thresholds for permanently removing a link during a sweep
///
/// Independent of [`super::FailurePolicy`]: the flip is a soft status change,
/// the sweep deletes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepPolicy {
    /// Minimum failures (and visits) before a link can be removed
    pub min_failures: u64,

    /// Failure rate at or above which the link is removed
    pub failure_rate: f64,
}

impl Default for SweepPolicy {
    fn default() -> Self {
        Self {
            min_failures: 5,
            failure_rate: 0.8,
        }
    }
}

impl SweepPolicy {
    /// Returns true if the link should be removed
    pub fn should_remove(&self, link: &LinkRecord) -> bool {
        link.failure_count >= self.min_failures
            && link.visit_count >= self.min_failures
            && link.failure_rate() >= self.failure_rate
    }
}

impl Registry {
    /// Removes every link matched by the sweep policy, regardless of status
    ///
    /// # Returns
    ///
    /// The removed records
    pub fn sweep(&mut self, policy: &SweepPolicy) -> Vec<LinkRecord> {
        let removed = self.retain_links(|link| !policy.should_remove(link));

        for link in &removed {
            tracing::info!(
                "Swept failing link: {} ({}/{} visits failed)",
                link.url,
                link.failure_count,
                link.visit_count
            );
        }

        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{LinkStatus, Priority};
    use chrono::Utc;

    fn link_with(url: &str, visits: u64, failures: u64) -> LinkRecord {
        let mut link = LinkRecord::new(url, "news", Priority::Medium, "", Utc::now());
        link.visit_count = visits;
        link.failure_count = failures;
        link.success_count = visits - failures;
        link
    }

    fn registry_of(links: Vec<LinkRecord>) -> Registry {
        let mut registry = Registry::new();
        for link in links {
            registry.add_link(&link.url, &link.category, link.priority, "", link.added_date);
            let stored = registry.get_mut(&link.url).unwrap();
            *stored = link;
        }
        registry
    }

    #[test]
    fn test_sweep_threshold() {
        let mut registry = registry_of(vec![
            link_with("https://bad.example/", 6, 5),
            link_with("https://flaky.example/", 10, 5),
        ]);

        let removed = registry.sweep(&SweepPolicy::default());

        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].url, "https://bad.example/");
        assert!(registry.get("https://bad.example/").is_none());
        assert!(registry.get("https://flaky.example/").is_some());
    }

    #[test]
    fn test_sweep_requires_min_failures() {
        // 4/4 failures is a 100% rate but below the failure floor
        let mut registry = registry_of(vec![link_with("https://new.example/", 4, 4)]);

        assert!(registry.sweep(&SweepPolicy::default()).is_empty());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_sweep_ignores_status() {
        let mut failed = link_with("https://failed.example/", 5, 5);
        failed.status = LinkStatus::Failed;
        let mut disabled = link_with("https://disabled.example/", 5, 5);
        disabled.status = LinkStatus::Disabled;
        let mut registry = registry_of(vec![failed, disabled]);

        assert_eq!(registry.sweep(&SweepPolicy::default()).len(), 2);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_sweep_with_custom_threshold() {
        let mut registry = registry_of(vec![link_with("https://a.example/", 3, 2)]);
        let policy = SweepPolicy {
            min_failures: 2,
            failure_rate: 0.6,
        };

        assert_eq!(registry.sweep(&policy).len(), 1);
    }
}
