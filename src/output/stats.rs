//! Statistics generation from the link registry
//!
//! This module provides functionality for aggregating link counters
//! and displaying them.

use crate::registry::Registry;
use crate::state::{LinkStatus, Priority};
use serde::Serialize;
use std::collections::BTreeMap;

/// Registry statistics summary
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LinkStatistics {
    /// Total number of registered links
    pub total_links: usize,

    pub active_links: usize,
    pub failed_links: usize,
    pub disabled_links: usize,

    /// Per-category link counts and visit totals
    pub categories: BTreeMap<String, CategoryStats>,

    /// Link counts by priority
    pub priority_breakdown: PriorityBreakdown,

    /// Visit totals across all links
    pub visit_stats: VisitStats,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryStats {
    pub count: usize,
    pub visits: u64,
    pub successes: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PriorityBreakdown {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VisitStats {
    pub total_visits: u64,
    pub total_successes: u64,
    pub total_failures: u64,

    /// Overall success rate as a percentage, rounded to two decimals
    pub avg_success_rate: f64,
}

impl LinkStatistics {
    /// Computes statistics over every link in the registry, whatever its status
    pub fn from_registry(registry: &Registry) -> Self {
        let mut stats = Self::default();

        for link in registry.links() {
            stats.total_links += 1;
            match link.status {
                LinkStatus::Active => stats.active_links += 1,
                LinkStatus::Failed => stats.failed_links += 1,
                LinkStatus::Disabled => stats.disabled_links += 1,
            }

            match link.priority {
                Priority::High => stats.priority_breakdown.high += 1,
                Priority::Medium => stats.priority_breakdown.medium += 1,
                Priority::Low => stats.priority_breakdown.low += 1,
            }

            let category = stats.categories.entry(link.category.clone()).or_default();
            category.count += 1;
            category.visits += link.visit_count;
            category.successes += link.success_count;

            stats.visit_stats.total_visits += link.visit_count;
            stats.visit_stats.total_successes += link.success_count;
            stats.visit_stats.total_failures += link.failure_count;
        }

        if stats.visit_stats.total_visits > 0 {
            let rate = stats.visit_stats.total_successes as f64
                / stats.visit_stats.total_visits as f64
                * 100.0;
            stats.visit_stats.avg_success_rate = (rate * 100.0).round() / 100.0;
        }

        stats
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &LinkStatistics) {
    println!("=== Link Statistics ===\n");

    println!("Overview:");
    println!("  Total links: {}", stats.total_links);
    println!("  Active: {}", stats.active_links);
    println!("  Failed: {}", stats.failed_links);
    println!("  Disabled: {}", stats.disabled_links);
    println!();

    println!("Priority:");
    println!("  high: {}", stats.priority_breakdown.high);
    println!("  medium: {}", stats.priority_breakdown.medium);
    println!("  low: {}", stats.priority_breakdown.low);
    println!();

    if !stats.categories.is_empty() {
        println!("Categories:");
        for (name, category) in &stats.categories {
            println!(
                "  {}: {} links, {} visits ({} successful)",
                name, category.count, category.visits, category.successes
            );
        }
        println!();
    }

    println!(
        "Success Rate: {:.2}% ({} / {} visits successful, {} failed)",
        stats.visit_stats.avg_success_rate,
        stats.visit_stats.total_successes,
        stats.visit_stats.total_visits,
        stats.visit_stats.total_failures
    );
}
