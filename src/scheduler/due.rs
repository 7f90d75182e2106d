//! Cadence-based due selection
//!
//! A link is due when it has never been visited, or when at least its category's
//! cadence interval has elapsed since its last visit. The boundary is inclusive:
//! a link last visited at `T` with a six hour cadence is due at exactly `T + 6h`.

use crate::registry::Registry;
use crate::state::{Cadence, LinkRecord};
use chrono::{DateTime, Duration, Utc};

/// Revisit interval for a category, falling back to the normal cadence when the
/// category has no policy
pub fn cadence_interval(registry: &Registry, category: &str) -> Duration {
    registry
        .category(category)
        .map(|policy| policy.cadence_interval())
        .unwrap_or_else(|| Cadence::Normal.interval())
}

/// The earliest instant at which a visited link becomes due again
///
/// Returns None for a link that has never been visited.
pub fn next_due(registry: &Registry, link: &LinkRecord) -> Option<DateTime<Utc>> {
    link.last_visited
        .map(|last| last + cadence_interval(registry, &link.category))
}

/// Checks whether a link is eligible for a visit at `now`
///
/// Links that are not active are never due.
pub fn is_due(registry: &Registry, link: &LinkRecord, now: DateTime<Utc>) -> bool {
    if !link.status.is_active() {
        return false;
    }

    match next_due(registry, link) {
        None => true,
        Some(due_at) => now >= due_at,
    }
}

/// Collects every active link that is due at `now`, optionally within one category
pub fn due_links<'a>(
    registry: &'a Registry,
    now: DateTime<Utc>,
    category: Option<&'a str>,
) -> Vec<&'a LinkRecord> {
    registry
        .active_links(category)
        .filter(|link| is_due(registry, link, now))
        .collect()
}
