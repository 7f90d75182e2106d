//! Visit planning
//!
//! A plan is assembled in three passes, each skipping links already chosen:
//!
//! 1. every due link
//! 2. high-priority links that are stale or were never visited
//! 3. a uniform random draw from the remaining active links
//!
//! The assembled list is shuffled, so priority decides inclusion but not order.

use crate::registry::Registry;
use crate::scheduler::due::due_links;
use crate::state::{LinkRecord, Priority};
use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use std::cmp::Reverse;
use std::collections::HashSet;

/// Default window after which a high-priority link counts as stale
pub const DEFAULT_STALENESS_HOURS: i64 = 12;

/// Builds bounded, shuffled visit plans from a registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisitPlanner {
    staleness: Duration,
}

impl Default for VisitPlanner {
    fn default() -> Self {
        Self::new(Duration::hours(DEFAULT_STALENESS_HOURS))
    }
}

impl VisitPlanner {
    pub fn new(staleness: Duration) -> Self {
        Self { staleness }
    }

    pub fn staleness(&self) -> Duration {
        self.staleness
    }

    /// Returns true if the link was never visited or not within the staleness window
    pub fn is_stale(&self, link: &LinkRecord, now: DateTime<Utc>) -> bool {
        match link.last_visited {
            None => true,
            Some(last) => now - last > self.staleness,
        }
    }

    /// Produces at most `max_links` links to visit, in random order
    ///
    /// # Arguments
    ///
    /// * `registry` - The registry to plan from
    /// * `now` - The current time
    /// * `category` - Restricts the due and random passes to one category when set
    /// * `max_links` - Upper bound on the plan size
    /// * `rng` - Source of randomness for back-fill and ordering
    pub fn plan<R: Rng + ?Sized>(
        &self,
        registry: &Registry,
        now: DateTime<Utc>,
        category: Option<&str>,
        max_links: usize,
        rng: &mut R,
    ) -> Vec<LinkRecord> {
        if max_links == 0 {
            return Vec::new();
        }

        let mut selected = due_links(registry, now, category);
        let due_count = selected.len();
        let mut chosen: HashSet<&str> = selected.iter().map(|link| link.url.as_str()).collect();

        // High-priority back-fill ignores the category scope
        if selected.len() < max_links {
            for link in registry.active_links(None) {
                if selected.len() >= max_links {
                    break;
                }
                if link.priority != Priority::High || chosen.contains(link.url.as_str()) {
                    continue;
                }
                if self.is_stale(link, now) {
                    chosen.insert(link.url.as_str());
                    selected.push(link);
                }
            }
        }
        let priority_count = selected.len() - due_count;

        if selected.len() < max_links {
            let remaining: Vec<&LinkRecord> = registry
                .active_links(category)
                .filter(|link| !chosen.contains(link.url.as_str()))
                .collect();
            let needed = max_links - selected.len();
            selected.extend(remaining.choose_multiple(rng, needed).copied());
        }
        let random_count = selected.len() - due_count - priority_count;

        selected.shuffle(rng);
        selected.truncate(max_links);

        tracing::debug!(
            "Planned {} visits (due: {}, stale high-priority: {}, random: {}, cap: {})",
            selected.len(),
            due_count,
            priority_count,
            random_count,
            max_links
        );

        selected.into_iter().cloned().collect()
    }
}

/// All active links ordered by priority, highest first
///
/// Links of equal priority come out in a fresh random order on every call: the
/// candidates are shuffled once and then stably sorted by rank.
pub fn priority_sorted<R: Rng + ?Sized>(
    registry: &Registry,
    category: Option<&str>,
    rng: &mut R,
) -> Vec<LinkRecord> {
    let mut links: Vec<&LinkRecord> = registry.active_links(category).collect();
    links.shuffle(rng);
    links.sort_by_key(|link| Reverse(link.priority.rank()));
    links.into_iter().cloned().collect()
}

/// Uniform random sample, without replacement, of active links
pub fn random_links<R: Rng + ?Sized>(
    registry: &Registry,
    count: usize,
    category: Option<&str>,
    priority: Option<Priority>,
    rng: &mut R,
) -> Vec<LinkRecord> {
    let candidates: Vec<&LinkRecord> = registry
        .active_links(category)
        .filter(|link| priority.map_or(true, |p| link.priority == p))
        .collect();

    candidates
        .choose_multiple(rng, count)
        .map(|link| (*link).clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::FailurePolicy;
    use crate::state::{Cadence, CategoryPolicy, LinkStatus, VisitResult};
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn visit(registry: &mut Registry, url: &str, when: DateTime<Utc>) {
        registry.record_outcome(
            url,
            &VisitResult::success(1.0),
            when,
            &FailurePolicy::default(),
        );
    }

    fn urls(plan: &[LinkRecord]) -> HashSet<String> {
        plan.iter().map(|l| l.url.clone()).collect()
    }

    #[test]
    fn test_plan_cap_with_many_due() {
        let mut registry = Registry::new();
        for i in 0..50 {
            registry.add_link(&format!("https://{}.example/", i), "news", Priority::Low, "", t0());
        }

        let plan = VisitPlanner::default().plan(&registry, t0(), None, 5, &mut rng());
        assert_eq!(plan.len(), 5);
        assert_eq!(urls(&plan).len(), 5);
    }

    #[test]
    fn test_plan_zero_cap_is_empty() {
        let mut registry = Registry::new();
        registry.add_link("https://a.example/", "news", Priority::Low, "", t0());

        let plan = VisitPlanner::default().plan(&registry, t0(), None, 0, &mut rng());
        assert!(plan.is_empty());
    }

    #[test]
    fn test_plan_includes_every_due_link_under_cap() {
        let mut registry = Registry::new();
        registry.upsert_category(CategoryPolicy::new("news", Priority::Low, Cadence::Rare));
        for i in 0..4 {
            registry.add_link(&format!("https://{}.example/", i), "news", Priority::Low, "", t0());
        }
        // Two links visited just now are not due and not high priority, so they
        // only enter through the random pass.
        visit(&mut registry, "https://0.example/", t0());
        visit(&mut registry, "https://1.example/", t0());

        let plan = VisitPlanner::default().plan(&registry, t0(), None, 2, &mut rng());
        assert_eq!(
            urls(&plan),
            HashSet::from(["https://2.example/".to_string(), "https://3.example/".to_string()])
        );
    }

    #[test]
    fn test_stale_high_priority_back_fill() {
        let mut registry = Registry::new();
        registry.upsert_category(CategoryPolicy::new("vip", Priority::High, Cadence::Rare));
        registry.add_link("https://stale.example/", "vip", Priority::High, "", t0());
        registry.add_link("https://fresh.example/", "vip", Priority::High, "", t0());
        registry.add_link("https://low.example/", "vip", Priority::Low, "", t0());

        visit(&mut registry, "https://stale.example/", t0());
        visit(&mut registry, "https://fresh.example/", t0() + Duration::hours(10));
        visit(&mut registry, "https://low.example/", t0());

        // 13h after the first visit: nothing is due under a 24h cadence, but the
        // stale high-priority link is past the 12h window.
        let now = t0() + Duration::hours(13);
        let planner = VisitPlanner::default();
        let link = registry.get("https://stale.example/").unwrap();
        assert!(planner.is_stale(link, now));

        let mut rng = rng();
        let plan = planner.plan(&registry, now, None, 1, &mut rng);
        assert_eq!(urls(&plan), HashSet::from(["https://stale.example/".to_string()]));
    }

    #[test]
    fn test_staleness_window_is_exclusive() {
        let mut registry = Registry::new();
        registry.add_link("https://a.example/", "vip", Priority::High, "", t0());
        visit(&mut registry, "https://a.example/", t0());
        let link = registry.get("https://a.example/").unwrap();
        let planner = VisitPlanner::default();

        assert!(!planner.is_stale(link, t0() + Duration::hours(12)));
        assert!(planner.is_stale(link, t0() + Duration::hours(12) + Duration::seconds(1)));
    }

    #[test]
    fn test_random_back_fill_fills_to_cap() {
        let mut registry = Registry::new();
        registry.upsert_category(CategoryPolicy::new("news", Priority::Low, Cadence::Rare));
        for i in 0..10 {
            let url = format!("https://{}.example/", i);
            registry.add_link(&url, "news", Priority::Low, "", t0());
            visit(&mut registry, &url, t0());
        }

        let plan = VisitPlanner::default().plan(&registry, t0(), None, 4, &mut rng());
        assert_eq!(plan.len(), 4);
        assert_eq!(urls(&plan).len(), 4);
    }

    #[test]
    fn test_plan_never_includes_inactive_links() {
        let mut registry = Registry::new();
        registry.add_link("https://a.example/", "news", Priority::High, "", t0());
        registry.add_link("https://b.example/", "news", Priority::High, "", t0());
        registry.add_link("https://c.example/", "news", Priority::High, "", t0());
        registry.set_status("https://b.example/", LinkStatus::Disabled);
        registry.set_status("https://c.example/", LinkStatus::Failed);

        let plan = VisitPlanner::default().plan(&registry, t0(), None, 10, &mut rng());
        assert_eq!(urls(&plan), HashSet::from(["https://a.example/".to_string()]));
    }

    #[test]
    fn test_high_priority_back_fill_crosses_category_scope() {
        let mut registry = Registry::new();
        registry.add_link("https://news.example/", "news", Priority::Low, "", t0());
        registry.add_link("https://vip.example/", "vip", Priority::High, "", t0());
        registry.add_link("https://other.example/", "other", Priority::Low, "", t0());

        let plan = VisitPlanner::default().plan(&registry, t0(), Some("news"), 10, &mut rng());
        assert_eq!(
            urls(&plan),
            HashSet::from([
                "https://news.example/".to_string(),
                "https://vip.example/".to_string()
            ])
        );
    }

    #[test]
    fn test_random_back_fill_respects_category_scope() {
        let mut registry = Registry::new();
        registry.upsert_category(CategoryPolicy::new("news", Priority::Low, Cadence::Rare));
        registry.upsert_category(CategoryPolicy::new("other", Priority::Low, Cadence::Rare));
        for url in ["https://news.example/", "https://other.example/"] {
            let category = if url.contains("news") { "news" } else { "other" };
            registry.add_link(url, category, Priority::Low, "", t0());
            visit(&mut registry, url, t0());
        }

        let plan = VisitPlanner::default().plan(&registry, t0(), Some("news"), 10, &mut rng());
        assert_eq!(urls(&plan), HashSet::from(["https://news.example/".to_string()]));
    }

    #[test]
    fn test_plan_order_is_shuffled() {
        let mut registry = Registry::new();
        registry.upsert_category(CategoryPolicy::new("news", Priority::Low, Cadence::Rare));
        for i in 0..3 {
            registry.add_link(&format!("https://due{}.example/", i), "news", Priority::Low, "", t0());
        }
        for i in 0..3 {
            let url = format!("https://fill{}.example/", i);
            registry.add_link(&url, "news", Priority::Low, "", t0());
            visit(&mut registry, &url, t0());
        }

        let mut rng = rng();
        let mut due_not_first = false;
        for _ in 0..50 {
            let plan = VisitPlanner::default().plan(&registry, t0(), None, 6, &mut rng);
            assert_eq!(plan.len(), 6);
            if plan[..3].iter().any(|l| l.url.contains("fill")) {
                due_not_first = true;
                break;
            }
        }
        assert!(due_not_first, "due links always came first");
    }

    #[test]
    fn test_priority_sorted_orders_by_rank() {
        let mut registry = Registry::new();
        registry.add_link("https://l1.example/", "c", Priority::Low, "", t0());
        registry.add_link("https://h1.example/", "c", Priority::High, "", t0());
        registry.add_link("https://m1.example/", "c", Priority::Medium, "", t0());
        registry.add_link("https://h2.example/", "c", Priority::High, "", t0());
        registry.add_link("https://l2.example/", "d", Priority::Low, "", t0());

        let sorted = priority_sorted(&registry, None, &mut rng());
        let ranks: Vec<u8> = sorted.iter().map(|l| l.priority.rank()).collect();
        assert_eq!(ranks, vec![3, 3, 2, 1, 1]);

        let scoped = priority_sorted(&registry, Some("d"), &mut rng());
        assert_eq!(scoped.len(), 1);
    }

    #[test]
    fn test_priority_sorted_ties_vary_between_calls() {
        let mut registry = Registry::new();
        for i in 0..8 {
            registry.add_link(&format!("https://{}.example/", i), "c", Priority::Medium, "", t0());
        }

        let mut rng = rng();
        let orders: HashSet<Vec<String>> = (0..20)
            .map(|_| {
                priority_sorted(&registry, None, &mut rng)
                    .into_iter()
                    .map(|l| l.url)
                    .collect()
            })
            .collect();
        assert!(orders.len() > 1);
    }

    #[test]
    fn test_random_links_filters() {
        let mut registry = Registry::new();
        registry.add_link("https://a.example/", "news", Priority::High, "", t0());
        registry.add_link("https://b.example/", "news", Priority::Low, "", t0());
        registry.add_link("https://c.example/", "shop", Priority::High, "", t0());

        let picked = random_links(&registry, 10, Some("news"), Some(Priority::High), &mut rng());
        assert_eq!(urls(&picked), HashSet::from(["https://a.example/".to_string()]));

        let picked = random_links(&registry, 2, None, None, &mut rng());
        assert_eq!(urls(&picked).len(), 2);
    }
}
