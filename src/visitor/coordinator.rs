//! Visit coordinator - main cycle orchestration logic
//!
//! Each cycle asks the link manager for a plan, visits the planned links with
//! bounded concurrency, feeds every outcome back, and persists the registry.
//! Periodic maintenance sweeps run between cycles.

use crate::config::{Config, SchedulerConfig};
use crate::manager::LinkManager;
use crate::visitor::{Fetcher, HttpFetcher};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Summary of one visit cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Links in the plan
    pub planned: usize,
    pub succeeded: usize,
    pub failed: usize,

    /// Links removed by a maintenance sweep after this cycle
    pub removed: usize,
}

/// Main visit coordinator structure
pub struct Coordinator {
    manager: Arc<LinkManager>,
    fetcher: Arc<dyn Fetcher>,
    config: SchedulerConfig,
}

impl Coordinator {
    pub fn new(manager: Arc<LinkManager>, fetcher: Arc<dyn Fetcher>, config: SchedulerConfig) -> Self {
        Self {
            manager,
            fetcher,
            config,
        }
    }

    /// Creates a coordinator that visits over HTTP with the configured user agent
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run cycles
    /// * `Err(CadenceError)` - Failed to build the HTTP client
    pub fn from_config(manager: Arc<LinkManager>, config: &Config) -> crate::Result<Self> {
        let fetcher = HttpFetcher::new(&config.user_agent)?;
        Ok(Self::new(manager, Arc::new(fetcher), config.scheduler.clone()))
    }

    pub fn manager(&self) -> &Arc<LinkManager> {
        &self.manager
    }

    /// Random pause taken after visiting a link of this category
    fn pacing_delay(&self, category: &str) -> Duration {
        let Some(policy) = self.manager.category(category) else {
            return Duration::ZERO;
        };

        let range = policy.delay_range;
        let seconds = if range.max > range.min {
            rand::thread_rng().gen_range(range.min..=range.max)
        } else {
            range.min
        };

        Duration::try_from_secs_f64(seconds).unwrap_or(Duration::ZERO)
    }

    /// Runs a single cycle: plan, visit, record, save
    ///
    /// # Arguments
    ///
    /// * `category` - Restrict the plan to one category
    /// * `max_links` - Upper bound on the plan size
    pub async fn run_cycle(&self, category: Option<&str>, max_links: usize) -> CycleReport {
        let plan = self.manager.plan_visits(category, max_links);
        let mut report = CycleReport {
            planned: plan.len(),
            ..CycleReport::default()
        };

        if plan.is_empty() {
            tracing::info!("Nothing to visit this cycle");
            return report;
        }

        tracing::info!("Visiting {} links", plan.len());

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_visits as usize));
        let mut tasks = JoinSet::new();

        for link in plan {
            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    tracing::error!("Visit semaphore closed: {}", e);
                    break;
                }
            };

            let delay = self.pacing_delay(&link.category);
            let manager = Arc::clone(&self.manager);
            let fetcher = Arc::clone(&self.fetcher);

            tasks.spawn(async move {
                let result = fetcher.visit(&link.url).await;
                manager.record_outcome(&link.url, &result);

                // The permit is held through the pause
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                drop(permit);

                result.success
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(true) => report.succeeded += 1,
                Ok(false) => report.failed += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::error!("Visit task failed: {}", e);
                }
            }
        }

        self.manager.save();

        tracing::info!(
            "Cycle complete: {} planned, {} succeeded, {} failed",
            report.planned,
            report.succeeded,
            report.failed
        );

        report
    }

    /// Runs `cycles` consecutive cycles over all categories
    ///
    /// A maintenance sweep follows every `sweep-every-cycles`-th cycle.
    pub async fn run(&self, cycles: u32) -> Vec<CycleReport> {
        let mut reports = Vec::with_capacity(cycles as usize);
        let pause = Duration::from_secs(self.config.cycle_pause_secs);

        for cycle in 1..=cycles {
            tracing::info!("Starting cycle {}/{}", cycle, cycles);
            let mut report = self.run_cycle(None, self.config.max_links).await;

            let every = self.config.sweep_every_cycles;
            if every > 0 && cycle % every == 0 {
                report.removed = self.manager.maintenance_sweep();
            }

            reports.push(report);

            if cycle < cycles && !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }
        }

        reports
    }
}
