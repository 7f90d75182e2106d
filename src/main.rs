//! Link-Cadence main entry point
//!
//! This is the command-line interface for the Link-Cadence visit scheduler.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use link_cadence::config::{load_config_with_hash, Config};
use link_cadence::manager::LinkManager;
use link_cadence::output::print_statistics;
use link_cadence::visitor::{parse_target_url, Coordinator};
use link_cadence::{LinkRecord, LinkStatus, Priority};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Link-Cadence: a link registry with an adaptive visit scheduler
///
/// Link-Cadence keeps a registry of target URLs grouped into categories,
/// decides which of them are due for a visit, and learns from every
/// visit outcome.
#[derive(Parser, Debug)]
#[command(name = "link-cadence")]
#[command(version = "1.0.0")]
#[command(about = "A link registry with an adaptive visit scheduler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG", default_value = "link-cadence.toml")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate the configuration and show what would be scheduled
    Check,

    #[command(flatten)]
    Registry(RegistryCommand),
}

/// Commands that open the stored registry
#[derive(Subcommand, Debug)]
enum RegistryCommand {
    /// Run visit cycles
    Run {
        /// Number of cycles to run
        #[arg(long, default_value_t = 1)]
        cycles: u32,

        /// Restrict a single cycle to one category
        #[arg(long, conflicts_with = "cycles")]
        category: Option<String>,

        /// Override the configured plan size
        #[arg(long)]
        max_links: Option<usize>,
    },

    /// Show the visit plan without visiting anything
    Plan {
        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        max_links: Option<usize>,
    },

    /// List links that are due now
    Due {
        #[arg(long)]
        category: Option<String>,
    },

    /// Show registry statistics
    Stats {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Register a new link
    Add {
        url: String,

        #[arg(long)]
        category: String,

        #[arg(long, value_parser = parse_priority, default_value = "medium")]
        priority: Priority,

        #[arg(long, default_value = "")]
        notes: String,
    },

    /// Remove a link from the registry
    Remove { url: String },

    /// Exclude a link from scheduling
    Disable { url: String },

    /// Return a failed or disabled link to scheduling
    Enable { url: String },

    /// Remove links that keep failing
    Sweep {
        /// Minimum failures before a link can be removed
        #[arg(long)]
        min_failures: Option<u64>,
    },
}

fn parse_priority(value: &str) -> Result<Priority, String> {
    Priority::from_db_string(value)
        .ok_or_else(|| format!("unknown priority '{}', expected high, medium or low", value))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    match cli.command {
        Command::Check => handle_check(&config),
        Command::Registry(command) => handle_command(command, &config, &config_hash).await,
    }
}

/// Dispatches every command that works on the stored registry
async fn handle_command(
    command: RegistryCommand,
    config: &Config,
    config_hash: &str,
) -> anyhow::Result<()> {
    let manager = LinkManager::from_config(config, Some(config_hash))
        .with_context(|| format!("Failed to open storage at {}", config.storage.path))?;
    let manager = Arc::new(manager);

    match command {
        RegistryCommand::Run {
            cycles,
            category,
            max_links,
        } => handle_run(config, manager, cycles, category, max_links).await?,
        RegistryCommand::Plan {
            category,
            max_links,
        } => {
            let max_links = max_links.unwrap_or(config.scheduler.max_links);
            let plan = manager.plan_visits(category.as_deref(), max_links);
            println!("Planned {} visits:", plan.len());
            print_links(&plan);
        }
        RegistryCommand::Due { category } => {
            let due = manager.due_links(category.as_deref());
            println!("{} links due:", due.len());
            print_links(&due);
        }
        RegistryCommand::Stats { json } => {
            let stats = manager.statistics();
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_statistics(&stats);
            }
        }
        RegistryCommand::Add {
            url,
            category,
            priority,
            notes,
        } => {
            let url = url.trim();
            parse_target_url(url).with_context(|| format!("Cannot add '{}'", url))?;
            if manager.add_link(url, &category, priority, &notes) {
                save(&manager)?;
                println!("Added {}", url);
            } else {
                println!("{} is already registered", url);
            }
        }
        RegistryCommand::Remove { url } => {
            if !manager.remove_link(&url) {
                bail!("{} is not registered", url);
            }
            save(&manager)?;
            println!("Removed {}", url);
        }
        RegistryCommand::Disable { url } => set_status(&manager, &url, LinkStatus::Disabled)?,
        RegistryCommand::Enable { url } => set_status(&manager, &url, LinkStatus::Active)?,
        RegistryCommand::Sweep { min_failures } => {
            let min_failures =
                min_failures.unwrap_or(config.maintenance.sweep_min_failures);
            let removed = manager.sweep(min_failures);
            println!("Removed {} failing links", removed);
        }
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("link_cadence=info,warn"),
            1 => EnvFilter::new("link_cadence=debug,info"),
            2 => EnvFilter::new("link_cadence=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn save(manager: &LinkManager) -> anyhow::Result<()> {
    if !manager.save() {
        bail!("Failed to persist the registry");
    }
    Ok(())
}

fn set_status(manager: &LinkManager, url: &str, status: LinkStatus) -> anyhow::Result<()> {
    if !manager.set_status(url, status) {
        bail!("{} is not registered", url);
    }
    save(manager)?;
    println!("{} is now {}", url, status);
    Ok(())
}

fn print_links(links: &[LinkRecord]) {
    for link in links {
        let last = link
            .last_visited
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "never".to_string());
        println!(
            "  [{}] {} ({}, last visited: {})",
            link.priority, link.url, link.category, last
        );
    }
}

/// Handles the check command: validates config and shows what would be scheduled
fn handle_check(config: &Config) -> anyhow::Result<()> {
    println!("=== Link-Cadence Configuration Check ===\n");

    println!("Scheduler:");
    println!("  Max links per plan: {}", config.scheduler.max_links);
    println!("  Staleness: {}h", config.scheduler.staleness_hours);
    println!(
        "  Max concurrent visits: {}",
        config.scheduler.max_concurrent_visits
    );
    println!("  Sweep every: {} cycles", config.scheduler.sweep_every_cycles);

    println!("\nMaintenance:");
    println!(
        "  Mark failed after {} visits at {:.0}% failures",
        config.maintenance.failure_min_visits,
        config.maintenance.failure_rate * 100.0
    );
    println!(
        "  Sweep after {} failures at {:.0}% failures",
        config.maintenance.sweep_min_failures,
        config.maintenance.sweep_failure_rate * 100.0
    );

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    println!("\nStorage:");
    println!("  Backend: {:?}", config.storage.backend);
    println!("  Path: {}", config.storage.path);

    println!("\nCategories ({}):", config.categories.len());
    for (name, category) in &config.categories {
        println!(
            "  - {} ({}, {}, {} urls, delay {}-{}s)",
            name,
            category.priority,
            category.visit_frequency,
            category.urls.len(),
            category.delay_range.min,
            category.delay_range.max
        );
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would bootstrap {} URLs into an empty registry",
        config.categories.values().map(|c| c.urls.len()).sum::<usize>()
    );

    Ok(())
}

/// Handles the run command
async fn handle_run(
    config: &Config,
    manager: Arc<LinkManager>,
    cycles: u32,
    category: Option<String>,
    max_links: Option<usize>,
) -> anyhow::Result<()> {
    let mut config = config.clone();
    if let Some(max_links) = max_links {
        config.scheduler.max_links = max_links;
    }
    let max_links = config.scheduler.max_links;
    let coordinator =
        Coordinator::from_config(manager, &config).context("Failed to build HTTP client")?;

    let reports = match category {
        Some(category) => vec![coordinator.run_cycle(Some(&category), max_links).await],
        None => coordinator.run(cycles).await,
    };

    let visited: usize = reports.iter().map(|r| r.succeeded + r.failed).sum();
    let succeeded: usize = reports.iter().map(|r| r.succeeded).sum();
    let removed: usize = reports.iter().map(|r| r.removed).sum();
    tracing::info!(
        "Finished {} cycles: {} visits, {} succeeded, {} links removed",
        reports.len(),
        visited,
        succeeded,
        removed
    );

    Ok(())
}
