//! Configuration module for Link-Cadence
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Besides scheduler tunables, the file carries the static category configuration
//! used to bootstrap an empty registry.
//!
//! # Example
//!
//! ```no_run
//! use link_cadence::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("link-cadence.toml")).unwrap();
//! println!("{} bootstrap categories", config.categories.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CategoryConfig, Config, MaintenanceConfig, SchedulerConfig, StorageBackend, StorageConfig,
    UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
