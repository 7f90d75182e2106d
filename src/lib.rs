//! Link-Cadence: a link registry with an adaptive visit scheduler
//!
//! This crate keeps a registry of target URLs grouped into categories and decides
//! which of them are due for a visit, in what order, and how visit outcomes feed
//! back into future scheduling (failure auto-flip, priority back-fill, per-category
//! cadence).

pub mod clock;
pub mod config;
pub mod manager;
pub mod output;
pub mod registry;
pub mod scheduler;
pub mod state;
pub mod storage;
pub mod visitor;

use thiserror::Error;

/// Main error type for Link-Cadence operations
#[derive(Debug, Error)]
pub enum CadenceError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Unsupported URL scheme '{scheme}' in {url}")]
    UnsupportedScheme { url: String, scheme: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Link-Cadence operations
pub type Result<T> = std::result::Result<T, CadenceError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use manager::LinkManager;
pub use registry::Registry;
pub use state::{Cadence, CategoryPolicy, LinkRecord, LinkStatus, Priority, VisitResult};
