use crate::config::types::{
    CategoryConfig, Config, MaintenanceConfig, SchedulerConfig, StorageConfig, UserAgentConfig,
    MAX_STALENESS_HOURS,
};
use crate::state::Cadence;
use crate::ConfigError;
use std::collections::BTreeMap;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_scheduler_config(&config.scheduler)?;
    validate_maintenance_config(&config.maintenance)?;
    validate_storage_config(&config.storage)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_categories(&config.categories)?;
    Ok(())
}

/// Validates scheduler configuration
fn validate_scheduler_config(config: &SchedulerConfig) -> Result<(), ConfigError> {
    if config.max_links < 1 {
        return Err(ConfigError::Validation(format!(
            "max_links must be >= 1, got {}",
            config.max_links
        )));
    }

    if config.staleness_hours < 1 || config.staleness_hours > MAX_STALENESS_HOURS {
        return Err(ConfigError::Validation(format!(
            "staleness_hours must be between 1 and {}, got {}",
            MAX_STALENESS_HOURS, config.staleness_hours
        )));
    }

    if config.max_concurrent_visits < 1 || config.max_concurrent_visits > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_visits must be between 1 and 100, got {}",
            config.max_concurrent_visits
        )));
    }

    Ok(())
}

/// Validates failure and sweep thresholds
fn validate_maintenance_config(config: &MaintenanceConfig) -> Result<(), ConfigError> {
    validate_rate("failure_rate", config.failure_rate)?;
    validate_rate("sweep_failure_rate", config.sweep_failure_rate)?;

    if config.failure_min_visits < 1 {
        return Err(ConfigError::Validation(format!(
            "failure_min_visits must be >= 1, got {}",
            config.failure_min_visits
        )));
    }

    if config.sweep_min_failures < 1 {
        return Err(ConfigError::Validation(format!(
            "sweep_min_failures must be >= 1, got {}",
            config.sweep_min_failures
        )));
    }

    Ok(())
}

fn validate_rate(name: &str, rate: f64) -> Result<(), ConfigError> {
    if !(rate > 0.0 && rate <= 1.0) {
        return Err(ConfigError::Validation(format!(
            "{} must be in (0, 1], got {}",
            name, rate
        )));
    }
    Ok(())
}

/// Validates storage configuration
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.path.is_empty() {
        return Err(ConfigError::Validation(
            "storage path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Name goes into the user agent: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates the bootstrap categories
fn validate_categories(categories: &BTreeMap<String, CategoryConfig>) -> Result<(), ConfigError> {
    for (name, entry) in categories {
        if name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "category name cannot be empty".to_string(),
            ));
        }

        let range = entry.delay_range;
        if !range.min.is_finite() || !range.max.is_finite() || range.min < 0.0 {
            return Err(ConfigError::Validation(format!(
                "Category '{}' delay range must be finite and non-negative",
                name
            )));
        }
        if range.min > range.max {
            return Err(ConfigError::Validation(format!(
                "Category '{}' delay range min ({}) exceeds max ({})",
                name, range.min, range.max
            )));
        }

        if let Cadence::Unrecognized(other) = &entry.visit_frequency {
            tracing::warn!(
                "Category '{}' has unrecognized visit frequency '{}', scheduling as normal",
                name,
                other
            );
        }

        for url in entry.urls.iter().map(|u| u.trim()).filter(|u| !u.is_empty()) {
            validate_target_url(name, url)?;
        }
    }

    Ok(())
}

/// Validates that a bootstrap URL is an absolute http(s) URL
fn validate_target_url(category: &str, url: &str) -> Result<(), ConfigError> {
    let parsed = Url::parse(url).map_err(|e| {
        ConfigError::InvalidUrl(format!(
            "Invalid URL '{}' in category '{}': {}",
            url, category, e
        ))
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::Validation(format!(
            "URL '{}' in category '{}' must use http or https",
            url, category
        )));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    // Basic email format check: must contain @ and have text on both sides
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    let local = parts[0];
    let domain = parts[1];

    if local.is_empty() || domain.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
