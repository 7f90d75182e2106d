use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigResult;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use link_cadence::config::load_config;
///
/// let config = load_config(Path::new("link-cadence.toml")).unwrap();
/// println!("Plans hold at most {} links", config.scheduler.max_links);
/// ```
pub fn load_config(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from a TOML string
pub fn parse_config(content: &str) -> ConfigResult<Config> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// The hash is recorded when the registry is bootstrapped, so a later run can
/// tell whether the static categories changed since.
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> ConfigResult<String> {
    let content = std::fs::read_to_string(path)?;
    Ok(hash_content(&content))
}

fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> ConfigResult<(Config, String)> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    Ok((config, hash_content(&content)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConfigError;
    use crate::config::StorageBackend;
    use crate::state::{Cadence, Priority};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const VALID_CONFIG: &str = r#"
[scheduler]
max-links = 20
staleness-hours = 8

[maintenance]
sweep-min-failures = 7

[storage]
backend = "sqlite"
path = "./registry.db"

[user-agent]
crawler-name = "TestVisitor"
crawler-version = "1.0"
contact-url = "https://example.com/about"
contact-email = "admin@example.com"

[categories.status_pages]
urls = ["https://status.example.com/", "https://health.example.org/"]
priority = "high"
visit-frequency = "frequent"
delay-range = { min = 2, max = 5 }

[categories.docs]
urls = []
visit-frequency = "whenever"
"#;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let file = create_temp_config(VALID_CONFIG);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.scheduler.max_links, 20);
        assert_eq!(config.scheduler.staleness_hours, 8);
        assert_eq!(config.scheduler.max_concurrent_visits, 4);
        assert_eq!(config.maintenance.sweep_min_failures, 7);
        assert_eq!(config.maintenance.failure_min_visits, 3);
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert_eq!(config.user_agent.crawler_name, "TestVisitor");
        assert_eq!(config.user_agent.request_timeout_secs, 30);

        let status = &config.categories["status_pages"];
        assert_eq!(status.urls.len(), 2);
        assert_eq!(status.priority, Priority::High);
        assert_eq!(status.visit_frequency, Cadence::Frequent);
        assert_eq!(status.delay_range.max, 5.0);

        let docs = &config.categories["docs"];
        assert_eq!(docs.priority, Priority::Medium);
        assert_eq!(docs.visit_frequency, Cadence::from("whenever"));
        assert!(docs.human_simulation);
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/link-cadence.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        assert!(matches!(
            load_config(file.path()).unwrap_err(),
            ConfigError::Parse(_)
        ));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let content = VALID_CONFIG.replace("max-links = 20", "max-links = 0");
        let file = create_temp_config(&content);
        assert!(matches!(
            load_config(file.path()).unwrap_err(),
            ConfigError::Validation(_)
        ));
    }

    #[test]
    fn test_load_config_with_bad_category_url() {
        let content = VALID_CONFIG.replace("https://health.example.org/", "health.example.org");
        let file = create_temp_config(&content);
        assert!(matches!(
            load_config(file.path()).unwrap_err(),
            ConfigError::InvalidUrl(_)
        ));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64); // SHA-256 produces 64 hex characters
    }

    #[test]
    fn test_load_config_with_hash_matches_file_hash() {
        let file = create_temp_config(VALID_CONFIG);
        let (_, hash) = load_config_with_hash(file.path()).unwrap();
        assert_eq!(hash, compute_config_hash(file.path()).unwrap());
    }
}
