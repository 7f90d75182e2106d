//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the visitor, including:
//! - Building HTTP clients with an identifying user agent string
//! - GET requests that read the full response body
//! - Classifying failures into short error kinds

use crate::config::UserAgentConfig;
use crate::state::VisitResult;
use crate::CadenceError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use url::Url;

/// Performs a single visit and reports its outcome
///
/// Implementations never fail: every problem is folded into a
/// failed [`VisitResult`].
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn visit(&self, url: &str) -> VisitResult;
}

/// Parses a visit target, accepting only absolute http(s) URLs
pub fn parse_target_url(url: &str) -> crate::Result<Url> {
    let parsed = Url::parse(url.trim())?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(CadenceError::UnsupportedScheme {
            url: url.to_string(),
            scheme: scheme.to_string(),
        }),
    }
}

/// Formats the user agent string
///
/// Format: `VisitorName/Version (+ContactURL; ContactEmail)`
pub fn format_user_agent(config: &UserAgentConfig) -> String {
    format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    )
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use link_cadence::config::UserAgentConfig;
/// use link_cadence::visitor::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "LinkCadence".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
///     request_timeout_secs: 30,
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    let timeout = Duration::from_secs(config.request_timeout_secs);

    Client::builder()
        .user_agent(format_user_agent(config))
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetcher backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    /// Sends a GET request and reads the body to completion
    ///
    /// | Condition | Error kind |
    /// |-----------|------------|
    /// | 2xx with a readable body | (success) |
    /// | Non-2xx status | `http_<code>` |
    /// | Timeout | `timeout` |
    /// | Connection failure | `connect` |
    /// | Body could not be read | `body` |
    /// | Anything else | `request` |
    async fn visit(&self, url: &str) -> VisitResult {
        let started = Instant::now();

        let result = match self.client.get(url).send().await {
            Ok(response) => {
                let status = response.status();
                if !status.is_success() {
                    VisitResult::failure(format!("http_{}", status.as_u16()))
                } else {
                    match response.bytes().await {
                        Ok(_) => VisitResult::success(0.0),
                        Err(e) => VisitResult::failure(classify_error(&e, "body")),
                    }
                }
            }
            Err(e) => VisitResult::failure(classify_error(&e, "request")),
        };

        let latency = started.elapsed().as_secs_f64();
        match &result.error_kind {
            None => tracing::debug!("Visited {} in {:.3}s", url, latency),
            Some(kind) => tracing::debug!("Visit to {} failed: {}", url, kind),
        }

        result.with_latency(latency)
    }
}

fn classify_error(error: &reqwest::Error, fallback: &str) -> String {
    if error.is_timeout() {
        "timeout".to_string()
    } else if error.is_connect() {
        "connect".to_string()
    } else {
        fallback.to_string()
    }
}
