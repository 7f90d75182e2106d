//! Visit execution
//!
//! This module turns visit plans into HTTP requests:
//! - Fetching targets with an identifying user agent
//! - Bounding concurrency and pacing visits per category
//! - Reporting every outcome back to the link manager

mod coordinator;
mod fetcher;

pub use coordinator::{Coordinator, CycleReport};
pub use fetcher::{build_http_client, format_user_agent, parse_target_url, Fetcher, HttpFetcher};
