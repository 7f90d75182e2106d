//! State module for link and category data
//!
//! # Components
//!
//! - `LinkRecord`: a target URL with its priority, status and visit counters
//! - `CategoryPolicy`: per-category cadence, priority and pacing
//! - `VisitResult`: what a fetcher reports back after a visit

mod category_policy;
mod link_record;
pub(crate) mod timestamp;
mod visit;

// Re-export main types
pub use category_policy::{Cadence, CategoryPolicy, DelayRange};
pub use link_record::{LinkRecord, LinkStatus, Priority};
pub use timestamp::parse_timestamp;
pub use visit::VisitResult;
