//! Scheduling module
//!
//! This module decides which links should be visited next:
//! - Cadence-based due selection per category
//! - Bounded visit plans with staleness and random back-fill
//! - Priority ordering and random sampling helpers
//!
//! Everything here is a pure read over a [`crate::Registry`] and never mutates it.

mod due;
mod planner;

pub use due::{cadence_interval, due_links, is_due, next_due};
pub use planner::{priority_sorted, random_links, VisitPlanner, DEFAULT_STALENESS_HOURS};
