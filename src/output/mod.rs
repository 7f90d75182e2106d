//! Output module for registry reports
//!
//! This module handles:
//! - Computing aggregate statistics over the registry
//! - Printing them for humans or as JSON

pub mod stats;

pub use stats::{
    print_statistics, CategoryStats, LinkStatistics, PriorityBreakdown, VisitStats,
};
