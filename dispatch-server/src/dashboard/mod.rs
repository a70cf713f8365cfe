//! Dashboard Aggregator
//!
//! Read-only statistics over the order and partner projections.

pub mod stats;

pub use stats::{compute_stats, get_dashboard_stats};
