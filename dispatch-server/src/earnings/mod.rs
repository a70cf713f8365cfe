//! Earnings Aggregator
//!
//! - **windows**: today / weekly / monthly buckets from credited deliveries
//! - **policy**: the partner's share of the delivery fee
//! - **worker**: credits partners when their orders are delivered
//! - **rollover**: recomputes windows after local midnight

pub mod policy;
pub mod rollover;
pub mod windows;
pub mod worker;

pub use policy::{FeeSharePolicy, PolicyParseError};
pub use rollover::RolloverScheduler;
pub use worker::EarningsWorker;

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct EarningsConfig {
    pub fee_share: FeeSharePolicy,
    /// Upper bound between rollover sweeps
    pub rollover_check_interval: Duration,
}
