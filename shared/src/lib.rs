//! Shared types for the dispatch platform
//!
//! Contracts used by the dispatch server and its clients: order and partner
//! projections, ledger events, commands, dashboard types and the unified
//! error system.

pub mod command;
pub mod dashboard;
pub mod error;
pub mod order;
pub mod partner;
pub mod util;

// Re-exports
pub use axum::{Json, body};
pub use http;
pub use serde::{Deserialize, Serialize};
