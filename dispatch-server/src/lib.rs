//! Dispatch Server - order lifecycle and delivery-partner assignment
//!
//! # Architecture
//!
//! - **Ledger** (`orders`): event-sourced orders and partners on redb
//! - **Assignment** (`assignment`): ranked, time-boxed offer rounds
//! - **Payments** (`payments`): gateway callback reconciliation
//! - **Earnings** (`earnings`): partner fee share and rolling windows
//! - **Dashboard** (`dashboard`): admin statistics
//! - **HTTP API** (`api`): axum routes behind JWT auth
//!
//! # Layout
//!
//! ```text
//! dispatch-server/src/
//! ├── core/          # config, state, server, event router, tasks
//! ├── auth/          # JWT service and extractor
//! ├── api/           # HTTP routes and handlers
//! ├── engine.rs      # DispatchEngine facade
//! ├── orders/        # ledger: manager, actions, appliers, storage
//! ├── assignment/    # matching engine, offers, locations
//! ├── payments/      # reconciler, callback signatures
//! ├── earnings/      # credit worker, windows, rollover
//! ├── dashboard/     # statistics
//! └── utils/         # logging, calendar helpers
//! ```

pub mod api;
pub mod assignment;
pub mod auth;
pub mod core;
pub mod dashboard;
pub mod earnings;
pub mod engine;
pub mod orders;
pub mod payments;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use engine::{DispatchEngine, EngineSettings, NewPartner};
pub use orders::OrdersManager;

pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCode};

pub use utils::logger::{init_logger, init_logger_with_file};

/// Load `.env` and initialise logging from the environment
pub fn setup_environment() {
    if let Err(e) = dotenv::dotenv() {
        eprintln!("No .env loaded: {}", e);
    }

    let log_level = std::env::var("LOG_LEVEL").ok();
    let json = std::env::var("LOG_JSON")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(false);
    let log_dir = std::env::var("LOG_DIR").ok();
    init_logger_with_file(log_level.as_deref(), json, log_dir.as_deref());
}
