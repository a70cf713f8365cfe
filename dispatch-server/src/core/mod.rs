//! Server core
//!
//! - [`Config`] - environment configuration
//! - [`ServerState`] - state shared by request handlers
//! - [`Server`] - HTTP server
//! - [`EventRouter`] - fans committed events out to the workers
//! - [`BackgroundTasks`] - worker registry and shutdown
//! - [`ServerError`] - startup errors

pub mod config;
pub mod error;
pub mod event_router;
pub mod server;
pub mod state;
pub mod tasks;

pub use config::{Config, ConfigError};
pub use error::{Result, ServerError};
pub use event_router::{EventChannels, EventRouter};
pub use server::Server;
pub use state::ServerState;
pub use tasks::{BackgroundTasks, TaskKind};
