//! Order and partner ledger
//!
//! Event-sourced core of the dispatch engine:
//!
//! - **manager**: `OrdersManager`, the single entry point for every mutation
//! - **storage**: redb persistence for events, projections and indexes
//! - **actions**: command validation, one handler per command
//! - **appliers**: pure event folds into projections
//! - **lifecycle**: the order status transition table per actor role
//! - **reducer**: projection rebuild from an event stream
//!
//! # Data Flow
//!
//! ```text
//! LedgerCommand → OrdersManager → Action → Events
//!                                            ↓
//!               redb write txn: events + projections + indexes
//!                                            ↓
//!                                broadcast of order events
//! ```

// `traits` first: `#[enum_dispatch]` must see the trait definitions before
// the dispatch enums in `appliers` and `actions` are expanded
pub mod traits;

pub mod actions;
pub mod appliers;
pub mod lifecycle;
pub mod manager;
pub mod money;
pub mod reducer;
pub mod storage;

pub use manager::{ManagerError, ManagerResult, OrdersManager};
pub use storage::{LedgerStorage, StorageError, StorageStats};
pub use traits::{LedgerEvent, OrderError};

pub use shared::command::{
    CommandError, CommandErrorCode, CommandPayload, CommandResponse, LedgerCommand,
};
pub use shared::order::{OrderEvent, OrderEventPayload, OrderEventType, OrderSnapshot, OrderStatus};
