//! Order event sourcing types
//!
//! - Events: immutable facts recorded after command processing
//! - Snapshots: order state projected from the event stream

pub mod event;
pub mod snapshot;
pub mod types;

// Re-exports
pub use event::{OrderEvent, OrderEventPayload, OrderEventType};
pub use snapshot::{OrderSnapshot, OrderStatus};
pub use types::*;
