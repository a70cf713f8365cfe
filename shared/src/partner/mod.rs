//! Delivery partner types
//!
//! Partners are a second aggregate in the ledger with their own event stream
//! and projection.

pub mod event;
pub mod snapshot;
pub mod types;

pub use event::{PartnerEvent, PartnerEventPayload, PartnerEventType, ReleaseReason};
pub use snapshot::{PartnerSnapshot, PartnerStatus};
pub use types::*;
