//! AssignmentUnresolved event applier
//!
//! Flags the order `UnassignedTimeout` for manual intervention. The order
//! keeps its status; it is never auto-cancelled.

use crate::orders::traits::EventApplier;
use shared::order::{AssignmentFlag, OrderEvent, OrderEventPayload, OrderSnapshot};

/// AssignmentUnresolved applier
pub struct AssignmentUnresolvedApplier;

impl EventApplier for AssignmentUnresolvedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let OrderEventPayload::AssignmentUnresolved { .. } = &event.payload {
            snapshot.assignment.flag = Some(AssignmentFlag::UnassignedTimeout);
            snapshot.assignment.current_offer = None;

            snapshot.last_sequence = event.sequence;
            snapshot.updated_at = event.timestamp;
            snapshot.update_checksum();
        }
    }
}
