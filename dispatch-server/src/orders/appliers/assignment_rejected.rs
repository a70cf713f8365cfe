//! AssignmentRejected event applier
//!
//! Closes the open offer after a decline or an expired window.

use crate::orders::traits::EventApplier;
use shared::order::{OrderEvent, OrderEventPayload, OrderSnapshot};

/// AssignmentRejected applier
pub struct AssignmentRejectedApplier;

impl EventApplier for AssignmentRejectedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let OrderEventPayload::AssignmentRejected {
            partner_id, round, ..
        } = &event.payload
        {
            let is_current = snapshot
                .assignment
                .current_offer
                .as_ref()
                .is_some_and(|o| &o.partner_id == partner_id && o.round == *round);
            if is_current {
                snapshot.assignment.current_offer = None;
            }

            snapshot.last_sequence = event.sequence;
            snapshot.updated_at = event.timestamp;
            snapshot.update_checksum();
        }
    }
}
