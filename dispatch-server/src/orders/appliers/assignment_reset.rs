//! AssignmentReset event applier
//!
//! Matching starts over from round zero. The released partner, if any, stays
//! in `tried_partners` so the next search skips them.

use crate::orders::traits::EventApplier;
use shared::order::{AssignmentState, OrderEvent, OrderEventPayload, OrderSnapshot};

/// AssignmentReset applier
pub struct AssignmentResetApplier;

impl EventApplier for AssignmentResetApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let OrderEventPayload::AssignmentReset {
            released_partner_id,
            ..
        } = &event.payload
        {
            snapshot.delivery_partner_id = None;
            snapshot.assignment = AssignmentState {
                tried_partners: released_partner_id.iter().cloned().collect(),
                ..AssignmentState::default()
            };

            snapshot.last_sequence = event.sequence;
            snapshot.updated_at = event.timestamp;
            snapshot.update_checksum();
        }
    }
}
