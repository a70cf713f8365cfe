//! PartnerAssigned event applier

use crate::orders::traits::EventApplier;
use shared::order::{OrderEvent, OrderEventPayload, OrderSnapshot};

/// PartnerAssigned applier
pub struct PartnerAssignedApplier;

impl EventApplier for PartnerAssignedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let OrderEventPayload::PartnerAssigned { partner_id, .. } = &event.payload {
            snapshot.delivery_partner_id = Some(partner_id.clone());
            snapshot.assignment.current_offer = None;
            // Manual assignment resolves a flagged order
            snapshot.assignment.flag = None;

            snapshot.last_sequence = event.sequence;
            snapshot.updated_at = event.timestamp;
            snapshot.update_checksum();
        }
    }
}
