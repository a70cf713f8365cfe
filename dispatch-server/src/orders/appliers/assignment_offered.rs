//! AssignmentOffered event applier

use crate::orders::traits::EventApplier;
use shared::order::{OpenOffer, OrderEvent, OrderEventPayload, OrderSnapshot};

/// AssignmentOffered applier
pub struct AssignmentOfferedApplier;

impl EventApplier for AssignmentOfferedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let OrderEventPayload::AssignmentOffered {
            partner_id,
            round,
            distance_km,
            expires_at,
        } = &event.payload
        {
            let assignment = &mut snapshot.assignment;
            assignment.offers_made = assignment.offers_made.max(*round);
            if !assignment.tried_partners.contains(partner_id) {
                assignment.tried_partners.push(partner_id.clone());
            }
            assignment.current_offer = Some(OpenOffer {
                partner_id: partner_id.clone(),
                round: *round,
                distance_km: *distance_km,
                expires_at: *expires_at,
            });

            snapshot.last_sequence = event.sequence;
            snapshot.updated_at = event.timestamp;
            snapshot.update_checksum();
        }
    }
}
