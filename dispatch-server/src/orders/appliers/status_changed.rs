//! StatusChanged event applier

use crate::orders::traits::EventApplier;
use shared::order::{OrderEvent, OrderEventPayload, OrderSnapshot, OrderStatus};

/// StatusChanged applier
pub struct StatusChangedApplier;

impl EventApplier for StatusChangedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let OrderEventPayload::StatusChanged { to, reason, .. } = &event.payload {
            snapshot.status = *to;

            match to {
                OrderStatus::Delivered => {
                    snapshot.delivered_at = Some(event.timestamp);
                }
                OrderStatus::Cancelled => {
                    snapshot.cancel_reason = reason.clone();
                    // Terminal orders drop any open offer or flag; the partner
                    // release travels as a partner event in the same commit
                    snapshot.assignment.current_offer = None;
                    snapshot.assignment.flag = None;
                }
                _ => {}
            }

            snapshot.last_sequence = event.sequence;
            snapshot.updated_at = event.timestamp;
            snapshot.update_checksum();
        }
    }
}
