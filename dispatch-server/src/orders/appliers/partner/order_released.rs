//! OrderReleased event applier
//!
//! A released partner goes back online; they were online when they took
//! the order.

use crate::orders::traits::PartnerEventApplier;
use shared::partner::{PartnerEvent, PartnerEventPayload, PartnerSnapshot, PartnerStatus};

/// OrderReleased applier
pub struct OrderReleasedApplier;

impl PartnerEventApplier for OrderReleasedApplier {
    fn apply(&self, snapshot: &mut PartnerSnapshot, event: &PartnerEvent) {
        if let PartnerEventPayload::OrderReleased { order_id, .. } = &event.payload {
            if snapshot.active_order_id.as_deref() == Some(order_id.as_str()) {
                snapshot.active_order_id = None;
                snapshot.status = PartnerStatus::Online;
            }

            snapshot.last_sequence = event.sequence;
            snapshot.updated_at = event.timestamp;
            snapshot.update_checksum();
        }
    }
}
