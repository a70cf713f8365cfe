//! DeliveryRated event applier

use crate::orders::traits::EventApplier;
use shared::order::{OrderEvent, OrderEventPayload, OrderSnapshot};

/// DeliveryRated applier
pub struct DeliveryRatedApplier;

impl EventApplier for DeliveryRatedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let OrderEventPayload::DeliveryRated { rating, .. } = &event.payload {
            snapshot.rating = Some(*rating);

            snapshot.last_sequence = event.sequence;
            snapshot.updated_at = event.timestamp;
            snapshot.update_checksum();
        }
    }
}
