//! AvailabilityChanged event applier

use crate::orders::traits::PartnerEventApplier;
use shared::partner::{PartnerEvent, PartnerEventPayload, PartnerSnapshot};

/// AvailabilityChanged applier
pub struct AvailabilityChangedApplier;

impl PartnerEventApplier for AvailabilityChangedApplier {
    fn apply(&self, snapshot: &mut PartnerSnapshot, event: &PartnerEvent) {
        if let PartnerEventPayload::AvailabilityChanged { to, .. } = &event.payload {
            snapshot.status = *to;

            snapshot.last_sequence = event.sequence;
            snapshot.updated_at = event.timestamp;
            snapshot.update_checksum();
        }
    }
}
