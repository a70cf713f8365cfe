//! EarningsRolledOver event applier

use crate::orders::traits::PartnerEventApplier;
use shared::partner::{PartnerEvent, PartnerEventPayload, PartnerSnapshot};

/// EarningsRolledOver applier
pub struct EarningsRolledOverApplier;

impl PartnerEventApplier for EarningsRolledOverApplier {
    fn apply(&self, snapshot: &mut PartnerSnapshot, event: &PartnerEvent) {
        if let PartnerEventPayload::EarningsRolledOver { windows } = &event.payload {
            snapshot.earnings = windows.clone();

            snapshot.last_sequence = event.sequence;
            snapshot.updated_at = event.timestamp;
            snapshot.update_checksum();
        }
    }
}
