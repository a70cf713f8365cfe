//! PartnerRegistered event applier

use crate::orders::traits::PartnerEventApplier;
use shared::partner::{PartnerEvent, PartnerEventPayload, PartnerSnapshot, PartnerStatus};

/// PartnerRegistered applier
pub struct PartnerRegisteredApplier;

impl PartnerEventApplier for PartnerRegisteredApplier {
    fn apply(&self, snapshot: &mut PartnerSnapshot, event: &PartnerEvent) {
        if let PartnerEventPayload::PartnerRegistered {
            name,
            phone,
            vehicle,
            timezone,
        } = &event.payload
        {
            snapshot.partner_id = event.partner_id.clone();
            snapshot.name = name.clone();
            snapshot.phone = phone.clone();
            snapshot.vehicle = vehicle.clone();
            snapshot.timezone = timezone.clone();
            snapshot.status = PartnerStatus::Offline;
            snapshot.joined_at = event.timestamp;

            snapshot.last_sequence = event.sequence;
            snapshot.updated_at = event.timestamp;
            snapshot.update_checksum();
        }
    }
}
