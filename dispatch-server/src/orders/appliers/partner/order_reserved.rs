//! OrderReserved event applier
//!
//! The only way a partner becomes `busy`.

use crate::orders::traits::PartnerEventApplier;
use shared::partner::{PartnerEvent, PartnerEventPayload, PartnerSnapshot, PartnerStatus};

/// OrderReserved applier
pub struct OrderReservedApplier;

impl PartnerEventApplier for OrderReservedApplier {
    fn apply(&self, snapshot: &mut PartnerSnapshot, event: &PartnerEvent) {
        if let PartnerEventPayload::OrderReserved { order_id } = &event.payload {
            snapshot.status = PartnerStatus::Busy;
            snapshot.active_order_id = Some(order_id.clone());

            snapshot.last_sequence = event.sequence;
            snapshot.updated_at = event.timestamp;
            snapshot.update_checksum();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::appliers::test_support::partner_event;

    #[test]
    fn test_reservation_makes_partner_busy() {
        let mut snapshot = PartnerSnapshot::new("p-1".to_string());
        snapshot.status = PartnerStatus::Online;
        let event = partner_event(
            "p-1",
            11,
            PartnerEventPayload::OrderReserved {
                order_id: "o-1".to_string(),
            },
        );
        OrderReservedApplier.apply(&mut snapshot, &event);

        assert_eq!(snapshot.status, PartnerStatus::Busy);
        assert_eq!(snapshot.active_order_id.as_deref(), Some("o-1"));
        assert!(!snapshot.is_available());
    }
}
