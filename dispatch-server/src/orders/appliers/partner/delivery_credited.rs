//! DeliveryCredited event applier
//!
//! Cumulative totals only. The rolling windows are recomputed from the event
//! stream and land through `EarningsRolledOver`.

use crate::orders::traits::PartnerEventApplier;
use shared::partner::{PartnerEvent, PartnerEventPayload, PartnerSnapshot};

/// DeliveryCredited applier
pub struct DeliveryCreditedApplier;

impl PartnerEventApplier for DeliveryCreditedApplier {
    fn apply(&self, snapshot: &mut PartnerSnapshot, event: &PartnerEvent) {
        if let PartnerEventPayload::DeliveryCredited { amount, .. } = &event.payload {
            snapshot.total_deliveries += 1;
            snapshot.total_earnings += *amount;

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
    use rust_decimal::Decimal;

    #[test]
    fn test_credit_accumulates() {
        let mut snapshot = PartnerSnapshot::new("p-1".to_string());
        for (seq, amount) in [(1, Decimal::new(2400, 2)), (2, Decimal::new(1850, 2))] {
            let event = partner_event(
                "p-1",
                seq,
                PartnerEventPayload::DeliveryCredited {
                    order_id: format!("o-{}", seq),
                    amount,
                    delivered_at: 0,
                },
            );
            DeliveryCreditedApplier.apply(&mut snapshot, &event);
        }

        assert_eq!(snapshot.total_deliveries, 2);
        assert_eq!(snapshot.total_earnings, Decimal::new(4250, 2));
        assert_eq!(snapshot.last_sequence, 2);
    }
}
