//! Projection rebuild from event streams
//!
//! Replays fold events through the same appliers the manager uses, so a
//! replayed projection is byte-for-byte the stored one unless something
//! drifted.

use super::appliers::{apply_order_event, apply_partner_event};
use shared::order::{OrderEvent, OrderSnapshot};
use shared::partner::{PartnerEvent, PartnerSnapshot};

/// Rebuild an order projection; `None` for an empty stream
pub fn replay_order(events: &[OrderEvent]) -> Option<OrderSnapshot> {
    let first = events.first()?;
    let mut snapshot = OrderSnapshot::new(first.order_id.clone());
    for event in events {
        if event.sequence <= snapshot.last_sequence {
            tracing::warn!(
                order_id = %event.order_id,
                sequence = event.sequence,
                last_sequence = snapshot.last_sequence,
                "Out-of-order event skipped during replay"
            );
            continue;
        }
        apply_order_event(&mut snapshot, event);
    }
    Some(snapshot)
}

/// Rebuild a partner projection; `None` for an empty stream
pub fn replay_partner(events: &[PartnerEvent]) -> Option<PartnerSnapshot> {
    let first = events.first()?;
    let mut snapshot = PartnerSnapshot::new(first.partner_id.clone());
    for event in events {
        if event.sequence <= snapshot.last_sequence {
            tracing::warn!(
                partner_id = %event.partner_id,
                sequence = event.sequence,
                last_sequence = snapshot.last_sequence,
                "Out-of-order event skipped during replay"
            );
            continue;
        }
        apply_partner_event(&mut snapshot, event);
    }
    Some(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::appliers::test_support::{order_event, partner_event};
    use rust_decimal::Decimal;
    use shared::order::{
        DeliveryAddress, GeoPoint, LineItem, MoneyBreakdown, OrderEventPayload, OrderStatus,
        PaymentInfo, PaymentMethod, PaymentStatus,
    };
    use shared::partner::{PartnerEventPayload, PartnerStatus, Vehicle, VehicleType};

    fn placed() -> OrderEventPayload {
        let items = vec![LineItem {
            product_id: "prod-1".to_string(),
            name: "Idli".to_string(),
            quantity: 4,
            unit_price: Decimal::from(40),
        }];
        OrderEventPayload::OrderPlaced {
            user_id: "cust-1".to_string(),
            shop_id: "shop-1".to_string(),
            pickup: GeoPoint::new(12.97, 77.59),
            money: MoneyBreakdown::from_items(&items, Decimal::from(30), Decimal::from(8)),
            items,
            delivery_address: DeliveryAddress {
                line1: "4 Church Street".to_string(),
                line2: None,
                city: "Bengaluru".to_string(),
                postal_code: "560001".to_string(),
                contact_phone: None,
                location: None,
            },
            payment: PaymentInfo {
                method: PaymentMethod::CashOnDelivery,
                razorpay_order_id: None,
                razorpay_payment_id: None,
                status: PaymentStatus::Pending,
                attempts: 0,
                updated_at: 0,
            },
        }
    }

    #[test]
    fn test_empty_stream() {
        assert!(replay_order(&[]).is_none());
        assert!(replay_partner(&[]).is_none());
    }

    #[test]
    fn test_replay_order_stream() {
        let events = vec![
            order_event("o-1", 1, placed()),
            order_event(
                "o-1",
                2,
                OrderEventPayload::StatusChanged {
                    from: OrderStatus::Pending,
                    to: OrderStatus::Confirmed,
                    reason: None,
                },
            ),
            order_event(
                "o-1",
                5,
                OrderEventPayload::StatusChanged {
                    from: OrderStatus::Confirmed,
                    to: OrderStatus::Cancelled,
                    reason: Some("shop closed".to_string()),
                },
            ),
        ];

        let snapshot = replay_order(&events).unwrap();
        assert_eq!(snapshot.status, OrderStatus::Cancelled);
        assert_eq!(snapshot.cancel_reason.as_deref(), Some("shop closed"));
        assert_eq!(snapshot.money.grand_total, Decimal::from(198));
        assert_eq!(snapshot.last_sequence, 5);
        assert!(snapshot.verify_checksum());
    }

    #[test]
    fn test_stale_event_skipped() {
        let events = vec![
            order_event("o-1", 1, placed()),
            order_event(
                "o-1",
                3,
                OrderEventPayload::StatusChanged {
                    from: OrderStatus::Pending,
                    to: OrderStatus::Confirmed,
                    reason: None,
                },
            ),
            order_event(
                "o-1",
                2,
                OrderEventPayload::StatusChanged {
                    from: OrderStatus::Pending,
                    to: OrderStatus::Cancelled,
                    reason: None,
                },
            ),
        ];

        let snapshot = replay_order(&events).unwrap();
        assert_eq!(snapshot.status, OrderStatus::Confirmed);
        assert_eq!(snapshot.last_sequence, 3);
    }

    #[test]
    fn test_replay_partner_stream() {
        let events = vec![
            partner_event(
                "p-1",
                1,
                PartnerEventPayload::PartnerRegistered {
                    name: "Ravi".to_string(),
                    phone: "+91-9000000001".to_string(),
                    vehicle: Vehicle {
                        kind: VehicleType::Scooter,
                        number: "KA01AB1234".to_string(),
                    },
                    timezone: "Asia/Kolkata".to_string(),
                },
            ),
            partner_event(
                "p-1",
                2,
                PartnerEventPayload::AvailabilityChanged {
                    from: PartnerStatus::Offline,
                    to: PartnerStatus::Online,
                },
            ),
            partner_event(
                "p-1",
                4,
                PartnerEventPayload::OrderReserved {
                    order_id: "o-1".to_string(),
                },
            ),
        ];

        let snapshot = replay_partner(&events).unwrap();
        assert_eq!(snapshot.status, PartnerStatus::Busy);
        assert_eq!(snapshot.active_order_id.as_deref(), Some("o-1"));
        assert_eq!(snapshot.last_sequence, 4);
    }
}
