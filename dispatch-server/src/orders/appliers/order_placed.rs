//! OrderPlaced event applier
//!
//! Initializes the order projection from the checkout payload.

use crate::orders::traits::EventApplier;
use shared::order::{OrderEvent, OrderEventPayload, OrderSnapshot, OrderStatus};

/// OrderPlaced applier
pub struct OrderPlacedApplier;

impl EventApplier for OrderPlacedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let OrderEventPayload::OrderPlaced {
            user_id,
            shop_id,
            pickup,
            items,
            delivery_address,
            money,
            payment,
        } = &event.payload
        {
            snapshot.order_id = event.order_id.clone();
            snapshot.user_id = user_id.clone();
            snapshot.shop_id = shop_id.clone();
            snapshot.pickup = *pickup;
            snapshot.items = items.clone();
            snapshot.delivery_address = delivery_address.clone();
            snapshot.money = money.clone();
            snapshot.payment = payment.clone();
            snapshot.status = OrderStatus::Pending;
            snapshot.created_at = event.timestamp;

            snapshot.last_sequence = event.sequence;
            snapshot.updated_at = event.timestamp;
            snapshot.update_checksum();
        }
    }
}
