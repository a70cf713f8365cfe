//! PaymentUpdated event applier

use crate::orders::traits::EventApplier;
use shared::order::{OrderEvent, OrderEventPayload, OrderSnapshot};

/// PaymentUpdated applier
pub struct PaymentUpdatedApplier;

impl EventApplier for PaymentUpdatedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let OrderEventPayload::PaymentUpdated {
            razorpay_order_id,
            razorpay_payment_id,
            status,
        } = &event.payload
        {
            snapshot.payment.razorpay_order_id = Some(razorpay_order_id.clone());
            if razorpay_payment_id.is_some() {
                snapshot.payment.razorpay_payment_id = razorpay_payment_id.clone();
            }
            snapshot.payment.status = *status;
            snapshot.payment.updated_at = event.timestamp;

            snapshot.last_sequence = event.sequence;
            snapshot.updated_at = event.timestamp;
            snapshot.update_checksum();
        }
    }
}
