//! PaymentRetried event applier
//!
//! A retry opens a fresh attempt under a new gateway reference.

use crate::orders::traits::EventApplier;
use shared::order::{OrderEvent, OrderEventPayload, OrderSnapshot, PaymentStatus};

/// PaymentRetried applier
pub struct PaymentRetriedApplier;

impl EventApplier for PaymentRetriedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let OrderEventPayload::PaymentRetried { razorpay_order_id } = &event.payload {
            snapshot.payment.razorpay_order_id = Some(razorpay_order_id.clone());
            snapshot.payment.razorpay_payment_id = None;
            snapshot.payment.status = PaymentStatus::Pending;
            snapshot.payment.attempts += 1;
            snapshot.payment.updated_at = event.timestamp;

            snapshot.last_sequence = event.sequence;
            snapshot.updated_at = event.timestamp;
            snapshot.update_checksum();
        }
    }
}
