//! RetryPayment command handler
//!
//! Opens a new payment attempt with a fresh gateway reference after a
//! failure. The failed reference stays mapped to the order so late callbacks
//! for it are recognized and ignored.

use async_trait::async_trait;

use super::{order_event, require_role};
use crate::orders::traits::{
    CommandContext, CommandHandler, CommandMetadata, LedgerEvent, OrderError,
};
use shared::order::{ActorRole, OrderEventPayload, OrderStatus, PaymentMethod, PaymentStatus};

/// RetryPayment action
#[derive(Debug, Clone)]
pub struct RetryPaymentAction {
    pub order_id: String,
    pub razorpay_order_id: String,
}

#[async_trait]
impl CommandHandler for RetryPaymentAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<LedgerEvent>, OrderError> {
        require_role(metadata, &[ActorRole::Customer, ActorRole::Admin])?;

        let snapshot = ctx.load_order(&self.order_id)?;
        if metadata.is(ActorRole::Customer) && snapshot.user_id != metadata.actor_id {
            return Err(OrderError::PermissionDenied(format!(
                "order {} belongs to another customer",
                self.order_id
            )));
        }

        if snapshot.status != OrderStatus::Pending {
            return Err(OrderError::InvalidOperation(format!(
                "cannot retry payment for order in {} status",
                snapshot.status
            )));
        }
        if snapshot.payment.method != PaymentMethod::Online {
            return Err(OrderError::InvalidOperation(
                "cash-on-delivery orders have no payment to retry".to_string(),
            ));
        }
        if snapshot.payment.status != PaymentStatus::Failed {
            return Err(OrderError::InvalidOperation(format!(
                "payment is {:?}; only a failed payment can be retried",
                snapshot.payment.status
            )));
        }
        if self.razorpay_order_id.trim().is_empty() {
            return Err(OrderError::Validation("razorpay_order_id is required".to_string()));
        }
        if ctx.payment_ref_exists(&self.razorpay_order_id)? {
            return Err(OrderError::Validation(format!(
                "payment reference {} is already in use",
                self.razorpay_order_id
            )));
        }

        let event = order_event(
            ctx,
            metadata,
            &self.order_id,
            OrderEventPayload::PaymentRetried {
                razorpay_order_id: self.razorpay_order_id.clone(),
            },
        );
        Ok(vec![event])
    }
}
