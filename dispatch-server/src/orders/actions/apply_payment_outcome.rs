//! ApplyPaymentOutcome command handler
//!
//! Folds a gateway outcome into `PaymentInfo`. Payment status moves one way
//! (`pending → success | failed`); replays and stale references leave the
//! order untouched. A captured payment on a pending order confirms it.

use async_trait::async_trait;

use super::{order_event, require_role};
use crate::orders::traits::{
    CommandContext, CommandHandler, CommandMetadata, LedgerEvent, OrderError,
};
use shared::order::{ActorRole, OrderEventPayload, OrderStatus, PaymentStatus};

/// ApplyPaymentOutcome action
#[derive(Debug, Clone)]
pub struct ApplyPaymentOutcomeAction {
    pub order_id: String,
    pub razorpay_order_id: String,
    pub razorpay_payment_id: Option<String>,
    pub status: PaymentStatus,
}

#[async_trait]
impl CommandHandler for ApplyPaymentOutcomeAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<LedgerEvent>, OrderError> {
        require_role(metadata, &[ActorRole::System, ActorRole::Admin])?;

        if self.status == PaymentStatus::Pending {
            return Err(OrderError::Validation(
                "a payment outcome must be success or failed".to_string(),
            ));
        }

        let snapshot = ctx.load_order(&self.order_id)?;
        let payment = &snapshot.payment;

        // 1. Outcome for an earlier attempt
        if payment.razorpay_order_id.as_deref() != Some(self.razorpay_order_id.as_str()) {
            tracing::warn!(
                order_id = %self.order_id,
                razorpay_order_id = %self.razorpay_order_id,
                current = ?payment.razorpay_order_id,
                "Ignoring outcome for a superseded payment attempt"
            );
            return Ok(vec![]);
        }

        // 2. Replayed callback
        if payment.status == self.status {
            tracing::debug!(
                order_id = %self.order_id,
                status = ?self.status,
                "Payment outcome already applied"
            );
            return Ok(vec![]);
        }

        // 3. Conflicting outcome after a terminal one
        if payment.status.is_terminal() {
            tracing::warn!(
                order_id = %self.order_id,
                current = ?payment.status,
                received = ?self.status,
                "Ignoring conflicting payment outcome"
            );
            return Ok(vec![]);
        }

        let mut events = vec![order_event(
            ctx,
            metadata,
            &self.order_id,
            OrderEventPayload::PaymentUpdated {
                razorpay_order_id: self.razorpay_order_id.clone(),
                razorpay_payment_id: self.razorpay_payment_id.clone(),
                status: self.status,
            },
        )];

        // 4. Captured payment releases the hold on a pending order
        if self.status == PaymentStatus::Success {
            match snapshot.status {
                OrderStatus::Pending => events.push(order_event(
                    ctx,
                    metadata,
                    &self.order_id,
                    OrderEventPayload::StatusChanged {
                        from: OrderStatus::Pending,
                        to: OrderStatus::Confirmed,
                        reason: Some("payment captured".to_string()),
                    },
                )),
                OrderStatus::Cancelled => tracing::warn!(
                    order_id = %self.order_id,
                    "Payment captured for a cancelled order"
                ),
                _ => {}
            }
        }

        Ok(events)
    }
}
