//! PlaceOrder command handler
//!
//! Creates an order in `pending` from a checkout. The money breakdown is
//! computed here so `grand_total` is always the sum of its parts.

use async_trait::async_trait;

use super::{order_event, require_role};
use crate::orders::money::validate_order_input;
use crate::orders::traits::{
    CommandContext, CommandHandler, CommandMetadata, LedgerEvent, OrderError,
};
use shared::command::PlaceOrderInput;
use shared::order::{
    ActorRole, MoneyBreakdown, OrderEventPayload, PaymentInfo, PaymentMethod, PaymentStatus,
};

/// PlaceOrder action
#[derive(Debug, Clone)]
pub struct PlaceOrderAction {
    pub order_id: String,
    pub input: PlaceOrderInput,
}

#[async_trait]
impl CommandHandler for PlaceOrderAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<LedgerEvent>, OrderError> {
        require_role(metadata, &[ActorRole::Customer, ActorRole::Admin])?;

        // 1. Order ids are caller-chosen; never overwrite
        if ctx.find_order(&self.order_id)?.is_some() {
            return Err(OrderError::InvalidOperation(format!(
                "order {} already exists",
                self.order_id
            )));
        }

        // 2. Validate input
        if self.input.shop_id.trim().is_empty() {
            return Err(OrderError::Validation("shop_id is required".to_string()));
        }
        if !self.input.pickup.is_valid() {
            return Err(OrderError::Validation("pickup location is invalid".to_string()));
        }
        validate_order_input(&self.input)?;

        // 3. Payment reference rules
        let razorpay_order_id = match (self.input.payment.method, &self.input.payment.razorpay_order_id) {
            (PaymentMethod::Online, Some(reference)) if !reference.trim().is_empty() => {
                if ctx.payment_ref_exists(reference)? {
                    return Err(OrderError::Validation(format!(
                        "payment reference {} is already in use",
                        reference
                    )));
                }
                Some(reference.clone())
            }
            (PaymentMethod::Online, _) => {
                return Err(OrderError::Validation(
                    "online payment requires a razorpay_order_id".to_string(),
                ));
            }
            (PaymentMethod::CashOnDelivery, Some(_)) => {
                return Err(OrderError::Validation(
                    "cash-on-delivery orders carry no gateway reference".to_string(),
                ));
            }
            (PaymentMethod::CashOnDelivery, None) => None,
        };

        let money = MoneyBreakdown::from_items(
            &self.input.items,
            self.input.delivery_fee,
            self.input.taxes,
        );
        let payment = PaymentInfo {
            method: self.input.payment.method,
            attempts: u32::from(razorpay_order_id.is_some()),
            razorpay_order_id,
            razorpay_payment_id: None,
            status: PaymentStatus::Pending,
            updated_at: shared::util::now_millis(),
        };

        // 4. Create event
        let event = order_event(
            ctx,
            metadata,
            &self.order_id,
            OrderEventPayload::OrderPlaced {
                user_id: metadata.actor_id.clone(),
                shop_id: self.input.shop_id.clone(),
                pickup: self.input.pickup,
                items: self.input.items.clone(),
                delivery_address: self.input.delivery_address.clone(),
                money,
                payment,
            },
        );

        Ok(vec![event])
    }
}
