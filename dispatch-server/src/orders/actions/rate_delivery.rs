//! RateDelivery command handler
//!
//! One rating per delivered order, folded into the partner's running average.

use async_trait::async_trait;

use super::{order_event, partner_event, require_role};
use crate::orders::traits::{
    CommandContext, CommandHandler, CommandMetadata, LedgerEvent, OrderError,
};
use shared::order::{ActorRole, OrderEventPayload, OrderStatus};
use shared::partner::PartnerEventPayload;

/// RateDelivery action
#[derive(Debug, Clone)]
pub struct RateDeliveryAction {
    pub order_id: String,
    pub rating: u8,
}

#[async_trait]
impl CommandHandler for RateDeliveryAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<LedgerEvent>, OrderError> {
        require_role(metadata, &[ActorRole::Customer, ActorRole::Admin])?;

        if !(1..=5).contains(&self.rating) {
            return Err(OrderError::Validation(format!(
                "rating must be between 1 and 5, got {}",
                self.rating
            )));
        }

        let order = ctx.load_order(&self.order_id)?;
        if metadata.is(ActorRole::Customer) && order.user_id != metadata.actor_id {
            return Err(OrderError::PermissionDenied(format!(
                "order {} belongs to another customer",
                self.order_id
            )));
        }
        if order.status != OrderStatus::Delivered {
            return Err(OrderError::InvalidOperation(format!(
                "only delivered orders can be rated; order {} is {}",
                self.order_id, order.status
            )));
        }
        if order.rating.is_some() {
            return Err(OrderError::InvalidOperation(format!(
                "order {} is already rated",
                self.order_id
            )));
        }
        let partner_id = order.delivery_partner_id.clone().ok_or_else(|| {
            OrderError::InvalidOperation(format!("order {} has no delivery partner", self.order_id))
        })?;
        ctx.load_partner(&partner_id)?;

        let rated = order_event(
            ctx,
            metadata,
            &self.order_id,
            OrderEventPayload::DeliveryRated {
                partner_id: partner_id.clone(),
                rating: self.rating,
            },
        );
        let recorded = partner_event(
            ctx,
            metadata,
            &partner_id,
            PartnerEventPayload::RatingRecorded {
                order_id: self.order_id.clone(),
                rating: self.rating,
            },
        );
        Ok(vec![rated, recorded])
    }
}
