//! RecordOffer command handler
//!
//! Records that the assignment engine offered an order to a partner.

use async_trait::async_trait;

use super::{order_event, require_role};
use crate::orders::traits::{
    CommandContext, CommandHandler, CommandMetadata, LedgerEvent, OrderError,
};
use shared::order::{ActorRole, OrderEventPayload};

/// RecordOffer action
#[derive(Debug, Clone)]
pub struct RecordOfferAction {
    pub order_id: String,
    pub partner_id: String,
    pub round: u32,
    pub distance_km: f64,
    pub expires_at: i64,
}

#[async_trait]
impl CommandHandler for RecordOfferAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<LedgerEvent>, OrderError> {
        require_role(metadata, &[ActorRole::System])?;

        let snapshot = ctx.load_order(&self.order_id)?;
        if !snapshot.needs_partner() {
            return Err(OrderError::InvalidOperation(format!(
                "order {} is not awaiting a partner",
                self.order_id
            )));
        }
        if let Some(open) = &snapshot.assignment.current_offer {
            return Err(OrderError::InvalidOperation(format!(
                "order {} already has an open offer to {}",
                self.order_id, open.partner_id
            )));
        }
        ctx.load_partner(&self.partner_id)?;

        let event = order_event(
            ctx,
            metadata,
            &self.order_id,
            OrderEventPayload::AssignmentOffered {
                partner_id: self.partner_id.clone(),
                round: self.round,
                distance_km: self.distance_km,
                expires_at: self.expires_at,
            },
        );
        Ok(vec![event])
    }
}
