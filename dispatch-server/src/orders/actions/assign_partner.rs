//! AssignPartner command handler
//!
//! Reserve-then-confirm: the order must still want a partner and the partner
//! must be online with no active order, both checked inside the write
//! transaction. Emits the order assignment and the partner reservation
//! together, so a partner is never busy without an order or double-booked.

use async_trait::async_trait;

use super::{order_event, partner_event, require_role};
use crate::orders::traits::{
    CommandContext, CommandHandler, CommandMetadata, LedgerEvent, OrderError,
};
use shared::order::{ActorRole, OrderEventPayload};
use shared::partner::PartnerEventPayload;

/// AssignPartner action
#[derive(Debug, Clone)]
pub struct AssignPartnerAction {
    pub order_id: String,
    pub partner_id: String,
    /// Admin assignment; otherwise the partner is accepting an open offer
    pub manual: bool,
}

#[async_trait]
impl CommandHandler for AssignPartnerAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<LedgerEvent>, OrderError> {
        // 1. Who may assign
        if self.manual {
            require_role(metadata, &[ActorRole::Admin])?;
        } else {
            require_role(metadata, &[ActorRole::Partner, ActorRole::System])?;
            if metadata.is(ActorRole::Partner) && metadata.actor_id != self.partner_id {
                return Err(OrderError::PermissionDenied(
                    "partners may only accept their own offers".to_string(),
                ));
            }
        }

        // 2. Order side
        let order = ctx.load_order(&self.order_id)?;
        if order.delivery_partner_id.as_deref() == Some(self.partner_id.as_str()) {
            // Already ours; a retried accept
            return Ok(vec![]);
        }
        if !order.status.is_assignable() {
            return Err(OrderError::InvalidOperation(format!(
                "order {} in {} status cannot take a partner",
                self.order_id, order.status
            )));
        }
        if let Some(current) = &order.delivery_partner_id {
            return Err(OrderError::InvalidOperation(format!(
                "order {} is already assigned to {}",
                self.order_id, current
            )));
        }
        if !self.manual {
            let offered = order
                .assignment
                .current_offer
                .as_ref()
                .is_some_and(|o| o.partner_id == self.partner_id);
            if !offered {
                return Err(OrderError::OfferExpired(format!(
                    "no open offer of order {} for partner {}",
                    self.order_id, self.partner_id
                )));
            }
        }

        // 3. Partner side
        let partner = ctx.load_partner(&self.partner_id)?;
        if !partner.is_available() {
            return Err(OrderError::PartnerUnavailable(format!(
                "partner {} is {}{}",
                self.partner_id,
                partner.status,
                partner
                    .active_order_id
                    .as_deref()
                    .map(|id| format!(" with order {}", id))
                    .unwrap_or_default()
            )));
        }

        let assigned = order_event(
            ctx,
            metadata,
            &self.order_id,
            OrderEventPayload::PartnerAssigned {
                partner_id: self.partner_id.clone(),
                manual: self.manual,
            },
        );
        let reserved = partner_event(
            ctx,
            metadata,
            &self.partner_id,
            PartnerEventPayload::OrderReserved {
                order_id: self.order_id.clone(),
            },
        );

        Ok(vec![assigned, reserved])
    }
}
