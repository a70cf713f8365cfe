//! ReassignOrder command handler
//!
//! Releases the current partner (if any) and restarts matching. Only valid
//! while the order is `confirmed` or `preparing`; once it is out for delivery
//! an admin must resolve it by hand.

use async_trait::async_trait;

use super::{order_event, partner_event, require_role};
use crate::orders::traits::{
    CommandContext, CommandHandler, CommandMetadata, LedgerEvent, OrderError,
};
use shared::order::{ActorRole, OrderEventPayload};
use shared::partner::{PartnerEventPayload, ReleaseReason};

/// ReassignOrder action
#[derive(Debug, Clone)]
pub struct ReassignOrderAction {
    pub order_id: String,
    pub reason: Option<String>,
}

#[async_trait]
impl CommandHandler for ReassignOrderAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<LedgerEvent>, OrderError> {
        require_role(metadata, &[ActorRole::Admin])?;

        let order = ctx.load_order(&self.order_id)?;
        if !order.status.is_assignable() {
            return Err(OrderError::InvalidReassignment(format!(
                "order {} is {}; reassignment is only possible while confirmed or preparing",
                self.order_id, order.status
            )));
        }

        let released = order.delivery_partner_id.clone();
        let mut release_partner = false;
        if let Some(partner_id) = &released {
            let partner = ctx.load_partner(partner_id)?;
            release_partner = partner.active_order_id.as_deref() == Some(self.order_id.as_str());
        } else if order.assignment.flag.is_none() && order.assignment.current_offer.is_some() {
            return Err(OrderError::InvalidReassignment(format!(
                "order {} is still being matched",
                self.order_id
            )));
        }

        let mut events = vec![order_event(
            ctx,
            metadata,
            &self.order_id,
            OrderEventPayload::AssignmentReset {
                released_partner_id: released.clone(),
                reason: self.reason.clone(),
            },
        )];

        if let (true, Some(partner_id)) = (release_partner, &released) {
            events.push(partner_event(
                ctx,
                metadata,
                partner_id,
                PartnerEventPayload::OrderReleased {
                    order_id: self.order_id.clone(),
                    reason: ReleaseReason::Reassigned,
                },
            ));
        }

        Ok(events)
    }
}
