//! FlagUnassigned command handler
//!
//! Marks an order the engine could not place within its offer rounds.

use async_trait::async_trait;

use super::{order_event, require_role};
use crate::orders::traits::{
    CommandContext, CommandHandler, CommandMetadata, LedgerEvent, OrderError,
};
use shared::order::{ActorRole, OrderEventPayload};

/// FlagUnassigned action
#[derive(Debug, Clone)]
pub struct FlagUnassignedAction {
    pub order_id: String,
    pub rounds: u32,
}

#[async_trait]
impl CommandHandler for FlagUnassignedAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<LedgerEvent>, OrderError> {
        require_role(metadata, &[ActorRole::System])?;

        let order = ctx.load_order(&self.order_id)?;
        // Assigned, cancelled or already flagged in the meantime
        if !order.needs_partner() {
            return Ok(vec![]);
        }

        let event = order_event(
            ctx,
            metadata,
            &self.order_id,
            OrderEventPayload::AssignmentUnresolved {
                rounds: self.rounds,
            },
        );
        Ok(vec![event])
    }
}
