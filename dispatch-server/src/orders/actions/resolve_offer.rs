//! ResolveOffer command handler
//!
//! Closes an open offer that was declined or timed out. A resolution for an
//! offer that is no longer open is a no-op.

use async_trait::async_trait;

use super::{order_event, require_role};
use crate::orders::traits::{
    CommandContext, CommandHandler, CommandMetadata, LedgerEvent, OrderError,
};
use shared::order::{ActorRole, OfferOutcome, OrderEventPayload};

/// ResolveOffer action
#[derive(Debug, Clone)]
pub struct ResolveOfferAction {
    pub order_id: String,
    pub partner_id: String,
    pub round: u32,
    pub outcome: OfferOutcome,
}

#[async_trait]
impl CommandHandler for ResolveOfferAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<LedgerEvent>, OrderError> {
        require_role(metadata, &[ActorRole::System])?;

        let snapshot = ctx.load_order(&self.order_id)?;
        let is_open = snapshot
            .assignment
            .current_offer
            .as_ref()
            .is_some_and(|o| o.partner_id == self.partner_id && o.round == self.round);
        if !is_open {
            tracing::debug!(
                order_id = %self.order_id,
                partner_id = %self.partner_id,
                round = self.round,
                "Offer already closed"
            );
            return Ok(vec![]);
        }

        let event = order_event(
            ctx,
            metadata,
            &self.order_id,
            OrderEventPayload::AssignmentRejected {
                partner_id: self.partner_id.clone(),
                round: self.round,
                outcome: self.outcome,
            },
        );
        Ok(vec![event])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::actions::test_support::*;
    use crate::orders::storage::LedgerStorage;
    use shared::order::{OpenOffer, OrderStatus};

    fn resolve(round: u32) -> ResolveOfferAction {
        ResolveOfferAction {
            order_id: "o-1".to_string(),
            partner_id: "p-1".to_string(),
            round,
            outcome: OfferOutcome::Declined,
        }
    }

    fn offered_order() -> shared::order::OrderSnapshot {
        let mut o = order("o-1", OrderStatus::Confirmed);
        o.assignment.current_offer = Some(OpenOffer {
            partner_id: "p-1".to_string(),
            round: 2,
            distance_km: 1.0,
            expires_at: 0,
        });
        o
    }

    #[tokio::test]
    async fn test_open_offer_rejected() {
        let storage = LedgerStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        seed_order(&storage, &txn, &offered_order());
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let events = resolve(2).execute(&mut ctx, &system()).await.unwrap();
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn test_stale_round_is_noop() {
        let storage = LedgerStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        seed_order(&storage, &txn, &offered_order());
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let events = resolve(1).execute(&mut ctx, &system()).await.unwrap();
        assert!(events.is_empty());
    }
}
