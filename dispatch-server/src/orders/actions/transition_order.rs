//! TransitionOrder command handler
//!
//! Moves an order along the lifecycle. Delivering or cancelling an order
//! with an assigned partner releases the partner in the same commit.

use async_trait::async_trait;

use super::{order_event, partner_event};
use crate::orders::lifecycle::{TransitionCheck, check_transition};
use crate::orders::traits::{
    CommandContext, CommandHandler, CommandMetadata, LedgerEvent, OrderError,
};
use shared::order::{OrderEventPayload, OrderStatus};
use shared::partner::{PartnerEventPayload, ReleaseReason};

/// TransitionOrder action
#[derive(Debug, Clone)]
pub struct TransitionOrderAction {
    pub order_id: String,
    pub target: OrderStatus,
    pub reason: Option<String>,
}

#[async_trait]
impl CommandHandler for TransitionOrderAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<LedgerEvent>, OrderError> {
        // 1. Load existing snapshot
        let snapshot = ctx.load_order(&self.order_id)?;

        // 2. Check the transition table; a repeated request is a no-op
        if check_transition(&snapshot, self.target, &metadata.actor())? == TransitionCheck::NoOp {
            tracing::debug!(
                order_id = %self.order_id,
                status = %self.target,
                "Order already in target status"
            );
            return Ok(vec![]);
        }

        let mut events = vec![order_event(
            ctx,
            metadata,
            &self.order_id,
            OrderEventPayload::StatusChanged {
                from: snapshot.status,
                to: self.target,
                reason: self.reason.clone(),
            },
        )];

        // 3. Release the assigned partner on terminal transitions
        let release = match self.target {
            OrderStatus::Delivered => Some(ReleaseReason::Delivered),
            OrderStatus::Cancelled => Some(ReleaseReason::Cancelled),
            _ => None,
        };
        if let (Some(reason), Some(partner_id)) = (release, &snapshot.delivery_partner_id) {
            let partner = ctx.load_partner(partner_id)?;
            if partner.active_order_id.as_deref() == Some(self.order_id.as_str()) {
                events.push(partner_event(
                    ctx,
                    metadata,
                    partner_id,
                    PartnerEventPayload::OrderReleased {
                        order_id: self.order_id.clone(),
                        reason,
                    },
                ));
            } else {
                tracing::warn!(
                    order_id = %self.order_id,
                    partner_id = %partner_id,
                    active_order_id = ?partner.active_order_id,
                    "Assigned partner is not holding this order"
                );
            }
        }

        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::actions::test_support::*;
    use crate::orders::storage::LedgerStorage;
    use shared::order::ActorRole;
    use shared::partner::PartnerStatus;

    fn action(target: OrderStatus) -> TransitionOrderAction {
        TransitionOrderAction {
            order_id: "o-1".to_string(),
            target,
            reason: None,
        }
    }

    #[tokio::test]
    async fn test_shop_confirms() {
        let storage = LedgerStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        seed_order(&storage, &txn, &order("o-1", OrderStatus::Pending));
        let mut ctx = CommandContext::new(&txn, &storage, 10);

        let events = action(OrderStatus::Confirmed)
            .execute(&mut ctx, &metadata(ActorRole::Shop, "shop-1"))
            .await
            .unwrap();

        let orders = order_events(&events);
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].sequence, 11);
        assert_eq!(orders[0].new_status(), Some(OrderStatus::Confirmed));
    }

    #[tokio::test]
    async fn test_repeat_is_noop() {
        let storage = LedgerStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        seed_order(&storage, &txn, &order("o-1", OrderStatus::Confirmed));
        let mut ctx = CommandContext::new(&txn, &storage, 10);

        let events = action(OrderStatus::Confirmed)
            .execute(&mut ctx, &metadata(ActorRole::Shop, "shop-1"))
            .await
            .unwrap();
        assert!(events.is_empty());
        assert_eq!(ctx.current_sequence(), 10);
    }

    #[tokio::test]
    async fn test_unknown_order() {
        let storage = LedgerStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let err = action(OrderStatus::Confirmed)
            .execute(&mut ctx, &metadata(ActorRole::Shop, "shop-1"))
            .await
            .unwrap_err();
        assert_eq!(err, OrderError::OrderNotFound("o-1".to_string()));
    }

    #[tokio::test]
    async fn test_delivery_releases_partner() {
        let storage = LedgerStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut o = order("o-1", OrderStatus::OutForDelivery);
        o.delivery_partner_id = Some("p-1".to_string());
        seed_order(&storage, &txn, &o);
        let mut p = partner("p-1", PartnerStatus::Busy);
        p.active_order_id = Some("o-1".to_string());
        seed_partner(&storage, &txn, &p);
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let events = action(OrderStatus::Delivered)
            .execute(&mut ctx, &metadata(ActorRole::Partner, "p-1"))
            .await
            .unwrap();

        assert_eq!(order_events(&events).len(), 1);
        let released = partner_events(&events);
        assert_eq!(released.len(), 1);
        assert!(matches!(
            released[0].payload,
            PartnerEventPayload::OrderReleased {
                reason: ReleaseReason::Delivered,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_cancel_from_out_for_delivery_rejected() {
        let storage = LedgerStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        seed_order(&storage, &txn, &order("o-1", OrderStatus::OutForDelivery));
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let err = action(OrderStatus::Cancelled)
            .execute(&mut ctx, &admin())
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::InvalidTransition { .. }));
    }
}
