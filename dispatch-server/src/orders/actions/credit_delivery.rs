//! CreditDelivery command handler
//!
//! Credits a partner for a delivered order and recomputes the rolling
//! windows from the partner's credited deliveries, the new one included.
//! The earnings worker issues it with a deterministic command id, so each
//! order is credited at most once.

use async_trait::async_trait;
use chrono_tz::Tz;
use rust_decimal::Decimal;

use super::{partner_event, require_role};
use crate::earnings::windows::{Credit, compute_windows, credits_from_events};
use crate::orders::traits::{
    CommandContext, CommandHandler, CommandMetadata, LedgerEvent, OrderError,
};
use crate::utils::time::timezone_or;
use shared::order::{ActorRole, OrderStatus};
use shared::partner::PartnerEventPayload;

/// CreditDelivery action
#[derive(Debug, Clone)]
pub struct CreditDeliveryAction {
    pub order_id: String,
    pub partner_id: String,
    pub amount: Decimal,
    pub fallback_timezone: Tz,
}

#[async_trait]
impl CommandHandler for CreditDeliveryAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<LedgerEvent>, OrderError> {
        require_role(metadata, &[ActorRole::System])?;

        if self.amount.is_sign_negative() && !self.amount.is_zero() {
            return Err(OrderError::Validation(format!(
                "credit amount must be non-negative, got {}",
                self.amount
            )));
        }

        let order = ctx.load_order(&self.order_id)?;
        if order.status != OrderStatus::Delivered {
            return Err(OrderError::InvalidOperation(format!(
                "order {} is {}; only delivered orders are credited",
                self.order_id, order.status
            )));
        }
        if order.delivery_partner_id.as_deref() != Some(self.partner_id.as_str()) {
            return Err(OrderError::InvalidOperation(format!(
                "order {} was not delivered by partner {}",
                self.order_id, self.partner_id
            )));
        }

        let partner = ctx.load_partner(&self.partner_id)?;
        if partner.total_earnings.checked_add(self.amount).is_none() {
            return Err(OrderError::Validation(format!(
                "credit of {} overflows the earnings of partner {}",
                self.amount, self.partner_id
            )));
        }
        let history = ctx.partner_events(&self.partner_id)?;
        let already_credited = history.iter().any(|e| {
            matches!(
                &e.payload,
                PartnerEventPayload::DeliveryCredited { order_id, .. } if order_id == &self.order_id
            )
        });
        if already_credited {
            tracing::debug!(order_id = %self.order_id, "Delivery already credited");
            return Ok(vec![]);
        }

        let delivered_at = order.delivered_at.unwrap_or(order.updated_at);
        let mut credits = credits_from_events(&history);
        credits.push(Credit {
            amount: self.amount,
            delivered_at,
        });
        let tz = timezone_or(&partner.timezone, self.fallback_timezone);
        let windows = compute_windows(&credits, tz, shared::util::now_millis());

        let credited = partner_event(
            ctx,
            metadata,
            &self.partner_id,
            PartnerEventPayload::DeliveryCredited {
                order_id: self.order_id.clone(),
                amount: self.amount,
                delivered_at,
            },
        );
        let rolled = partner_event(
            ctx,
            metadata,
            &self.partner_id,
            PartnerEventPayload::EarningsRolledOver { windows },
        );
        Ok(vec![credited, rolled])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::actions::test_support::*;
    use crate::orders::storage::LedgerStorage;
    use shared::partner::{PartnerEvent, PartnerStatus};

    fn credit(amount: i64) -> CreditDeliveryAction {
        CreditDeliveryAction {
            order_id: "o-1".to_string(),
            partner_id: "p-1".to_string(),
            amount: Decimal::from(amount),
            fallback_timezone: chrono_tz::UTC,
        }
    }

    fn delivered_order() -> shared::order::OrderSnapshot {
        let mut o = order("o-1", OrderStatus::Delivered);
        o.delivery_partner_id = Some("p-1".to_string());
        o.delivered_at = Some(shared::util::now_millis());
        o
    }

    #[tokio::test]
    async fn test_credit_updates_windows() {
        let storage = LedgerStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        seed_order(&storage, &txn, &delivered_order());
        seed_partner(&storage, &txn, &partner("p-1", PartnerStatus::Online));
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let events = credit(24).execute(&mut ctx, &system()).await.unwrap();
        let partners = partner_events(&events);
        assert_eq!(partners.len(), 2);
        if let PartnerEventPayload::EarningsRolledOver { windows } = &partners[1].payload {
            assert_eq!(windows.today, Decimal::from(24));
            assert_eq!(windows.today_deliveries, 1);
            assert_eq!(windows.monthly, Decimal::from(24));
        } else {
            panic!("Expected EarningsRolledOver payload");
        }
    }

    #[tokio::test]
    async fn test_credit_once_per_order() {
        let storage = LedgerStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        seed_order(&storage, &txn, &delivered_order());
        seed_partner(&storage, &txn, &partner("p-1", PartnerStatus::Online));
        let earlier = PartnerEvent::new(
            1,
            "p-1".to_string(),
            "system".to_string(),
            ActorRole::System,
            "credit-o-1".to_string(),
            PartnerEventPayload::DeliveryCredited {
                order_id: "o-1".to_string(),
                amount: Decimal::from(24),
                delivered_at: 0,
            },
        );
        storage.store_partner_event(&txn, &earlier).unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 1);

        let events = credit(24).execute(&mut ctx, &system()).await.unwrap();
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_wrong_partner_not_credited() {
        let storage = LedgerStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut o = delivered_order();
        o.delivery_partner_id = Some("p-2".to_string());
        seed_order(&storage, &txn, &o);
        seed_partner(&storage, &txn, &partner("p-1", PartnerStatus::Online));
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let err = credit(24).execute(&mut ctx, &system()).await.unwrap_err();
        assert!(matches!(err, OrderError::InvalidOperation(_)));
    }
}
