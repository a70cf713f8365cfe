//! SetPartnerAvailability command handler
//!
//! Partners toggle between `online` and `offline`. `busy` is never set here;
//! while a partner is busy, availability requests are ignored.

use async_trait::async_trait;

use super::{partner_event, require_role};
use crate::orders::traits::{
    CommandContext, CommandHandler, CommandMetadata, LedgerEvent, OrderError,
};
use shared::order::ActorRole;
use shared::partner::{PartnerEventPayload, PartnerStatus};

/// SetPartnerAvailability action
#[derive(Debug, Clone)]
pub struct SetPartnerAvailabilityAction {
    pub partner_id: String,
    pub status: PartnerStatus,
}

#[async_trait]
impl CommandHandler for SetPartnerAvailabilityAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<LedgerEvent>, OrderError> {
        require_role(
            metadata,
            &[ActorRole::Partner, ActorRole::Admin, ActorRole::System],
        )?;
        if metadata.is(ActorRole::Partner) && metadata.actor_id != self.partner_id {
            return Err(OrderError::PermissionDenied(
                "partners may only change their own availability".to_string(),
            ));
        }
        if self.status == PartnerStatus::Busy {
            return Err(OrderError::Validation(
                "busy is derived from assignments and cannot be set".to_string(),
            ));
        }

        let partner = ctx.load_partner(&self.partner_id)?;
        if partner.status == PartnerStatus::Busy || partner.status == self.status {
            return Ok(vec![]);
        }

        let event = partner_event(
            ctx,
            metadata,
            &self.partner_id,
            PartnerEventPayload::AvailabilityChanged {
                from: partner.status,
                to: self.status,
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

    fn set(status: PartnerStatus) -> SetPartnerAvailabilityAction {
        SetPartnerAvailabilityAction {
            partner_id: "p-1".to_string(),
            status,
        }
    }

    #[tokio::test]
    async fn test_go_online() {
        let storage = LedgerStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        seed_partner(&storage, &txn, &partner("p-1", PartnerStatus::Offline));
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let events = set(PartnerStatus::Online)
            .execute(&mut ctx, &metadata(ActorRole::Partner, "p-1"))
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn test_busy_partner_ignores_toggle() {
        let storage = LedgerStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        seed_partner(&storage, &txn, &partner("p-1", PartnerStatus::Busy));
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let events = set(PartnerStatus::Offline)
            .execute(&mut ctx, &metadata(ActorRole::Partner, "p-1"))
            .await
            .unwrap();
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_busy_cannot_be_set() {
        let storage = LedgerStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        seed_partner(&storage, &txn, &partner("p-1", PartnerStatus::Online));
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let err = set(PartnerStatus::Busy)
            .execute(&mut ctx, &admin())
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::Validation(_)));
    }

    #[tokio::test]
    async fn test_other_partner_denied() {
        let storage = LedgerStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        seed_partner(&storage, &txn, &partner("p-1", PartnerStatus::Offline));
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let err = set(PartnerStatus::Online)
            .execute(&mut ctx, &metadata(ActorRole::Partner, "p-2"))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::PermissionDenied(_)));
    }
}
