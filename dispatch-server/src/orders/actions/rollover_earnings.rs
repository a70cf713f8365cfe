//! RollOverEarnings command handler
//!
//! Recomputes a partner's rolling windows from their credited deliveries as
//! of now. Emits nothing when the windows are already current.

use async_trait::async_trait;
use chrono_tz::Tz;

use super::{partner_event, require_role};
use crate::earnings::windows::{compute_windows, credits_from_events};
use crate::orders::traits::{
    CommandContext, CommandHandler, CommandMetadata, LedgerEvent, OrderError,
};
use crate::utils::time::timezone_or;
use shared::order::ActorRole;
use shared::partner::PartnerEventPayload;

/// RollOverEarnings action
#[derive(Debug, Clone)]
pub struct RollOverEarningsAction {
    pub partner_id: String,
    pub fallback_timezone: Tz,
}

#[async_trait]
impl CommandHandler for RollOverEarningsAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<LedgerEvent>, OrderError> {
        require_role(metadata, &[ActorRole::System, ActorRole::Admin])?;

        let partner = ctx.load_partner(&self.partner_id)?;
        let history = ctx.partner_events(&self.partner_id)?;
        let tz = timezone_or(&partner.timezone, self.fallback_timezone);
        let windows = compute_windows(
            &credits_from_events(&history),
            tz,
            shared::util::now_millis(),
        );

        if windows == partner.earnings {
            return Ok(vec![]);
        }

        let event = partner_event(
            ctx,
            metadata,
            &self.partner_id,
            PartnerEventPayload::EarningsRolledOver { windows },
        );
        Ok(vec![event])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::actions::test_support::*;
    use crate::orders::storage::LedgerStorage;
    use rust_decimal::Decimal;
    use shared::partner::{EarningsWindows, PartnerStatus};

    fn rollover() -> RollOverEarningsAction {
        RollOverEarningsAction {
            partner_id: "p-1".to_string(),
            fallback_timezone: chrono_tz::UTC,
        }
    }

    #[tokio::test]
    async fn test_stale_windows_reset() {
        let storage = LedgerStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut p = partner("p-1", PartnerStatus::Online);
        p.earnings = EarningsWindows {
            today: Decimal::from(80),
            weekly: Decimal::from(80),
            monthly: Decimal::from(80),
            today_deliveries: 2,
            day: chrono::NaiveDate::from_ymd_opt(2020, 1, 1),
            week_start: chrono::NaiveDate::from_ymd_opt(2019, 12, 30),
            month_start: chrono::NaiveDate::from_ymd_opt(2020, 1, 1),
        };
        seed_partner(&storage, &txn, &p);
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let events = rollover().execute(&mut ctx, &system()).await.unwrap();
        let partners = partner_events(&events);
        assert_eq!(partners.len(), 1);
        if let PartnerEventPayload::EarningsRolledOver { windows } = &partners[0].payload {
            assert_eq!(windows.today, Decimal::ZERO);
            assert_eq!(windows.monthly, Decimal::ZERO);
        } else {
            panic!("Expected EarningsRolledOver payload");
        }
    }

    #[tokio::test]
    async fn test_current_windows_unchanged() {
        let storage = LedgerStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut p = partner("p-1", PartnerStatus::Online);
        let tz = timezone_or(&p.timezone, chrono_tz::UTC);
        p.earnings = compute_windows(&[], tz, shared::util::now_millis());
        seed_partner(&storage, &txn, &p);
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let events = rollover().execute(&mut ctx, &system()).await.unwrap();
        assert!(events.is_empty());
    }
}
