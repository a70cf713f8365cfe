//! Earnings rollover
//!
//! Windows only change when something recomputes them. Deliveries do that
//! as they are credited; this scheduler does it for partners whose windows
//! still describe an earlier local day. It wakes at the next business-zone
//! midnight or after the check interval, whichever is sooner, so partners in
//! other zones are rolled over within one interval of their own midnight.

use chrono_tz::Tz;
use shared::command::{CommandPayload, LedgerCommand};
use shared::order::Actor;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::windows::is_stale;
use crate::orders::{ManagerResult, OrdersManager};
use crate::utils::time::{duration_until_next_midnight, local_date, timezone_or};

#[derive(Debug, Clone)]
pub struct RolloverScheduler {
    manager: OrdersManager,
    check_interval: Duration,
    business_timezone: Tz,
}

impl RolloverScheduler {
    pub fn new(manager: OrdersManager, check_interval: Duration, business_timezone: Tz) -> Self {
        Self {
            manager,
            check_interval,
            business_timezone,
        }
    }

    /// Recompute windows that are stale as of `now`; returns the partners touched
    pub fn roll_over_stale(&self, now: i64) -> ManagerResult<usize> {
        let mut rolled = 0;
        for partner in self.manager.all_partners()? {
            // Nothing credited yet, nothing to roll
            if partner.total_deliveries == 0 {
                continue;
            }
            let tz = timezone_or(&partner.timezone, self.business_timezone);
            if !is_stale(&partner.earnings, tz, now) {
                continue;
            }

            // One rollover per partner per local day
            let command_id = format!("rollover-{}-{}", partner.partner_id, local_date(now, tz));
            let response = self.manager.execute(LedgerCommand::with_id(
                command_id,
                Actor::system("earnings-rollover"),
                CommandPayload::RollOverEarnings {
                    partner_id: partner.partner_id.clone(),
                },
            ))?;
            if !response.duplicate {
                rolled += 1;
            }
        }
        if rolled > 0 {
            tracing::info!(partners = rolled, "Earnings windows rolled over");
        }
        Ok(rolled)
    }

    /// Sleep before the next sweep
    pub fn next_wake(&self, now: i64) -> Duration {
        duration_until_next_midnight(now, self.business_timezone).min(self.check_interval)
    }

    pub async fn run(self, shutdown: CancellationToken) {
        tracing::info!(
            interval_secs = self.check_interval.as_secs(),
            timezone = %self.business_timezone,
            "Earnings rollover scheduler started"
        );
        loop {
            if let Err(e) = self.roll_over_stale(shared::util::now_millis()) {
                tracing::error!(error = %e, "Earnings rollover sweep failed");
            }

            let wait = self.next_wake(shared::util::now_millis());
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Earnings rollover scheduler received shutdown signal");
                    break;
                }
                _ = tokio::time::sleep(wait) => {}
            }
        }
    }
}
