//! Dispatch engine facade
//!
//! One handle over the ledger and the components that react to it. The HTTP
//! layer and the integration tests talk to the engine only through this
//! type.
//!
//! ```text
//!              DispatchEngine
//!   ┌──────────────┼───────────────┬──────────────────┐
//!   ▼              ▼               ▼                  ▼
//! OrdersManager  AssignmentEngine  PaymentReconciler  EarningsWorker
//!   (ledger)     (+ LocationTable)                    (+ RolloverScheduler)
//! ```

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use shared::command::{CommandPayload, LedgerCommand, PlaceOrderInput};
use shared::dashboard::{DashboardStats, StatsPeriod};
use shared::order::{Actor, GeoPoint, OfferResponse, OrderEvent, OrderSnapshot, OrderStatus};
use shared::partner::{PartnerStatus, PartnerView, Vehicle};
use shared::util::{new_id, now_millis};
use std::sync::Arc;

use crate::assignment::{AssignmentConfig, AssignmentEngine, LocationTable};
use crate::core::{BackgroundTasks, EventRouter, TaskKind};
use crate::dashboard;
use crate::earnings::{EarningsConfig, EarningsWorker, RolloverScheduler};
use crate::orders::actions::ActionDefaults;
use crate::orders::{ManagerError, ManagerResult, OrderError, OrdersManager};
use crate::payments::{PaymentCallback, PaymentReconciler, PaymentsConfig};

/// Buffer of each routed worker channel
const ROUTED_CHANNEL_BUFFER: usize = 1024;

/// Engine-wide settings, taken from [`crate::core::Config`]
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub business_timezone: Tz,
    pub assignment: AssignmentConfig,
    pub earnings: EarningsConfig,
    pub payments: PaymentsConfig,
}

impl EngineSettings {
    /// Ledger action defaults derived from these settings
    pub fn action_defaults(&self) -> ActionDefaults {
        ActionDefaults {
            timezone: self.business_timezone,
        }
    }
}

/// Partner registration request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPartner {
    /// Generated when absent
    #[serde(default)]
    pub partner_id: Option<String>,
    pub name: String,
    pub phone: String,
    pub vehicle: Vehicle,
    #[serde(default)]
    pub timezone: Option<String>,
}

#[derive(Clone)]
pub struct DispatchEngine {
    manager: OrdersManager,
    settings: EngineSettings,
    locations: LocationTable,
    assignment: AssignmentEngine,
    reconciler: PaymentReconciler,
    earnings: EarningsWorker,
}

impl std::fmt::Debug for DispatchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchEngine")
            .field("settings", &self.settings)
            .field("locations", &self.locations.len())
            .field("assignment", &self.assignment)
            .finish()
    }
}

impl DispatchEngine {
    pub fn new(manager: OrdersManager, settings: EngineSettings) -> Self {
        let locations = LocationTable::new();
        let assignment = AssignmentEngine::new(
            manager.clone(),
            settings.assignment.clone(),
            Arc::new(locations.clone()),
        );
        let reconciler = PaymentReconciler::new(manager.clone(), settings.payments.clone());
        let earnings = EarningsWorker::new(manager.clone(), settings.earnings.fee_share);

        Self {
            manager,
            settings,
            locations,
            assignment,
            reconciler,
            earnings,
        }
    }

    pub fn manager(&self) -> &OrdersManager {
        &self.manager
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn assignment(&self) -> &AssignmentEngine {
        &self.assignment
    }

    pub fn locations(&self) -> &LocationTable {
        &self.locations
    }

    /// Start the event router, the assignment and earnings workers and the
    /// rollover scheduler
    pub fn spawn_workers(&self, tasks: &mut BackgroundTasks) {
        let (router, channels) = EventRouter::new(ROUTED_CHANNEL_BUFFER);
        let source = self.manager.subscribe();
        let shutdown = tasks.shutdown_token();

        tasks.spawn(
            "event_router",
            TaskKind::Listener,
            router.run(source, shutdown.clone()),
        );
        tasks.spawn(
            "assignment_worker",
            TaskKind::Worker,
            self.assignment
                .clone()
                .run(channels.assignment_rx, shutdown.clone()),
        );
        tasks.spawn(
            "earnings_worker",
            TaskKind::Worker,
            self.earnings
                .clone()
                .run(channels.earnings_rx, shutdown.clone()),
        );

        let rollover = RolloverScheduler::new(
            self.manager.clone(),
            self.settings.earnings.rollover_check_interval,
            self.settings.business_timezone,
        );
        tasks.spawn(
            "earnings_rollover",
            TaskKind::Periodic,
            rollover.run(shutdown),
        );
    }

    fn order(&self, order_id: &str) -> ManagerResult<OrderSnapshot> {
        self.manager
            .get_order(order_id)?
            .ok_or_else(|| ManagerError::OrderNotFound(order_id.to_string()))
    }

    fn execute_for_order(&self, cmd: LedgerCommand, order_id: &str) -> ManagerResult<OrderSnapshot> {
        self.manager.execute(cmd)?;
        self.order(order_id)
    }

    // ========== Orders ==========

    /// Place an order with a generated id
    pub fn place_order(&self, actor: &Actor, input: PlaceOrderInput) -> ManagerResult<OrderSnapshot> {
        self.place_order_with_id(actor, &new_id(), input)
    }

    /// Place an order under a caller-chosen id
    pub fn place_order_with_id(
        &self,
        actor: &Actor,
        order_id: &str,
        input: PlaceOrderInput,
    ) -> ManagerResult<OrderSnapshot> {
        let cmd = LedgerCommand::new(
            actor.clone(),
            CommandPayload::PlaceOrder {
                order_id: order_id.to_string(),
                input,
            },
        );
        let order = self.execute_for_order(cmd, order_id)?;
        tracing::info!(
            order_id = %order.order_id,
            shop_id = %order.shop_id,
            grand_total = %order.money.grand_total,
            "Order placed"
        );
        Ok(order)
    }

    pub fn transition_order(
        &self,
        actor: &Actor,
        order_id: &str,
        target: OrderStatus,
        reason: Option<String>,
    ) -> ManagerResult<OrderSnapshot> {
        let cmd = LedgerCommand::new(
            actor.clone(),
            CommandPayload::TransitionOrder {
                order_id: order_id.to_string(),
                target,
                reason,
            },
        );
        self.execute_for_order(cmd, order_id)
    }

    /// New gateway reference for an order whose payment failed
    pub fn retry_payment(
        &self,
        actor: &Actor,
        order_id: &str,
        razorpay_order_id: &str,
    ) -> ManagerResult<OrderSnapshot> {
        let cmd = LedgerCommand::new(
            actor.clone(),
            CommandPayload::RetryPayment {
                order_id: order_id.to_string(),
                razorpay_order_id: razorpay_order_id.to_string(),
            },
        );
        self.execute_for_order(cmd, order_id)
    }

    pub fn rate_delivery(&self, actor: &Actor, order_id: &str, rating: u8) -> ManagerResult<OrderSnapshot> {
        let cmd = LedgerCommand::new(
            actor.clone(),
            CommandPayload::RateDelivery {
                order_id: order_id.to_string(),
                rating,
            },
        );
        self.execute_for_order(cmd, order_id)
    }

    /// Admin assignment, also the way out for a flagged order
    pub fn assign_partner(
        &self,
        actor: &Actor,
        order_id: &str,
        partner_id: &str,
    ) -> ManagerResult<OrderSnapshot> {
        let cmd = LedgerCommand::new(
            actor.clone(),
            CommandPayload::AssignPartner {
                order_id: order_id.to_string(),
                partner_id: partner_id.to_string(),
                manual: true,
            },
        );
        self.execute_for_order(cmd, order_id)
    }

    /// Release the current partner and restart matching
    pub fn reassign_order(
        &self,
        actor: &Actor,
        order_id: &str,
        reason: Option<String>,
    ) -> ManagerResult<OrderSnapshot> {
        let cmd = LedgerCommand::new(
            actor.clone(),
            CommandPayload::ReassignOrder {
                order_id: order_id.to_string(),
                reason,
            },
        );
        self.execute_for_order(cmd, order_id)
    }

    pub fn get_order(&self, order_id: &str) -> ManagerResult<OrderSnapshot> {
        self.order(order_id)
    }

    pub fn order_events(&self, order_id: &str) -> ManagerResult<Vec<OrderEvent>> {
        let events = self.manager.order_events(order_id)?;
        if events.is_empty() {
            return Err(ManagerError::OrderNotFound(order_id.to_string()));
        }
        Ok(events)
    }

    /// Orders whose offer rounds ran out, oldest first
    pub fn list_unassigned_orders(&self) -> ManagerResult<Vec<OrderSnapshot>> {
        let mut orders = self.manager.list_unassigned()?;
        orders.sort_by_key(|o| o.created_at);
        Ok(orders)
    }

    // ========== Partners ==========

    pub fn register_partner(&self, actor: &Actor, partner: NewPartner) -> ManagerResult<PartnerView> {
        let partner_id = partner.partner_id.unwrap_or_else(new_id);
        let cmd = LedgerCommand::new(
            actor.clone(),
            CommandPayload::RegisterPartner {
                partner_id: partner_id.clone(),
                name: partner.name,
                phone: partner.phone,
                vehicle: partner.vehicle,
                timezone: partner.timezone,
            },
        );
        self.manager.execute(cmd)?;
        tracing::info!(partner_id = %partner_id, "Partner registered");
        self.get_partner(&partner_id)
    }

    pub fn get_partner(&self, partner_id: &str) -> ManagerResult<PartnerView> {
        let partner = self
            .manager
            .get_partner(partner_id)?
            .ok_or_else(|| ManagerError::PartnerNotFound(partner_id.to_string()))?;
        Ok(PartnerView {
            last_location: self.locations.get(partner_id),
            partner,
        })
    }

    /// Record a partner heartbeat
    ///
    /// The position goes to the location table only. A requested status
    /// switches the partner between online and offline; `busy` is owned by
    /// assignments, so requesting it or sending any status while busy leaves
    /// the ledger untouched.
    pub fn record_partner_heartbeat(
        &self,
        actor: &Actor,
        partner_id: &str,
        lat: f64,
        lng: f64,
        status: Option<PartnerStatus>,
    ) -> ManagerResult<PartnerView> {
        let point = GeoPoint::new(lat, lng);
        if !point.is_valid() {
            return Err(OrderError::Validation(format!("invalid coordinates ({}, {})", lat, lng)).into());
        }

        let partner = self
            .manager
            .get_partner(partner_id)?
            .ok_or_else(|| ManagerError::PartnerNotFound(partner_id.to_string()))?;

        if let Some(requested) = status
            && requested != PartnerStatus::Busy
            && partner.status != PartnerStatus::Busy
            && partner.status != requested
        {
            let cmd = LedgerCommand::new(
                actor.clone(),
                CommandPayload::SetPartnerAvailability {
                    partner_id: partner_id.to_string(),
                    status: requested,
                },
            );
            self.manager.execute(cmd)?;
            tracing::info!(partner_id = %partner_id, from = %partner.status, to = %requested, "Partner availability changed");
        }

        self.locations.record(partner_id, point, now_millis());
        self.get_partner(partner_id)
    }

    /// Accept or reject an open offer
    pub fn respond_to_assignment(
        &self,
        partner_id: &str,
        order_id: &str,
        response: OfferResponse,
    ) -> ManagerResult<OrderSnapshot> {
        self.assignment.respond(partner_id, order_id, response)
    }

    // ========== Payments ==========

    pub fn handle_payment_callback(&self, callback: &PaymentCallback) -> ManagerResult<OrderSnapshot> {
        self.reconciler.handle_callback(callback)
    }

    // ========== Dashboard ==========

    pub fn get_dashboard_stats(&self, period: StatsPeriod) -> ManagerResult<DashboardStats> {
        dashboard::get_dashboard_stats(&self.manager, period, self.settings.business_timezone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::earnings::FeeSharePolicy;
    use crate::test_support::*;
    use rust_decimal::Decimal;
    use shared::command::CommandErrorCode;
    use shared::partner::VehicleType;
    use std::time::Duration;

    fn engine() -> DispatchEngine {
        DispatchEngine::new(
            manager(),
            EngineSettings {
                business_timezone: chrono_tz::Asia::Kolkata,
                assignment: AssignmentConfig {
                    acceptance_window: Duration::from_millis(200),
                    ..AssignmentConfig::default()
                },
                earnings: EarningsConfig {
                    fee_share: FeeSharePolicy::Percentage(Decimal::from(80)),
                    rollover_check_interval: Duration::from_secs(60),
                },
                payments: PaymentsConfig::default(),
            },
        )
    }

    fn new_partner(id: &str) -> NewPartner {
        NewPartner {
            partner_id: Some(id.to_string()),
            name: "Ravi".to_string(),
            phone: "+91-9000000001".to_string(),
            vehicle: Vehicle {
                kind: VehicleType::Scooter,
                number: "KA-01-1234".to_string(),
            },
            timezone: None,
        }
    }

    #[test]
    fn test_heartbeat_goes_online_and_records_location() {
        let engine = engine();
        engine.register_partner(&admin(), new_partner("p-1")).unwrap();

        let view = engine
            .record_partner_heartbeat(&partner("p-1"), "p-1", 12.97, 77.59, Some(PartnerStatus::Online))
            .unwrap();
        assert_eq!(view.partner.status, PartnerStatus::Online);
        assert_eq!(view.last_location.unwrap().point, GeoPoint::new(12.97, 77.59));
        assert_eq!(view.partner.timezone, "Asia/Kolkata");
    }

    #[test]
    fn test_heartbeat_without_status_only_moves_partner() {
        let engine = engine();
        engine.register_partner(&admin(), new_partner("p-1")).unwrap();
        let before = engine.manager().partner_events("p-1").unwrap().len();

        let view = engine
            .record_partner_heartbeat(&partner("p-1"), "p-1", 12.97, 77.59, None)
            .unwrap();
        assert_eq!(view.partner.status, PartnerStatus::Offline);
        assert_eq!(engine.manager().partner_events("p-1").unwrap().len(), before);
    }

    #[test]
    fn test_heartbeat_cannot_request_busy() {
        let engine = engine();
        engine.register_partner(&admin(), new_partner("p-1")).unwrap();

        let view = engine
            .record_partner_heartbeat(&partner("p-1"), "p-1", 12.97, 77.59, Some(PartnerStatus::Busy))
            .unwrap();
        assert_eq!(view.partner.status, PartnerStatus::Offline);
    }

    #[test]
    fn test_heartbeat_rejects_bad_coordinates() {
        let engine = engine();
        engine.register_partner(&admin(), new_partner("p-1")).unwrap();

        let err = engine
            .record_partner_heartbeat(&partner("p-1"), "p-1", 123.0, 77.59, None)
            .unwrap_err();
        assert_eq!(err.code(), CommandErrorCode::ValidationFailed);
        assert!(engine.locations().get("p-1").is_none());
    }

    #[test]
    fn test_heartbeat_for_unknown_partner() {
        let err = engine()
            .record_partner_heartbeat(&partner("p-9"), "p-9", 12.97, 77.59, None)
            .unwrap_err();
        assert_eq!(err.code(), CommandErrorCode::NotFound);
    }

    #[test]
    fn test_place_and_confirm_cash_order() {
        let engine = engine();
        let order = engine
            .place_order_with_id(&customer(), "o-1", order_input("shop-1", cash()))
            .unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.money.grand_total, Decimal::from(550));

        let order = engine
            .transition_order(&shop("shop-1"), "o-1", OrderStatus::Confirmed, None)
            .unwrap();
        assert_eq!(order.status, OrderStatus::Confirmed);
    }

    #[test]
    fn test_unknown_order() {
        let engine = engine();
        let err = engine
            .transition_order(&admin(), "missing", OrderStatus::Confirmed, None)
            .unwrap_err();
        assert_eq!(err.code(), CommandErrorCode::NotFound);
        assert_eq!(
            engine.order_events("missing").unwrap_err().code(),
            CommandErrorCode::NotFound
        );
    }

    #[test]
    fn test_respond_without_offer_is_expired() {
        let engine = engine();
        let err = engine
            .respond_to_assignment("p-1", "o-1", OfferResponse::Accept)
            .unwrap_err();
        assert_eq!(err.code(), CommandErrorCode::OfferExpired);
    }
}
