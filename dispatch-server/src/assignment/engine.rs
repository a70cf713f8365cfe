//! Matching rounds
//!
//! One matching loop per order, started when the order is confirmed or its
//! assignment is reset. Each round offers the order to the best remaining
//! candidate and waits for a response or the acceptance window, whichever
//! comes first. Loops for different orders run concurrently; the ledger
//! decides any conflict between them (a partner can only be reserved once).

use dashmap::DashSet;
use futures::future::join_all;
use shared::command::{CommandPayload, LedgerCommand};
use shared::order::{
    Actor, ActorRole, OfferOutcome, OfferResponse, OrderEvent, OrderEventPayload, OrderSnapshot,
    OrderStatus,
};
use shared::partner::PartnerSnapshot;
use shared::util::now_millis;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use super::AssignmentConfig;
use super::geo::{distance_metres, haversine_km};
use super::location::{LocationProvider, lookup_with_timeout};
use super::offers::OfferBook;
use super::ranking::{Candidate, rank};
use crate::earnings::windows::is_stale;
use crate::orders::{ManagerError, ManagerResult, OrderError, OrdersManager};
use crate::utils::time::parse_timezone;

/// How a matching loop ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    Assigned(String),
    /// Rounds exhausted; the order waits in the admin queue
    Flagged { rounds: u32 },
    /// The order stopped needing a partner while matching
    Abandoned,
}

enum Reply {
    Responded(OfferResponse),
    Expired,
    /// Offer cancelled from outside (order cancelled or assigned by an admin)
    Withdrawn,
}

#[derive(Clone)]
pub struct AssignmentEngine {
    manager: OrdersManager,
    config: AssignmentConfig,
    locations: Arc<dyn LocationProvider>,
    offers: OfferBook,
    /// Orders with a matching loop in flight
    matching: Arc<DashSet<String>>,
}

impl std::fmt::Debug for AssignmentEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssignmentEngine")
            .field("config", &self.config)
            .field("offers", &self.offers)
            .field("matching", &self.matching.len())
            .finish()
    }
}

impl AssignmentEngine {
    pub fn new(
        manager: OrdersManager,
        config: AssignmentConfig,
        locations: Arc<dyn LocationProvider>,
    ) -> Self {
        Self {
            manager,
            config,
            locations,
            offers: OfferBook::new(),
            matching: Arc::new(DashSet::new()),
        }
    }

    pub fn config(&self) -> &AssignmentConfig {
        &self.config
    }

    pub fn offers(&self) -> &OfferBook {
        &self.offers
    }

    fn system_actor() -> Actor {
        Actor::system("assignment-engine")
    }

    // ========== Candidates ==========

    /// Eligible partners for `order`, best first
    pub async fn find_candidates(&self, order: &OrderSnapshot) -> ManagerResult<Vec<Candidate>> {
        let now = now_millis();
        let item_count = order.item_count();

        let eligible: Vec<PartnerSnapshot> = self
            .manager
            .all_partners()?
            .into_iter()
            .filter(|p| p.is_available())
            .filter(|p| !order.assignment.tried_partners.contains(&p.partner_id))
            .filter(|p| self.config.capacity.fits(p.vehicle.kind, item_count))
            .filter(|p| !self.offers.has_offer_for(&p.partner_id))
            .collect();

        let fixes = join_all(eligible.iter().map(|p| {
            lookup_with_timeout(
                self.locations.as_ref(),
                &p.partner_id,
                self.config.location_timeout,
            )
        }))
        .await;

        let candidates = eligible
            .into_iter()
            .zip(fixes)
            .filter_map(|(partner, fix)| {
                let fix = fix?;
                let distance_km = haversine_km(fix.point, order.pickup);
                if distance_km > self.config.radius_km {
                    return None;
                }
                Some(Candidate {
                    distance_m: distance_metres(fix.point, order.pickup),
                    distance_km,
                    rating: partner.rating,
                    today_deliveries: deliveries_today(&partner, now),
                    joined_at: partner.joined_at,
                    partner_id: partner.partner_id,
                })
            })
            .collect();

        Ok(rank(candidates))
    }

    // ========== Matching ==========

    /// Spawn a matching loop for the order unless one is already running
    pub fn start_matching(&self, order_id: &str) -> bool {
        if !self.matching.insert(order_id.to_string()) {
            tracing::debug!(order_id = %order_id, "Matching already in progress");
            return false;
        }

        let engine = self.clone();
        let order_id = order_id.to_string();
        tokio::spawn(async move {
            match engine.run_matching(&order_id).await {
                Ok(outcome) => {
                    tracing::debug!(order_id = %order_id, outcome = ?outcome, "Matching finished")
                }
                Err(e) => tracing::error!(order_id = %order_id, error = %e, "Matching failed"),
            }
            engine.matching.remove(&order_id);
        });
        true
    }

    /// Run offer rounds until the order is assigned, flagged or no longer needs a partner
    pub async fn run_matching(&self, order_id: &str) -> ManagerResult<MatchOutcome> {
        // Rounds in which nobody was eligible; they count toward the limit
        let mut idle_rounds = 0u32;

        loop {
            let order = self
                .manager
                .get_order(order_id)?
                .ok_or_else(|| ManagerError::OrderNotFound(order_id.to_string()))?;

            if let Some(partner_id) = &order.delivery_partner_id {
                return Ok(MatchOutcome::Assigned(partner_id.clone()));
            }
            if !order.needs_partner() {
                return Ok(MatchOutcome::Abandoned);
            }

            // An offer left open by a previous process can no longer be answered
            if let Some(stale) = &order.assignment.current_offer {
                if self.offers.is_open(order_id) {
                    return Ok(MatchOutcome::Abandoned);
                }
                self.resolve(order_id, &stale.partner_id, stale.round, OfferOutcome::Expired)?;
                continue;
            }

            let rounds = order.assignment.offers_made + idle_rounds;
            if rounds >= self.config.offer_rounds {
                return self.flag(order_id, rounds);
            }

            let candidates = self.find_candidates(&order).await?;
            let Some(best) = candidates.into_iter().next() else {
                idle_rounds += 1;
                tracing::debug!(order_id = %order_id, idle_rounds, "No eligible partner this round");
                if order.assignment.offers_made + idle_rounds >= self.config.offer_rounds {
                    return self.flag(order_id, order.assignment.offers_made + idle_rounds);
                }
                tokio::time::sleep(self.config.acceptance_window).await;
                continue;
            };

            let round = order.assignment.offers_made + 1;
            let Some(reply) = self.offers.open(order_id, &best.partner_id, round) else {
                // Another matching loop reached this partner first
                tracing::debug!(order_id = %order_id, partner_id = %best.partner_id, "Candidate taken, re-ranking");
                continue;
            };
            let expires_at = now_millis() + self.config.acceptance_window.as_millis() as i64;
            let record = LedgerCommand::new(
                Self::system_actor(),
                CommandPayload::RecordOffer {
                    order_id: order_id.to_string(),
                    partner_id: best.partner_id.clone(),
                    round,
                    distance_km: best.distance_km,
                    expires_at,
                },
            );
            if let Err(e) = self.manager.execute(record) {
                self.offers.withdraw(order_id, &best.partner_id);
                return Err(e);
            }
            tracing::info!(
                order_id = %order_id,
                partner_id = %best.partner_id,
                round,
                distance_km = best.distance_km,
                "Offer sent"
            );

            match self.await_reply(order_id, &best.partner_id, reply).await {
                Reply::Responded(OfferResponse::Accept) => {
                    return Ok(MatchOutcome::Assigned(best.partner_id));
                }
                Reply::Responded(OfferResponse::Reject) => {
                    self.resolve(order_id, &best.partner_id, round, OfferOutcome::Declined)?;
                }
                Reply::Expired => {
                    tracing::info!(order_id = %order_id, partner_id = %best.partner_id, round, "Offer expired");
                    self.resolve(order_id, &best.partner_id, round, OfferOutcome::Expired)?;
                }
                Reply::Withdrawn => return Ok(MatchOutcome::Abandoned),
            }
        }
    }

    async fn await_reply(
        &self,
        order_id: &str,
        partner_id: &str,
        mut reply: oneshot::Receiver<OfferResponse>,
    ) -> Reply {
        match tokio::time::timeout(self.config.acceptance_window, &mut reply).await {
            Ok(Ok(response)) => Reply::Responded(response),
            Ok(Err(_)) => Reply::Withdrawn,
            Err(_) => {
                if self.offers.withdraw(order_id, partner_id) {
                    return Reply::Expired;
                }
                // A response claimed the offer as the window closed; it decides
                match reply.await {
                    Ok(response) => Reply::Responded(response),
                    Err(_) => Reply::Withdrawn,
                }
            }
        }
    }

    fn resolve(
        &self,
        order_id: &str,
        partner_id: &str,
        round: u32,
        outcome: OfferOutcome,
    ) -> ManagerResult<()> {
        self.manager.execute(LedgerCommand::new(
            Self::system_actor(),
            CommandPayload::ResolveOffer {
                order_id: order_id.to_string(),
                partner_id: partner_id.to_string(),
                round,
                outcome,
            },
        ))?;
        Ok(())
    }

    fn flag(&self, order_id: &str, rounds: u32) -> ManagerResult<MatchOutcome> {
        self.manager.execute(LedgerCommand::new(
            Self::system_actor(),
            CommandPayload::FlagUnassigned {
                order_id: order_id.to_string(),
                rounds,
            },
        ))?;
        tracing::warn!(order_id = %order_id, rounds, "No partner accepted; order needs manual assignment");
        Ok(MatchOutcome::Flagged { rounds })
    }

    // ========== Partner responses ==========

    /// Answer an open offer
    ///
    /// Accepting commits the assignment before the matching loop hears about
    /// it. A response to an offer that already expired, was answered or was
    /// never made fails with `OfferExpired`.
    pub fn respond(
        &self,
        partner_id: &str,
        order_id: &str,
        response: OfferResponse,
    ) -> ManagerResult<OrderSnapshot> {
        let claim = self.offers.claim(order_id, partner_id).ok_or_else(|| {
            ManagerError::Domain(OrderError::OfferExpired(format!(
                "no open offer on order {} for partner {}",
                order_id, partner_id
            )))
        })?;

        match response {
            OfferResponse::Reject => {
                tracing::info!(order_id = %order_id, partner_id = %partner_id, "Offer rejected");
                claim.respond(OfferResponse::Reject);
            }
            OfferResponse::Accept => {
                let name = self
                    .manager
                    .get_partner(partner_id)
                    .ok()
                    .flatten()
                    .map(|p| p.name)
                    .unwrap_or_else(|| partner_id.to_string());
                let accept = LedgerCommand::new(
                    Actor::new(partner_id, name, ActorRole::Partner),
                    CommandPayload::AssignPartner {
                        order_id: order_id.to_string(),
                        partner_id: partner_id.to_string(),
                        manual: false,
                    },
                );
                if let Err(e) = self.manager.execute(accept) {
                    // Treat a failed accept as a decline so matching moves on
                    claim.respond(OfferResponse::Reject);
                    return Err(e);
                }
                claim.respond(OfferResponse::Accept);
            }
        }

        self.manager
            .get_order(order_id)?
            .ok_or_else(|| ManagerError::OrderNotFound(order_id.to_string()))
    }

    // ========== Worker ==========

    /// React to a committed order event
    pub fn handle_event(&self, event: &OrderEvent) {
        match &event.payload {
            OrderEventPayload::StatusChanged {
                to: OrderStatus::Confirmed,
                ..
            }
            | OrderEventPayload::AssignmentReset { .. } => {
                self.start_matching(&event.order_id);
            }
            OrderEventPayload::StatusChanged {
                to: OrderStatus::Cancelled,
                ..
            }
            | OrderEventPayload::PartnerAssigned { manual: true, .. } => {
                if self.offers.cancel(&event.order_id) {
                    tracing::debug!(order_id = %event.order_id, "Open offer withdrawn");
                }
            }
            _ => {}
        }
    }

    /// Restart matching for orders left waiting by a previous process
    pub fn resume_pending(&self) -> ManagerResult<usize> {
        let mut resumed = 0;
        for order in self.manager.all_orders()? {
            if order.needs_partner() && self.start_matching(&order.order_id) {
                resumed += 1;
            }
        }
        if resumed > 0 {
            tracing::info!(count = resumed, "Resumed matching for waiting orders");
        }
        Ok(resumed)
    }

    /// Worker loop fed by the event router
    pub async fn run(self, mut events: mpsc::Receiver<OrderEvent>, shutdown: CancellationToken) {
        tracing::info!("Assignment worker started");
        if let Err(e) = self.resume_pending() {
            tracing::error!(error = %e, "Failed to resume pending orders");
        }

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Assignment worker received shutdown signal");
                    break;
                }
                event = events.recv() => match event {
                    Some(event) => self.handle_event(&event),
                    None => {
                        tracing::info!("Assignment channel closed, worker stopping");
                        break;
                    }
                }
            }
        }
    }
}

/// Deliveries completed today, zero when the stored windows are from an earlier day
fn deliveries_today(partner: &PartnerSnapshot, now: i64) -> u32 {
    match parse_timezone(&partner.timezone) {
        Some(tz) if !is_stale(&partner.earnings, tz, now) => partner.earnings.today_deliveries,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignment::LocationTable;
    use crate::orders::LedgerStorage;
    use crate::orders::actions::ActionDefaults;
    use rust_decimal::Decimal;
    use shared::command::{CommandErrorCode, NewPaymentInput, PlaceOrderInput};
    use shared::order::{DeliveryAddress, GeoPoint, LineItem, OrderEventType, PaymentMethod};
    use shared::partner::{PartnerStatus, Vehicle, VehicleType};
    use std::time::Duration;

    const SHOP: GeoPoint = GeoPoint {
        lat: 12.9716,
        lng: 77.5946,
    };

    struct Fixture {
        manager: OrdersManager,
        locations: LocationTable,
        engine: AssignmentEngine,
    }

    fn fixture(window_ms: u64, rounds: u32) -> Fixture {
        let manager = OrdersManager::with_storage(
            LedgerStorage::open_in_memory().unwrap(),
            ActionDefaults {
                timezone: chrono_tz::Asia::Kolkata,
            },
        );
        let locations = LocationTable::new();
        let config = AssignmentConfig {
            acceptance_window: Duration::from_millis(window_ms),
            offer_rounds: rounds,
            location_timeout: Duration::from_millis(200),
            ..AssignmentConfig::default()
        };
        let engine = AssignmentEngine::new(manager.clone(), config, Arc::new(locations.clone()));
        Fixture {
            manager,
            locations,
            engine,
        }
    }

    fn execute(manager: &OrdersManager, actor: Actor, payload: CommandPayload) {
        manager
            .execute(LedgerCommand::new(actor, payload))
            .expect("command should succeed");
    }

    fn admin() -> Actor {
        Actor::new("admin-1", "Ops", ActorRole::Admin)
    }

    fn online_partner(f: &Fixture, id: &str, kind: VehicleType, at: GeoPoint) {
        execute(
            &f.manager,
            admin(),
            CommandPayload::RegisterPartner {
                partner_id: id.to_string(),
                name: format!("Rider {}", id),
                phone: "+91-9000000000".to_string(),
                vehicle: Vehicle {
                    kind,
                    number: "KA01AB1234".to_string(),
                },
                timezone: None,
            },
        );
        execute(
            &f.manager,
            Actor::new(id, "Rider", ActorRole::Partner),
            CommandPayload::SetPartnerAvailability {
                partner_id: id.to_string(),
                status: PartnerStatus::Online,
            },
        );
        f.locations.record(id, at, now_millis());
    }

    /// Cash order with `quantity` units, confirmed by the shop
    fn confirmed_order(f: &Fixture, order_id: &str, quantity: u32) {
        execute(
            &f.manager,
            Actor::new("cust-1", "Asha", ActorRole::Customer),
            CommandPayload::PlaceOrder {
                order_id: order_id.to_string(),
                input: PlaceOrderInput {
                    shop_id: "shop-1".to_string(),
                    pickup: SHOP,
                    items: vec![LineItem {
                        product_id: "prod-1".to_string(),
                        name: "Idli".to_string(),
                        quantity,
                        unit_price: Decimal::from(40),
                    }],
                    delivery_address: DeliveryAddress {
                        line1: "12 MG Road".to_string(),
                        line2: None,
                        city: "Bengaluru".to_string(),
                        postal_code: "560001".to_string(),
                        contact_phone: None,
                        location: None,
                    },
                    delivery_fee: Decimal::from(30),
                    taxes: Decimal::from(10),
                    payment: NewPaymentInput {
                        method: PaymentMethod::CashOnDelivery,
                        razorpay_order_id: None,
                    },
                },
            },
        );
        execute(
            &f.manager,
            Actor::new("shop-1", "Spice Route", ActorRole::Shop),
            CommandPayload::TransitionOrder {
                order_id: order_id.to_string(),
                target: OrderStatus::Confirmed,
                reason: None,
            },
        );
    }

    /// Point roughly `metres` north of the shop
    fn north_of_shop(metres: f64) -> GeoPoint {
        GeoPoint::new(SHOP.lat + metres / 111_195.0, SHOP.lng)
    }

    async fn wait_for_offer(f: &Fixture, order_id: &str, partner_id: &str) {
        for _ in 0..300 {
            let order = f.manager.get_order(order_id).unwrap().unwrap();
            if order
                .assignment
                .current_offer
                .as_ref()
                .is_some_and(|o| o.partner_id == partner_id)
                && f.engine.offers().is_open(order_id)
            {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("no offer to {} on {}", partner_id, order_id);
    }

    #[tokio::test]
    async fn test_candidates_filtered_and_ranked() {
        let f = fixture(1_000, 3);
        online_partner(&f, "near", VehicleType::Scooter, north_of_shop(800.0));
        online_partner(&f, "far", VehicleType::Scooter, north_of_shop(3_000.0));
        online_partner(&f, "outside", VehicleType::Car, north_of_shop(9_000.0));
        online_partner(&f, "small", VehicleType::Bicycle, north_of_shop(100.0));
        execute(
            &f.manager,
            admin(),
            CommandPayload::RegisterPartner {
                partner_id: "offline".to_string(),
                name: "Off".to_string(),
                phone: "+91-9000000001".to_string(),
                vehicle: Vehicle {
                    kind: VehicleType::Car,
                    number: "KA01".to_string(),
                },
                timezone: None,
            },
        );
        f.locations.record("offline", SHOP, now_millis());
        online_partner(&f, "nowhere", VehicleType::Car, SHOP);
        f.locations.remove("nowhere");

        // 6 units: too many for a bicycle
        confirmed_order(&f, "o-1", 6);
        let order = f.manager.get_order("o-1").unwrap().unwrap();
        let candidates = f.engine.find_candidates(&order).await.unwrap();
        let ids: Vec<&str> = candidates.iter().map(|c| c.partner_id.as_str()).collect();
        assert_eq!(ids, vec!["near", "far"]);
        assert!((candidates[0].distance_km - 0.8).abs() < 0.01);
    }

    #[tokio::test]
    async fn test_accepted_offer_assigns() {
        let f = fixture(2_000, 3);
        online_partner(&f, "p-1", VehicleType::Scooter, north_of_shop(500.0));
        confirmed_order(&f, "o-1", 2);

        let engine = f.engine.clone();
        let matching = tokio::spawn(async move { engine.run_matching("o-1").await });
        wait_for_offer(&f, "o-1", "p-1").await;

        let order = f.engine.respond("p-1", "o-1", OfferResponse::Accept).unwrap();
        assert_eq!(order.delivery_partner_id.as_deref(), Some("p-1"));
        assert_eq!(
            matching.await.unwrap().unwrap(),
            MatchOutcome::Assigned("p-1".to_string())
        );

        let partner = f.manager.get_partner("p-1").unwrap().unwrap();
        assert_eq!(partner.status, PartnerStatus::Busy);
    }

    #[tokio::test]
    async fn test_timeout_moves_to_next_candidate() {
        let f = fixture(100, 3);
        online_partner(&f, "p-1", VehicleType::Scooter, north_of_shop(300.0));
        online_partner(&f, "p-2", VehicleType::Scooter, north_of_shop(900.0));
        confirmed_order(&f, "o-1", 2);

        let engine = f.engine.clone();
        let matching = tokio::spawn(async move { engine.run_matching("o-1").await });

        // p-1 stays silent
        wait_for_offer(&f, "o-1", "p-2").await;
        let late = f.engine.respond("p-1", "o-1", OfferResponse::Accept).unwrap_err();
        assert_eq!(late.code(), CommandErrorCode::OfferExpired);

        f.engine.respond("p-2", "o-1", OfferResponse::Accept).unwrap();
        assert_eq!(
            matching.await.unwrap().unwrap(),
            MatchOutcome::Assigned("p-2".to_string())
        );

        let events = f.manager.order_events("o-1").unwrap();
        let expired = events.iter().any(|e| {
            matches!(
                &e.payload,
                OrderEventPayload::AssignmentRejected { partner_id, outcome: OfferOutcome::Expired, .. }
                    if partner_id == "p-1"
            )
        });
        assert!(expired);
    }

    #[tokio::test]
    async fn test_rejection_then_flag_after_rounds() {
        let f = fixture(2_000, 1);
        online_partner(&f, "p-1", VehicleType::Scooter, north_of_shop(300.0));
        online_partner(&f, "p-2", VehicleType::Scooter, north_of_shop(600.0));
        confirmed_order(&f, "o-1", 2);

        let engine = f.engine.clone();
        let matching = tokio::spawn(async move { engine.run_matching("o-1").await });
        wait_for_offer(&f, "o-1", "p-1").await;
        f.engine.respond("p-1", "o-1", OfferResponse::Reject).unwrap();

        assert_eq!(
            matching.await.unwrap().unwrap(),
            MatchOutcome::Flagged { rounds: 1 }
        );
        let flagged = f.manager.list_unassigned().unwrap();
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].order_id, "o-1");
        // Not cancelled, still waiting for an admin
        assert_eq!(flagged[0].status, OrderStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_no_partners_flags_without_offers() {
        let f = fixture(20, 2);
        confirmed_order(&f, "o-1", 1);

        let outcome = f.engine.run_matching("o-1").await.unwrap();
        assert_eq!(outcome, MatchOutcome::Flagged { rounds: 2 });

        let types: Vec<OrderEventType> = f
            .manager
            .order_events("o-1")
            .unwrap()
            .iter()
            .map(|e| e.event_type)
            .collect();
        assert!(!types.contains(&OrderEventType::AssignmentOffered));
        assert!(types.contains(&OrderEventType::AssignmentUnresolved));
    }

    #[tokio::test]
    async fn test_cancellation_withdraws_offer() {
        let f = fixture(5_000, 3);
        online_partner(&f, "p-1", VehicleType::Scooter, north_of_shop(300.0));
        confirmed_order(&f, "o-1", 2);

        let engine = f.engine.clone();
        let matching = tokio::spawn(async move { engine.run_matching("o-1").await });
        wait_for_offer(&f, "o-1", "p-1").await;

        let mut events = f.manager.subscribe();
        execute(
            &f.manager,
            Actor::new("shop-1", "Spice Route", ActorRole::Shop),
            CommandPayload::TransitionOrder {
                order_id: "o-1".to_string(),
                target: OrderStatus::Cancelled,
                reason: Some("out of stock".to_string()),
            },
        );
        loop {
            let event = events.recv().await.unwrap();
            f.engine.handle_event(&event);
            if matches!(
                event.payload,
                OrderEventPayload::StatusChanged {
                    to: OrderStatus::Cancelled,
                    ..
                }
            ) {
                break;
            }
        }

        assert_eq!(matching.await.unwrap().unwrap(), MatchOutcome::Abandoned);
        let err = f.engine.respond("p-1", "o-1", OfferResponse::Accept).unwrap_err();
        assert_eq!(err.code(), CommandErrorCode::OfferExpired);
    }

    #[tokio::test]
    async fn test_stale_ledger_offer_expired_on_resume() {
        let f = fixture(2_000, 3);
        online_partner(&f, "p-1", VehicleType::Scooter, north_of_shop(300.0));
        online_partner(&f, "p-2", VehicleType::Scooter, north_of_shop(600.0));
        confirmed_order(&f, "o-1", 2);

        // Offer recorded by a process that is gone
        execute(
            &f.manager,
            Actor::system("previous-run"),
            CommandPayload::RecordOffer {
                order_id: "o-1".to_string(),
                partner_id: "p-1".to_string(),
                round: 1,
                distance_km: 0.3,
                expires_at: now_millis(),
            },
        );

        let engine = f.engine.clone();
        let matching = tokio::spawn(async move { engine.run_matching("o-1").await });
        wait_for_offer(&f, "o-1", "p-2").await;
        f.engine.respond("p-2", "o-1", OfferResponse::Accept).unwrap();
        assert_eq!(
            matching.await.unwrap().unwrap(),
            MatchOutcome::Assigned("p-2".to_string())
        );
    }

    #[tokio::test]
    async fn test_start_matching_runs_once_per_order() {
        let f = fixture(5_000, 3);
        online_partner(&f, "p-1", VehicleType::Scooter, north_of_shop(300.0));
        confirmed_order(&f, "o-1", 2);

        assert!(f.engine.start_matching("o-1"));
        assert!(!f.engine.start_matching("o-1"));
        wait_for_offer(&f, "o-1", "p-1").await;
        f.engine.respond("p-1", "o-1", OfferResponse::Accept).unwrap();
    }
}
