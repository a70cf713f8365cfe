//! Fixtures for engine-level integration tests
#![allow(dead_code)]

use dispatch_server::assignment::AssignmentConfig;
use dispatch_server::earnings::{EarningsConfig, FeeSharePolicy};
use dispatch_server::orders::LedgerStorage;
use dispatch_server::payments::{PaymentCallback, PaymentsConfig};
use dispatch_server::{DispatchEngine, EngineSettings, NewPartner, OrdersManager};
use rust_decimal::Decimal;
use shared::command::{NewPaymentInput, PlaceOrderInput};
use shared::order::{
    Actor, ActorRole, DeliveryAddress, GeoPoint, LineItem, OrderStatus, PaymentMethod,
    PaymentStatus,
};
use shared::partner::{PartnerStatus, Vehicle, VehicleType};
use std::time::Duration;

pub const PICKUP: GeoPoint = GeoPoint {
    lat: 12.9716,
    lng: 77.5946,
};

/// About 1.2 km north of the pickup
pub const NEARBY: GeoPoint = GeoPoint {
    lat: 12.9824,
    lng: 77.5946,
};

pub fn settings(acceptance_window: Duration) -> EngineSettings {
    EngineSettings {
        business_timezone: chrono_tz::Asia::Kolkata,
        assignment: AssignmentConfig {
            radius_km: 5.0,
            acceptance_window,
            offer_rounds: 3,
            location_timeout: Duration::from_millis(200),
            ..AssignmentConfig::default()
        },
        earnings: EarningsConfig {
            fee_share: FeeSharePolicy::Percentage(Decimal::from(80)),
            rollover_check_interval: Duration::from_secs(60),
        },
        payments: PaymentsConfig::default(),
    }
}

pub fn engine(acceptance_window: Duration) -> DispatchEngine {
    let settings = settings(acceptance_window);
    let manager = OrdersManager::with_storage(
        LedgerStorage::open_in_memory().unwrap(),
        settings.action_defaults(),
    );
    DispatchEngine::new(manager, settings)
}

pub fn customer() -> Actor {
    Actor::new("cust-1", "Asha", ActorRole::Customer)
}

pub fn shop() -> Actor {
    Actor::new("shop-1", "Spice Route", ActorRole::Shop)
}

pub fn admin() -> Actor {
    Actor::new("admin-1", "Ops", ActorRole::Admin)
}

pub fn partner(id: &str) -> Actor {
    Actor::new(id, format!("Rider {}", id), ActorRole::Partner)
}

/// Item total 500, delivery fee 30, taxes 20
pub fn order_input(payment: NewPaymentInput) -> PlaceOrderInput {
    PlaceOrderInput {
        shop_id: "shop-1".to_string(),
        pickup: PICKUP,
        items: vec![
            LineItem {
                product_id: "prod-1".to_string(),
                name: "Masala Dosa".to_string(),
                quantity: 2,
                unit_price: Decimal::from(150),
            },
            LineItem {
                product_id: "prod-2".to_string(),
                name: "Filter Coffee".to_string(),
                quantity: 4,
                unit_price: Decimal::from(50),
            },
        ],
        delivery_address: DeliveryAddress {
            line1: "42 Residency Road".to_string(),
            line2: None,
            city: "Bengaluru".to_string(),
            postal_code: "560025".to_string(),
            contact_phone: Some("+91-9800000000".to_string()),
            location: Some(GeoPoint::new(12.9680, 77.6010)),
        },
        delivery_fee: Decimal::from(30),
        taxes: Decimal::from(20),
        payment,
    }
}

pub fn cash() -> NewPaymentInput {
    NewPaymentInput {
        method: PaymentMethod::CashOnDelivery,
        razorpay_order_id: None,
    }
}

pub fn online(reference: &str) -> NewPaymentInput {
    NewPaymentInput {
        method: PaymentMethod::Online,
        razorpay_order_id: Some(reference.to_string()),
    }
}

pub fn callback(reference: &str, status: PaymentStatus) -> PaymentCallback {
    PaymentCallback {
        razorpay_order_id: reference.to_string(),
        razorpay_payment_id: Some(format!("pay_{}", reference)),
        razorpay_signature: None,
        status,
        error_description: None,
    }
}

/// Registered, online and parked at `location`
pub fn onboard_partner(engine: &DispatchEngine, id: &str, location: GeoPoint) {
    engine
        .register_partner(
            &admin(),
            NewPartner {
                partner_id: Some(id.to_string()),
                name: format!("Rider {}", id),
                phone: "+91-9000000000".to_string(),
                vehicle: Vehicle {
                    kind: VehicleType::Motorcycle,
                    number: format!("KA-05-{}", id),
                },
                timezone: None,
            },
        )
        .unwrap();
    engine
        .record_partner_heartbeat(
            &partner(id),
            id,
            location.lat,
            location.lng,
            Some(PartnerStatus::Online),
        )
        .unwrap();
}

/// Deliver a cash order by manual assignment and leave a customer rating
pub fn complete_rated_delivery(engine: &DispatchEngine, order_id: &str, partner_id: &str, rating: u8) {
    engine
        .place_order_with_id(&customer(), order_id, order_input(cash()))
        .unwrap();
    engine
        .transition_order(&shop(), order_id, OrderStatus::Confirmed, None)
        .unwrap();
    engine.assign_partner(&admin(), order_id, partner_id).unwrap();
    engine
        .transition_order(&shop(), order_id, OrderStatus::Preparing, None)
        .unwrap();
    engine
        .transition_order(&partner(partner_id), order_id, OrderStatus::OutForDelivery, None)
        .unwrap();
    engine
        .transition_order(&partner(partner_id), order_id, OrderStatus::Delivered, None)
        .unwrap();
    engine.rate_delivery(&customer(), order_id, rating).unwrap();
}

/// Poll `condition` every 10 ms until it holds or `timeout` passes
pub async fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
