//! Fixtures shared by unit tests outside the ledger core

use rust_decimal::Decimal;
use shared::command::{CommandPayload, LedgerCommand, NewPaymentInput, PlaceOrderInput};
use shared::order::{
    Actor, ActorRole, DeliveryAddress, GeoPoint, LineItem, OrderStatus, PaymentMethod,
};
use shared::partner::{PartnerStatus, Vehicle, VehicleType};

use crate::orders::actions::ActionDefaults;
use crate::orders::{LedgerStorage, OrdersManager};

pub const SHOP_LOCATION: GeoPoint = GeoPoint {
    lat: 12.9716,
    lng: 77.5946,
};

pub fn manager() -> OrdersManager {
    OrdersManager::with_storage(
        LedgerStorage::open_in_memory().unwrap(),
        ActionDefaults {
            timezone: chrono_tz::Asia::Kolkata,
        },
    )
}

pub fn customer() -> Actor {
    Actor::new("cust-1", "Asha", ActorRole::Customer)
}

pub fn shop(shop_id: &str) -> Actor {
    Actor::new(shop_id, "Spice Route", ActorRole::Shop)
}

pub fn admin() -> Actor {
    Actor::new("admin-1", "Ops", ActorRole::Admin)
}

pub fn partner(partner_id: &str) -> Actor {
    Actor::new(partner_id, "Rider", ActorRole::Partner)
}

pub fn execute(manager: &OrdersManager, actor: Actor, payload: CommandPayload) {
    manager
        .execute(LedgerCommand::new(actor, payload))
        .expect("command should succeed");
}

/// Two units at 200 plus one at 100, delivery fee 30, taxes 20
pub fn order_input(shop_id: &str, payment: NewPaymentInput) -> PlaceOrderInput {
    PlaceOrderInput {
        shop_id: shop_id.to_string(),
        pickup: SHOP_LOCATION,
        items: vec![
            LineItem {
                product_id: "prod-1".to_string(),
                name: "Chicken Biryani".to_string(),
                quantity: 2,
                unit_price: Decimal::from(200),
            },
            LineItem {
                product_id: "prod-2".to_string(),
                name: "Gulab Jamun".to_string(),
                quantity: 1,
                unit_price: Decimal::from(100),
            },
        ],
        delivery_address: DeliveryAddress {
            line1: "12 MG Road".to_string(),
            line2: None,
            city: "Bengaluru".to_string(),
            postal_code: "560001".to_string(),
            contact_phone: None,
            location: Some(GeoPoint::new(12.975, 77.605)),
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

pub fn place_order(manager: &OrdersManager, order_id: &str, input: PlaceOrderInput) {
    execute(
        manager,
        customer(),
        CommandPayload::PlaceOrder {
            order_id: order_id.to_string(),
            input,
        },
    );
}

pub fn transition(manager: &OrdersManager, actor: Actor, order_id: &str, target: OrderStatus) {
    execute(
        manager,
        actor,
        CommandPayload::TransitionOrder {
            order_id: order_id.to_string(),
            target,
            reason: None,
        },
    );
}

/// Registered and online
pub fn register_partner(manager: &OrdersManager, partner_id: &str) {
    execute(
        manager,
        admin(),
        CommandPayload::RegisterPartner {
            partner_id: partner_id.to_string(),
            name: format!("Rider {}", partner_id),
            phone: "+91-9000000000".to_string(),
            vehicle: Vehicle {
                kind: VehicleType::Scooter,
                number: "KA01AB1234".to_string(),
            },
            timezone: None,
        },
    );
    execute(
        manager,
        partner(partner_id),
        CommandPayload::SetPartnerAvailability {
            partner_id: partner_id.to_string(),
            status: PartnerStatus::Online,
        },
    );
}

/// Take a placed cash order through assignment to delivered
pub fn deliver(manager: &OrdersManager, order_id: &str, shop_id: &str, partner_id: &str) {
    transition(manager, shop(shop_id), order_id, OrderStatus::Confirmed);
    execute(
        manager,
        Actor::system("test"),
        CommandPayload::RecordOffer {
            order_id: order_id.to_string(),
            partner_id: partner_id.to_string(),
            round: 1,
            distance_km: 1.0,
            expires_at: shared::util::now_millis() + 30_000,
        },
    );
    execute(
        manager,
        partner(partner_id),
        CommandPayload::AssignPartner {
            order_id: order_id.to_string(),
            partner_id: partner_id.to_string(),
            manual: false,
        },
    );
    transition(manager, shop(shop_id), order_id, OrderStatus::Preparing);
    transition(manager, partner(partner_id), order_id, OrderStatus::OutForDelivery);
    transition(manager, partner(partner_id), order_id, OrderStatus::Delivered);
}
