use super::*;
use rust_decimal::Decimal;
use shared::command::{CommandErrorCode, CommandPayload, NewPaymentInput, PlaceOrderInput};
use shared::order::{
    Actor, ActorRole, DeliveryAddress, GeoPoint, LineItem, OrderEventType, OrderStatus,
    PaymentMethod, PaymentStatus,
};
use shared::partner::{PartnerStatus, Vehicle, VehicleType};

mod test_lifecycle;
mod test_payments;

fn create_test_manager() -> OrdersManager {
    let storage = LedgerStorage::open_in_memory().unwrap();
    OrdersManager::with_storage(
        storage,
        ActionDefaults {
            timezone: chrono_tz::Asia::Kolkata,
        },
    )
}

fn customer() -> Actor {
    Actor::new("cust-1", "Asha", ActorRole::Customer)
}

fn shop() -> Actor {
    Actor::new("shop-1", "Spice Route", ActorRole::Shop)
}

fn admin() -> Actor {
    Actor::new("admin-1", "Ops", ActorRole::Admin)
}

fn system() -> Actor {
    Actor::system("test-worker")
}

fn partner_actor(partner_id: &str) -> Actor {
    Actor::new(partner_id, "Rider", ActorRole::Partner)
}

fn run(manager: &OrdersManager, actor: Actor, payload: CommandPayload) -> CommandResponse {
    manager.execute_command(LedgerCommand::new(actor, payload))
}

fn assert_ok(response: &CommandResponse) {
    assert!(response.success, "command failed: {:?}", response.error);
}

fn error_code(response: &CommandResponse) -> CommandErrorCode {
    response.error.as_ref().expect("expected an error").code
}

/// 500 in items + 30 delivery + 20 taxes
fn order_input(payment: NewPaymentInput) -> PlaceOrderInput {
    PlaceOrderInput {
        shop_id: "shop-1".to_string(),
        pickup: GeoPoint::new(12.9716, 77.5946),
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
            line2: Some("Flat 4B".to_string()),
            city: "Bengaluru".to_string(),
            postal_code: "560001".to_string(),
            contact_phone: Some("+91-9800000000".to_string()),
            location: Some(GeoPoint::new(12.975, 77.605)),
        },
        delivery_fee: Decimal::from(30),
        taxes: Decimal::from(20),
        payment,
    }
}

fn place_cod_order(manager: &OrdersManager, order_id: &str) {
    let response = run(
        manager,
        customer(),
        CommandPayload::PlaceOrder {
            order_id: order_id.to_string(),
            input: order_input(NewPaymentInput {
                method: PaymentMethod::CashOnDelivery,
                razorpay_order_id: None,
            }),
        },
    );
    assert_ok(&response);
}

fn place_online_order(manager: &OrdersManager, order_id: &str, reference: &str) {
    let response = run(
        manager,
        customer(),
        CommandPayload::PlaceOrder {
            order_id: order_id.to_string(),
            input: order_input(NewPaymentInput {
                method: PaymentMethod::Online,
                razorpay_order_id: Some(reference.to_string()),
            }),
        },
    );
    assert_ok(&response);
}

fn transition(manager: &OrdersManager, actor: Actor, order_id: &str, target: OrderStatus) -> CommandResponse {
    run(
        manager,
        actor,
        CommandPayload::TransitionOrder {
            order_id: order_id.to_string(),
            target,
            reason: None,
        },
    )
}

fn register_online_partner(manager: &OrdersManager, partner_id: &str) {
    assert_ok(&run(
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
    ));
    assert_ok(&run(
        manager,
        partner_actor(partner_id),
        CommandPayload::SetPartnerAvailability {
            partner_id: partner_id.to_string(),
            status: PartnerStatus::Online,
        },
    ));
}

fn offer(manager: &OrdersManager, order_id: &str, partner_id: &str, round: u32) -> CommandResponse {
    run(
        manager,
        system(),
        CommandPayload::RecordOffer {
            order_id: order_id.to_string(),
            partner_id: partner_id.to_string(),
            round,
            distance_km: 1.2,
            expires_at: shared::util::now_millis() + 30_000,
        },
    )
}

fn accept(manager: &OrdersManager, order_id: &str, partner_id: &str) -> CommandResponse {
    run(
        manager,
        partner_actor(partner_id),
        CommandPayload::AssignPartner {
            order_id: order_id.to_string(),
            partner_id: partner_id.to_string(),
            manual: false,
        },
    )
}

/// COD order confirmed by the shop and accepted by `partner_id`
fn assigned_order(manager: &OrdersManager, order_id: &str, partner_id: &str) {
    place_cod_order(manager, order_id);
    assert_ok(&transition(manager, shop(), order_id, OrderStatus::Confirmed));
    assert_ok(&offer(manager, order_id, partner_id, 1));
    assert_ok(&accept(manager, order_id, partner_id));
}

/// Assigned order taken all the way to delivered
fn delivered_order(manager: &OrdersManager, order_id: &str, partner_id: &str) {
    assigned_order(manager, order_id, partner_id);
    assert_ok(&transition(manager, shop(), order_id, OrderStatus::Preparing));
    assert_ok(&transition(
        manager,
        partner_actor(partner_id),
        order_id,
        OrderStatus::OutForDelivery,
    ));
    assert_ok(&transition(
        manager,
        partner_actor(partner_id),
        order_id,
        OrderStatus::Delivered,
    ));
}

fn event_types(manager: &OrdersManager, order_id: &str) -> Vec<OrderEventType> {
    manager
        .order_events(order_id)
        .unwrap()
        .iter()
        .map(|e| e.event_type)
        .collect()
}
