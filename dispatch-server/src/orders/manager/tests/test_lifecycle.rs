use super::*;

#[test]
fn test_place_order_starts_pending() {
    let manager = create_test_manager();
    place_cod_order(&manager, "o-1");

    let order = manager.get_order("o-1").unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.user_id, "cust-1");
    assert_eq!(order.money.item_total, Decimal::from(500));
    assert_eq!(order.money.grand_total, Decimal::from(550));
    assert!(order.money.is_consistent());
    assert_eq!(event_types(&manager, "o-1"), vec![OrderEventType::OrderPlaced]);
}

#[test]
fn test_duplicate_order_id_rejected() {
    let manager = create_test_manager();
    place_cod_order(&manager, "o-1");

    let response = run(
        &manager,
        customer(),
        CommandPayload::PlaceOrder {
            order_id: "o-1".to_string(),
            input: order_input(NewPaymentInput {
                method: PaymentMethod::CashOnDelivery,
                razorpay_order_id: None,
            }),
        },
    );
    assert!(!response.success);
    assert_eq!(manager.order_events("o-1").unwrap().len(), 1);
}

#[test]
fn test_oversized_charges_rejected_without_commit() {
    let manager = create_test_manager();
    let mut input = order_input(NewPaymentInput {
        method: PaymentMethod::CashOnDelivery,
        razorpay_order_id: None,
    });
    input.delivery_fee = Decimal::MAX;
    input.taxes = Decimal::MAX;

    let response = run(
        &manager,
        customer(),
        CommandPayload::PlaceOrder {
            order_id: "o-big".to_string(),
            input,
        },
    );
    assert!(!response.success);
    assert_eq!(error_code(&response), CommandErrorCode::ValidationFailed);
    assert!(manager.get_order("o-big").unwrap().is_none());

    // The ledger is still writable afterwards
    place_cod_order(&manager, "o-1");
}

#[test]
fn test_confirm_twice_records_one_event() {
    let manager = create_test_manager();
    place_cod_order(&manager, "o-1");

    assert_ok(&transition(&manager, shop(), "o-1", OrderStatus::Confirmed));
    let second = transition(&manager, shop(), "o-1", OrderStatus::Confirmed);
    assert_ok(&second);
    assert!(!second.duplicate);

    assert_eq!(
        event_types(&manager, "o-1"),
        vec![OrderEventType::OrderPlaced, OrderEventType::StatusChanged]
    );
}

#[test]
fn test_repeat_of_current_status_checks_the_actor() {
    let manager = create_test_manager();
    place_cod_order(&manager, "o-1");
    assert_ok(&transition(&manager, shop(), "o-1", OrderStatus::Confirmed));

    let stranger = Actor::new("cust-999", "Vikram", ActorRole::Customer);
    let response = transition(&manager, stranger, "o-1", OrderStatus::Confirmed);
    assert!(!response.success);
    assert_eq!(error_code(&response), CommandErrorCode::InvalidTransition);

    let response = transition(&manager, partner_actor("p-x"), "o-1", OrderStatus::Confirmed);
    assert!(!response.success);
    assert_eq!(error_code(&response), CommandErrorCode::InvalidTransition);

    assert_eq!(manager.order_events("o-1").unwrap().len(), 2);
}

#[test]
fn test_replayed_command_id_is_duplicate() {
    let manager = create_test_manager();
    place_cod_order(&manager, "o-1");

    let cmd = LedgerCommand::new(
        shop(),
        CommandPayload::TransitionOrder {
            order_id: "o-1".to_string(),
            target: OrderStatus::Confirmed,
            reason: None,
        },
    );
    assert_ok(&manager.execute_command(cmd.clone()));
    let replay = manager.execute_command(cmd);
    assert!(replay.success);
    assert!(replay.duplicate);
    assert_eq!(manager.order_events("o-1").unwrap().len(), 2);
}

#[test]
fn test_cannot_skip_to_out_for_delivery() {
    let manager = create_test_manager();
    place_cod_order(&manager, "o-1");

    let response = transition(&manager, admin(), "o-1", OrderStatus::OutForDelivery);
    assert_eq!(error_code(&response), CommandErrorCode::InvalidTransition);

    let order = manager.get_order("o-1").unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(manager.order_events("o-1").unwrap().len(), 1);
}

#[test]
fn test_unknown_order_not_found() {
    let manager = create_test_manager();
    let response = transition(&manager, shop(), "missing", OrderStatus::Confirmed);
    assert_eq!(error_code(&response), CommandErrorCode::NotFound);
}

#[test]
fn test_full_delivery_releases_partner() {
    let manager = create_test_manager();
    register_online_partner(&manager, "p-1");
    delivered_order(&manager, "o-1", "p-1");

    let order = manager.get_order("o-1").unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Delivered);
    assert!(order.delivered_at.is_some());
    assert_eq!(order.delivery_partner_id.as_deref(), Some("p-1"));

    let partner = manager.get_partner("p-1").unwrap().unwrap();
    assert_eq!(partner.status, PartnerStatus::Online);
    assert!(partner.active_order_id.is_none());

    let statuses: Vec<OrderStatus> = manager
        .order_events("o-1")
        .unwrap()
        .iter()
        .filter_map(|e| e.new_status())
        .collect();
    assert_eq!(
        statuses,
        vec![
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::OutForDelivery,
            OrderStatus::Delivered,
        ]
    );
}

#[test]
fn test_cancel_releases_partner() {
    let manager = create_test_manager();
    register_online_partner(&manager, "p-1");
    assigned_order(&manager, "o-1", "p-1");
    assert_eq!(
        manager.get_partner("p-1").unwrap().unwrap().status,
        PartnerStatus::Busy
    );

    assert_ok(&transition(&manager, shop(), "o-1", OrderStatus::Cancelled));

    let partner = manager.get_partner("p-1").unwrap().unwrap();
    assert_eq!(partner.status, PartnerStatus::Online);
    assert!(partner.active_order_id.is_none());
}

#[test]
fn test_sequences_increase_per_order() {
    let manager = create_test_manager();
    register_online_partner(&manager, "p-1");
    place_cod_order(&manager, "o-2");
    delivered_order(&manager, "o-1", "p-1");

    let sequences: Vec<u64> = manager
        .order_events("o-1")
        .unwrap()
        .iter()
        .map(|e| e.sequence)
        .collect();
    assert!(sequences.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(
        manager.current_sequence().unwrap(),
        manager.stats().unwrap().current_sequence
    );
}

#[test]
fn test_replay_matches_projection() {
    let manager = create_test_manager();
    register_online_partner(&manager, "p-1");
    delivered_order(&manager, "o-1", "p-1");

    assert!(manager.verify_order("o-1").unwrap());
    assert!(manager.verify_partner("p-1").unwrap());
}

#[tokio::test]
async fn test_committed_events_are_broadcast() {
    let manager = create_test_manager();
    let mut rx = manager.subscribe();

    place_cod_order(&manager, "o-1");
    assert_ok(&transition(&manager, shop(), "o-1", OrderStatus::Confirmed));

    let first = rx.recv().await.unwrap();
    let second = rx.recv().await.unwrap();
    assert_eq!(first.event_type, OrderEventType::OrderPlaced);
    assert_eq!(second.new_status(), Some(OrderStatus::Confirmed));
}
