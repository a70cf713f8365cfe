use super::*;

fn outcome(
    manager: &OrdersManager,
    order_id: &str,
    reference: &str,
    status: PaymentStatus,
) -> CommandResponse {
    run(
        manager,
        system(),
        CommandPayload::ApplyPaymentOutcome {
            order_id: order_id.to_string(),
            razorpay_order_id: reference.to_string(),
            razorpay_payment_id: Some(format!("pay_{}", reference)),
            status,
        },
    )
}

#[test]
fn test_online_order_waits_for_payment() {
    let manager = create_test_manager();
    place_online_order(&manager, "o-1", "order_rzp_1");

    let response = transition(&manager, shop(), "o-1", OrderStatus::Confirmed);
    assert_eq!(error_code(&response), CommandErrorCode::InvalidOperation);
    assert_eq!(manager.find_order_by_payment_ref("order_rzp_1").unwrap(), "o-1");
}

#[test]
fn test_success_confirms_order() {
    let manager = create_test_manager();
    place_online_order(&manager, "o-1", "order_rzp_1");

    assert_ok(&outcome(&manager, "o-1", "order_rzp_1", PaymentStatus::Success));

    let order = manager.get_order("o-1").unwrap().unwrap();
    assert_eq!(order.payment.status, PaymentStatus::Success);
    assert_eq!(order.status, OrderStatus::Confirmed);
    assert_eq!(
        event_types(&manager, "o-1"),
        vec![
            OrderEventType::OrderPlaced,
            OrderEventType::PaymentUpdated,
            OrderEventType::StatusChanged,
        ]
    );
}

#[test]
fn test_replayed_outcome_applies_once() {
    let manager = create_test_manager();
    place_online_order(&manager, "o-1", "order_rzp_1");

    assert_ok(&outcome(&manager, "o-1", "order_rzp_1", PaymentStatus::Success));
    assert_ok(&outcome(&manager, "o-1", "order_rzp_1", PaymentStatus::Success));

    let payment_events = event_types(&manager, "o-1")
        .into_iter()
        .filter(|t| *t == OrderEventType::PaymentUpdated)
        .count();
    assert_eq!(payment_events, 1);
}

#[test]
fn test_failure_keeps_order_pending() {
    let manager = create_test_manager();
    place_online_order(&manager, "o-1", "order_rzp_1");

    assert_ok(&outcome(&manager, "o-1", "order_rzp_1", PaymentStatus::Failed));
    // A late success for the failed attempt does not flip it
    assert_ok(&outcome(&manager, "o-1", "order_rzp_1", PaymentStatus::Success));

    let order = manager.get_order("o-1").unwrap().unwrap();
    assert_eq!(order.payment.status, PaymentStatus::Failed);
    assert_eq!(order.status, OrderStatus::Pending);
}

#[test]
fn test_retry_after_failure() {
    let manager = create_test_manager();
    place_online_order(&manager, "o-1", "order_rzp_1");
    assert_ok(&outcome(&manager, "o-1", "order_rzp_1", PaymentStatus::Failed));

    assert_ok(&run(
        &manager,
        customer(),
        CommandPayload::RetryPayment {
            order_id: "o-1".to_string(),
            razorpay_order_id: "order_rzp_2".to_string(),
        },
    ));
    let order = manager.get_order("o-1").unwrap().unwrap();
    assert_eq!(order.payment.status, PaymentStatus::Pending);
    assert_eq!(order.payment.attempts, 2);
    assert_eq!(manager.find_order_by_payment_ref("order_rzp_2").unwrap(), "o-1");

    // Outcome for the superseded reference is ignored
    assert_ok(&outcome(&manager, "o-1", "order_rzp_1", PaymentStatus::Success));
    assert_eq!(
        manager.get_order("o-1").unwrap().unwrap().status,
        OrderStatus::Pending
    );

    assert_ok(&outcome(&manager, "o-1", "order_rzp_2", PaymentStatus::Success));
    assert_eq!(
        manager.get_order("o-1").unwrap().unwrap().status,
        OrderStatus::Confirmed
    );
}

#[test]
fn test_retry_requires_failed_payment() {
    let manager = create_test_manager();
    place_online_order(&manager, "o-1", "order_rzp_1");

    let response = run(
        &manager,
        customer(),
        CommandPayload::RetryPayment {
            order_id: "o-1".to_string(),
            razorpay_order_id: "order_rzp_2".to_string(),
        },
    );
    assert!(!response.success);
}

#[test]
fn test_unknown_reference() {
    let manager = create_test_manager();
    let err = manager.find_order_by_payment_ref("order_rzp_x").unwrap_err();
    assert_eq!(err.code(), CommandErrorCode::UnknownPaymentReference);
}

#[test]
fn test_customer_cannot_report_outcome() {
    let manager = create_test_manager();
    place_online_order(&manager, "o-1", "order_rzp_1");

    let response = run(
        &manager,
        customer(),
        CommandPayload::ApplyPaymentOutcome {
            order_id: "o-1".to_string(),
            razorpay_order_id: "order_rzp_1".to_string(),
            razorpay_payment_id: None,
            status: PaymentStatus::Success,
        },
    );
    assert_eq!(error_code(&response), CommandErrorCode::PermissionDenied);
}
