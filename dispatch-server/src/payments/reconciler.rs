//! Gateway callback handling
//!
//! ```text
//! callback → signature check → reference lookup → ApplyPaymentOutcome
//! ```
//!
//! The command id is derived from the reference and the reported status, so
//! a redelivered callback is recognised before it reaches the order.

use serde::{Deserialize, Serialize};
use shared::command::{CommandPayload, LedgerCommand};
use shared::order::{Actor, OrderSnapshot, PaymentStatus};

use super::PaymentsConfig;
use super::signature;
use crate::orders::{ManagerError, ManagerResult, OrderError, OrdersManager};

/// Payment gateway callback body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentCallback {
    pub razorpay_order_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub razorpay_payment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub razorpay_signature: Option<String>,
    pub status: PaymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

impl PaymentCallback {
    fn command_id(&self) -> String {
        let status = match self.status {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Success => "success",
            PaymentStatus::Failed => "failed",
        };
        format!("payment-{}-{}", self.razorpay_order_id, status)
    }
}

#[derive(Debug, Clone)]
pub struct PaymentReconciler {
    manager: OrdersManager,
    config: PaymentsConfig,
}

impl PaymentReconciler {
    pub fn new(manager: OrdersManager, config: PaymentsConfig) -> Self {
        Self { manager, config }
    }

    fn verify_signature(&self, callback: &PaymentCallback) -> ManagerResult<()> {
        let Some(secret) = self.config.webhook_secret.as_deref() else {
            return Ok(());
        };
        let payment_id = callback.razorpay_payment_id.as_deref().unwrap_or_default();
        let provided = callback.razorpay_signature.as_deref().unwrap_or_default();

        signature::verify(secret, &callback.razorpay_order_id, payment_id, provided).map_err(
            |reason| {
                tracing::warn!(
                    razorpay_order_id = %callback.razorpay_order_id,
                    reason,
                    "Rejected payment callback"
                );
                ManagerError::Domain(OrderError::PermissionDenied(format!(
                    "invalid payment signature: {}",
                    reason
                )))
            },
        )
    }

    /// Apply a gateway outcome to the order it belongs to
    pub fn handle_callback(&self, callback: &PaymentCallback) -> ManagerResult<OrderSnapshot> {
        self.verify_signature(callback)?;

        let order_id = self
            .manager
            .find_order_by_payment_ref(&callback.razorpay_order_id)
            .inspect_err(|_| {
                tracing::warn!(
                    razorpay_order_id = %callback.razorpay_order_id,
                    "Payment callback for an unknown reference"
                );
            })?;

        if callback.status == PaymentStatus::Failed {
            tracing::info!(
                order_id = %order_id,
                razorpay_order_id = %callback.razorpay_order_id,
                reason = ?callback.error_description,
                "Payment failed"
            );
        }

        let response = self.manager.execute(LedgerCommand::with_id(
            callback.command_id(),
            Actor::system("payment-reconciler"),
            CommandPayload::ApplyPaymentOutcome {
                order_id: order_id.clone(),
                razorpay_order_id: callback.razorpay_order_id.clone(),
                razorpay_payment_id: callback.razorpay_payment_id.clone(),
                status: callback.status,
            },
        ))?;
        if response.duplicate {
            tracing::debug!(order_id = %order_id, "Duplicate payment callback absorbed");
        }

        self.manager
            .get_order(&order_id)?
            .ok_or(ManagerError::OrderNotFound(order_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use shared::command::CommandErrorCode;
    use shared::order::{OrderEventType, OrderStatus};

    fn callback(reference: &str, status: PaymentStatus) -> PaymentCallback {
        PaymentCallback {
            razorpay_order_id: reference.to_string(),
            razorpay_payment_id: Some("pay_1".to_string()),
            razorpay_signature: None,
            status,
            error_description: None,
        }
    }

    fn reconciler(manager: &OrdersManager, secret: Option<&str>) -> PaymentReconciler {
        PaymentReconciler::new(
            manager.clone(),
            PaymentsConfig {
                webhook_secret: secret.map(str::to_string),
            },
        )
    }

    #[test]
    fn test_success_confirms_order() {
        let manager = manager();
        place_order(&manager, "o-1", order_input("shop-1", online("order_rzp_1")));

        let order = reconciler(&manager, None)
            .handle_callback(&callback("order_rzp_1", PaymentStatus::Success))
            .unwrap();
        assert_eq!(order.payment.status, PaymentStatus::Success);
        assert_eq!(order.payment.razorpay_payment_id.as_deref(), Some("pay_1"));
        assert_eq!(order.status, OrderStatus::Confirmed);
    }

    #[test]
    fn test_replayed_callback_applies_once() {
        let manager = manager();
        place_order(&manager, "o-1", order_input("shop-1", online("order_rzp_1")));
        let reconciler = reconciler(&manager, None);

        let success = callback("order_rzp_1", PaymentStatus::Success);
        reconciler.handle_callback(&success).unwrap();
        reconciler.handle_callback(&success).unwrap();

        let transitions = manager
            .order_events("o-1")
            .unwrap()
            .iter()
            .filter(|e| e.event_type == OrderEventType::StatusChanged)
            .count();
        assert_eq!(transitions, 1);
    }

    #[test]
    fn test_failure_keeps_order_pending() {
        let manager = manager();
        place_order(&manager, "o-1", order_input("shop-1", online("order_rzp_1")));

        let mut failed = callback("order_rzp_1", PaymentStatus::Failed);
        failed.razorpay_payment_id = None;
        failed.error_description = Some("card declined".to_string());
        let order = reconciler(&manager, None).handle_callback(&failed).unwrap();
        assert_eq!(order.payment.status, PaymentStatus::Failed);
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[test]
    fn test_unknown_reference() {
        let manager = manager();
        let err = reconciler(&manager, None)
            .handle_callback(&callback("order_missing", PaymentStatus::Success))
            .unwrap_err();
        assert_eq!(err.code(), CommandErrorCode::UnknownPaymentReference);
    }

    #[test]
    fn test_signature_required_with_secret() {
        let manager = manager();
        place_order(&manager, "o-1", order_input("shop-1", online("order_rzp_1")));
        let reconciler = reconciler(&manager, Some("whsec"));

        let unsigned = callback("order_rzp_1", PaymentStatus::Success);
        let err = reconciler.handle_callback(&unsigned).unwrap_err();
        assert_eq!(err.code(), CommandErrorCode::PermissionDenied);
        let order = manager.get_order("o-1").unwrap().unwrap();
        assert_eq!(order.payment.status, PaymentStatus::Pending);

        let mut signed = unsigned.clone();
        signed.razorpay_signature = Some(signature::sign("whsec", "order_rzp_1", "pay_1"));
        let order = reconciler.handle_callback(&signed).unwrap();
        assert_eq!(order.payment.status, PaymentStatus::Success);
    }

    #[test]
    fn test_callback_wire_format() {
        let json = r#"{"razorpay_order_id":"order_rzp_1","razorpay_payment_id":"pay_9","status":"success"}"#;
        let parsed: PaymentCallback = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.status, PaymentStatus::Success);
        assert!(parsed.razorpay_signature.is_none());
    }
}
