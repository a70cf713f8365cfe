//! Payment Reconciler
//!
//! Gateway callbacks are resolved to orders through the payment reference
//! index and applied as ledger commands. Duplicate and out-of-order
//! callbacks are absorbed by the command id and by the one-way payment
//! status.

pub mod reconciler;
pub mod signature;

pub use reconciler::{PaymentCallback, PaymentReconciler};

#[derive(Debug, Clone, Default)]
pub struct PaymentsConfig {
    /// Shared secret for callback signatures; verification is off without it
    pub webhook_secret: Option<String>,
}
