//! Order snapshot - current state projected from the order's event stream
//!
//! The snapshot includes a `state_checksum` field for drift detection: an
//! audit replay recomputes the projection from events and compares checksums.

use super::types::{
    AssignmentState, DeliveryAddress, GeoPoint, LineItem, MoneyBreakdown, PaymentInfo,
    PaymentMethod, PaymentStatus,
};
use serde::{Deserialize, Serialize};
use std::hash::Hash;

/// Order lifecycle status
///
/// `Pending -> Confirmed -> Preparing -> OutForDelivery -> Delivered`, with
/// `Cancelled` reachable from the first three. `Delivered` and `Cancelled`
/// are terminal.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Preparing,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Statuses in which the order may hold or change a partner
    pub fn is_assignable(&self) -> bool {
        matches!(self, OrderStatus::Confirmed | OrderStatus::Preparing)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::OutForDelivery => "out_for_delivery",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order snapshot - computed from event stream
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderSnapshot {
    pub order_id: String,
    pub user_id: String,
    pub shop_id: String,
    /// Shop location at the time the order was placed (matching origin)
    pub pickup: GeoPoint,
    pub items: Vec<LineItem>,
    pub status: OrderStatus,
    pub delivery_address: DeliveryAddress,
    pub money: MoneyBreakdown,
    pub payment: PaymentInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_partner_id: Option<String>,
    #[serde(default)]
    pub assignment: AssignmentState,
    /// Customer rating of the delivery (1-5), at most once
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
    /// Last applied event sequence
    pub last_sequence: u64,
    /// Checksum over the key state fields (hex string)
    #[serde(default)]
    pub state_checksum: String,
}

impl OrderSnapshot {
    /// Create an empty projection; `OrderPlaced` fills it in
    pub fn new(order_id: String) -> Self {
        let mut snapshot = Self {
            order_id,
            user_id: String::new(),
            shop_id: String::new(),
            pickup: GeoPoint::new(0.0, 0.0),
            items: Vec::new(),
            status: OrderStatus::Pending,
            delivery_address: DeliveryAddress {
                line1: String::new(),
                line2: None,
                city: String::new(),
                postal_code: String::new(),
                contact_phone: None,
                location: None,
            },
            money: MoneyBreakdown::default(),
            payment: PaymentInfo {
                method: PaymentMethod::Online,
                razorpay_order_id: None,
                razorpay_payment_id: None,
                status: PaymentStatus::Pending,
                attempts: 0,
                updated_at: 0,
            },
            delivery_partner_id: None,
            assignment: AssignmentState::default(),
            rating: None,
            cancel_reason: None,
            delivered_at: None,
            created_at: 0,
            updated_at: 0,
            last_sequence: 0,
            state_checksum: String::new(),
        };
        snapshot.update_checksum();
        snapshot
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Order size used for vehicle capacity checks (total item quantity)
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Confirmed or preparing, with no partner and no flag
    pub fn needs_partner(&self) -> bool {
        self.status.is_assignable()
            && self.delivery_partner_id.is_none()
            && self.assignment.flag.is_none()
    }

    /// Compute state checksum for drift detection
    ///
    /// Covers item count, grand total, status, payment status, partner,
    /// rating and last sequence. Returns a 16-character hex string.
    pub fn compute_checksum(&self) -> String {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::Hasher as _;

        let mut hasher = DefaultHasher::new();
        self.items.len().hash(&mut hasher);
        self.money.grand_total.normalize().to_string().hash(&mut hasher);
        self.status.hash(&mut hasher);
        (self.payment.status as u8).hash(&mut hasher);
        self.delivery_partner_id.hash(&mut hasher);
        self.rating.hash(&mut hasher);
        self.last_sequence.hash(&mut hasher);
        format!("{:016x}", hasher.finish())
    }

    pub fn update_checksum(&mut self) {
        self.state_checksum = self.compute_checksum();
    }

    /// Returns false if the stored checksum no longer matches the state
    pub fn verify_checksum(&self) -> bool {
        self.state_checksum == self.compute_checksum()
    }
}
