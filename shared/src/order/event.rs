//! Order events - immutable facts recorded after command processing

use super::snapshot::OrderStatus;
use super::types::{
    ActorRole, DeliveryAddress, GeoPoint, LineItem, MoneyBreakdown, OfferOutcome, PaymentInfo,
    PaymentStatus,
};
use serde::{Deserialize, Serialize};

/// Order event - immutable audit record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderEvent {
    pub event_id: String,
    /// Global sequence number; strictly increasing within one order's stream
    pub sequence: u64,
    pub order_id: String,
    /// Server timestamp (Unix milliseconds), authoritative
    pub timestamp: i64,
    /// Client timestamp from the command, kept for audit only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_timestamp: Option<i64>,
    pub actor_id: String,
    pub actor_role: ActorRole,
    pub command_id: String,
    pub event_type: OrderEventType,
    pub payload: OrderEventPayload,
}

impl OrderEvent {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sequence: u64,
        order_id: String,
        actor_id: String,
        actor_role: ActorRole,
        command_id: String,
        client_timestamp: Option<i64>,
        event_type: OrderEventType,
        payload: OrderEventPayload,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            sequence,
            order_id,
            timestamp: crate::util::now_millis(),
            client_timestamp,
            actor_id,
            actor_role,
            command_id,
            event_type,
            payload,
        }
    }

    /// The status this event moved the order to, if it is a transition
    pub fn new_status(&self) -> Option<OrderStatus> {
        match &self.payload {
            OrderEventPayload::StatusChanged { to, .. } => Some(*to),
            _ => None,
        }
    }
}

/// Event type enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderEventType {
    // Lifecycle
    OrderPlaced,
    StatusChanged,

    // Payment
    PaymentUpdated,
    PaymentRetried,

    // Assignment
    AssignmentOffered,
    AssignmentRejected,
    PartnerAssigned,
    AssignmentReset,
    AssignmentUnresolved,

    // Feedback
    DeliveryRated,
}

impl std::fmt::Display for OrderEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderEventType::OrderPlaced => "ORDER_PLACED",
            OrderEventType::StatusChanged => "STATUS_CHANGED",
            OrderEventType::PaymentUpdated => "PAYMENT_UPDATED",
            OrderEventType::PaymentRetried => "PAYMENT_RETRIED",
            OrderEventType::AssignmentOffered => "ASSIGNMENT_OFFERED",
            OrderEventType::AssignmentRejected => "ASSIGNMENT_REJECTED",
            OrderEventType::PartnerAssigned => "PARTNER_ASSIGNED",
            OrderEventType::AssignmentReset => "ASSIGNMENT_RESET",
            OrderEventType::AssignmentUnresolved => "ASSIGNMENT_UNRESOLVED",
            OrderEventType::DeliveryRated => "DELIVERY_RATED",
        };
        f.write_str(s)
    }
}

/// Event payload variants
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderEventPayload {
    // ========== Lifecycle ==========
    OrderPlaced {
        user_id: String,
        shop_id: String,
        pickup: GeoPoint,
        items: Vec<LineItem>,
        delivery_address: DeliveryAddress,
        money: MoneyBreakdown,
        payment: PaymentInfo,
    },

    StatusChanged {
        from: OrderStatus,
        to: OrderStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    // ========== Payment ==========
    PaymentUpdated {
        razorpay_order_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        razorpay_payment_id: Option<String>,
        status: PaymentStatus,
    },

    /// New gateway reference after a failed attempt
    PaymentRetried { razorpay_order_id: String },

    // ========== Assignment ==========
    AssignmentOffered {
        partner_id: String,
        round: u32,
        distance_km: f64,
        expires_at: i64,
    },

    AssignmentRejected {
        partner_id: String,
        round: u32,
        outcome: OfferOutcome,
    },

    PartnerAssigned {
        partner_id: String,
        /// Admin assignment instead of an accepted offer
        #[serde(default)]
        manual: bool,
    },

    /// Matching restarts; the released partner (if any) is excluded
    AssignmentReset {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        released_partner_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    AssignmentUnresolved { rounds: u32 },

    // ========== Feedback ==========
    DeliveryRated { partner_id: String, rating: u8 },
}

impl OrderEventPayload {
    pub fn event_type(&self) -> OrderEventType {
        match self {
            OrderEventPayload::OrderPlaced { .. } => OrderEventType::OrderPlaced,
            OrderEventPayload::StatusChanged { .. } => OrderEventType::StatusChanged,
            OrderEventPayload::PaymentUpdated { .. } => OrderEventType::PaymentUpdated,
            OrderEventPayload::PaymentRetried { .. } => OrderEventType::PaymentRetried,
            OrderEventPayload::AssignmentOffered { .. } => OrderEventType::AssignmentOffered,
            OrderEventPayload::AssignmentRejected { .. } => OrderEventType::AssignmentRejected,
            OrderEventPayload::PartnerAssigned { .. } => OrderEventType::PartnerAssigned,
            OrderEventPayload::AssignmentReset { .. } => OrderEventType::AssignmentReset,
            OrderEventPayload::AssignmentUnresolved { .. } => OrderEventType::AssignmentUnresolved,
            OrderEventPayload::DeliveryRated { .. } => OrderEventType::DeliveryRated,
        }
    }
}
