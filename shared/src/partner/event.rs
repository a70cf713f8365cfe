//! Partner events

use super::snapshot::PartnerStatus;
use super::types::{EarningsWindows, Vehicle};
use crate::order::ActorRole;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PartnerEvent {
    pub event_id: String,
    /// Global sequence number shared with order events
    pub sequence: u64,
    pub partner_id: String,
    pub timestamp: i64,
    pub actor_id: String,
    pub actor_role: ActorRole,
    pub command_id: String,
    pub event_type: PartnerEventType,
    pub payload: PartnerEventPayload,
}

impl PartnerEvent {
    pub fn new(
        sequence: u64,
        partner_id: String,
        actor_id: String,
        actor_role: ActorRole,
        command_id: String,
        payload: PartnerEventPayload,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            sequence,
            partner_id,
            timestamp: crate::util::now_millis(),
            actor_id,
            actor_role,
            command_id,
            event_type: payload.event_type(),
            payload,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PartnerEventType {
    PartnerRegistered,
    AvailabilityChanged,
    OrderReserved,
    OrderReleased,
    DeliveryCredited,
    RatingRecorded,
    EarningsRolledOver,
}

/// Why a partner's active order was released
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReleaseReason {
    Delivered,
    Cancelled,
    Reassigned,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PartnerEventPayload {
    PartnerRegistered {
        name: String,
        phone: String,
        vehicle: Vehicle,
        timezone: String,
    },

    AvailabilityChanged {
        from: PartnerStatus,
        to: PartnerStatus,
    },

    /// Partner took an order and became busy
    OrderReserved { order_id: String },

    OrderReleased {
        order_id: String,
        reason: ReleaseReason,
    },

    DeliveryCredited {
        order_id: String,
        amount: Decimal,
        delivered_at: i64,
    },

    RatingRecorded { order_id: String, rating: u8 },

    /// Windows recomputed from the credited deliveries
    EarningsRolledOver { windows: EarningsWindows },
}

impl PartnerEventPayload {
    pub fn event_type(&self) -> PartnerEventType {
        match self {
            PartnerEventPayload::PartnerRegistered { .. } => PartnerEventType::PartnerRegistered,
            PartnerEventPayload::AvailabilityChanged { .. } => PartnerEventType::AvailabilityChanged,
            PartnerEventPayload::OrderReserved { .. } => PartnerEventType::OrderReserved,
            PartnerEventPayload::OrderReleased { .. } => PartnerEventType::OrderReleased,
            PartnerEventPayload::DeliveryCredited { .. } => PartnerEventType::DeliveryCredited,
            PartnerEventPayload::RatingRecorded { .. } => PartnerEventType::RatingRecorded,
            PartnerEventPayload::EarningsRolledOver { .. } => PartnerEventType::EarningsRolledOver,
        }
    }
}
