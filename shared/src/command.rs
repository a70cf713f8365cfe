//! Ledger commands - requests that mutate orders or partners

use crate::error::{AppError, ErrorCode};
use crate::order::{
    Actor, DeliveryAddress, GeoPoint, LineItem, OfferOutcome, OrderStatus, PaymentMethod,
    PaymentStatus,
};
use crate::partner::{PartnerStatus, Vehicle};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Command envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerCommand {
    /// Idempotency key; a command id is processed at most once
    pub command_id: String,
    /// Client timestamp (Unix milliseconds)
    pub timestamp: i64,
    pub actor: Actor,
    pub payload: CommandPayload,
}

impl LedgerCommand {
    pub fn new(actor: Actor, payload: CommandPayload) -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string(), actor, payload)
    }

    /// Build a command with a caller-chosen id (deterministic ids make
    /// replays from background workers idempotent)
    pub fn with_id(command_id: impl Into<String>, actor: Actor, payload: CommandPayload) -> Self {
        Self {
            command_id: command_id.into(),
            timestamp: crate::util::now_millis(),
            actor,
            payload,
        }
    }
}

/// Payment details supplied when an order is placed or re-attempted
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewPaymentInput {
    pub method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub razorpay_order_id: Option<String>,
}

/// Everything needed to place an order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaceOrderInput {
    pub shop_id: String,
    /// Shop location, used as the matching origin
    pub pickup: GeoPoint,
    pub items: Vec<LineItem>,
    pub delivery_address: DeliveryAddress,
    pub delivery_fee: Decimal,
    pub taxes: Decimal,
    pub payment: NewPaymentInput,
}

/// Command payload variants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandPayload {
    // ========== Order lifecycle ==========
    PlaceOrder {
        /// Chosen by the caller so a replayed command maps to the same order
        order_id: String,
        input: PlaceOrderInput,
    },
    TransitionOrder {
        order_id: String,
        target: OrderStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    // ========== Payment ==========
    ApplyPaymentOutcome {
        order_id: String,
        razorpay_order_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        razorpay_payment_id: Option<String>,
        status: PaymentStatus,
    },
    RetryPayment {
        order_id: String,
        razorpay_order_id: String,
    },

    // ========== Assignment ==========
    RecordOffer {
        order_id: String,
        partner_id: String,
        round: u32,
        distance_km: f64,
        expires_at: i64,
    },
    ResolveOffer {
        order_id: String,
        partner_id: String,
        round: u32,
        outcome: OfferOutcome,
    },
    AssignPartner {
        order_id: String,
        partner_id: String,
        /// Admin assignment instead of an accepted offer
        manual: bool,
    },
    ReassignOrder {
        order_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    FlagUnassigned {
        order_id: String,
        rounds: u32,
    },

    // ========== Feedback ==========
    RateDelivery {
        order_id: String,
        rating: u8,
    },

    // ========== Partners ==========
    RegisterPartner {
        partner_id: String,
        name: String,
        phone: String,
        vehicle: Vehicle,
        /// IANA timezone for earnings windows; falls back to the business zone
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timezone: Option<String>,
    },
    SetPartnerAvailability {
        partner_id: String,
        status: PartnerStatus,
    },
    CreditDelivery {
        order_id: String,
        partner_id: String,
        amount: Decimal,
    },
    RollOverEarnings {
        partner_id: String,
    },
}

impl CommandPayload {
    pub fn order_id(&self) -> Option<&str> {
        match self {
            CommandPayload::PlaceOrder { order_id, .. }
            | CommandPayload::TransitionOrder { order_id, .. }
            | CommandPayload::ApplyPaymentOutcome { order_id, .. }
            | CommandPayload::RetryPayment { order_id, .. }
            | CommandPayload::RecordOffer { order_id, .. }
            | CommandPayload::ResolveOffer { order_id, .. }
            | CommandPayload::AssignPartner { order_id, .. }
            | CommandPayload::ReassignOrder { order_id, .. }
            | CommandPayload::FlagUnassigned { order_id, .. }
            | CommandPayload::RateDelivery { order_id, .. }
            | CommandPayload::CreditDelivery { order_id, .. } => Some(order_id),
            CommandPayload::RegisterPartner { .. }
            | CommandPayload::SetPartnerAvailability { .. }
            | CommandPayload::RollOverEarnings { .. } => None,
        }
    }

    pub fn partner_id(&self) -> Option<&str> {
        match self {
            CommandPayload::RecordOffer { partner_id, .. }
            | CommandPayload::ResolveOffer { partner_id, .. }
            | CommandPayload::AssignPartner { partner_id, .. }
            | CommandPayload::RegisterPartner { partner_id, .. }
            | CommandPayload::SetPartnerAvailability { partner_id, .. }
            | CommandPayload::CreditDelivery { partner_id, .. }
            | CommandPayload::RollOverEarnings { partner_id } => Some(partner_id),
            _ => None,
        }
    }
}

// ============================================================================
// Responses
// ============================================================================

/// Command response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
    pub command_id: String,
    pub success: bool,
    /// True when the command id had already been processed
    #[serde(default)]
    pub duplicate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CommandError>,
}

impl CommandResponse {
    pub fn success(command_id: String, order_id: Option<String>, partner_id: Option<String>) -> Self {
        Self {
            command_id,
            success: true,
            duplicate: false,
            order_id,
            partner_id,
            error: None,
        }
    }

    pub fn error(command_id: String, error: CommandError) -> Self {
        Self {
            command_id,
            success: false,
            duplicate: false,
            order_id: None,
            partner_id: None,
            error: Some(error),
        }
    }

    pub fn duplicate(command_id: String) -> Self {
        Self {
            command_id,
            success: true,
            duplicate: true,
            order_id: None,
            partner_id: None,
            error: None,
        }
    }
}

/// Structured command failure: kind plus message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommandError {
    pub code: CommandErrorCode,
    pub message: String,
}

impl CommandError {
    pub fn new(code: CommandErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for CommandError {}

/// Command error codes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandErrorCode {
    NotFound,
    InvalidTransition,
    InvalidReassignment,
    OfferExpired,
    UnknownPaymentReference,
    Timeout,
    PartnerUnavailable,
    PermissionDenied,
    InvalidOperation,
    ValidationFailed,
    InternalError,
    // Storage errors (maps to ErrorCode 94xx)
    StorageFull,
    StorageCorrupted,
    SystemBusy,
}

impl From<CommandErrorCode> for ErrorCode {
    fn from(code: CommandErrorCode) -> Self {
        match code {
            CommandErrorCode::NotFound => ErrorCode::NotFound,
            CommandErrorCode::InvalidTransition => ErrorCode::InvalidTransition,
            CommandErrorCode::InvalidReassignment => ErrorCode::InvalidReassignment,
            CommandErrorCode::OfferExpired => ErrorCode::OfferExpired,
            CommandErrorCode::UnknownPaymentReference => ErrorCode::UnknownPaymentReference,
            CommandErrorCode::Timeout => ErrorCode::TimeoutError,
            CommandErrorCode::PartnerUnavailable => ErrorCode::PartnerUnavailable,
            CommandErrorCode::PermissionDenied => ErrorCode::PermissionDenied,
            CommandErrorCode::InvalidOperation => ErrorCode::InvalidOperation,
            CommandErrorCode::ValidationFailed => ErrorCode::ValidationFailed,
            CommandErrorCode::InternalError => ErrorCode::InternalError,
            CommandErrorCode::StorageFull => ErrorCode::StorageFull,
            CommandErrorCode::StorageCorrupted => ErrorCode::StorageCorrupted,
            CommandErrorCode::SystemBusy => ErrorCode::SystemBusy,
        }
    }
}

impl From<CommandError> for AppError {
    fn from(err: CommandError) -> Self {
        AppError::with_message(err.code.into(), err.message)
    }
}
