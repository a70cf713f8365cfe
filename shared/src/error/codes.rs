//! Unified error codes
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 4xxx: Order errors
//! - 5xxx: Payment errors
//! - 6xxx: Partner / assignment errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Operation not allowed in the current state
    InvalidOperation = 6,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Specific role required
    RoleRequired = 2002,
    /// Admin role required
    AdminRequired = 2003,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Status transition not allowed
    InvalidTransition = 4002,
    /// Order cannot be reassigned in its current status
    InvalidReassignment = 4003,
    /// Order has no line items
    OrderEmpty = 4004,
    /// Order has already been rated
    OrderAlreadyRated = 4005,

    // ==================== 5xxx: Payment ====================
    /// Payment reference does not match any order
    UnknownPaymentReference = 5001,
    /// Payment callback signature mismatch
    PaymentSignatureInvalid = 5002,
    /// Payment has not succeeded yet
    PaymentNotCompleted = 5003,

    // ==================== 6xxx: Partner / Assignment ====================
    /// Partner not found
    PartnerNotFound = 6001,
    /// Partner is not available for an assignment
    PartnerUnavailable = 6002,
    /// Assignment offer is no longer open
    OfferExpired = 6003,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Operation timed out
    TimeoutError = 9004,
    /// Configuration error
    ConfigError = 9005,
    /// Storage is full
    StorageFull = 9401,
    /// Storage corrupted
    StorageCorrupted = 9403,
    /// System is busy
    SystemBusy = 9404,
}

impl ErrorCode {
    /// Get the numeric code value
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this code represents success
    pub fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the default message for this error code
    pub fn message(&self) -> &'static str {
        match self {
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "Unknown error",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidOperation => "Operation not allowed",

            ErrorCode::NotAuthenticated => "Authentication required",
            ErrorCode::TokenExpired => "Token has expired",
            ErrorCode::TokenInvalid => "Token is invalid",

            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::RoleRequired => "Role required",
            ErrorCode::AdminRequired => "Admin role required",

            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::InvalidTransition => "Invalid status transition",
            ErrorCode::InvalidReassignment => "Order cannot be reassigned",
            ErrorCode::OrderEmpty => "Order has no items",
            ErrorCode::OrderAlreadyRated => "Order has already been rated",

            ErrorCode::UnknownPaymentReference => "Unknown payment reference",
            ErrorCode::PaymentSignatureInvalid => "Invalid payment signature",
            ErrorCode::PaymentNotCompleted => "Payment has not completed",

            ErrorCode::PartnerNotFound => "Delivery partner not found",
            ErrorCode::PartnerUnavailable => "Delivery partner unavailable",
            ErrorCode::OfferExpired => "Assignment offer expired",

            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::StorageFull => "Storage is full",
            ErrorCode::StorageCorrupted => "Storage corrupted",
            ErrorCode::SystemBusy => "System is busy, please retry",
        }
    }
}

/// Error returned when a numeric value is not a known error code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code as u16
    }
}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidOperation),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2002 => Ok(ErrorCode::RoleRequired),
            2003 => Ok(ErrorCode::AdminRequired),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::InvalidTransition),
            4003 => Ok(ErrorCode::InvalidReassignment),
            4004 => Ok(ErrorCode::OrderEmpty),
            4005 => Ok(ErrorCode::OrderAlreadyRated),

            // Payment
            5001 => Ok(ErrorCode::UnknownPaymentReference),
            5002 => Ok(ErrorCode::PaymentSignatureInvalid),
            5003 => Ok(ErrorCode::PaymentNotCompleted),

            // Partner
            6001 => Ok(ErrorCode::PartnerNotFound),
            6002 => Ok(ErrorCode::PartnerUnavailable),
            6003 => Ok(ErrorCode::OfferExpired),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9004 => Ok(ErrorCode::TimeoutError),
            9005 => Ok(ErrorCode::ConfigError),
            9401 => Ok(ErrorCode::StorageFull),
            9403 => Ok(ErrorCode::StorageCorrupted),
            9404 => Ok(ErrorCode::SystemBusy),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
