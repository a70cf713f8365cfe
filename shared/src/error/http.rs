//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound | Self::OrderNotFound | Self::PartnerNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::AlreadyExists
            | Self::InvalidTransition
            | Self::InvalidReassignment
            | Self::OrderAlreadyRated
            | Self::PartnerUnavailable
            | Self::InvalidOperation => StatusCode::CONFLICT,

            // 410 Gone
            Self::OfferExpired => StatusCode::GONE,

            // 401 Unauthorized
            Self::NotAuthenticated | Self::TokenExpired | Self::TokenInvalid => {
                StatusCode::UNAUTHORIZED
            }

            // 403 Forbidden
            Self::PermissionDenied
            | Self::RoleRequired
            | Self::AdminRequired
            | Self::PaymentSignatureInvalid => StatusCode::FORBIDDEN,

            // 402 Payment Required
            Self::PaymentNotCompleted => StatusCode::PAYMENT_REQUIRED,

            // 422 Unprocessable (logged, never retried by the gateway)
            Self::UnknownPaymentReference => StatusCode::UNPROCESSABLE_ENTITY,

            // 503 Service Unavailable (transient, client can retry)
            Self::TimeoutError | Self::SystemBusy => StatusCode::SERVICE_UNAVAILABLE,

            // 500 Internal Server Error
            Self::Unknown
            | Self::InternalError
            | Self::DatabaseError
            | Self::ConfigError
            | Self::StorageFull
            | Self::StorageCorrupted => StatusCode::INTERNAL_SERVER_ERROR,

            // 400 Bad Request
            Self::ValidationFailed | Self::InvalidRequest | Self::OrderEmpty => {
                StatusCode::BAD_REQUEST
            }
        }
    }
}
