//! Payment gateway callback
//!
//! Unauthenticated; callbacks are checked against the webhook signature
//! when a secret is configured.

use axum::{Json, Router, extract::State, routing::post};
use shared::error::{ApiResponse, AppResult};
use shared::order::OrderSnapshot;

use crate::core::ServerState;
use crate::payments::PaymentCallback;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/payments/callback", post(callback))
}

pub async fn callback(
    State(state): State<ServerState>,
    Json(payload): Json<PaymentCallback>,
) -> AppResult<ApiResponse<OrderSnapshot>> {
    let order = state.engine().handle_payment_callback(&payload)?;
    Ok(ApiResponse::success(order))
}
