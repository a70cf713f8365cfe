//! Order API handlers

use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
};
use serde::Deserialize;
use shared::command::PlaceOrderInput;
use shared::error::{ApiResponse, AppError, AppResult};
use shared::order::{ActorRole, OrderEvent, OrderSnapshot, OrderStatus};

use crate::auth::{CurrentUser, require_role};
use crate::core::ServerState;

/// Header carrying a client-chosen order id; retries with the same key
/// resolve to the same order
const IDEMPOTENCY_KEY: &str = "idempotency-key";

#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub target: OrderStatus,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RetryPaymentRequest {
    pub razorpay_order_id: String,
}

#[derive(Debug, Deserialize)]
pub struct RatingRequest {
    pub rating: u8,
}

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub partner_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReassignRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

/// Who may read an order
fn can_view(user: &CurrentUser, order: &OrderSnapshot) -> bool {
    match user.role {
        ActorRole::Admin => true,
        ActorRole::Customer => order.user_id == user.id,
        ActorRole::Shop => order.shop_id == user.id,
        ActorRole::Partner => order.delivery_partner_id.as_deref() == Some(user.id.as_str()),
        ActorRole::System => false,
    }
}

pub async fn place_order(
    State(state): State<ServerState>,
    user: CurrentUser,
    headers: HeaderMap,
    Json(input): Json<PlaceOrderInput>,
) -> AppResult<ApiResponse<OrderSnapshot>> {
    let key = headers
        .get(IDEMPOTENCY_KEY)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    let engine = state.engine();
    let order = match key {
        Some(order_id) => match engine.get_order(order_id) {
            // A retried request: hand back the order it created
            Ok(existing) if existing.user_id == user.id => existing,
            Ok(_) => {
                return Err(AppError::with_message(
                    shared::error::ErrorCode::AlreadyExists,
                    format!("order {} already exists", order_id),
                ));
            }
            Err(_) => engine.place_order_with_id(&user.actor(), order_id, input)?,
        },
        None => engine.place_order(&user.actor(), input)?,
    };
    Ok(ApiResponse::success(order))
}

pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<OrderSnapshot>> {
    let order = state.engine().get_order(&id)?;
    if !can_view(&user, &order) {
        return Err(AppError::permission_denied(format!(
            "{} may not view order {}",
            user.id, id
        )));
    }
    Ok(ApiResponse::success(order))
}

pub async fn list_events(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Vec<OrderEvent>>> {
    require_role(&user, &[ActorRole::Admin])?;
    Ok(ApiResponse::success(state.engine().order_events(&id)?))
}

pub async fn list_unassigned(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<ApiResponse<Vec<OrderSnapshot>>> {
    require_role(&user, &[ActorRole::Admin])?;
    Ok(ApiResponse::success(state.engine().list_unassigned_orders()?))
}

pub async fn transition(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<TransitionRequest>,
) -> AppResult<ApiResponse<OrderSnapshot>> {
    let order = state
        .engine()
        .transition_order(&user.actor(), &id, req.target, req.reason)?;
    Ok(ApiResponse::success(order))
}

pub async fn retry_payment(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<RetryPaymentRequest>,
) -> AppResult<ApiResponse<OrderSnapshot>> {
    let order = state
        .engine()
        .retry_payment(&user.actor(), &id, &req.razorpay_order_id)?;
    Ok(ApiResponse::success(order))
}

pub async fn rate(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<RatingRequest>,
) -> AppResult<ApiResponse<OrderSnapshot>> {
    let order = state.engine().rate_delivery(&user.actor(), &id, req.rating)?;
    Ok(ApiResponse::success(order))
}

pub async fn assign(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<AssignRequest>,
) -> AppResult<ApiResponse<OrderSnapshot>> {
    require_role(&user, &[ActorRole::Admin])?;
    let order = state
        .engine()
        .assign_partner(&user.actor(), &id, &req.partner_id)?;
    Ok(ApiResponse::success(order))
}

pub async fn reassign(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<ReassignRequest>,
) -> AppResult<ApiResponse<OrderSnapshot>> {
    require_role(&user, &[ActorRole::Admin])?;
    let order = state.engine().reassign_order(&user.actor(), &id, req.reason)?;
    Ok(ApiResponse::success(order))
}
