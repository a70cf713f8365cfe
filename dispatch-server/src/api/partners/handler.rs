//! Partner API handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use shared::error::{ApiResponse, AppError, AppResult};
use shared::order::{ActorRole, OfferResponse, OrderSnapshot};
use shared::partner::{PartnerStatus, PartnerView};

use crate::auth::{CurrentUser, require_role, require_self_or_admin};
use crate::core::ServerState;
use crate::engine::NewPartner;

#[derive(Debug, Deserialize)]
pub struct HeartbeatRequest {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub status: Option<PartnerStatus>,
}

#[derive(Debug, Deserialize)]
pub struct OfferReply {
    pub response: OfferResponse,
}

pub async fn register(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(req): Json<NewPartner>,
) -> AppResult<ApiResponse<PartnerView>> {
    require_role(&user, &[ActorRole::Admin])?;
    Ok(ApiResponse::success(
        state.engine().register_partner(&user.actor(), req)?,
    ))
}

pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<PartnerView>> {
    require_self_or_admin(&user, &id)?;
    Ok(ApiResponse::success(state.engine().get_partner(&id)?))
}

pub async fn heartbeat(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<HeartbeatRequest>,
) -> AppResult<ApiResponse<PartnerView>> {
    require_role(&user, &[ActorRole::Partner, ActorRole::Admin])?;
    require_self_or_admin(&user, &id)?;
    let view = state
        .engine()
        .record_partner_heartbeat(&user.actor(), &id, req.lat, req.lng, req.status)?;
    Ok(ApiResponse::success(view))
}

pub async fn respond_to_offer(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path((id, order_id)): Path<(String, String)>,
    Json(req): Json<OfferReply>,
) -> AppResult<ApiResponse<OrderSnapshot>> {
    if user.role != ActorRole::Partner || user.id != id {
        return Err(AppError::permission_denied(
            "only the offered partner can answer an offer",
        ));
    }
    let order = state
        .engine()
        .respond_to_assignment(&id, &order_id, req.response)?;
    Ok(ApiResponse::success(order))
}
