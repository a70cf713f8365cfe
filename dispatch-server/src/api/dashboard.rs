//! Admin dashboard

use axum::{
    Router,
    extract::{Query, State},
    routing::get,
};
use serde::Deserialize;
use shared::dashboard::{DashboardStats, StatsPeriod};
use shared::error::{ApiResponse, AppResult};
use shared::order::ActorRole;

use crate::auth::{CurrentUser, require_role};
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/dashboard/stats", get(stats))
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    #[serde(default)]
    pub period: Option<StatsPeriod>,
}

pub async fn stats(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<StatsQuery>,
) -> AppResult<ApiResponse<DashboardStats>> {
    require_role(&user, &[ActorRole::Admin])?;
    let period = query.period.unwrap_or(StatsPeriod::Today);
    Ok(ApiResponse::success(state.engine().get_dashboard_stats(period)?))
}
