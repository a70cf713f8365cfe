//! Health check (public)

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/health", get(health))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    /// Regenerated on every start
    epoch: String,
    ledger_sequence: Option<u64>,
    open_offers: usize,
    tracked_partners: usize,
}

pub async fn health(State(state): State<ServerState>) -> Json<HealthResponse> {
    let engine = state.engine();
    let ledger_sequence = match engine.manager().current_sequence() {
        Ok(seq) => Some(seq),
        Err(e) => {
            tracing::error!(error = %e, "Health check could not read the ledger");
            None
        }
    };

    Json(HealthResponse {
        status: if ledger_sequence.is_some() { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        epoch: engine.manager().epoch().to_string(),
        ledger_sequence,
        open_offers: engine.assignment().offers().len(),
        tracked_partners: engine.locations().len(),
    })
}
