//! Partner API
//!
//! | Path | Method | Caller |
//! |------|--------|--------|
//! | /api/partners | POST | admin |
//! | /api/partners/{id} | GET | the partner, admin |
//! | /api/partners/{id}/heartbeat | POST | the partner, admin |
//! | /api/partners/{id}/offers/{order_id} | POST | the partner |

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/partners", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::register))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/heartbeat", post(handler::heartbeat))
        .route("/{id}/offers/{order_id}", post(handler::respond_to_offer))
}
