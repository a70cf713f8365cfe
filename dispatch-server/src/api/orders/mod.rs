//! Order API
//!
//! | Path | Method | Caller |
//! |------|--------|--------|
//! | /api/orders | POST | customer, admin |
//! | /api/orders/unassigned | GET | admin |
//! | /api/orders/{id} | GET | owner, shop, assigned partner, admin |
//! | /api/orders/{id}/events | GET | admin |
//! | /api/orders/{id}/transition | POST | per transition table |
//! | /api/orders/{id}/retry-payment | POST | owner |
//! | /api/orders/{id}/rating | POST | owner |
//! | /api/orders/{id}/assign | POST | admin |
//! | /api/orders/{id}/reassign | POST | admin |

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::place_order))
        .route("/unassigned", get(handler::list_unassigned))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/events", get(handler::list_events))
        .route("/{id}/transition", post(handler::transition))
        .route("/{id}/retry-payment", post(handler::retry_payment))
        .route("/{id}/rating", post(handler::rate))
        .route("/{id}/assign", post(handler::assign))
        .route("/{id}/reassign", post(handler::reassign))
}
