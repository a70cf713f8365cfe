//! HTTP API
//!
//! - [`health`] - liveness (public)
//! - [`orders`] - order lifecycle
//! - [`partners`] - partner registration, heartbeats and offer replies
//! - [`payments`] - gateway callback (public, signature-checked)
//! - [`dashboard`] - admin statistics
//!
//! Every handler answers with `ApiResponse`; failures map through
//! `ErrorCode::http_status`.

pub mod convert;
pub mod dashboard;
pub mod health;
pub mod orders;
pub mod partners;
pub mod payments;

use axum::Router;
use http::{HeaderName, HeaderValue};
use tower_http::cors::CorsLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::core::ServerState;

const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// All routes, without middleware or state
pub fn build_router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(orders::router())
        .merge(partners::router())
        .merge(payments::router())
        .merge(dashboard::router())
}

/// The served application: routes, middleware and state
pub fn build_app(state: ServerState) -> Router {
    build_router()
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static(REQUEST_ID_HEADER),
            XRequestId,
        ))
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            REQUEST_ID_HEADER,
        )))
        .with_state(state)
}
