//! REST API routes.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::api::{geocode, planning, request_id};
use crate::state::AppState;

/// Create the API router.
pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/v1/routes/optimize", post(planning::optimize_route))
        .route("/v1/routes/analyze", post(planning::analyze_route))
        .route("/v1/geocode", get(geocode::geocode))
        .layer(middleware::from_fn(request_id::propagate_request_id))
}
