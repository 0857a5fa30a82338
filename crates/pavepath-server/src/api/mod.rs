//! API routes for the PavePath server.

pub mod error;
pub mod geocode;
pub mod planning;
pub mod request_id;
mod routes;

use crate::state::AppState;
use axum::Router;
use std::sync::Arc;

pub use error::ApiError;

pub fn routes() -> Router<Arc<AppState>> {
    routes::create_router()
}

#[cfg(test)]
mod tests;
