use axum::{
    extract::{Query, State},
    Json,
};
use pavepath_core::{Coordinate, Geocoder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::ApiError;
use crate::state::{AppState, CachingGeocoder};

#[derive(Debug, Deserialize)]
pub struct GeocodeQuery {
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GeocodeResponse {
    pub query: String,
    pub coordinate: Coordinate,
}

/// Resolve an address, answering from the cache when possible.
pub async fn geocode(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GeocodeQuery>,
) -> Result<Json<GeocodeResponse>, ApiError> {
    let address = query
        .q
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::BadRequest("query parameter 'q' is required".to_string()))?;

    let lookup = address.clone();
    let coordinate =
        tokio::task::spawn_blocking(move || CachingGeocoder::new(&state).resolve(&lookup))
            .await
            .map_err(|err| ApiError::Internal(format!("geocoding task failed: {err}")))??;

    match coordinate {
        Some(coordinate) => Ok(Json(GeocodeResponse {
            query: address,
            coordinate,
        })),
        None => Err(ApiError::NotFound(format!("no match for '{address}'"))),
    }
}
