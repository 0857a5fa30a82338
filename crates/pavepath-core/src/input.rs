//! Waypoint input normalization.
//!
//! Inputs may be coordinates, `"lat,lon"` strings, grid IDs such as `B3`, or
//! free-form addresses handed to a [`Geocoder`].

use crate::error::{CoreError, RoutingProviderError, ValidationError};
use crate::models::Coordinate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Resolves free-form addresses to coordinates.
pub trait Geocoder {
    /// `Ok(None)` means the provider answered but found nothing.
    fn resolve(&self, address: &str) -> Result<Option<Coordinate>, RoutingProviderError>;
}

/// Geocoder used when no provider is configured. Resolves nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGeocoder;

impl Geocoder for NoGeocoder {
    fn resolve(&self, _address: &str) -> Result<Option<Coordinate>, RoutingProviderError> {
        Ok(None)
    }
}

/// One waypoint as supplied by a caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WaypointInput {
    Coordinate(Coordinate),
    Pair([f64; 2]),
    Text(String),
}

impl From<&str> for WaypointInput {
    fn from(value: &str) -> Self {
        WaypointInput::Text(value.to_string())
    }
}

impl From<Coordinate> for WaypointInput {
    fn from(value: Coordinate) -> Self {
        WaypointInput::Coordinate(value)
    }
}

/// Resolve every input to a validated coordinate, in order.
///
/// At least one input is required. Any input that cannot be resolved stops
/// the whole batch.
pub fn resolve_waypoints(
    inputs: &[WaypointInput],
    grid_lookup: &BTreeMap<String, Coordinate>,
    geocoder: &dyn Geocoder,
) -> Result<Vec<Coordinate>, CoreError> {
    if inputs.is_empty() {
        return Err(ValidationError::EmptyWaypoints.into());
    }
    inputs
        .iter()
        .enumerate()
        .map(|(index, input)| resolve_one(index, input, grid_lookup, geocoder))
        .collect()
}

fn resolve_one(
    index: usize,
    input: &WaypointInput,
    grid_lookup: &BTreeMap<String, Coordinate>,
    geocoder: &dyn Geocoder,
) -> Result<Coordinate, CoreError> {
    let coordinate = match input {
        WaypointInput::Coordinate(coordinate) => *coordinate,
        WaypointInput::Pair([lat, lon]) => Coordinate { lat: *lat, lon: *lon },
        WaypointInput::Text(text) => {
            let text = text.trim();
            if let Some(coordinate) = parse_lat_lon(text) {
                coordinate
            } else if is_grid_id(text) {
                *grid_lookup
                    .get(text)
                    .ok_or_else(|| unresolved(index, text))?
            } else if text.is_empty() {
                return Err(unresolved(index, text).into());
            } else {
                tracing::debug!(index, address = text, "geocoding waypoint");
                geocoder
                    .resolve(text)?
                    .ok_or_else(|| unresolved(index, text))?
            }
        }
    };

    if !coordinate.is_valid() {
        return Err(ValidationError::WaypointOutOfRange {
            index,
            lat: coordinate.lat,
            lon: coordinate.lon,
        }
        .into());
    }
    Ok(coordinate)
}

fn unresolved(index: usize, input: &str) -> ValidationError {
    ValidationError::UnresolvedWaypoint {
        index,
        input: input.to_string(),
    }
}

/// Parse `"lat,lon"` (whitespace tolerated). Range is checked by the caller.
pub fn parse_lat_lon(text: &str) -> Option<Coordinate> {
    let (lat, lon) = text.split_once(',')?;
    let lat = lat.trim().parse::<f64>().ok()?;
    let lon = lon.trim().parse::<f64>().ok()?;
    Some(Coordinate { lat, lon })
}

/// Grid IDs are one uppercase letter followed by digits, e.g. `B3`.
pub fn is_grid_id(text: &str) -> bool {
    static GRID_ID: OnceLock<Regex> = OnceLock::new();
    GRID_ID
        .get_or_init(|| Regex::new(r"^[A-Z][0-9]+$").expect("valid regex"))
        .is_match(text)
}
