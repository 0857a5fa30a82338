//! Great-circle distance helpers.

use crate::error::ValidationError;
use crate::models::Coordinate;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Calculate distance between two points in kilometers using the Haversine formula.
///
/// # Arguments
/// * `lat1`, `lon1` - First point coordinates in decimal degrees
/// * `lat2`, `lon2` - Second point coordinates in decimal degrees
///
/// No range checks; see [`distance`] for the validating entry point.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Distance in kilometers between two validated coordinates.
pub fn distance(a: &Coordinate, b: &Coordinate) -> Result<f64, ValidationError> {
    a.validate()?;
    b.validate()?;
    Ok(haversine_km(a.lat, a.lon, b.lat, b.lon))
}

/// Distance from `point` to the closest vertex of `path`, if the path has any.
pub fn nearest_vertex_km(point: &Coordinate, path: &[Coordinate]) -> Option<f64> {
    path.iter()
        .map(|vertex| haversine_km(point.lat, point.lon, vertex.lat, vertex.lon))
        .min_by(|a, b| a.total_cmp(b))
}
