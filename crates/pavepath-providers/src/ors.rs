//! OpenRouteService directions client (GeoJSON endpoint).

use crate::http::{build_client, mask_key, read_json};
use pavepath_core::{
    Coordinate, DirectionStep, DirectionsAdapter, DrivingGeometry, RoutingProviderError,
    SegmentEndpoints,
};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;

const PROVIDER: &str = "openrouteservice";
const DEFAULT_BASE_URL: &str = "https://api.openrouteservice.org/v2/directions/driving-car";

pub struct OpenRouteServiceClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OpenRouteServiceClient {
    pub fn new(
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, RoutingProviderError> {
        Ok(Self {
            client: build_client(PROVIDER, timeout)?,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl DirectionsAdapter for OpenRouteServiceClient {
    fn fetch_segments(
        &self,
        origin: &Coordinate,
        destination: &Coordinate,
    ) -> Result<DrivingGeometry, RoutingProviderError> {
        tracing::debug!(
            provider = PROVIDER,
            key = %mask_key(&self.api_key),
            %origin,
            %destination,
            "requesting driving directions"
        );
        // ORS takes lon,lat order.
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("api_key", self.api_key.clone()),
                ("start", format!("{},{}", origin.lon, origin.lat)),
                ("end", format!("{},{}", destination.lon, destination.lat)),
            ])
            .send()
            .map_err(|err| RoutingProviderError::transport(PROVIDER, err))?;
        let body: FeatureCollection = read_json(PROVIDER, response)?;
        parse_directions(body)
    }
}

#[derive(Debug, Deserialize)]
pub struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
pub struct Feature {
    pub geometry: LineString,
    #[serde(default)]
    pub properties: Properties,
}

#[derive(Debug, Deserialize)]
pub struct LineString {
    /// `[lon, lat]` pairs; elevation, if requested, is ignored
    pub coordinates: Vec<Vec<f64>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Properties {
    #[serde(default)]
    pub segments: Vec<RouteSegment>,
}

#[derive(Debug, Deserialize)]
pub struct RouteSegment {
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
pub struct Step {
    #[serde(default)]
    pub instruction: String,
    #[serde(default)]
    pub distance: f64,
    #[serde(default)]
    pub duration: f64,
}

pub fn parse_directions(body: FeatureCollection) -> Result<DrivingGeometry, RoutingProviderError> {
    let Some(feature) = body.features.into_iter().next() else {
        return Err(RoutingProviderError::EmptyGeometry {
            provider: PROVIDER.to_string(),
        });
    };

    let points = feature
        .geometry
        .coordinates
        .iter()
        .map(|position| match position.as_slice() {
            [lon, lat, ..] => Ok(Coordinate { lat: *lat, lon: *lon }),
            _ => Err(RoutingProviderError::malformed(
                PROVIDER,
                "position with fewer than two values",
            )),
        })
        .collect::<Result<Vec<_>, _>>()?;
    if points.len() < 2 {
        return Err(RoutingProviderError::EmptyGeometry {
            provider: PROVIDER.to_string(),
        });
    }

    let segments = points
        .windows(2)
        .map(|pair| SegmentEndpoints {
            from: pair[0],
            to: pair[1],
        })
        .collect();
    let directions = feature
        .properties
        .segments
        .into_iter()
        .flat_map(|segment| segment.steps)
        .map(|step| DirectionStep {
            instruction: step.instruction,
            distance_m: step.distance,
            duration_s: step.duration,
        })
        .collect();

    Ok(DrivingGeometry {
        segments,
        directions,
    })
}

pub fn parse_directions_json(json: &str) -> Result<DrivingGeometry, RoutingProviderError> {
    let body: FeatureCollection = serde_json::from_str(json)
        .map_err(|err| RoutingProviderError::malformed(PROVIDER, err.to_string()))?;
    parse_directions(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use crate::fixture_server::serve_once;

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate { lat, lon }
    }

    #[test]
    fn consecutive_vertices_become_edges() {
        let body = json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": {
                    "type": "LineString",
                    "coordinates": [
                        [-117.9143, 33.8366],
                        [-117.9100, 33.8100],
                        [-117.8677, 33.7455]
                    ]
                },
                "properties": {
                    "segments": [{
                        "distance": 11080.0,
                        "duration": 845.0,
                        "steps": [
                            {
                                "instruction": "Head south on Harbor Boulevard",
                                "distance": 2960.0,
                                "duration": 301.0
                            },
                            {
                                "instruction": "Arrive at your destination",
                                "distance": 0.0,
                                "duration": 0.0
                            }
                        ]
                    }]
                }
            }]
        });
        let geometry = parse_directions_json(&body.to_string()).unwrap();
        assert_eq!(geometry.segments.len(), 2);
        assert_eq!(geometry.segments[0].from, coord(33.8366, -117.9143));
        assert_eq!(geometry.segments[0].to, geometry.segments[1].from);
        assert_eq!(geometry.directions.len(), 2);
        assert_eq!(geometry.directions[0].distance_m, 2960.0);
    }

    #[test]
    fn no_features_is_empty_geometry() {
        let err = parse_directions_json(&json!({"features": []}).to_string()).unwrap_err();
        assert!(matches!(err, RoutingProviderError::EmptyGeometry { .. }));
    }

    #[test]
    fn single_vertex_is_empty_geometry() {
        let body = json!({"features": [{"geometry": {"coordinates": [[-117.9, 33.8]]}}]});
        let err = parse_directions_json(&body.to_string()).unwrap_err();
        assert!(matches!(err, RoutingProviderError::EmptyGeometry { .. }));
    }

    #[test]
    fn short_position_is_malformed() {
        let body = json!({"features": [{"geometry": {"coordinates": [[-117.9], [-117.8, 33.7]]}}]});
        let err = parse_directions_json(&body.to_string()).unwrap_err();
        assert!(matches!(err, RoutingProviderError::MalformedResponse { .. }));
    }

    #[test]
    fn http_error_status_is_reported() {
        let body = json!({"error": {"code": 2003, "message": "Access denied"}}).to_string();
        let (base_url, server) = serve_once(403, body);
        let client = OpenRouteServiceClient::new("test-key-123456", Duration::from_secs(5))
            .unwrap()
            .with_base_url(base_url);

        let err = client
            .fetch_segments(&coord(33.8366, -117.9143), &coord(33.7455, -117.8677))
            .unwrap_err();
        assert!(matches!(
            err,
            RoutingProviderError::Status { ref provider, ref status, .. }
                if provider == "openrouteservice" && status == "403"
        ));

        let request = server.join().unwrap();
        assert!(request.contains("api_key=test-key-123456"));
    }
}
