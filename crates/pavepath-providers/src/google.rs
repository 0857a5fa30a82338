//! Google Directions API client.

use crate::http::{build_client, mask_key, read_json, strip_html};
use pavepath_core::{
    Coordinate, DirectionStep, DirectionsAdapter, DrivingGeometry, RoutingProviderError,
    SegmentEndpoints,
};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;

const PROVIDER: &str = "google";
const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/directions/json";

pub struct GoogleDirectionsClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GoogleDirectionsClient {
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

impl DirectionsAdapter for GoogleDirectionsClient {
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
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("origin", format!("{},{}", origin.lat, origin.lon)),
                ("destination", format!("{},{}", destination.lat, destination.lon)),
                ("mode", "driving".to_string()),
                ("key", self.api_key.clone()),
            ])
            .send()
            .map_err(|err| RoutingProviderError::transport(PROVIDER, err))?;
        let body: DirectionsResponse = read_json(PROVIDER, response)?;
        parse_directions(body)
    }
}

#[derive(Debug, Deserialize)]
pub struct DirectionsResponse {
    pub status: String,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub routes: Vec<Route>,
}

#[derive(Debug, Deserialize)]
pub struct Route {
    #[serde(default)]
    pub legs: Vec<Leg>,
}

#[derive(Debug, Deserialize)]
pub struct Leg {
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
pub struct Step {
    pub start_location: LatLng,
    pub end_location: LatLng,
    #[serde(default)]
    pub html_instructions: String,
    pub distance: TextValue,
    pub duration: TextValue,
}

#[derive(Debug, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl From<&LatLng> for Coordinate {
    fn from(value: &LatLng) -> Self {
        Coordinate {
            lat: value.lat,
            lon: value.lng,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TextValue {
    pub value: f64,
}

/// Edges and steps from the first leg of the first route.
pub fn parse_directions(body: DirectionsResponse) -> Result<DrivingGeometry, RoutingProviderError> {
    if body.status != "OK" {
        return Err(RoutingProviderError::Status {
            provider: PROVIDER.to_string(),
            status: body.status,
            message: body.error_message.unwrap_or_default(),
        });
    }

    let steps = body
        .routes
        .into_iter()
        .next()
        .and_then(|route| route.legs.into_iter().next())
        .map(|leg| leg.steps)
        .unwrap_or_default();
    if steps.is_empty() {
        return Err(RoutingProviderError::EmptyGeometry {
            provider: PROVIDER.to_string(),
        });
    }

    let mut geometry = DrivingGeometry::default();
    for step in &steps {
        geometry.segments.push(SegmentEndpoints {
            from: (&step.start_location).into(),
            to: (&step.end_location).into(),
        });
        geometry.directions.push(DirectionStep {
            instruction: strip_html(&step.html_instructions),
            distance_m: step.distance.value,
            duration_s: step.duration.value,
        });
    }
    Ok(geometry)
}

/// Parse a raw JSON body. Used by tests and offline fixtures.
pub fn parse_directions_json(json: &str) -> Result<DrivingGeometry, RoutingProviderError> {
    let body: DirectionsResponse = serde_json::from_str(json)
        .map_err(|err| RoutingProviderError::malformed(PROVIDER, err.to_string()))?;
    parse_directions(body)
}
