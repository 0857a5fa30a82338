//! OpenCage forward geocoding.

use crate::http::{build_client, mask_key, read_json};
use pavepath_core::{Coordinate, Geocoder, RoutingProviderError};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;

const PROVIDER: &str = "opencage";
const DEFAULT_BASE_URL: &str = "https://api.opencagedata.com/geocode/v1/json";

pub struct OpenCageGeocoder {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OpenCageGeocoder {
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

impl Geocoder for OpenCageGeocoder {
    fn resolve(&self, address: &str) -> Result<Option<Coordinate>, RoutingProviderError> {
        tracing::debug!(provider = PROVIDER, key = %mask_key(&self.api_key), address, "geocoding");
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("q", address), ("key", self.api_key.as_str()), ("limit", "1")])
            .send()
            .map_err(|err| RoutingProviderError::transport(PROVIDER, err))?;
        let body: GeocodeResponse = read_json(PROVIDER, response)?;
        Ok(parse_geocode(body))
    }
}

#[derive(Debug, Deserialize)]
pub struct GeocodeResponse {
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
pub struct GeocodeResult {
    pub geometry: Geometry,
}

#[derive(Debug, Deserialize)]
pub struct Geometry {
    pub lat: f64,
    pub lng: f64,
}

/// First result wins; no results means the address is unknown.
pub fn parse_geocode(body: GeocodeResponse) -> Option<Coordinate> {
    body.results.into_iter().next().map(|result| Coordinate {
        lat: result.geometry.lat,
        lon: result.geometry.lng,
    })
}

pub fn parse_geocode_json(json: &str) -> Result<Option<Coordinate>, RoutingProviderError> {
    let body: GeocodeResponse = serde_json::from_str(json)
        .map_err(|err| RoutingProviderError::malformed(PROVIDER, err.to_string()))?;
    Ok(parse_geocode(body))
}
