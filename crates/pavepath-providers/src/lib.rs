//! PavePath providers - directions and geocoding clients
//!
//! Each client implements a core seam ([`DirectionsAdapter`] or
//! [`Geocoder`]) over a blocking HTTP call. Response parsing is exposed
//! separately so it can run against stored fixtures.

#[cfg(test)]
mod fixture_server;
pub mod google;
pub mod http;
pub mod opencage;
pub mod ors;

pub use google::GoogleDirectionsClient;
pub use http::mask_key;
pub use opencage::OpenCageGeocoder;
pub use ors::OpenRouteServiceClient;

use pavepath_core::{DirectionsAdapter, Geocoder, RoutingProviderError};
use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

pub type SharedDirections = Arc<dyn DirectionsAdapter + Send + Sync>;
pub type SharedGeocoder = Arc<dyn Geocoder + Send + Sync>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DirectionsProviderKind {
    Google,
    OpenRouteService,
    #[default]
    None,
}

impl FromStr for DirectionsProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "ors" | "openrouteservice" => Ok(Self::OpenRouteService),
            "none" | "" => Ok(Self::None),
            other => Err(format!(
                "unknown directions provider '{other}' (expected google, ors or none)"
            )),
        }
    }
}

/// Provider selection and credentials, read from the environment.
#[derive(Clone, Default)]
pub struct ProviderSettings {
    pub directions: DirectionsProviderKind,
    pub google_api_key: Option<String>,
    pub ors_api_key: Option<String>,
    pub opencage_api_key: Option<String>,
    pub timeout: Duration,
}

impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let masked = |key: &Option<String>| key.as_deref().map(mask_key);
        f.debug_struct("ProviderSettings")
            .field("directions", &self.directions)
            .field("google_api_key", &masked(&self.google_api_key))
            .field("ors_api_key", &masked(&self.ors_api_key))
            .field("opencage_api_key", &masked(&self.opencage_api_key))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ProviderSettings {
    pub fn from_env() -> Self {
        let directions = env::var("PAVEPATH_DIRECTIONS_PROVIDER")
            .ok()
            .and_then(|value| match value.parse() {
                Ok(kind) => Some(kind),
                Err(err) => {
                    tracing::warn!("{}", err);
                    None
                }
            })
            .unwrap_or_default();
        Self {
            directions,
            google_api_key: non_empty_var("GOOGLE_MAPS_API_KEY"),
            ors_api_key: non_empty_var("ORS_API_KEY"),
            opencage_api_key: non_empty_var("OPENCAGE_API_KEY"),
            timeout: Duration::from_secs(
                env::var("PAVEPATH_PROVIDER_TIMEOUT_S")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(12),
            ),
        }
    }

    /// The configured directions client, or `None` when no provider is
    /// selected or its key is missing.
    pub fn build_directions(&self) -> Result<Option<SharedDirections>, RoutingProviderError> {
        let client: SharedDirections = match self.directions {
            DirectionsProviderKind::None => return Ok(None),
            DirectionsProviderKind::Google => match &self.google_api_key {
                Some(key) => Arc::new(GoogleDirectionsClient::new(key.clone(), self.timeout)?),
                None => {
                    tracing::warn!("google directions selected but GOOGLE_MAPS_API_KEY is not set");
                    return Ok(None);
                }
            },
            DirectionsProviderKind::OpenRouteService => match &self.ors_api_key {
                Some(key) => Arc::new(OpenRouteServiceClient::new(key.clone(), self.timeout)?),
                None => {
                    tracing::warn!("openrouteservice selected but ORS_API_KEY is not set");
                    return Ok(None);
                }
            },
        };
        tracing::info!(provider = ?self.directions, "directions provider configured");
        Ok(Some(client))
    }

    pub fn build_geocoder(&self) -> Result<Option<SharedGeocoder>, RoutingProviderError> {
        match &self.opencage_api_key {
            Some(key) => {
                tracing::info!(key = %mask_key(key), "opencage geocoder configured");
                let geocoder: SharedGeocoder =
                    Arc::new(OpenCageGeocoder::new(key.clone(), self.timeout)?);
                Ok(Some(geocoder))
            }
            None => Ok(None),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
