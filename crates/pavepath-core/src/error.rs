//! Error types shared across the PavePath crates.

use thiserror::Error;

/// Top-level error returned by core operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    RoutingProvider(#[from] RoutingProviderError),
    /// The analyzer was handed a route with no segments.
    #[error("cannot summarize a route with zero segments")]
    EmptyRouteSummary,
}

/// Invalid input rejected before any routing work starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("coordinate ({lat}, {lon}) is out of range")]
    CoordinateOutOfRange { lat: f64, lon: f64 },
    #[error("waypoint {index} is invalid: ({lat}, {lon}) is out of range")]
    WaypointOutOfRange { index: usize, lat: f64, lon: f64 },
    #[error("at least one waypoint is required")]
    EmptyWaypoints,
    #[error("waypoint {index} ('{input}') could not be resolved to a coordinate")]
    UnresolvedWaypoint { index: usize, input: String },
    #[error("hazard severity {severity} for {hazard} is outside [0, 10]")]
    SeverityOutOfRange { hazard: String, severity: f64 },
    #[error("weight {weight} for {hazard} is outside [0, 1]")]
    WeightOutOfRange { hazard: String, weight: f64 },
    #[error("hazard weights sum to {sum}, expected 1.0")]
    WeightSum { sum: f64 },
    #[error("hazard weights sum to {sum}, more than 1.0")]
    WeightSumExceeded { sum: f64 },
    #[error("no weight configured for hazard type {hazard}")]
    MissingWeight { hazard: String },
    #[error("invalid routing rule {field}: {reason}")]
    Rule { field: &'static str, reason: String },
}

/// Failure reported by a directions or geocoding provider.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RoutingProviderError {
    #[error("{provider} request failed: {message}")]
    Transport { provider: String, message: String },
    #[error("{provider} returned status {status}: {message}")]
    Status {
        provider: String,
        status: String,
        message: String,
    },
    #[error("{provider} returned a malformed response: {message}")]
    MalformedResponse { provider: String, message: String },
    #[error("{provider} returned an empty route geometry")]
    EmptyGeometry { provider: String },
    #[error("no {what} provider is configured")]
    NotConfigured { what: &'static str },
}

impl RoutingProviderError {
    pub fn transport(provider: &str, message: impl ToString) -> Self {
        Self::Transport {
            provider: provider.to_string(),
            message: message.to_string(),
        }
    }

    pub fn malformed(provider: &str, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            provider: provider.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T, E = CoreError> = std::result::Result<T, E>;
