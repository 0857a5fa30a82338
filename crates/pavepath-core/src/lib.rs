//! Hazard-aware route planning.
//!
//! Waypoints are ordered by a greedy nearest-neighbor search over a blended
//! hazard/distance cost, then summarized per segment with threshold alerts.

pub mod analyzer;
pub mod cost;
pub mod error;
pub mod hazard;
pub mod input;
pub mod models;
pub mod routing;
pub mod rules;
pub mod spatial;
pub mod surface;

pub use analyzer::{AlertSink, CollectingAlertSink, RouteAnalyzer, TracingAlertSink};
pub use cost::{CostFunction, SegmentCost};
pub use error::{CoreError, RoutingProviderError, ValidationError};
pub use hazard::{decayed_severity, FixedHazards, HazardModel, HazardSource, SimulatedHazards};
pub use input::{resolve_waypoints, Geocoder, NoGeocoder, WaypointInput};
pub use models::{
    round2, Coordinate, DirectionStep, DrivingGeometry, HazardReading, HazardReadings,
    HazardType, RiskAlert, RouteMode, RouteResult, RouteSummary, Segment, SegmentEndpoints,
    SegmentScore,
};
pub use routing::{DirectionsAdapter, RouteSequencer};
pub use rules::{DrivingCostPolicy, HazardWeights, MissingWeightPolicy, RoutingRules};
pub use spatial::haversine_km;
pub use surface::{surface_readings, RoadFeature, RoadFilter, SurfaceHazardSource};
