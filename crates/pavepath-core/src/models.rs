//! Core data models for hazard-aware routing.

use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    /// Build a coordinate, rejecting out-of-range or non-finite values.
    pub fn new(lat: f64, lon: f64) -> Result<Self, ValidationError> {
        let coordinate = Self { lat, lon };
        coordinate.validate()?;
        Ok(coordinate)
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(ValidationError::CoordinateOutOfRange {
                lat: self.lat,
                lon: self.lon,
            })
        }
    }

    /// Midpoint in degree space. Good enough for matching short road segments.
    pub fn midpoint(&self, other: &Coordinate) -> Coordinate {
        Coordinate {
            lat: (self.lat + other.lat) / 2.0,
            lon: (self.lon + other.lon) / 2.0,
        }
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(value: Coordinate) -> Self {
        [value.lat, value.lon]
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.4}, {:.4})", self.lat, self.lon)
    }
}

/// Kinds of hazard signal contributing to a segment's risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardType {
    Weather,
    RoadCondition,
    Traffic,
    Crime,
    NaturalDisaster,
}

impl HazardType {
    pub const ALL: [HazardType; 5] = [
        HazardType::Weather,
        HazardType::RoadCondition,
        HazardType::Traffic,
        HazardType::Crime,
        HazardType::NaturalDisaster,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HazardType::Weather => "weather",
            HazardType::RoadCondition => "road_condition",
            HazardType::Traffic => "traffic",
            HazardType::Crime => "crime",
            HazardType::NaturalDisaster => "natural_disaster",
        }
    }
}

impl fmt::Display for HazardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const MAX_SEVERITY: f64 = 10.0;

/// A single hazard observation. The hazard type is the key it is stored under.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HazardReading {
    /// 0 (none) to 10 (extreme)
    pub severity: f64,
    pub observed_at: DateTime<Utc>,
}

impl HazardReading {
    pub fn new(
        hazard: HazardType,
        severity: f64,
        observed_at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let reading = Self {
            severity,
            observed_at,
        };
        reading.validate(hazard)?;
        Ok(reading)
    }

    pub fn validate(&self, hazard: HazardType) -> Result<(), ValidationError> {
        if self.severity.is_finite() && (0.0..=MAX_SEVERITY).contains(&self.severity) {
            Ok(())
        } else {
            Err(ValidationError::SeverityOutOfRange {
                hazard: hazard.to_string(),
                severity: self.severity,
            })
        }
    }
}

/// All readings for one segment, keyed by hazard type.
pub type HazardReadings = BTreeMap<HazardType, HazardReading>;

/// Requested routing behaviour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteMode {
    /// Blend hazard and distance
    #[default]
    Safe,
    /// Distance only
    Fast,
    /// Real-road geometry from a directions provider
    Driving,
}

impl fmt::Display for RouteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RouteMode::Safe => "safe",
            RouteMode::Fast => "fast",
            RouteMode::Driving => "driving",
        })
    }
}

impl std::str::FromStr for RouteMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "safe" => Ok(RouteMode::Safe),
            "fast" => Ok(RouteMode::Fast),
            "driving" => Ok(RouteMode::Driving),
            other => Err(format!("unknown route mode '{other}'")),
        }
    }
}

/// Endpoints of one polyline edge returned by a directions provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentEndpoints {
    pub from: Coordinate,
    pub to: Coordinate,
}

/// One turn-by-turn instruction from a directions provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionStep {
    pub instruction: String,
    pub distance_m: f64,
    pub duration_s: f64,
}

/// Road geometry and steps for a driving route.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DrivingGeometry {
    pub segments: Vec<SegmentEndpoints>,
    pub directions: Vec<DirectionStep>,
}

/// A scored route edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub from: Coordinate,
    pub to: Coordinate,
    pub distance_km: f64,
    pub hazard_score: f64,
    /// Rounded to 2 decimals
    pub composite_cost: f64,
    #[serde(default)]
    pub hazards: HazardReadings,
}

/// Output of one optimization call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    pub ordered_waypoints: Vec<Coordinate>,
    pub segments: Vec<Segment>,
    #[serde(default)]
    pub directions: Vec<DirectionStep>,
    pub mode: RouteMode,
}

impl RouteResult {
    pub fn empty(waypoints: Vec<Coordinate>, mode: RouteMode) -> Self {
        Self {
            ordered_waypoints: waypoints,
            segments: Vec::new(),
            directions: Vec::new(),
            mode,
        }
    }

    pub fn total_distance_km(&self) -> f64 {
        self.segments.iter().map(|s| s.distance_km).sum()
    }

    pub fn total_cost(&self) -> f64 {
        round2(self.segments.iter().map(|s| s.composite_cost).sum())
    }

    /// Readings of every segment, in route order.
    pub fn segment_readings(&self) -> Vec<HazardReadings> {
        self.segments.iter().map(|s| s.hazards.clone()).collect()
    }
}

/// Score breakdown for one segment of a summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentScore {
    pub segment_index: usize,
    /// Rounded to 2 decimals
    pub score: f64,
    /// Raw severity per hazard type
    pub hazards: BTreeMap<HazardType, f64>,
}

/// Aggregate statistics over a route's segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSummary {
    pub segment_scores: Vec<SegmentScore>,
    pub average_score: f64,
    pub highest_risk_segment: usize,
}

impl RouteSummary {
    /// True when any single hazard on any segment reaches the reroute
    /// threshold. Raw severities are compared, not the weighted score, so one
    /// severe hazard (a flooded road) is enough.
    pub fn requires_reroute(&self, threshold: f64) -> bool {
        self.segment_scores
            .iter()
            .flat_map(|s| s.hazards.values())
            .any(|severity| *severity >= threshold)
    }

    pub fn highest_risk(&self) -> Option<&SegmentScore> {
        self.segment_scores.get(self.highest_risk_segment)
    }
}

/// Emitted when a segment's score exceeds the configured risk threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAlert {
    pub segment_index: usize,
    pub score: f64,
    pub threshold: f64,
}

/// Round for reporting. Comparisons should use the unrounded value.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
