//! Routing rules and thresholds.
//!
//! Built once at startup and passed to each component at construction.

use crate::error::ValidationError;
use crate::models::{Coordinate, HazardType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Per-hazard weights used by the composite score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HazardWeights(BTreeMap<HazardType, f64>);

impl HazardWeights {
    pub fn new(weights: impl IntoIterator<Item = (HazardType, f64)>) -> Self {
        Self(weights.into_iter().collect())
    }

    pub fn get(&self, hazard: HazardType) -> Option<f64> {
        self.0.get(&hazard).copied()
    }

    pub fn sum(&self) -> f64 {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (HazardType, f64)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }

    /// Check each weight is in [0, 1] and the sum is at most 1, which keeps
    /// composite scores within [0, 10]. With `strict` the sum must be exactly 1.
    pub fn validate(&self, strict: bool) -> Result<(), ValidationError> {
        for (hazard, weight) in self.iter() {
            if !weight.is_finite() || !(0.0..=1.0).contains(&weight) {
                return Err(ValidationError::WeightOutOfRange {
                    hazard: hazard.to_string(),
                    weight,
                });
            }
        }
        let sum = self.sum();
        if sum > 1.0 + WEIGHT_SUM_TOLERANCE {
            return Err(ValidationError::WeightSumExceeded { sum });
        }
        if strict && (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ValidationError::WeightSum { sum });
        }
        Ok(())
    }
}

impl Default for HazardWeights {
    fn default() -> Self {
        Self::new([
            (HazardType::Weather, 0.20),
            (HazardType::RoadCondition, 0.25),
            (HazardType::Traffic, 0.20),
            (HazardType::Crime, 0.20),
            (HazardType::NaturalDisaster, 0.15),
        ])
    }
}

/// What to do with a reading whose hazard type has no weight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingWeightPolicy {
    /// Contributes zero
    #[default]
    Ignore,
    /// Contributes zero and logs a warning
    Warn,
    /// Fails validation
    Reject,
}

/// Which cost formula scores the edges of a driving polyline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrivingCostPolicy {
    /// Always blend hazard and distance, whatever mode was requested
    #[default]
    AlwaysSafe,
    /// Use the caller's mode (driving costs are then distance only)
    RequestedMode,
}

/// Configuration for scoring and sequencing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingRules {
    pub hazard_weights: HazardWeights,
    /// Exponential decay constant per hour of hazard age
    pub decay_lambda: f64,
    /// Weight of the hazard score in safe-mode cost
    pub hazard_cost_weight: f64,
    /// Weight of distance (km) in safe-mode cost
    pub distance_cost_weight: f64,
    /// Segments scoring above this raise an alert
    pub risk_threshold: f64,
    /// Segments scoring at or above this recommend a reroute
    pub reroute_threshold: f64,
    /// Require hazard weights to sum to 1
    pub strict_weights: bool,
    pub missing_weight_policy: MissingWeightPolicy,
    pub driving_cost_policy: DrivingCostPolicy,
    /// Simulated readings are aged uniformly up to this many hours
    pub simulated_max_age_hours: f64,
    /// Max distance from a segment midpoint to a road feature for surface matching
    pub surface_match_radius_km: f64,
    /// Grid ID lookup for waypoint input
    pub grid_lookup: BTreeMap<String, Coordinate>,
}

impl Default for RoutingRules {
    fn default() -> Self {
        Self {
            hazard_weights: HazardWeights::default(),
            decay_lambda: 0.05,
            hazard_cost_weight: 0.7,
            distance_cost_weight: 0.3,
            risk_threshold: 6.0,
            reroute_threshold: 4.0,
            strict_weights: false,
            missing_weight_policy: MissingWeightPolicy::default(),
            driving_cost_policy: DrivingCostPolicy::default(),
            simulated_max_age_hours: 0.0,
            surface_match_radius_km: 0.5,
            grid_lookup: BTreeMap::from([(
                "B3".to_string(),
                Coordinate {
                    lat: 33.7000,
                    lon: -117.9000,
                },
            )]),
        }
    }
}

impl RoutingRules {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.hazard_weights.validate(self.strict_weights)?;
        non_negative("decay_lambda", self.decay_lambda)?;
        non_negative("hazard_cost_weight", self.hazard_cost_weight)?;
        non_negative("distance_cost_weight", self.distance_cost_weight)?;
        non_negative("risk_threshold", self.risk_threshold)?;
        non_negative("reroute_threshold", self.reroute_threshold)?;
        non_negative("simulated_max_age_hours", self.simulated_max_age_hours)?;
        non_negative("surface_match_radius_km", self.surface_match_radius_km)?;
        for (id, coordinate) in &self.grid_lookup {
            if !coordinate.is_valid() {
                return Err(ValidationError::Rule {
                    field: "grid_lookup",
                    reason: format!("{id} maps to an out-of-range coordinate {coordinate}"),
                });
            }
        }
        Ok(())
    }

    /// Parse rules from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        let rules: RoutingRules = serde_json::from_str(json).map_err(|e| ValidationError::Rule {
            field: "rules",
            reason: e.to_string(),
        })?;
        rules.validate()?;
        Ok(rules)
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::Rule {
            field,
            reason: format!("expected a finite non-negative number, got {value}"),
        })
    }
}
