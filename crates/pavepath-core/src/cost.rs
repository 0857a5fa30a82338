//! Mode-dependent edge cost.

use crate::error::CoreError;
use crate::hazard::{HazardModel, HazardSource};
use crate::models::{round2, Coordinate, HazardReadings, RouteMode};
use crate::rules::RoutingRules;
use crate::spatial;
use chrono::{DateTime, Utc};

/// Cost of one candidate edge.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentCost {
    /// Rounded to 2 decimals
    pub cost: f64,
    /// Unrounded; used to rank candidates
    pub raw_cost: f64,
    pub hazard_score: f64,
    pub distance_km: f64,
    pub hazards: HazardReadings,
}

/// Blends hazard score and distance into one scalar per routing mode.
#[derive(Debug, Clone)]
pub struct CostFunction {
    model: HazardModel,
    hazard_weight: f64,
    distance_weight: f64,
}

impl CostFunction {
    pub fn new(model: HazardModel, hazard_weight: f64, distance_weight: f64) -> Self {
        Self {
            model,
            hazard_weight,
            distance_weight,
        }
    }

    pub fn from_rules(rules: &RoutingRules) -> Self {
        Self::new(
            HazardModel::from_rules(rules),
            rules.hazard_cost_weight,
            rules.distance_cost_weight,
        )
    }

    /// Cost of travelling `start -> end` under `mode`.
    ///
    /// The hazard score is always computed and reported; only `Safe` folds it
    /// into the cost.
    pub fn compute_segment_cost(
        &self,
        start: &Coordinate,
        end: &Coordinate,
        mode: RouteMode,
        hazards: &mut dyn HazardSource,
        now: DateTime<Utc>,
    ) -> Result<SegmentCost, CoreError> {
        let distance_km = spatial::distance(start, end)?;
        let readings = hazards.readings(start, end, now)?;
        let hazard_score = self.model.composite_score(&readings, now)?;

        let raw_cost = match mode {
            RouteMode::Safe => {
                hazard_score * self.hazard_weight + distance_km * self.distance_weight
            }
            RouteMode::Fast | RouteMode::Driving => distance_km,
        };

        Ok(SegmentCost {
            cost: round2(raw_cost),
            raw_cost,
            hazard_score,
            distance_km,
            hazards: readings,
        })
    }
}

impl Default for CostFunction {
    fn default() -> Self {
        Self::from_rules(&RoutingRules::default())
    }
}
