//! Route sequencing.
//!
//! Multi-stop routes are ordered greedily by edge cost starting from the
//! first waypoint. Two-point driving routes take their geometry from a
//! [`DirectionsAdapter`] and cost every polyline edge.

use crate::cost::CostFunction;
use crate::error::{CoreError, RoutingProviderError, ValidationError};
use crate::hazard::HazardSource;
use crate::models::{Coordinate, DrivingGeometry, RouteMode, RouteResult, Segment};
use crate::rules::{DrivingCostPolicy, RoutingRules};
use chrono::{DateTime, Utc};

/// Supplies real-road geometry between two points.
pub trait DirectionsAdapter {
    fn fetch_segments(
        &self,
        origin: &Coordinate,
        destination: &Coordinate,
    ) -> Result<DrivingGeometry, RoutingProviderError>;
}

/// Orders waypoints into a scored route.
pub struct RouteSequencer<'a> {
    cost: CostFunction,
    driving_cost_policy: DrivingCostPolicy,
    directions: Option<&'a dyn DirectionsAdapter>,
}

impl<'a> RouteSequencer<'a> {
    pub fn new(rules: &RoutingRules) -> Self {
        Self {
            cost: CostFunction::from_rules(rules),
            driving_cost_policy: rules.driving_cost_policy,
            directions: None,
        }
    }

    pub fn with_directions(mut self, directions: &'a dyn DirectionsAdapter) -> Self {
        self.directions = Some(directions);
        self
    }

    /// Build a route over `waypoints`.
    ///
    /// Every waypoint is validated before any edge is evaluated. Fewer than two
    /// waypoints yields a route with no segments.
    pub fn optimize(
        &self,
        waypoints: &[Coordinate],
        mode: RouteMode,
        hazards: &mut dyn HazardSource,
        now: DateTime<Utc>,
    ) -> Result<RouteResult, CoreError> {
        validate_waypoints(waypoints)?;

        if waypoints.len() < 2 {
            return Ok(RouteResult::empty(waypoints.to_vec(), mode));
        }

        if mode == RouteMode::Driving && waypoints.len() == 2 {
            return self.optimize_driving(&waypoints[0], &waypoints[1], mode, hazards, now);
        }

        self.optimize_greedy(waypoints, mode, hazards, now)
    }

    fn optimize_greedy(
        &self,
        waypoints: &[Coordinate],
        mode: RouteMode,
        hazards: &mut dyn HazardSource,
        now: DateTime<Utc>,
    ) -> Result<RouteResult, CoreError> {
        let mut unvisited: Vec<Coordinate> = waypoints[1..].to_vec();
        let mut route = vec![waypoints[0]];
        let mut segments = Vec::with_capacity(unvisited.len());

        while !unvisited.is_empty() {
            let last = route[route.len() - 1];

            // Strict less-than keeps the first minimum in scan order.
            let mut best: Option<(usize, crate::cost::SegmentCost)> = None;
            for (index, candidate) in unvisited.iter().enumerate() {
                let cost = self
                    .cost
                    .compute_segment_cost(&last, candidate, mode, hazards, now)?;
                let better = match &best {
                    Some((_, current)) => cost.raw_cost < current.raw_cost,
                    None => true,
                };
                if better {
                    best = Some((index, cost));
                }
            }

            let Some((index, cost)) = best else {
                break;
            };
            let next = unvisited.remove(index);
            tracing::debug!(
                from = %last,
                to = %next,
                cost = cost.cost,
                hazard_score = cost.hazard_score,
                "selected next waypoint"
            );
            segments.push(Segment {
                from: last,
                to: next,
                distance_km: cost.distance_km,
                hazard_score: cost.hazard_score,
                composite_cost: cost.cost,
                hazards: cost.hazards,
            });
            route.push(next);
        }

        Ok(RouteResult {
            ordered_waypoints: route,
            segments,
            directions: Vec::new(),
            mode,
        })
    }

    fn optimize_driving(
        &self,
        origin: &Coordinate,
        destination: &Coordinate,
        mode: RouteMode,
        hazards: &mut dyn HazardSource,
        now: DateTime<Utc>,
    ) -> Result<RouteResult, CoreError> {
        let directions = self
            .directions
            .ok_or(RoutingProviderError::NotConfigured { what: "directions" })?;
        let geometry = directions.fetch_segments(origin, destination)?;
        if geometry.segments.is_empty() {
            return Err(RoutingProviderError::EmptyGeometry {
                provider: "directions".to_string(),
            }
            .into());
        }

        let edge_mode = match self.driving_cost_policy {
            DrivingCostPolicy::AlwaysSafe => RouteMode::Safe,
            DrivingCostPolicy::RequestedMode => mode,
        };

        let mut segments = Vec::with_capacity(geometry.segments.len());
        for edge in &geometry.segments {
            let cost = self
                .cost
                .compute_segment_cost(&edge.from, &edge.to, edge_mode, hazards, now)?;
            segments.push(Segment {
                from: edge.from,
                to: edge.to,
                distance_km: cost.distance_km,
                hazard_score: cost.hazard_score,
                composite_cost: cost.cost,
                hazards: cost.hazards,
            });
        }

        tracing::debug!(
            edges = segments.len(),
            steps = geometry.directions.len(),
            "annotated driving route"
        );

        Ok(RouteResult {
            ordered_waypoints: vec![*origin, *destination],
            segments,
            directions: geometry.directions,
            mode,
        })
    }
}

fn validate_waypoints(waypoints: &[Coordinate]) -> Result<(), ValidationError> {
    for (index, waypoint) in waypoints.iter().enumerate() {
        if !waypoint.is_valid() {
            return Err(ValidationError::WaypointOutOfRange {
                index,
                lat: waypoint.lat,
                lon: waypoint.lon,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hazard::{FixedHazards, SimulatedHazards};
    use crate::models::{DirectionStep, HazardReading, HazardReadings, HazardType, SegmentEndpoints};

    fn reading(severity: f64, observed_at: DateTime<Utc>) -> HazardReading {
        HazardReading {
            severity,
            observed_at,
        }
    }

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate { lat, lon }
    }

    fn zero_hazards() -> FixedHazards {
        FixedHazards::default()
    }

    fn readings(severity: f64, now: DateTime<Utc>) -> HazardReadings {
        HazardType::ALL
            .iter()
            .map(|h| (*h, reading(severity, now)))
            .collect()
    }

    struct FailingDirections;

    impl DirectionsAdapter for FailingDirections {
        fn fetch_segments(
            &self,
            _origin: &Coordinate,
            _destination: &Coordinate,
        ) -> Result<DrivingGeometry, RoutingProviderError> {
            Err(RoutingProviderError::Status {
                provider: "stub".into(),
                status: "ZERO_RESULTS".into(),
                message: "no route".into(),
            })
        }
    }

    struct EmptyDirections;

    impl DirectionsAdapter for EmptyDirections {
        fn fetch_segments(
            &self,
            _origin: &Coordinate,
            _destination: &Coordinate,
        ) -> Result<DrivingGeometry, RoutingProviderError> {
            Ok(DrivingGeometry::default())
        }
    }

    #[test]
    fn empty_and_single_waypoint_routes_have_no_segments() {
        let rules = RoutingRules::default();
        let sequencer = RouteSequencer::new(&rules);
        let now = Utc::now();

        let empty = sequencer
            .optimize(&[], RouteMode::Safe, &mut zero_hazards(), now)
            .unwrap();
        assert!(empty.segments.is_empty());
        assert!(empty.ordered_waypoints.is_empty());

        let single = sequencer
            .optimize(&[coord(1.0, 2.0)], RouteMode::Fast, &mut zero_hazards(), now)
            .unwrap();
        assert_eq!(single.ordered_waypoints, vec![coord(1.0, 2.0)]);
        assert!(single.segments.is_empty());
    }

    #[test]
    fn greedy_visits_nearest_first_without_hazards() {
        let rules = RoutingRules::default();
        let sequencer = RouteSequencer::new(&rules);
        let points = [coord(0.0, 0.0), coord(0.0, 3.0), coord(0.0, 1.0), coord(0.0, 2.0)];
        let route = sequencer
            .optimize(&points, RouteMode::Safe, &mut zero_hazards(), Utc::now())
            .unwrap();
        assert_eq!(
            route.ordered_waypoints,
            vec![coord(0.0, 0.0), coord(0.0, 1.0), coord(0.0, 2.0), coord(0.0, 3.0)]
        );
        assert_eq!(route.segments.len(), 3);
        assert_eq!(route.segments[0].from, coord(0.0, 0.0));
        assert_eq!(route.segments[2].to, coord(0.0, 3.0));
    }

    #[test]
    fn ties_keep_first_candidate_in_unvisited_order() {
        let rules = RoutingRules::default();
        let sequencer = RouteSequencer::new(&rules);
        // Both candidates are exactly 1 degree of longitude away.
        let points = [coord(0.0, 0.0), coord(0.0, -1.0), coord(0.0, 1.0)];
        let route = sequencer
            .optimize(&points, RouteMode::Fast, &mut zero_hazards(), Utc::now())
            .unwrap();
        assert_eq!(route.ordered_waypoints[1], coord(0.0, -1.0));
    }

    #[test]
    fn safe_mode_prefers_low_hazard_edge() {
        let rules = RoutingRules::default();
        let sequencer = RouteSequencer::new(&rules);
        let now = Utc::now();
        // First step evaluates B then C: B is closer but dangerous.
        let points = [coord(0.0, 0.0), coord(0.0, 0.01), coord(0.0, 0.02)];
        let mut hazards = FixedHazards::new(vec![readings(10.0, now), readings(0.0, now)]);
        let route = sequencer
            .optimize(&points, RouteMode::Safe, &mut hazards, now)
            .unwrap();
        assert_eq!(route.ordered_waypoints[1], coord(0.0, 0.02));
    }

    #[test]
    fn invalid_waypoint_fails_before_sequencing() {
        let rules = RoutingRules::default();
        let sequencer = RouteSequencer::new(&rules);
        let err = sequencer
            .optimize(
                &[coord(0.0, 0.0), coord(0.0, 181.0)],
                RouteMode::Safe,
                &mut SimulatedHazards::from_seed(3),
                Utc::now(),
            )
            .unwrap_err();
        assert_eq!(
            err,
            CoreError::Validation(ValidationError::WaypointOutOfRange {
                index: 1,
                lat: 0.0,
                lon: 181.0
            })
        );
    }

    #[test]
    fn driving_without_adapter_is_a_provider_error() {
        let rules = RoutingRules::default();
        let sequencer = RouteSequencer::new(&rules);
        let err = sequencer
            .optimize(
                &[coord(0.0, 0.0), coord(0.0, 1.0)],
                RouteMode::Driving,
                &mut zero_hazards(),
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::RoutingProvider(RoutingProviderError::NotConfigured { .. })
        ));
    }

    #[test]
    fn provider_failure_propagates_unmodified() {
        let rules = RoutingRules::default();
        let directions = FailingDirections;
        let sequencer = RouteSequencer::new(&rules).with_directions(&directions);
        let err = sequencer
            .optimize(
                &[coord(0.0, 0.0), coord(0.0, 1.0)],
                RouteMode::Driving,
                &mut zero_hazards(),
                Utc::now(),
            )
            .unwrap_err();
        assert_eq!(
            err,
            CoreError::RoutingProvider(RoutingProviderError::Status {
                provider: "stub".into(),
                status: "ZERO_RESULTS".into(),
                message: "no route".into(),
            })
        );
    }

    #[test]
    fn empty_geometry_is_rejected() {
        let rules = RoutingRules::default();
        let directions = EmptyDirections;
        let sequencer = RouteSequencer::new(&rules).with_directions(&directions);
        let err = sequencer
            .optimize(
                &[coord(0.0, 0.0), coord(0.0, 1.0)],
                RouteMode::Driving,
                &mut zero_hazards(),
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::RoutingProvider(RoutingProviderError::EmptyGeometry { .. })
        ));
    }

    #[test]
    fn driving_with_more_than_two_points_falls_back_to_greedy() {
        let rules = RoutingRules::default();
        let directions = FailingDirections;
        let sequencer = RouteSequencer::new(&rules).with_directions(&directions);
        let route = sequencer
            .optimize(
                &[coord(0.0, 0.0), coord(0.0, 2.0), coord(0.0, 1.0)],
                RouteMode::Driving,
                &mut SimulatedHazards::from_seed(9),
                Utc::now(),
            )
            .unwrap();
        assert_eq!(route.segments.len(), 2);
        assert!(route.directions.is_empty());
        for segment in &route.segments {
            assert_eq!(segment.composite_cost, crate::models::round2(segment.distance_km));
        }
    }

    struct StraightLine;

    impl DirectionsAdapter for StraightLine {
        fn fetch_segments(
            &self,
            origin: &Coordinate,
            destination: &Coordinate,
        ) -> Result<DrivingGeometry, RoutingProviderError> {
            Ok(DrivingGeometry {
                segments: vec![SegmentEndpoints { from: *origin, to: *destination }],
                directions: vec![DirectionStep {
                    instruction: "Head east".into(),
                    distance_m: 111_195.0,
                    duration_s: 3600.0,
                }],
            })
        }
    }

    #[test]
    fn requested_mode_policy_costs_driving_by_distance() {
        let rules = RoutingRules {
            driving_cost_policy: DrivingCostPolicy::RequestedMode,
            ..RoutingRules::default()
        };
        let directions = StraightLine;
        let sequencer = RouteSequencer::new(&rules).with_directions(&directions);
        let route = sequencer
            .optimize(
                &[coord(0.0, 0.0), coord(0.0, 1.0)],
                RouteMode::Driving,
                &mut SimulatedHazards::from_seed(5),
                Utc::now(),
            )
            .unwrap();
        let segment = &route.segments[0];
        assert_eq!(segment.composite_cost, crate::models::round2(segment.distance_km));
    }
}
