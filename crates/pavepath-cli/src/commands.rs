//! `optimize` and `analyze` command logic, independent of argument parsing.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use pavepath_core::{
    resolve_waypoints, CollectingAlertSink, DirectionsAdapter, Geocoder, HazardReadings,
    NoGeocoder, RiskAlert, RoadFeature, RoadFilter, RouteAnalyzer, RouteMode, RouteResult,
    RouteSequencer, RouteSummary, RoutingRules, SimulatedHazards, SurfaceHazardSource,
    WaypointInput,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::roads::load_roads;

/// Read rules from a JSON file, or use the defaults.
pub fn load_rules(path: Option<&Path>) -> Result<RoutingRules> {
    match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading rules {}", path.display()))?;
            RoutingRules::from_json(&json)
                .with_context(|| format!("invalid rules in {}", path.display()))
        }
        None => Ok(RoutingRules::default()),
    }
}

#[derive(Debug, Serialize)]
pub struct RouteReport {
    pub route: RouteResult,
    pub summary: Option<RouteSummary>,
    pub alerts: Vec<RiskAlert>,
    pub requires_reroute: bool,
}

#[derive(Debug, Serialize)]
pub struct AnalysisReport {
    pub summary: RouteSummary,
    pub alerts: Vec<RiskAlert>,
    pub requires_reroute: bool,
}

pub struct OptimizeOptions {
    pub waypoints: Vec<String>,
    pub mode: RouteMode,
    pub seed: Option<u64>,
}

/// Resolve, sequence and summarize a route.
pub fn optimize(
    options: &OptimizeOptions,
    rules: &RoutingRules,
    directions: Option<&dyn DirectionsAdapter>,
    geocoder: Option<&dyn Geocoder>,
) -> Result<RouteReport> {
    let inputs: Vec<WaypointInput> = options
        .waypoints
        .iter()
        .map(|w| WaypointInput::from(w.as_str()))
        .collect();
    let geocoder = geocoder.unwrap_or(&NoGeocoder);
    let waypoints = resolve_waypoints(&inputs, &rules.grid_lookup, geocoder)?;

    let mut sequencer = RouteSequencer::new(rules);
    if let Some(directions) = directions {
        sequencer = sequencer.with_directions(directions);
    }
    let mut hazards =
        SimulatedHazards::with_seed(options.seed).with_max_age_hours(rules.simulated_max_age_hours);
    let now = Utc::now();
    let route = sequencer.optimize(&waypoints, options.mode, &mut hazards, now)?;

    if route.segments.is_empty() {
        return Ok(RouteReport {
            route,
            summary: None,
            alerts: Vec::new(),
            requires_reroute: false,
        });
    }
    let (summary, alerts) = summarize(rules, rules.risk_threshold, &route.segment_readings(), now)?;
    Ok(RouteReport {
        requires_reroute: summary.requires_reroute(rules.reroute_threshold),
        route,
        summary: Some(summary),
        alerts,
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HazardSourceKind {
    #[default]
    Simulated,
    Surface,
}

impl FromStr for HazardSourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "simulated" => Ok(Self::Simulated),
            "surface" => Ok(Self::Surface),
            other => Err(format!(
                "unknown hazard source '{other}' (expected simulated or surface)"
            )),
        }
    }
}

pub struct AnalyzeOptions {
    pub roads: Option<PathBuf>,
    pub road_type: RoadFilter,
    pub segments: Option<usize>,
    pub source: HazardSourceKind,
    pub threshold: Option<f64>,
    pub seed: Option<u64>,
}

/// Score a road network or a number of simulated segments.
pub fn analyze(options: &AnalyzeOptions, rules: &RoutingRules) -> Result<AnalysisReport> {
    let now = Utc::now();
    let readings = match (&options.roads, options.segments) {
        (Some(path), _) => {
            let roads = options.road_type.apply(load_roads(path)?);
            if roads.is_empty() {
                bail!("no roads in {} match road type {:?}", path.display(), options.road_type);
            }
            road_readings(roads, options, rules, now)
        }
        (None, Some(count)) => {
            if options.source == HazardSourceKind::Surface {
                bail!("--source surface requires --roads");
            }
            let mut simulator = SimulatedHazards::with_seed(options.seed)
                .with_max_age_hours(rules.simulated_max_age_hours);
            (0..count).map(|_| simulator.simulate(now)).collect()
        }
        (None, None) => bail!("either --roads or --segments is required"),
    };

    let threshold = options.threshold.unwrap_or(rules.risk_threshold);
    let (summary, alerts) = summarize(rules, threshold, &readings, now)?;
    Ok(AnalysisReport {
        requires_reroute: summary.requires_reroute(rules.reroute_threshold),
        summary,
        alerts,
    })
}

/// One set of readings per road edge.
fn road_readings(
    roads: Vec<RoadFeature>,
    options: &AnalyzeOptions,
    rules: &RoutingRules,
    now: DateTime<Utc>,
) -> Vec<HazardReadings> {
    let source = SurfaceHazardSource::new(roads, rules.surface_match_radius_km);
    match options.source {
        HazardSourceKind::Surface => source.feature_segments(now),
        HazardSourceKind::Simulated => {
            let edges = source.feature_segments(now).len();
            let mut simulator = SimulatedHazards::with_seed(options.seed)
                .with_max_age_hours(rules.simulated_max_age_hours);
            (0..edges).map(|_| simulator.simulate(now)).collect()
        }
    }
}

fn summarize(
    rules: &RoutingRules,
    threshold: f64,
    readings: &[HazardReadings],
    now: DateTime<Utc>,
) -> Result<(RouteSummary, Vec<RiskAlert>)> {
    let analyzer = RouteAnalyzer::new(rules)
        .with_threshold(threshold)
        .with_sink(CollectingAlertSink::new());
    let summary = analyzer.analyze(readings, now)?;
    Ok((summary, analyzer.into_sink().into_alerts()))
}
