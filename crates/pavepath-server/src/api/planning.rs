//! Route optimization and hazard analysis handlers.
//!
//! Core routing is synchronous and may block on provider calls, so each
//! request runs on the blocking pool.

use axum::{extract::State, Json};
use chrono::Utc;
use pavepath_core::{
    resolve_waypoints, AlertSink, CollectingAlertSink, CoreError, HazardReadings, RiskAlert,
    RouteAnalyzer, RouteMode, RouteResult, RouteSequencer, RouteSummary, SimulatedHazards,
    TracingAlertSink, WaypointInput,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::ApiError;
use crate::state::{AppState, CachingGeocoder};

/// Upper bound on simulated segments per analyze request.
pub const MAX_SIMULATED_SEGMENTS: usize = 10_000;

// === Request/Response types ===

#[derive(Debug, Deserialize)]
pub struct OptimizeRequest {
    pub waypoints: Vec<WaypointInput>,
    #[serde(default)]
    pub mode: RouteMode,
    /// Seed for simulated hazards; omitted means non-deterministic
    pub seed: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct OptimizeResponse {
    pub route: RouteResult,
    /// Absent when the route has no segments
    pub summary: Option<RouteSummary>,
    pub alerts: Vec<RiskAlert>,
    pub requires_reroute: bool,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    /// Per-segment readings in route order
    pub readings: Option<Vec<HazardReadings>>,
    /// Simulate this many segments instead of supplying readings
    pub simulate_segments: Option<usize>,
    pub risk_threshold: Option<f64>,
    pub seed: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub summary: RouteSummary,
    pub alerts: Vec<RiskAlert>,
    pub requires_reroute: bool,
}

// === Handlers ===

pub async fn optimize_route(
    State(state): State<Arc<AppState>>,
    Json(request): Json<OptimizeRequest>,
) -> Result<Json<OptimizeResponse>, ApiError> {
    tracing::info!(
        waypoints = request.waypoints.len(),
        mode = %request.mode,
        "optimize requested"
    );
    let response = run_blocking(move || plan_route(&state, request)).await?;
    Ok(Json(response))
}

pub async fn analyze_route(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let readings = match (request.readings, request.simulate_segments) {
        (Some(readings), _) => readings,
        (None, Some(count)) if count > MAX_SIMULATED_SEGMENTS => {
            return Err(ApiError::BadRequest(format!(
                "simulate_segments must be at most {MAX_SIMULATED_SEGMENTS}"
            )));
        }
        (None, Some(count)) => {
            let mut simulator = SimulatedHazards::with_seed(request.seed)
                .with_max_age_hours(state.rules().simulated_max_age_hours);
            let now = Utc::now();
            (0..count).map(|_| simulator.simulate(now)).collect()
        }
        (None, None) => {
            return Err(ApiError::BadRequest(
                "either readings or simulate_segments is required".to_string(),
            ));
        }
    };
    if let Some(threshold) = request.risk_threshold {
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(ApiError::BadRequest(
                "risk_threshold must be a finite non-negative number".to_string(),
            ));
        }
    }

    let threshold = request
        .risk_threshold
        .unwrap_or(state.rules().risk_threshold);
    let response = run_blocking(move || {
        let (summary, alerts) = summarize(&state, &readings, threshold)?;
        Ok(AnalyzeResponse {
            requires_reroute: summary.requires_reroute(state.rules().reroute_threshold),
            summary,
            alerts,
        })
    })
    .await?;
    Ok(Json(response))
}

// === Blocking work ===

async fn run_blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, CoreError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| ApiError::Internal(format!("routing task failed: {err}")))?
        .map_err(ApiError::from)
}

fn plan_route(state: &AppState, request: OptimizeRequest) -> Result<OptimizeResponse, CoreError> {
    let rules = state.rules();
    let geocoder = CachingGeocoder::new(state);
    let waypoints = resolve_waypoints(&request.waypoints, &rules.grid_lookup, &geocoder)?;

    let mut hazards = SimulatedHazards::with_seed(request.seed)
        .with_max_age_hours(rules.simulated_max_age_hours);
    let mut sequencer = RouteSequencer::new(rules);
    if let Some(directions) = state.directions() {
        sequencer = sequencer.with_directions(directions.as_ref());
    }

    let now = Utc::now();
    let route = sequencer.optimize(&waypoints, request.mode, &mut hazards, now)?;
    if route.segments.is_empty() {
        return Ok(OptimizeResponse {
            route,
            summary: None,
            alerts: Vec::new(),
            requires_reroute: false,
        });
    }

    let (summary, alerts) = summarize(state, &route.segment_readings(), rules.risk_threshold)?;
    tracing::info!(
        segments = route.segments.len(),
        total_cost = route.total_cost(),
        alerts = alerts.len(),
        "route optimized"
    );
    Ok(OptimizeResponse {
        requires_reroute: summary.requires_reroute(rules.reroute_threshold),
        route,
        summary: Some(summary),
        alerts,
    })
}

/// Analyze readings, logging each alert and returning them to the caller.
fn summarize(
    state: &AppState,
    readings: &[HazardReadings],
    threshold: f64,
) -> Result<(RouteSummary, Vec<RiskAlert>), CoreError> {
    let collected = CollectingAlertSink::new();
    let summary = RouteAnalyzer::new(state.rules())
        .with_threshold(threshold)
        .with_sink(|alert: &RiskAlert| {
            TracingAlertSink.emit(alert);
            collected.emit(alert);
        })
        .analyze(readings, Utc::now())?;
    Ok((summary, collected.into_alerts()))
}
