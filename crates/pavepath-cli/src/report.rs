//! Human-readable route and summary output.

use pavepath_core::{RiskAlert, RouteResult, RouteSummary};
use std::fmt::Write;

pub fn format_route(route: &RouteResult) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Route ({} mode, {} waypoints)",
        route.mode,
        route.ordered_waypoints.len()
    );
    for (i, waypoint) in route.ordered_waypoints.iter().enumerate() {
        let _ = writeln!(out, "  {:>2}. {}", i + 1, waypoint);
    }
    if route.segments.is_empty() {
        let _ = writeln!(out, "No segments.");
        return out;
    }

    let _ = writeln!(out, "Segments:");
    for (i, segment) in route.segments.iter().enumerate() {
        let _ = writeln!(
            out,
            "  [{}] {} -> {}  {:.2} km  hazard {:.2}  cost {:.2}",
            i,
            segment.from,
            segment.to,
            segment.distance_km,
            segment.hazard_score,
            segment.composite_cost
        );
    }
    let _ = writeln!(
        out,
        "Total: {:.2} km, cost {:.2}",
        route.total_distance_km(),
        route.total_cost()
    );

    if !route.directions.is_empty() {
        let _ = writeln!(out, "Directions:");
        for step in &route.directions {
            let _ = writeln!(
                out,
                "  - {} ({:.1} km, {:.0} min)",
                step.instruction,
                step.distance_m / 1000.0,
                step.duration_s / 60.0
            );
        }
    }
    out
}

pub fn format_summary(
    summary: &RouteSummary,
    alerts: &[RiskAlert],
    requires_reroute: bool,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Hazard summary ({} segments)", summary.segment_scores.len());
    for score in &summary.segment_scores {
        let breakdown = score
            .hazards
            .iter()
            .map(|(hazard, severity)| format!("{hazard}={severity:.1}"))
            .collect::<Vec<_>>()
            .join(" ");
        let _ = writeln!(
            out,
            "  [{}] score {:.2}  {}",
            score.segment_index, score.score, breakdown
        );
    }
    let _ = writeln!(out, "Average score: {:.2}", summary.average_score);
    if let Some(highest) = summary.highest_risk() {
        let _ = writeln!(
            out,
            "Highest risk segment: {} (score {:.2})",
            highest.segment_index, highest.score
        );
    }
    for alert in alerts {
        let _ = writeln!(
            out,
            "ALERT: segment {} scored {:.2} (threshold {:.2})",
            alert.segment_index, alert.score, alert.threshold
        );
    }
    if requires_reroute {
        let _ = writeln!(out, "Reroute recommended.");
    }
    out
}
