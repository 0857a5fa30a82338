//! Route-level hazard aggregation and threshold alerts.

use crate::error::CoreError;
use crate::hazard::HazardModel;
use crate::models::{round2, HazardReadings, RiskAlert, RouteResult, RouteSummary, SegmentScore};
use crate::rules::RoutingRules;
use chrono::{DateTime, Utc};
use std::sync::Mutex;

/// Receives risk alerts raised during analysis.
pub trait AlertSink {
    fn emit(&self, alert: &RiskAlert);
}

impl<F> AlertSink for F
where
    F: Fn(&RiskAlert),
{
    fn emit(&self, alert: &RiskAlert) {
        self(alert)
    }
}

/// Logs each alert as a structured `tracing` warning.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAlertSink;

impl AlertSink for TracingAlertSink {
    fn emit(&self, alert: &RiskAlert) {
        tracing::warn!(
            segment_index = alert.segment_index,
            score = alert.score,
            threshold = alert.threshold,
            "segment exceeds risk threshold"
        );
    }
}

/// Keeps alerts in memory so callers can return them.
#[derive(Debug, Default)]
pub struct CollectingAlertSink {
    alerts: Mutex<Vec<RiskAlert>>,
}

impl CollectingAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_alerts(self) -> Vec<RiskAlert> {
        self.alerts
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl AlertSink for CollectingAlertSink {
    fn emit(&self, alert: &RiskAlert) {
        match self.alerts.lock() {
            Ok(mut alerts) => alerts.push(alert.clone()),
            Err(poisoned) => poisoned.into_inner().push(alert.clone()),
        }
    }
}

/// Scores each segment and summarizes the route.
pub struct RouteAnalyzer<S = TracingAlertSink> {
    model: HazardModel,
    risk_threshold: f64,
    sink: S,
}

impl RouteAnalyzer<TracingAlertSink> {
    pub fn new(rules: &RoutingRules) -> Self {
        Self {
            model: HazardModel::from_rules(rules),
            risk_threshold: rules.risk_threshold,
            sink: TracingAlertSink,
        }
    }
}

impl<S: AlertSink> RouteAnalyzer<S> {
    pub fn with_sink<T: AlertSink>(self, sink: T) -> RouteAnalyzer<T> {
        RouteAnalyzer {
            model: self.model,
            risk_threshold: self.risk_threshold,
            sink,
        }
    }

    pub fn with_threshold(mut self, risk_threshold: f64) -> Self {
        self.risk_threshold = risk_threshold;
        self
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Summarize per-segment readings given in route order.
    ///
    /// Fails with [`CoreError::EmptyRouteSummary`] when there are no segments.
    pub fn analyze(
        &self,
        segment_readings: &[HazardReadings],
        now: DateTime<Utc>,
    ) -> Result<RouteSummary, CoreError> {
        if segment_readings.is_empty() {
            return Err(CoreError::EmptyRouteSummary);
        }

        let mut segment_scores = Vec::with_capacity(segment_readings.len());
        let mut total = 0.0;
        let mut highest: Option<(usize, f64)> = None;

        for (index, readings) in segment_readings.iter().enumerate() {
            let score = self.model.composite_score(readings, now)?;
            if score > self.risk_threshold {
                self.sink.emit(&RiskAlert {
                    segment_index: index,
                    score: round2(score),
                    threshold: self.risk_threshold,
                });
            }
            if highest.map_or(true, |(_, max)| score > max) {
                highest = Some((index, score));
            }
            total += score;
            segment_scores.push(SegmentScore {
                segment_index: index,
                score: round2(score),
                hazards: readings
                    .iter()
                    .map(|(hazard, reading)| (*hazard, reading.severity))
                    .collect(),
            });
        }

        let average_score = round2(total / segment_readings.len() as f64);
        let highest_risk_segment = highest.map(|(index, _)| index).unwrap_or_default();

        Ok(RouteSummary {
            segment_scores,
            average_score,
            highest_risk_segment,
        })
    }

    /// Recompute a summary from the readings carried by a route's segments.
    pub fn analyze_route(
        &self,
        route: &RouteResult,
        now: DateTime<Utc>,
    ) -> Result<RouteSummary, CoreError> {
        self.analyze(&route.segment_readings(), now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HazardReading, HazardType};

    fn reading(severity: f64, observed_at: DateTime<Utc>) -> HazardReading {
        HazardReading {
            severity,
            observed_at,
        }
    }

    fn readings(severity: f64, now: DateTime<Utc>) -> HazardReadings {
        HazardType::ALL
            .iter()
            .map(|h| (*h, reading(severity, now)))
            .collect()
    }

    #[test]
    fn empty_input_is_an_explicit_error() {
        let analyzer = RouteAnalyzer::new(&RoutingRules::default());
        assert_eq!(
            analyzer.analyze(&[], Utc::now()),
            Err(CoreError::EmptyRouteSummary)
        );
    }

    #[test]
    fn summary_averages_and_finds_first_maximum() {
        let now = Utc::now();
        let analyzer = RouteAnalyzer::new(&RoutingRules::default());
        let summary = analyzer
            .analyze(
                &[readings(2.0, now), readings(8.0, now), readings(8.0, now), readings(4.0, now)],
                now,
            )
            .unwrap();
        assert_eq!(summary.segment_scores.len(), 4);
        assert_eq!(summary.highest_risk_segment, 1);
        assert_eq!(summary.average_score, 5.5);
        assert_eq!(summary.segment_scores[3].segment_index, 3);
        assert_eq!(summary.segment_scores[0].hazards[&HazardType::Traffic], 2.0);
    }

    #[test]
    fn alerts_fire_only_above_threshold() {
        let now = Utc::now();
        let analyzer =
            RouteAnalyzer::new(&RoutingRules::default()).with_sink(CollectingAlertSink::new());
        analyzer
            .analyze(
                &[readings(5.0, now), readings(6.5, now), readings(9.0, now)],
                now,
            )
            .unwrap();
        let alerts = analyzer.into_sink().into_alerts();
        let indices: Vec<usize> = alerts.iter().map(|a| a.segment_index).collect();
        assert_eq!(indices, vec![1, 2]);
        assert!(alerts.iter().all(|a| a.threshold == 6.0));
    }

    #[test]
    fn closure_sinks_receive_alerts() {
        let now = Utc::now();
        let seen = std::cell::Cell::new(0);
        let analyzer = RouteAnalyzer::new(&RoutingRules::default())
            .with_threshold(1.0)
            .with_sink(|_: &RiskAlert| seen.set(seen.get() + 1));
        analyzer
            .analyze(&[readings(5.0, now), readings(0.5, now)], now)
            .unwrap();
        assert_eq!(seen.get(), 1);
    }

    #[test]
    fn segment_without_readings_scores_zero() {
        let now = Utc::now();
        let analyzer = RouteAnalyzer::new(&RoutingRules::default());
        let summary = analyzer
            .analyze(&[HazardReadings::new(), readings(3.0, now)], now)
            .unwrap();
        assert_eq!(summary.segment_scores[0].score, 0.0);
        assert!(summary.segment_scores[0].hazards.is_empty());
        assert_eq!(summary.highest_risk_segment, 1);
    }

    #[test]
    fn reroute_is_recommended_at_threshold() {
        let now = Utc::now();
        let analyzer = RouteAnalyzer::new(&RoutingRules::default());
        let summary = analyzer
            .analyze(&[readings(1.0, now), readings(4.0, now)], now)
            .unwrap();
        assert!(summary.requires_reroute(4.0));
        assert!(!summary.requires_reroute(4.5));
    }

    #[test]
    fn single_severe_hazard_requires_reroute() {
        let now = Utc::now();
        let flooded = HazardReadings::from([(
            HazardType::NaturalDisaster,
            reading(5.0, now),
        )]);
        let summary = RouteAnalyzer::new(&RoutingRules::default())
            .analyze(&[flooded], now)
            .unwrap();
        assert_eq!(summary.segment_scores[0].score, 0.75);
        assert!(summary.requires_reroute(RoutingRules::default().reroute_threshold));
    }
}
