//! Hazard readings and scoring.
//!
//! A [`HazardSource`] produces readings for a segment; [`HazardModel`]
//! reduces them to one decayed, weighted composite score.

use crate::error::{CoreError, ValidationError};
use crate::models::{Coordinate, HazardReading, HazardReadings, HazardType, MAX_SEVERITY};
use crate::rules::{HazardWeights, MissingWeightPolicy, RoutingRules};
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Supplies hazard readings for a candidate segment.
pub trait HazardSource {
    fn readings(
        &mut self,
        from: &Coordinate,
        to: &Coordinate,
        now: DateTime<Utc>,
    ) -> Result<HazardReadings, CoreError>;
}

/// Pseudo-random hazard generator. Deterministic for a given seed.
#[derive(Debug, Clone)]
pub struct SimulatedHazards {
    rng: StdRng,
    max_age_hours: f64,
}

impl SimulatedHazards {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            max_age_hours: 0.0,
        }
    }

    /// Seeded from the operating system.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
            max_age_hours: 0.0,
        }
    }

    pub fn with_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::from_seed(seed),
            None => Self::from_entropy(),
        }
    }

    /// Backdate each reading by a uniform age in `[0, hours]`.
    pub fn with_max_age_hours(mut self, hours: f64) -> Self {
        self.max_age_hours = if hours.is_finite() { hours.max(0.0) } else { 0.0 };
        self
    }

    /// One reading per known hazard type, severity uniform in [0, 10].
    pub fn simulate(&mut self, now: DateTime<Utc>) -> HazardReadings {
        HazardType::ALL
            .iter()
            .map(|hazard| {
                let severity = self.rng.random_range(0.0..=MAX_SEVERITY);
                let age_hours = if self.max_age_hours > 0.0 {
                    self.rng.random_range(0.0..=self.max_age_hours)
                } else {
                    0.0
                };
                let age = Duration::milliseconds((age_hours * 3_600_000.0) as i64);
                (
                    *hazard,
                    HazardReading {
                        severity,
                        observed_at: now - age,
                    },
                )
            })
            .collect()
    }
}

impl HazardSource for SimulatedHazards {
    fn readings(
        &mut self,
        _from: &Coordinate,
        _to: &Coordinate,
        now: DateTime<Utc>,
    ) -> Result<HazardReadings, CoreError> {
        Ok(self.simulate(now))
    }
}

/// Readings supplied up front, one set per segment in route order.
///
/// Segments past the end of the list get no readings.
#[derive(Debug, Clone, Default)]
pub struct FixedHazards {
    readings: Vec<HazardReadings>,
    next: usize,
}

impl FixedHazards {
    pub fn new(readings: Vec<HazardReadings>) -> Self {
        Self { readings, next: 0 }
    }
}

impl HazardSource for FixedHazards {
    fn readings(
        &mut self,
        _from: &Coordinate,
        _to: &Coordinate,
        _now: DateTime<Utc>,
    ) -> Result<HazardReadings, CoreError> {
        let readings = self.readings.get(self.next).cloned().unwrap_or_default();
        self.next += 1;
        Ok(readings)
    }
}

/// Age-decayed, weighted hazard scoring.
#[derive(Debug, Clone)]
pub struct HazardModel {
    weights: HazardWeights,
    decay_lambda: f64,
    missing_weight_policy: MissingWeightPolicy,
}

impl HazardModel {
    pub fn new(
        weights: HazardWeights,
        decay_lambda: f64,
        missing_weight_policy: MissingWeightPolicy,
    ) -> Self {
        Self {
            weights,
            decay_lambda,
            missing_weight_policy,
        }
    }

    pub fn from_rules(rules: &RoutingRules) -> Self {
        Self::new(
            rules.hazard_weights.clone(),
            rules.decay_lambda,
            rules.missing_weight_policy,
        )
    }

    /// `severity * exp(-lambda * age_hours)`.
    ///
    /// Readings stamped in the future are treated as age zero.
    pub fn score(&self, severity: f64, observed_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
        let age_hours = (now - observed_at).num_milliseconds() as f64 / 3_600_000.0;
        decayed_severity(severity, age_hours.max(0.0), self.decay_lambda)
    }

    /// Weighted sum of decayed severities, unrounded.
    pub fn composite_score(
        &self,
        readings: &HazardReadings,
        now: DateTime<Utc>,
    ) -> Result<f64, ValidationError> {
        let mut total = 0.0;
        for (hazard, reading) in readings {
            reading.validate(*hazard)?;
            let Some(weight) = self.weights.get(*hazard) else {
                match self.missing_weight_policy {
                    MissingWeightPolicy::Ignore => {}
                    MissingWeightPolicy::Warn => {
                        tracing::warn!(%hazard, "no weight configured, reading ignored");
                    }
                    MissingWeightPolicy::Reject => {
                        return Err(ValidationError::MissingWeight {
                            hazard: hazard.to_string(),
                        });
                    }
                }
                continue;
            };
            total += weight * self.score(reading.severity, reading.observed_at, now);
        }
        Ok(total)
    }
}

impl Default for HazardModel {
    fn default() -> Self {
        Self::from_rules(&RoutingRules::default())
    }
}

pub fn decayed_severity(severity: f64, age_hours: f64, lambda: f64) -> f64 {
    severity * (-lambda * age_hours).exp()
}
