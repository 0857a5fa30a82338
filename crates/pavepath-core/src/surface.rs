//! Road-surface hazards derived from mapped road features.

use crate::error::CoreError;
use crate::hazard::HazardSource;
use crate::models::{Coordinate, HazardReading, HazardReadings, HazardType};
use crate::spatial;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

const UNPAVED_SEVERITY: f64 = 2.0;
const GRAVEL_PENALTY: f64 = 1.0;
const FLOOD_SEVERITY: f64 = 5.0;

/// A mapped road: a polyline plus surface attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadFeature {
    pub name: String,
    #[serde(default)]
    pub surface: Option<String>,
    #[serde(default)]
    pub flood_risk: bool,
    pub geometry: Vec<Coordinate>,
}

impl RoadFeature {
    pub fn surface_class(&self) -> SurfaceClass {
        SurfaceClass::from_surface(self.surface.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceClass {
    Paved,
    Unpaved,
    Gravel,
}

impl SurfaceClass {
    /// Missing or unrecognized surface tags count as paved.
    pub fn from_surface(surface: Option<&str>) -> Self {
        match surface.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("unpaved") | Some("dirt") => SurfaceClass::Unpaved,
            Some("gravel") => SurfaceClass::Gravel,
            _ => SurfaceClass::Paved,
        }
    }
}

/// Readings a road contributes to any segment matched to it.
pub fn surface_readings(feature: &RoadFeature, observed_at: DateTime<Utc>) -> HazardReadings {
    let mut readings = HazardReadings::new();
    let road_condition = match feature.surface_class() {
        SurfaceClass::Paved => None,
        SurfaceClass::Unpaved => Some(UNPAVED_SEVERITY),
        SurfaceClass::Gravel => Some(UNPAVED_SEVERITY + GRAVEL_PENALTY),
    };
    if let Some(severity) = road_condition {
        readings.insert(
            HazardType::RoadCondition,
            HazardReading {
                severity,
                observed_at,
            },
        );
    }
    if feature.flood_risk {
        readings.insert(
            HazardType::NaturalDisaster,
            HazardReading {
                severity: FLOOD_SEVERITY,
                observed_at,
            },
        );
    }
    readings
}

/// Which roads to keep when loading a road network.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoadFilter {
    /// Unpaved and gravel roads
    Dirt,
    Paved,
    #[default]
    Both,
}

impl RoadFilter {
    pub fn matches(&self, feature: &RoadFeature) -> bool {
        match self {
            RoadFilter::Both => true,
            RoadFilter::Paved => feature.surface_class() == SurfaceClass::Paved,
            RoadFilter::Dirt => feature.surface_class() != SurfaceClass::Paved,
        }
    }

    pub fn apply(&self, features: Vec<RoadFeature>) -> Vec<RoadFeature> {
        features.into_iter().filter(|f| self.matches(f)).collect()
    }
}

impl FromStr for RoadFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dirt" => Ok(RoadFilter::Dirt),
            "paved" => Ok(RoadFilter::Paved),
            "both" => Ok(RoadFilter::Both),
            other => Err(format!("unknown road type '{other}' (expected dirt, paved or both)")),
        }
    }
}

/// Matches each segment to the nearest road feature and reports its surface
/// readings.
#[derive(Debug, Clone)]
pub struct SurfaceHazardSource {
    features: Vec<RoadFeature>,
    match_radius_km: f64,
}

impl SurfaceHazardSource {
    pub fn new(features: Vec<RoadFeature>, match_radius_km: f64) -> Self {
        Self {
            features,
            match_radius_km,
        }
    }

    /// Closest feature to `point` within the match radius. Ties keep the
    /// first feature.
    pub fn nearest_feature(&self, point: &Coordinate) -> Option<&RoadFeature> {
        let mut best: Option<(&RoadFeature, f64)> = None;
        for feature in &self.features {
            let Some(distance) = spatial::nearest_vertex_km(point, &feature.geometry) else {
                continue;
            };
            if distance > self.match_radius_km {
                continue;
            }
            if best.map_or(true, |(_, current)| distance < current) {
                best = Some((feature, distance));
            }
        }
        best.map(|(feature, _)| feature)
    }

    /// Each consecutive vertex pair of every feature, with that feature's
    /// readings. Used when analyzing a road network directly.
    pub fn feature_segments(&self, observed_at: DateTime<Utc>) -> Vec<HazardReadings> {
        self.features
            .iter()
            .flat_map(|feature| {
                let readings = surface_readings(feature, observed_at);
                let edges = feature.geometry.len().saturating_sub(1);
                std::iter::repeat(readings).take(edges)
            })
            .collect()
    }
}

impl HazardSource for SurfaceHazardSource {
    fn readings(
        &mut self,
        from: &Coordinate,
        to: &Coordinate,
        now: DateTime<Utc>,
    ) -> Result<HazardReadings, CoreError> {
        let midpoint = from.midpoint(to);
        Ok(self
            .nearest_feature(&midpoint)
            .map(|feature| surface_readings(feature, now))
            .unwrap_or_default())
    }
}
