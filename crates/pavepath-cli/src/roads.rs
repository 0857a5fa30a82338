//! GeoJSON road network loading.

use anyhow::{bail, Context, Result};
use geojson::{Feature, GeoJson, Value};
use pavepath_core::{Coordinate, RoadFeature};
use serde_json::Value as JsonValue;
use std::path::Path;

pub fn load_roads(path: &Path) -> Result<Vec<RoadFeature>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading road network {}", path.display()))?;
    parse_roads(&text).with_context(|| format!("parsing road network {}", path.display()))
}

/// Line features of a FeatureCollection as roads.
///
/// `MultiLineString`s become one road per part. Other geometry types are
/// skipped.
pub fn parse_roads(text: &str) -> Result<Vec<RoadFeature>> {
    let geojson: GeoJson = text.parse()?;
    let GeoJson::FeatureCollection(collection) = geojson else {
        bail!("expected a GeoJSON FeatureCollection");
    };

    let mut roads = Vec::new();
    for (index, feature) in collection.features.iter().enumerate() {
        let Some(geometry) = &feature.geometry else {
            continue;
        };
        let lines: Vec<&Vec<Vec<f64>>> = match &geometry.value {
            Value::LineString(line) => vec![line],
            Value::MultiLineString(lines) => lines.iter().collect(),
            _ => {
                tracing::debug!(index, "skipping non-line feature");
                continue;
            }
        };

        let name = property_str(feature, "name")
            .map(str::to_string)
            .unwrap_or_else(|| format!("road #{index}"));
        let surface = property_str(feature, "surface").map(str::to_string);
        let flood_risk = feature
            .property("flood_risk")
            .map(is_truthy)
            .unwrap_or(false);

        for line in lines {
            let geometry = line
                .iter()
                .map(|position| match position.as_slice() {
                    [lon, lat, ..] => Coordinate::new(*lat, *lon)
                        .with_context(|| format!("feature {index} ({name})")),
                    _ => bail!(
                        "feature {index} ({name}) has a position with fewer than two values"
                    ),
                })
                .collect::<Result<Vec<_>>>()?;
            roads.push(RoadFeature {
                name: name.clone(),
                surface: surface.clone(),
                flood_risk,
                geometry,
            });
        }
    }
    tracing::info!(roads = roads.len(), "loaded road network");
    Ok(roads)
}

fn property_str<'a>(feature: &'a Feature, key: &str) -> Option<&'a str> {
    feature.property(key).and_then(JsonValue::as_str)
}

fn is_truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Bool(flag) => *flag,
        JsonValue::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        JsonValue::String(s) => matches!(s.to_ascii_lowercase().as_str(), "yes" | "true" | "1"),
        _ => false,
    }
}
