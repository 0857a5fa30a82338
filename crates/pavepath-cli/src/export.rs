//! Tabular export of route summaries.

use anyhow::{Context, Result};
use pavepath_core::{HazardType, RouteSummary, SegmentScore};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// One CSV row per segment. Absent hazards are empty cells.
#[derive(Debug, Serialize, PartialEq)]
pub struct SegmentRow {
    pub segment_index: usize,
    pub score: f64,
    pub weather: Option<f64>,
    pub road_condition: Option<f64>,
    pub traffic: Option<f64>,
    pub crime: Option<f64>,
    pub natural_disaster: Option<f64>,
}

impl From<&SegmentScore> for SegmentRow {
    fn from(score: &SegmentScore) -> Self {
        let hazard = |kind: HazardType| score.hazards.get(&kind).copied();
        Self {
            segment_index: score.segment_index,
            score: score.score,
            weather: hazard(HazardType::Weather),
            road_condition: hazard(HazardType::RoadCondition),
            traffic: hazard(HazardType::Traffic),
            crime: hazard(HazardType::Crime),
            natural_disaster: hazard(HazardType::NaturalDisaster),
        }
    }
}

pub fn write_summary_csv<W: Write>(summary: &RouteSummary, writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for score in &summary.segment_scores {
        csv.serialize(SegmentRow::from(score))?;
    }
    csv.flush()?;
    Ok(())
}

pub fn export_summary_csv(summary: &RouteSummary, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    write_summary_csv(summary, file)?;
    tracing::info!(path = %path.display(), rows = summary.segment_scores.len(), "exported summary");
    Ok(())
}
