//! PavePath CLI - route planning and hazard analysis from the command line.
//!
//! The `pavepath` binary wraps these modules:
//! - `commands`: optimize and analyze
//! - `roads`: GeoJSON road network loading
//! - `export`: CSV export of summaries
//! - `report`: text output

pub mod commands;
pub mod export;
pub mod report;
pub mod roads;

pub use commands::{
    analyze, load_rules, optimize, AnalyzeOptions, HazardSourceKind, OptimizeOptions,
};
