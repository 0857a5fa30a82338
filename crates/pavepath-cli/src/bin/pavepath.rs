use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use pavepath_cli::commands::{self, AnalyzeOptions, HazardSourceKind, OptimizeOptions};
use pavepath_cli::{export, report};
use pavepath_core::{DirectionsAdapter, Geocoder, RoadFilter, RouteMode};
use pavepath_providers::ProviderSettings;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about = "Hazard-aware route planning", long_about = None)]
struct Cli {
    /// JSON routing rules overriding the defaults
    #[arg(long, global = true)]
    rules: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Order waypoints into a scored route
    Optimize(OptimizeArgs),
    /// Score a road network or simulated segments
    Analyze(AnalyzeArgs),
}

#[derive(Args, Debug)]
struct OptimizeArgs {
    /// Waypoint: "lat,lon", a grid ID such as B3, or an address
    #[arg(short, long = "waypoint", required = true, num_args = 1..)]
    waypoints: Vec<String>,

    /// safe, fast or driving
    #[arg(long, default_value = "safe")]
    mode: RouteMode,

    /// Seed for simulated hazards
    #[arg(long)]
    seed: Option<u64>,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// GeoJSON FeatureCollection of roads
    #[arg(long, conflicts_with = "segments", required_unless_present = "segments")]
    roads: Option<PathBuf>,

    /// dirt, paved or both
    #[arg(long, default_value = "both")]
    road_type: RoadFilter,

    /// Number of simulated segments
    #[arg(long)]
    segments: Option<usize>,

    /// simulated or surface (surface needs --roads)
    #[arg(long)]
    source: Option<HazardSourceKind>,

    /// Risk threshold for alerts
    #[arg(long)]
    threshold: Option<f64>,

    #[arg(long)]
    seed: Option<u64>,

    /// Write the per-segment breakdown as CSV
    #[arg(long)]
    csv: Option<PathBuf>,

    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "pavepath=debug,pavepath_cli=debug,pavepath_core=debug,pavepath_providers=debug"
    } else {
        "warn"
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .init();

    let rules = commands::load_rules(cli.rules.as_deref())?;

    match cli.command {
        Command::Optimize(args) => {
            let settings = ProviderSettings::from_env();
            let directions = settings.build_directions()?;
            let geocoder = settings.build_geocoder()?;
            let options = OptimizeOptions {
                waypoints: args.waypoints,
                mode: args.mode,
                seed: args.seed,
            };
            let result = commands::optimize(
                &options,
                &rules,
                directions.as_deref().map(|d| d as &dyn DirectionsAdapter),
                geocoder.as_deref().map(|g| g as &dyn Geocoder),
            )?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print!("{}", report::format_route(&result.route));
                if let Some(summary) = &result.summary {
                    print!(
                        "{}",
                        report::format_summary(summary, &result.alerts, result.requires_reroute)
                    );
                }
            }
        }
        Command::Analyze(args) => {
            // Roads default to their surface readings.
            let source = args.source.unwrap_or(if args.roads.is_some() {
                HazardSourceKind::Surface
            } else {
                HazardSourceKind::Simulated
            });
            let options = AnalyzeOptions {
                roads: args.roads,
                road_type: args.road_type,
                segments: args.segments,
                source,
                threshold: args.threshold,
                seed: args.seed,
            };
            let result = commands::analyze(&options, &rules)?;
            if let Some(path) = &args.csv {
                export::export_summary_csv(&result.summary, path)?;
            }
            if args.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print!(
                    "{}",
                    report::format_summary(&result.summary, &result.alerts, result.requires_reroute)
                );
            }
        }
    }

    Ok(())
}
