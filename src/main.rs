//! CLI entry point for the Bluebikes traffic tool.
//!
//! Provides subcommands for aggregating station traffic, exporting the
//! marker layer and map document, and checking the bike-lane overlays.

use anyhow::Result;
use bluebikes_traffic::{
    config::Config,
    fetch::BasicClient,
    markers::{MapDocument, marker_collection},
    model::{EnrichedStation, Station, Trip},
    output::{print_json, print_pretty, write_json, write_station_csv},
    pipeline::{load_datasets, load_overlays},
    traffic::{RadiusScale, TrafficSummary, aggregate, busiest},
};
use clap::{Args, Parser, Subcommand};
use geojson::GeoJson;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "bluebikes_traffic")]
#[command(about = "Station traffic and marker sizing for the Bluebikes map", long_about = None)]
struct Cli {
    /// JSON config file (defaults to $BLUEBIKES_CONFIG)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Dataset overrides shared by the commands that aggregate.
#[derive(Args)]
struct DatasetArgs {
    /// Station JSON file or URL
    #[arg(long)]
    stations: Option<String>,

    /// Trip CSV file or URL (.gz accepted)
    #[arg(long)]
    trips: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate trips per station and report the busiest stations
    Traffic {
        #[command(flatten)]
        datasets: DatasetArgs,

        /// CSV file to write the per-station table to
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of busiest stations to log
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Write the station markers as a GeoJSON FeatureCollection
    Markers {
        #[command(flatten)]
        datasets: DatasetArgs,

        #[arg(short, long, default_value = "markers.geojson")]
        output: PathBuf,
    },
    /// Load the configured bike-lane overlays and summarize them
    Lanes,
    /// Write the full map document (view, lanes, marker style, markers)
    Map {
        #[command(flatten)]
        datasets: DatasetArgs,

        #[arg(short, long, default_value = "map.json")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/bluebikes_traffic.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("bluebikes_traffic.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let config = Config::resolve(cli.config.as_deref())?;
    let client = BasicClient::new()?;

    match cli.command {
        Commands::Traffic {
            datasets,
            output,
            top,
        } => {
            let config = with_dataset_args(config, datasets)?;
            let (stations, trips) = load_datasets(&client, &config.datasets).await?;
            let (enriched, scale) = run_aggregate(&config, &stations, &trips);

            for s in busiest(&enriched, top) {
                info!(
                    station = s.id(),
                    name = s.station.name.as_deref().unwrap_or(""),
                    total = s.total_traffic,
                    departures = s.departures,
                    arrivals = s.arrivals,
                    radius = scale.radius(s.total_traffic),
                    "Busy station"
                );
            }

            if let Some(path) = output {
                write_station_csv(&path, &enriched, &scale)?;
                info!(path = %path.display(), rows = enriched.len(), "Station table written");
            }
        }
        Commands::Markers { datasets, output } => {
            let config = with_dataset_args(config, datasets)?;
            let (stations, trips) = load_datasets(&client, &config.datasets).await?;
            let (enriched, scale) = run_aggregate(&config, &stations, &trips);

            write_json(&output, &GeoJson::from(marker_collection(&enriched, &scale)))?;
        }
        Commands::Lanes => {
            config.validate()?;
            let summaries = load_overlays(&client, &config.lanes).await;

            for summary in &summaries {
                info!(
                    layer = %summary.layer_id,
                    features = summary.feature_count,
                    line_features = summary.line_features(),
                    "Lane overlay"
                );
                print_pretty(summary);
            }

            if summaries.len() < config.lanes.len() {
                warn!(
                    loaded = summaries.len(),
                    configured = config.lanes.len(),
                    "Some lane overlays could not be loaded"
                );
            }
        }
        Commands::Map { datasets, output } => {
            let config = with_dataset_args(config, datasets)?;
            let (stations, trips) = load_datasets(&client, &config.datasets).await?;
            let (enriched, scale) = run_aggregate(&config, &stations, &trips);

            write_json(&output, &MapDocument::build(&config, &enriched, &scale))?;
        }
    }

    Ok(())
}

/// Applies the command-line dataset flags, then validates the final config.
fn with_dataset_args(config: Config, args: DatasetArgs) -> Result<Config> {
    let config = config.with_datasets(args.stations, args.trips);
    config.validate()?;
    Ok(config)
}

/// Runs the aggregation with the configured maximum radius and logs the summary.
fn run_aggregate(
    config: &Config,
    stations: &[Station],
    trips: &[Trip],
) -> (Vec<EnrichedStation>, RadiusScale) {
    let (enriched, scale) = aggregate(stations, trips);
    let scale = scale.with_max_radius(config.markers.max_radius);

    let summary = TrafficSummary::from_aggregate(&enriched, trips);
    info!(
        stations = summary.stations,
        trips = summary.trips,
        departures = summary.matched_departures,
        arrivals = summary.matched_arrivals,
        unmatched = summary.unmatched_trips,
        idle = summary.idle_stations,
        max_traffic = summary.max_traffic,
        "Traffic aggregated"
    );
    if let Err(e) = print_json(&summary) {
        warn!(error = %e, "Failed to render summary as JSON");
    }

    (enriched, scale)
}
