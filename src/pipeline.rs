//! Loading steps shared by the CLI subcommands.

use anyhow::{Context, Result};
use futures::future::join_all;
use tracing::{error, info};

use crate::config::{Datasets, LaneLayer};
use crate::fetch::{HttpClient, load_source};
use crate::model::{Station, Trip};
use crate::overlay::OverlaySummary;
use crate::parser::{parse_overlay, parse_stations, parse_trips};

/// Loads and parses the station list and the trip log concurrently.
#[tracing::instrument(skip_all, fields(stations = %datasets.stations, trips = %datasets.trips))]
pub async fn load_datasets<C: HttpClient>(
    client: &C,
    datasets: &Datasets,
) -> Result<(Vec<Station>, Vec<Trip>)> {
    let (station_bytes, trip_bytes) = tokio::try_join!(
        load_source(client, &datasets.stations),
        load_source(client, &datasets.trips),
    )?;

    let stations = parse_stations(&station_bytes)
        .with_context(|| format!("Invalid station dataset {}", datasets.stations))?;
    let trips = parse_trips(&trip_bytes)
        .with_context(|| format!("Invalid trip dataset {}", datasets.trips))?;

    info!(
        stations = stations.len(),
        trips = trips.len(),
        "Datasets loaded"
    );
    Ok((stations, trips))
}

/// Loads every lane overlay concurrently. Failing layers are logged and left out.
pub async fn load_overlays<C: HttpClient>(client: &C, lanes: &[LaneLayer]) -> Vec<OverlaySummary> {
    let loads = lanes.iter().map(|lane| async move {
        let result = load_source(client, &lane.source)
            .await
            .and_then(|bytes| parse_overlay(&bytes));
        (lane, result)
    });

    let mut summaries = Vec::new();
    for (lane, result) in join_all(loads).await {
        match result {
            Ok(geojson) => summaries.push(OverlaySummary::from_geojson(&lane.id, &geojson)),
            Err(e) => error!(layer = %lane.id, error = %e, "Lane overlay failed to load"),
        }
    }
    summaries
}
