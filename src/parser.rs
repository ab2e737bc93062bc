//! Decoders for the station JSON, the trip CSV and GeoJSON overlays.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, NaiveDateTime};
use geojson::GeoJson;
use serde::{Deserialize, Deserializer};
use tracing::{debug, warn};

use crate::model::{Station, Trip};

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

#[derive(Deserialize)]
struct StationFeed {
    data: StationData,
}

#[derive(Deserialize)]
struct StationData {
    stations: Vec<RawStation>,
}

/// Both coordinate and name spellings appear in published station feeds,
/// sometimes on the same record, so each is its own field.
#[derive(Deserialize)]
struct RawStation {
    #[serde(default)]
    short_name: Option<String>,
    #[serde(default, rename = "NAME")]
    name_upper: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "Lat", deserialize_with = "opt_number_or_string")]
    lat_upper: Option<f64>,
    #[serde(default, deserialize_with = "opt_number_or_string")]
    lat: Option<f64>,
    #[serde(default, rename = "Long", deserialize_with = "opt_number_or_string")]
    lon_upper: Option<f64>,
    #[serde(default, deserialize_with = "opt_number_or_string")]
    lon: Option<f64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    String(String),
}

fn opt_number_or_string<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrString::Number(n)) => Ok(Some(n)),
        Some(NumberOrString::String(s)) if s.trim().is_empty() => Ok(None),
        Some(NumberOrString::String(s)) => {
            s.trim().parse().map(Some).map_err(serde::de::Error::custom)
        }
    }
}

#[derive(Deserialize)]
struct RawTrip {
    #[serde(default)]
    start_station_id: Option<String>,
    #[serde(default)]
    end_station_id: Option<String>,
    #[serde(default)]
    started_at: Option<String>,
    #[serde(default)]
    ended_at: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parses a trip timestamp. Returns `None` for empty or unrecognized input.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.naive_utc())
        })
}

/// Decodes a station feed of the form `{"data": {"stations": [...]}}`.
///
/// `Lat`/`Long`/`NAME` win over `lat`/`lon`/`name` when a record has both.
/// Records without a `short_name` are skipped.
///
/// # Errors
///
/// Returns an error if the document is not JSON, lacks the station list, or
/// a station has missing or non-numeric coordinates.
pub fn parse_stations(bytes: &[u8]) -> Result<Vec<Station>> {
    let feed: StationFeed =
        serde_json::from_slice(bytes).context("Failed to parse station dataset")?;

    let mut stations = Vec::with_capacity(feed.data.stations.len());
    let mut without_id = 0usize;

    for (index, raw) in feed.data.stations.into_iter().enumerate() {
        let Some(id) = non_empty(raw.short_name) else {
            without_id += 1;
            continue;
        };
        let latitude = raw
            .lat_upper
            .or(raw.lat)
            .ok_or_else(|| anyhow!("Station {id} (record {index}) has no latitude"))?;
        let longitude = raw
            .lon_upper
            .or(raw.lon)
            .ok_or_else(|| anyhow!("Station {id} (record {index}) has no longitude"))?;

        stations.push(Station {
            id,
            name: non_empty(raw.name_upper).or_else(|| non_empty(raw.name)),
            latitude,
            longitude,
        });
    }

    if without_id > 0 {
        warn!(without_id, "Station records without short_name skipped");
    }
    debug!(count = stations.len(), "Stations parsed");
    Ok(stations)
}

/// Decodes the trip log CSV. Timestamps are parsed here, once.
///
/// # Errors
///
/// Returns an error if a row cannot be read as CSV.
pub fn parse_trips(bytes: &[u8]) -> Result<Vec<Trip>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let mut trips = Vec::new();
    let mut bad_timestamps = 0usize;

    for (row, result) in rdr.deserialize::<RawTrip>().enumerate() {
        let raw = result.with_context(|| format!("Failed to parse trip row {}", row + 1))?;

        let started_at = raw.started_at.as_deref().and_then(parse_timestamp);
        let ended_at = raw.ended_at.as_deref().and_then(parse_timestamp);
        if started_at.is_none() || ended_at.is_none() {
            bad_timestamps += 1;
        }

        trips.push(Trip {
            start_station_id: non_empty(raw.start_station_id),
            end_station_id: non_empty(raw.end_station_id),
            started_at,
            ended_at,
        });
    }

    if bad_timestamps > 0 {
        warn!(bad_timestamps, "Trips with missing or unparseable timestamps");
    }
    debug!(count = trips.len(), "Trips parsed");
    Ok(trips)
}

/// Decodes a GeoJSON overlay document.
pub fn parse_overlay(bytes: &[u8]) -> Result<GeoJson> {
    let text = std::str::from_utf8(bytes).context("Overlay is not valid UTF-8")?;
    text.parse::<GeoJson>()
        .map_err(|e| anyhow!("Failed to parse GeoJSON overlay: {e}"))
}
