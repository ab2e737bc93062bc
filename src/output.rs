//! Output formatting and persistence for traffic results.
//!
//! Supports pretty-printing, JSON logging, the station CSV table and JSON
//! artifact files.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt::Debug;
use std::path::Path;
use tracing::{debug, info};

use crate::model::EnrichedStation;
use crate::traffic::RadiusScale;
use csv::WriterBuilder;

/// Logs a value using Rust's debug pretty-print format.
pub fn print_pretty<T: Debug>(value: &T) {
    debug!("{:#?}", value);
}

/// Logs a value as pretty-printed JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Serialize)]
struct StationRow<'a> {
    id: &'a str,
    name: Option<&'a str>,
    latitude: f64,
    longitude: f64,
    arrivals: u64,
    departures: u64,
    total_traffic: u64,
    radius: f64,
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    Ok(())
}

/// Writes one CSV row per station, replacing any existing file.
pub fn write_station_csv(
    path: &Path,
    stations: &[EnrichedStation],
    scale: &RadiusScale,
) -> Result<()> {
    ensure_parent(path)?;
    debug!(path = %path.display(), rows = stations.len(), "Writing station CSV");

    let mut writer = WriterBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    for s in stations {
        writer.serialize(StationRow {
            id: s.id(),
            name: s.station.name.as_deref(),
            latitude: s.station.latitude,
            longitude: s.station.longitude,
            arrivals: s.arrivals,
            departures: s.departures,
            total_traffic: s.total_traffic,
            radius: scale.radius(s.total_traffic),
        })?;
    }
    writer.flush()?;

    Ok(())
}

/// Writes `value` as pretty JSON, replacing any existing file.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent(path)?;
    let body = serde_json::to_string_pretty(value).context("Failed to serialize JSON")?;
    std::fs::write(path, body).with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), "JSON written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Station, Trip};
    use crate::traffic::{TrafficSummary, aggregate};
    use std::env;
    use std::fs;

    fn sample() -> (Vec<EnrichedStation>, RadiusScale) {
        let stations = vec![
            Station::new("A", 42.35, -71.05).with_name("Alpha"),
            Station::new("B", 42.37, -71.10),
        ];
        aggregate(&stations, &[Trip::between("A", "B")])
    }

    #[test]
    fn test_print_pretty_does_not_panic() {
        print_pretty(&TrafficSummary::default());
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&TrafficSummary::default()).unwrap();
    }

    #[test]
    fn test_write_station_csv() {
        let path = env::temp_dir().join("bluebikes_output_stations.csv");
        let _ = fs::remove_file(&path);

        let (enriched, scale) = sample();
        write_station_csv(&path, &enriched, &scale).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(
            lines[0],
            "id,name,latitude,longitude,arrivals,departures,total_traffic,radius"
        );
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("A,Alpha,"));
        assert!(lines[2].starts_with("B,,"));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_station_csv_overwrites() {
        let path = env::temp_dir().join("bluebikes_output_overwrite.csv");

        let (enriched, scale) = sample();
        write_station_csv(&path, &enriched, &scale).unwrap();
        write_station_csv(&path, &enriched, &scale).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 3);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_json_creates_parent_dirs() {
        let dir = env::temp_dir().join("bluebikes_output_nested");
        let path = dir.join("deeper/summary.json");
        let _ = fs::remove_dir_all(&dir);

        write_json(&path, &TrafficSummary::default()).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["trips"], 0);

        fs::remove_dir_all(&dir).unwrap();
    }
}
