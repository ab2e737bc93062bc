//! Station and trip records shared by the parser, the aggregator and the
//! marker builder.

use chrono::NaiveDateTime;
use serde::Serialize;

/// A bike-share dock location, keyed by its short code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Station {
    pub id: String,
    pub name: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl Station {
    pub fn new(id: &str, latitude: f64, longitude: f64) -> Self {
        Self {
            id: id.to_string(),
            name: None,
            latitude,
            longitude,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }
}

/// One rental. Station ids are not checked against the station list.
#[derive(Debug, Clone, PartialEq)]
pub struct Trip {
    pub start_station_id: Option<String>,
    pub end_station_id: Option<String>,
    pub started_at: Option<NaiveDateTime>,
    pub ended_at: Option<NaiveDateTime>,
}

impl Trip {
    /// Builds a trip with both endpoints set and no timestamps.
    pub fn between(start: &str, end: &str) -> Self {
        Self {
            start_station_id: Some(start.to_string()),
            end_station_id: Some(end.to_string()),
            started_at: None,
            ended_at: None,
        }
    }
}

/// A station annotated with the trips that start and end at it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedStation {
    #[serde(flatten)]
    pub station: Station,
    pub arrivals: u64,
    pub departures: u64,
    pub total_traffic: u64,
}

impl EnrichedStation {
    pub fn id(&self) -> &str {
        &self.station.id
    }

    /// Tooltip text shown on hover over the station marker.
    pub fn title(&self) -> String {
        format!(
            "{} trips ({} departures, {} arrivals)",
            self.total_traffic, self.departures, self.arrivals
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_format() {
        let station = EnrichedStation {
            station: Station::new("A32000", 42.35, -71.05),
            arrivals: 4,
            departures: 6,
            total_traffic: 10,
        };

        assert_eq!(station.title(), "10 trips (6 departures, 4 arrivals)");
        assert_eq!(station.id(), "A32000");
    }

    #[test]
    fn test_enriched_station_serializes_flat() {
        let station = EnrichedStation {
            station: Station::new("B1", 1.0, 2.0).with_name("Kendall"),
            arrivals: 1,
            departures: 2,
            total_traffic: 3,
        };

        let json = serde_json::to_value(&station).unwrap();
        assert_eq!(json["id"], "B1");
        assert_eq!(json["name"], "Kendall");
        assert_eq!(json["total_traffic"], 3);
    }
}
