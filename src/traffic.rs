//! Station traffic aggregation and marker radius scaling.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use serde::Serialize;

use crate::model::{EnrichedStation, Station, Trip};

/// Largest marker radius, in pixels, handed out by [`aggregate`].
pub const DEFAULT_MAX_RADIUS: f64 = 25.0;

/// Counts items per key. Items whose key function returns `None` are skipped.
pub fn count_by<T, K, F>(items: impl IntoIterator<Item = T>, mut key: F) -> HashMap<K, u64>
where
    K: Eq + Hash,
    F: FnMut(T) -> Option<K>,
{
    let mut counts = HashMap::new();
    for item in items {
        if let Some(k) = key(item) {
            *counts.entry(k).or_insert(0) += 1;
        }
    }
    counts
}

/// Square-root scale from `[0, max_traffic]` onto `[0, max_radius]`.
///
/// Area grows roughly linearly with traffic. With `max_traffic == 0` every
/// input maps to zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RadiusScale {
    max_traffic: u64,
    max_radius: f64,
}

impl RadiusScale {
    pub fn new(max_traffic: u64) -> Self {
        Self {
            max_traffic,
            max_radius: DEFAULT_MAX_RADIUS,
        }
    }

    pub fn with_max_radius(mut self, max_radius: f64) -> Self {
        self.max_radius = max_radius;
        self
    }

    pub fn max_traffic(&self) -> u64 {
        self.max_traffic
    }

    pub fn max_radius(&self) -> f64 {
        self.max_radius
    }

    /// Values above `max_traffic` extrapolate along the same curve.
    pub fn radius(&self, traffic: u64) -> f64 {
        if self.max_traffic == 0 {
            return 0.0;
        }
        self.max_radius * (traffic as f64 / self.max_traffic as f64).sqrt()
    }
}

/// Annotates every station with its arrival and departure counts and builds
/// the radius scale for the busiest one.
///
/// Station order is preserved. Trips naming unknown stations are ignored and
/// stations without trips get zero counts.
pub fn aggregate(stations: &[Station], trips: &[Trip]) -> (Vec<EnrichedStation>, RadiusScale) {
    let departures = count_by(trips, |t| t.start_station_id.as_deref());
    let arrivals = count_by(trips, |t| t.end_station_id.as_deref());

    let enriched: Vec<EnrichedStation> = stations
        .iter()
        .map(|s| {
            let id = s.id.as_str();
            let arrivals = arrivals.get(id).copied().unwrap_or(0);
            let departures = departures.get(id).copied().unwrap_or(0);
            EnrichedStation {
                station: s.clone(),
                arrivals,
                departures,
                total_traffic: arrivals + departures,
            }
        })
        .collect();

    let max_traffic = enriched.iter().map(|s| s.total_traffic).max().unwrap_or(0);

    (enriched, RadiusScale::new(max_traffic))
}

/// Totals reported after an aggregation run.
#[derive(Debug, Default, Serialize)]
pub struct TrafficSummary {
    pub stations: usize,
    pub trips: usize,
    pub matched_departures: u64,
    pub matched_arrivals: u64,
    /// Trips whose start and end both miss the station list.
    pub unmatched_trips: usize,
    pub idle_stations: usize,
    pub busiest_station: Option<String>,
    pub max_traffic: u64,
}

impl TrafficSummary {
    pub fn from_aggregate(enriched: &[EnrichedStation], trips: &[Trip]) -> Self {
        let known: HashSet<&str> = enriched.iter().map(|s| s.id()).collect();
        let is_known = |id: &Option<String>| {
            id.as_deref()
                .map(|id| known.contains(id))
                .unwrap_or(false)
        };

        let unmatched_trips = trips
            .iter()
            .filter(|t| !is_known(&t.start_station_id) && !is_known(&t.end_station_id))
            .count();

        // first station wins a tie
        let busiest = enriched
            .iter()
            .filter(|s| s.total_traffic > 0)
            .fold(None::<&EnrichedStation>, |best, s| match best {
                Some(b) if b.total_traffic >= s.total_traffic => Some(b),
                _ => Some(s),
            });

        TrafficSummary {
            stations: enriched.len(),
            trips: trips.len(),
            matched_departures: enriched.iter().map(|s| s.departures).sum(),
            matched_arrivals: enriched.iter().map(|s| s.arrivals).sum(),
            unmatched_trips,
            idle_stations: enriched.iter().filter(|s| s.total_traffic == 0).count(),
            busiest_station: busiest.map(|s| s.id().to_string()),
            max_traffic: busiest.map(|s| s.total_traffic).unwrap_or(0),
        }
    }
}

/// Returns up to `n` stations ordered by descending traffic, ties by id.
pub fn busiest(enriched: &[EnrichedStation], n: usize) -> Vec<&EnrichedStation> {
    let mut sorted: Vec<&EnrichedStation> = enriched.iter().collect();
    sorted.sort_by(|a, b| {
        b.total_traffic
            .cmp(&a.total_traffic)
            .then_with(|| a.id().cmp(b.id()))
    });
    sorted.truncate(n);
    sorted
}
