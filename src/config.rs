//! Run configuration: dataset sources, map view, lane overlays and marker
//! styling.
//!
//! Values come from the built-in defaults, then an optional JSON file, then
//! environment variables. CLI flags are applied last by the binary.
//!
//! ```json
//! {
//!   "datasets": { "trips": "data/bluebikes-traffic-2024-03.csv.gz" },
//!   "view": { "zoom": 12.5 },
//!   "markers": { "max_radius": 30 }
//! }
//! ```

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::traffic::DEFAULT_MAX_RADIUS;

pub const STATIONS_URL: &str = "https://dsc106.com/labs/lab07/data/bluebikes-stations.json";
pub const TRIPS_URL: &str = "https://dsc106.com/labs/lab07/data/bluebikes-traffic-2024-03.csv";
pub const BOSTON_LANES_URL: &str = "https://bostonopendata-boston.opendata.arcgis.com/datasets/boston::existing-bike-network-2022.geojson";
pub const CAMBRIDGE_LANES_URL: &str =
    "https://dsc106.com/labs/lab07/data/cambridge-bike-lanes.geojson";

pub const ENV_CONFIG: &str = "BLUEBIKES_CONFIG";
pub const ENV_STATIONS: &str = "BLUEBIKES_STATIONS_URL";
pub const ENV_TRIPS: &str = "BLUEBIKES_TRIPS_URL";
pub const ENV_ACCESS_TOKEN: &str = "MAPBOX_ACCESS_TOKEN";

/// Where the station list and trip log are loaded from (URL or file path).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Datasets {
    pub stations: String,
    pub trips: String,
}

impl Default for Datasets {
    fn default() -> Self {
        Self {
            stations: STATIONS_URL.to_string(),
            trips: TRIPS_URL.to_string(),
        }
    }
}

/// Initial camera of the basemap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapView {
    pub style: String,
    /// `[longitude, latitude]`
    pub center: [f64; 2],
    pub zoom: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            style: "mapbox://styles/mapbox/light-v11".to_string(),
            center: [-71.0589, 42.3601],
            zoom: 11.2,
            access_token: None,
        }
    }
}

/// A bike-lane line layer drawn over the basemap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaneLayer {
    pub id: String,
    pub source: String,
    pub color: String,
    pub width: f64,
    pub opacity: f64,
}

impl LaneLayer {
    pub fn new(id: &str, source: &str, color: &str, opacity: f64) -> Self {
        Self {
            id: id.to_string(),
            source: source.to_string(),
            color: color.to_string(),
            width: 3.0,
            opacity,
        }
    }
}

pub fn default_lanes() -> Vec<LaneLayer> {
    vec![
        LaneLayer::new("boston-bike-lanes", BOSTON_LANES_URL, "green", 0.4),
        LaneLayer::new("cambridge-bike-lanes", CAMBRIDGE_LANES_URL, "#32D400", 0.5),
    ]
}

/// Paint for the station circles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerStyle {
    pub fill: String,
    pub fill_opacity: f64,
    pub stroke: String,
    pub stroke_width: f64,
    pub max_radius: f64,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            fill: "steelblue".to_string(),
            fill_opacity: 0.6,
            stroke: "white".to_string(),
            stroke_width: 1.0,
            max_radius: DEFAULT_MAX_RADIUS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub datasets: Datasets,
    pub view: MapView,
    pub lanes: Vec<LaneLayer>,
    pub markers: MarkerStyle,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            datasets: Datasets::default(),
            view: MapView::default(),
            lanes: default_lanes(),
            markers: MarkerStyle::default(),
        }
    }
}

impl Config {
    /// Loads a JSON config file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        debug!(path = %path.display(), "Config file loaded");
        Ok(config)
    }

    /// Resolves the configuration for a run from the process environment.
    /// See [`Config::resolve_with`]. The result is not validated yet, so CLI
    /// overrides can still be applied.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        Self::resolve_with(path, |key| std::env::var(key).ok())
    }

    /// `path` if given, else the file named by `BLUEBIKES_CONFIG`, else
    /// defaults; then the variable overrides from `lookup`.
    pub fn resolve_with<F>(path: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let from_env = lookup(ENV_CONFIG).filter(|p| !p.is_empty());
        let path = path.or(from_env.as_deref().map(Path::new));

        let mut config = match path {
            Some(p) => Self::load(p)?,
            None => Self::default(),
        };
        config.apply_env(lookup);
        Ok(config)
    }

    /// Replaces the dataset sources given on the command line.
    pub fn with_datasets(mut self, stations: Option<String>, trips: Option<String>) -> Self {
        if let Some(stations) = stations {
            self.datasets.stations = stations;
        }
        if let Some(trips) = trips {
            self.datasets.trips = trips;
        }
        self
    }

    /// Applies overrides from a variable lookup (normally the process environment).
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_STATIONS) {
            self.datasets.stations = v;
        }
        if let Some(v) = lookup(ENV_TRIPS) {
            self.datasets.trips = v;
        }
        if let Some(v) = lookup(ENV_ACCESS_TOKEN) {
            self.view.access_token = Some(v);
        }
    }

    pub fn validate(&self) -> Result<()> {
        let r = self.markers.max_radius;
        if !r.is_finite() || r <= 0.0 {
            bail!("markers.max_radius must be a positive number, got {r}");
        }
        if !self.view.zoom.is_finite() {
            bail!("view.zoom must be finite");
        }
        if self.datasets.stations.trim().is_empty() || self.datasets.trips.trim().is_empty() {
            bail!("dataset sources must not be empty");
        }
        Ok(())
    }
}
