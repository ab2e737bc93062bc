//! GeoJSON marker layer and the map document consumed by the front-end.

use geojson::{Feature, FeatureCollection, Geometry, Value, feature::Id};
use serde::Serialize;
use serde_json::json;

use crate::config::{Config, LaneLayer, MapView, MarkerStyle};
use crate::model::EnrichedStation;
use crate::traffic::RadiusScale;

/// Builds the point feature for one station, positioned at `[lon, lat]`.
pub fn station_feature(station: &EnrichedStation, scale: &RadiusScale) -> Feature {
    let s = &station.station;

    let mut properties = serde_json::Map::new();
    properties.insert("id".to_string(), json!(s.id));
    properties.insert("name".to_string(), json!(s.name));
    properties.insert("arrivals".to_string(), json!(station.arrivals));
    properties.insert("departures".to_string(), json!(station.departures));
    properties.insert("total_traffic".to_string(), json!(station.total_traffic));
    properties.insert(
        "radius".to_string(),
        json!(scale.radius(station.total_traffic)),
    );
    properties.insert("title".to_string(), json!(station.title()));

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(vec![s.longitude, s.latitude]))),
        id: Some(Id::String(s.id.clone())),
        properties: Some(properties),
        foreign_members: None,
    }
}

/// One feature per station, in station order.
pub fn marker_collection(stations: &[EnrichedStation], scale: &RadiusScale) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: stations.iter().map(|s| station_feature(s, scale)).collect(),
        foreign_members: None,
    }
}

/// Everything needed to draw the traffic map: camera, lane layers, marker
/// paint and the station markers themselves.
#[derive(Debug, Serialize)]
pub struct MapDocument {
    pub view: MapView,
    pub lanes: Vec<LaneLayer>,
    pub marker_style: MarkerStyle,
    pub max_traffic: u64,
    pub markers: FeatureCollection,
}

impl MapDocument {
    pub fn build(config: &Config, stations: &[EnrichedStation], scale: &RadiusScale) -> Self {
        Self {
            view: config.view.clone(),
            lanes: config.lanes.clone(),
            marker_style: config.markers.clone(),
            max_traffic: scale.max_traffic(),
            markers: marker_collection(stations, scale),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Station, Trip};
    use crate::traffic::aggregate;

    fn sample() -> (Vec<EnrichedStation>, RadiusScale) {
        let stations = vec![
            Station::new("A", 42.35, -71.05).with_name("Alpha"),
            Station::new("B", 42.37, -71.10),
        ];
        let trips = vec![Trip::between("A", "B"), Trip::between("A", "A")];
        aggregate(&stations, &trips)
    }

    #[test]
    fn test_station_feature_properties() {
        let (enriched, scale) = sample();
        let feature = station_feature(&enriched[0], &scale);

        assert_eq!(feature.id, Some(Id::String("A".to_string())));
        match feature.geometry.unwrap().value {
            Value::Point(coords) => assert_eq!(coords, vec![-71.05, 42.35]),
            other => panic!("expected point, got {other:?}"),
        }

        let props = feature.properties.unwrap();
        assert_eq!(props["name"], "Alpha");
        assert_eq!(props["total_traffic"], 3);
        assert_eq!(props["radius"], 25.0);
        assert_eq!(props["title"], "3 trips (2 departures, 1 arrivals)");
    }

    #[test]
    fn test_marker_collection_preserves_order() {
        let (enriched, scale) = sample();
        let collection = marker_collection(&enriched, &scale);

        let ids: Vec<_> = collection.features.iter().map(|f| f.id.clone()).collect();
        assert_eq!(
            ids,
            vec![Some(Id::String("A".into())), Some(Id::String("B".into()))]
        );
    }

    #[test]
    fn test_map_document_uses_config() {
        let (enriched, scale) = sample();
        let config = Config::default();
        let doc = MapDocument::build(&config, &enriched, &scale);

        assert_eq!(doc.max_traffic, 3);
        assert_eq!(doc.lanes.len(), 2);

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["view"]["zoom"], 11.2);
        assert_eq!(json["marker_style"]["fill"], "steelblue");
        assert_eq!(json["markers"]["type"], "FeatureCollection");
        assert_eq!(json["markers"]["features"].as_array().unwrap().len(), 2);
    }
}
