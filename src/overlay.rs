//! Bike-lane overlay summaries.

use std::collections::BTreeMap;

use geojson::{GeoJson, Geometry};
use serde::Serialize;

#[derive(Debug, Default, Serialize)]
pub struct OverlaySummary {
    pub layer_id: String,
    pub feature_count: usize,
    /// Geometry type name to feature count. Features without geometry count as `"None"`.
    pub geometry_types: BTreeMap<String, usize>,
}

fn type_name(geometry: Option<&Geometry>) -> &'static str {
    use geojson::Value::*;
    match geometry.map(|g| &g.value) {
        None => "None",
        Some(Point(_)) => "Point",
        Some(MultiPoint(_)) => "MultiPoint",
        Some(LineString(_)) => "LineString",
        Some(MultiLineString(_)) => "MultiLineString",
        Some(Polygon(_)) => "Polygon",
        Some(MultiPolygon(_)) => "MultiPolygon",
        Some(GeometryCollection(_)) => "GeometryCollection",
    }
}

impl OverlaySummary {
    pub fn from_geojson(layer_id: &str, geojson: &GeoJson) -> Self {
        let mut s = OverlaySummary {
            layer_id: layer_id.to_string(),
            ..Default::default()
        };

        let mut count = |geometry: Option<&Geometry>| {
            s.feature_count += 1;
            *s.geometry_types
                .entry(type_name(geometry).to_string())
                .or_insert(0) += 1;
        };

        match geojson {
            GeoJson::FeatureCollection(fc) => {
                for f in &fc.features {
                    count(f.geometry.as_ref());
                }
            }
            GeoJson::Feature(f) => count(f.geometry.as_ref()),
            GeoJson::Geometry(g) => count(Some(g)),
        }

        s
    }

    /// Number of features carrying line geometry.
    pub fn line_features(&self) -> usize {
        ["LineString", "MultiLineString"]
            .iter()
            .filter_map(|t| self.geometry_types.get(*t))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts_geometry_types() {
        let geojson: GeoJson = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {}, "geometry": {"type": "LineString", "coordinates": [[-71.1, 42.3], [-71.2, 42.4]]}},
                {"type": "Feature", "properties": {}, "geometry": {"type": "MultiLineString", "coordinates": [[[-71.1, 42.3], [-71.2, 42.4]]]}},
                {"type": "Feature", "properties": {}, "geometry": {"type": "LineString", "coordinates": [[-71.0, 42.0], [-71.0, 42.1]]}},
                {"type": "Feature", "properties": {}, "geometry": null}
            ]
        }"#
        .parse()
        .unwrap();

        let summary = OverlaySummary::from_geojson("cambridge-bike-lanes", &geojson);

        assert_eq!(summary.layer_id, "cambridge-bike-lanes");
        assert_eq!(summary.feature_count, 4);
        assert_eq!(summary.geometry_types["LineString"], 2);
        assert_eq!(summary.geometry_types["None"], 1);
        assert_eq!(summary.line_features(), 3);
    }

    #[test]
    fn test_summary_of_bare_geometry() {
        let geojson: GeoJson = r#"{"type": "Point", "coordinates": [-71.0, 42.0]}"#
            .parse()
            .unwrap();

        let summary = OverlaySummary::from_geojson("single", &geojson);

        assert_eq!(summary.feature_count, 1);
        assert_eq!(summary.line_features(), 0);
    }
}
