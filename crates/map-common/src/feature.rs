//! Feature documents: GeoJSON feature collections and topology documents.

use geojson::{Feature, FeatureCollection, Geometry};
use serde_json::Value;

use crate::{LatLng, LatLngBounds, MapError, MapResult, Topology};

/// Property used to join features to attribute rows.
pub const ID_PROPERTY: &str = "id";

/// A fetched geometry document, classified by its `type` member.
#[derive(Debug, Clone)]
pub enum FeatureDocument {
    FeatureCollection(FeatureCollection),
    Topology(Topology),
}

impl FeatureDocument {
    /// Classify a JSON document. Anything other than a `FeatureCollection` or
    /// a `Topology` is rejected with [`MapError::UnrecognizedDocument`].
    pub fn from_value(value: Value) -> MapResult<Self> {
        let kind = value.get("type").and_then(Value::as_str).map(str::to_string);
        match kind.as_deref() {
            Some("FeatureCollection") => {
                let collection: FeatureCollection = serde_json::from_value(value)?;
                Ok(FeatureDocument::FeatureCollection(collection))
            }
            Some("Topology") => Ok(FeatureDocument::Topology(Topology::from_value(value)?)),
            other => Err(MapError::UnrecognizedDocument(
                other.unwrap_or("<missing>").to_string(),
            )),
        }
    }

    /// Features of the document. A topology contributes its first named object.
    pub fn into_features(self) -> MapResult<Vec<Feature>> {
        match self {
            FeatureDocument::FeatureCollection(collection) => Ok(collection.features),
            FeatureDocument::Topology(topology) => topology.first_object_features(),
        }
    }
}

/// The feature's `id` property.
pub fn feature_id(feature: &Feature) -> Option<&Value> {
    feature.property(ID_PROPERTY)
}

/// Every position of a geometry, in document order.
pub fn geometry_positions(geometry: &Geometry) -> Vec<LatLng> {
    let mut out = Vec::new();
    collect_positions(&geometry.value, &mut out);
    out
}

fn collect_positions(value: &geojson::Value, out: &mut Vec<LatLng>) {
    use geojson::Value as G;

    match value {
        G::Point(p) => out.extend(LatLng::from_position(p)),
        G::MultiPoint(points) | G::LineString(points) => {
            out.extend(points.iter().filter_map(|p| LatLng::from_position(p)))
        }
        G::MultiLineString(lines) | G::Polygon(lines) => out.extend(
            lines
                .iter()
                .flatten()
                .filter_map(|p| LatLng::from_position(p)),
        ),
        G::MultiPolygon(polygons) => out.extend(
            polygons
                .iter()
                .flatten()
                .flatten()
                .filter_map(|p| LatLng::from_position(p)),
        ),
        G::GeometryCollection(geometries) => {
            for geometry in geometries {
                collect_positions(&geometry.value, out);
            }
        }
    }
}

/// Bounding box of a feature's geometry.
pub fn feature_bounds(feature: &Feature) -> Option<LatLngBounds> {
    feature
        .geometry
        .as_ref()
        .and_then(|geometry| LatLngBounds::from_points(geometry_positions(geometry)))
}

/// First coordinate pair of a feature's geometry.
///
/// For points this is the point itself; other geometries yield their first
/// vertex.
pub fn first_position(feature: &Feature) -> Option<LatLng> {
    feature
        .geometry
        .as_ref()
        .and_then(|geometry| geometry_positions(geometry).into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_feature_collection_passthrough() {
        let doc = FeatureDocument::from_value(json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {"id": 1},
                "geometry": {"type": "Point", "coordinates": [26.1, 44.4]}
            }]
        }))
        .unwrap();

        let features = doc.into_features().unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(feature_id(&features[0]), Some(&json!(1)));
        assert_eq!(first_position(&features[0]), Some(LatLng::new(44.4, 26.1)));
    }

    #[test]
    fn test_unrecognized_document() {
        let err = FeatureDocument::from_value(json!({"type": "Feature"})).unwrap_err();
        assert!(matches!(err, MapError::UnrecognizedDocument(ref t) if t == "Feature"));

        let err = FeatureDocument::from_value(json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, MapError::UnrecognizedDocument(_)));
    }

    #[test]
    fn test_polygon_bounds() {
        let feature: Feature = serde_json::from_value(json!({
            "type": "Feature",
            "properties": {"id": "x"},
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[0.0, 0.0], [4.0, 0.0], [4.0, 2.0], [0.0, 2.0], [0.0, 0.0]]]
            }
        }))
        .unwrap();

        let bounds = feature_bounds(&feature).unwrap();
        assert_eq!(bounds, LatLngBounds::new(0.0, 0.0, 2.0, 4.0));
        assert_eq!(bounds.center(), LatLng::new(1.0, 2.0));
        assert_eq!(first_position(&feature), Some(LatLng::new(0.0, 0.0)));
    }

    #[test]
    fn test_feature_without_geometry() {
        let feature: Feature = serde_json::from_value(json!({
            "type": "Feature",
            "properties": {"id": 3},
            "geometry": null
        }))
        .unwrap();
        assert!(feature_bounds(&feature).is_none());
        assert!(first_position(&feature).is_none());
    }
}
