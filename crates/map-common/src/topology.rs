//! Topology documents: arc-encoded geometry shared between neighbouring
//! features.
//!
//! Coordinates live in a shared `arcs` array. With a `transform`, arc
//! positions are quantized and delta-encoded; geometries reference arcs by
//! index, where a negative index `!i` means arc `i` traversed backwards.
//! Converting an object expands those references into plain GeoJSON features.

use geojson::{feature::Id, Feature, Geometry};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::{MapError, MapResult};

type Position = Vec<f64>;

/// Quantization transform.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Transform {
    pub scale: [f64; 2],
    pub translate: [f64; 2],
}

impl Transform {
    fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            x * self.scale[0] + self.translate[0],
            y * self.scale[1] + self.translate[1],
        )
    }
}

/// A parsed topology document.
#[derive(Debug, Clone, Deserialize)]
pub struct Topology {
    #[serde(default)]
    pub transform: Option<Transform>,
    #[serde(default)]
    pub arcs: Vec<Vec<Position>>,
    /// Named geometry objects, in document order.
    pub objects: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct TopoObject {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    arcs: Value,
    #[serde(default)]
    coordinates: Value,
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
    #[serde(default)]
    geometries: Vec<TopoObject>,
}

impl Topology {
    pub fn from_value(value: Value) -> MapResult<Self> {
        serde_json::from_value(value).map_err(|err| MapError::InvalidTopology(err.to_string()))
    }

    /// Names of the document's objects, in document order.
    pub fn object_names(&self) -> impl Iterator<Item = &str> {
        self.objects.keys().map(String::as_str)
    }

    /// Features of the first named object.
    pub fn first_object_features(&self) -> MapResult<Vec<Feature>> {
        let name = self
            .object_names()
            .next()
            .ok_or_else(|| MapError::InvalidTopology("document has no objects".to_string()))?;
        self.object_features(name)
    }

    /// Features of a named object. A `GeometryCollection` yields one feature
    /// per member geometry; any other object yields a single feature.
    pub fn object_features(&self, name: &str) -> MapResult<Vec<Feature>> {
        let raw = self
            .objects
            .get(name)
            .ok_or_else(|| MapError::InvalidTopology(format!("no object named '{}'", name)))?;
        let object: TopoObject = serde_json::from_value(raw.clone())
            .map_err(|err| MapError::InvalidTopology(err.to_string()))?;

        let decoder = ArcDecoder {
            transform: self.transform,
            arcs: self.decode_arcs(),
        };

        if object.kind.as_deref() == Some("GeometryCollection") {
            object
                .geometries
                .iter()
                .map(|member| decoder.feature(member))
                .collect()
        } else {
            Ok(vec![decoder.feature(&object)?])
        }
    }

    /// Arcs in absolute coordinates.
    fn decode_arcs(&self) -> Vec<Vec<Position>> {
        let Some(transform) = self.transform else {
            return self.arcs.clone();
        };

        self.arcs
            .iter()
            .map(|arc| {
                let (mut x, mut y) = (0.0, 0.0);
                arc.iter()
                    .map(|delta| {
                        x += delta.first().copied().unwrap_or(0.0);
                        y += delta.get(1).copied().unwrap_or(0.0);
                        let (px, py) = transform.apply(x, y);
                        let mut position = vec![px, py];
                        position.extend(delta.iter().skip(2));
                        position
                    })
                    .collect()
            })
            .collect()
    }
}

struct ArcDecoder {
    transform: Option<Transform>,
    arcs: Vec<Vec<Position>>,
}

impl ArcDecoder {
    fn feature(&self, object: &TopoObject) -> MapResult<Feature> {
        let id = match &object.id {
            Some(Value::String(s)) => Some(Id::String(s.clone())),
            Some(Value::Number(n)) => Some(Id::Number(n.clone())),
            _ => None,
        };

        Ok(Feature {
            bbox: None,
            geometry: self.geometry(object)?,
            id,
            properties: Some(object.properties.clone().unwrap_or_default()),
            foreign_members: None,
        })
    }

    fn geometry(&self, object: &TopoObject) -> MapResult<Option<Geometry>> {
        use geojson::Value as G;

        let value = match object.kind.as_deref() {
            None => return Ok(None),
            Some("Point") => G::Point(self.point(&parse::<Position>(&object.coordinates)?)),
            Some("MultiPoint") => {
                let points: Vec<Position> = parse(&object.coordinates)?;
                G::MultiPoint(points.iter().map(|p| self.point(p)).collect())
            }
            Some("LineString") => G::LineString(self.line(&parse::<Vec<i64>>(&object.arcs)?)?),
            Some("MultiLineString") => {
                let lines: Vec<Vec<i64>> = parse(&object.arcs)?;
                G::MultiLineString(
                    lines
                        .iter()
                        .map(|l| self.line(l))
                        .collect::<MapResult<_>>()?,
                )
            }
            Some("Polygon") => {
                G::Polygon(self.polygon(&parse::<Vec<Vec<i64>>>(&object.arcs)?)?)
            }
            Some("MultiPolygon") => {
                let polygons: Vec<Vec<Vec<i64>>> = parse(&object.arcs)?;
                G::MultiPolygon(
                    polygons
                        .iter()
                        .map(|p| self.polygon(p))
                        .collect::<MapResult<_>>()?,
                )
            }
            Some("GeometryCollection") => {
                let mut members = Vec::new();
                for member in &object.geometries {
                    if let Some(geometry) = self.geometry(member)? {
                        members.push(geometry);
                    }
                }
                G::GeometryCollection(members)
            }
            Some(other) => {
                return Err(MapError::InvalidTopology(format!(
                    "unsupported geometry type '{}'",
                    other
                )))
            }
        };

        Ok(Some(Geometry::new(value)))
    }

    /// Points are quantized but not delta-encoded.
    fn point(&self, position: &[f64]) -> Position {
        let x = position.first().copied().unwrap_or(0.0);
        let y = position.get(1).copied().unwrap_or(0.0);
        let (px, py) = match self.transform {
            Some(transform) => transform.apply(x, y),
            None => (x, y),
        };
        let mut out = vec![px, py];
        out.extend(position.iter().skip(2));
        out
    }

    /// Stitch arcs end to end; each arc after the first drops its shared
    /// start point.
    fn line(&self, indices: &[i64]) -> MapResult<Vec<Position>> {
        let mut points: Vec<Position> = Vec::new();

        for &index in indices {
            let (arc_index, reversed) = if index < 0 {
                ((!index) as usize, true)
            } else {
                (index as usize, false)
            };
            let arc = self.arcs.get(arc_index).ok_or_else(|| {
                MapError::InvalidTopology(format!("arc index {} out of range", index))
            })?;

            points.pop();
            let start = points.len();
            points.extend(arc.iter().cloned());
            if reversed {
                points[start..].reverse();
            }
        }

        if points.len() == 1 {
            points.push(points[0].clone());
        }
        Ok(points)
    }

    /// Rings are padded to the four positions a closed ring needs.
    fn ring(&self, indices: &[i64]) -> MapResult<Vec<Position>> {
        let mut points = self.line(indices)?;
        if let Some(first) = points.first().cloned() {
            while points.len() < 4 {
                points.push(first.clone());
            }
        }
        Ok(points)
    }

    fn polygon(&self, rings: &[Vec<i64>]) -> MapResult<Vec<Vec<Position>>> {
        rings.iter().map(|ring| self.ring(ring)).collect()
    }
}

fn parse<T: for<'de> Deserialize<'de>>(value: &Value) -> MapResult<T> {
    T::deserialize(value).map_err(|err| MapError::InvalidTopology(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn coords(feature: &Feature) -> geojson::Value {
        feature.geometry.as_ref().unwrap().value.clone()
    }

    #[test]
    fn test_quantized_polygon() {
        let topology = Topology::from_value(json!({
            "type": "Topology",
            "transform": {"scale": [0.5, 0.5], "translate": [10.0, 20.0]},
            "arcs": [[[0, 0], [2, 0], [0, 2], [-2, 0], [0, -2]]],
            "objects": {
                "regions": {
                    "type": "GeometryCollection",
                    "geometries": [
                        {"type": "Polygon", "arcs": [[0]], "properties": {"id": "A"}}
                    ]
                }
            }
        }))
        .unwrap();

        let features = topology.first_object_features().unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].property("id"), Some(&json!("A")));
        assert_eq!(
            coords(&features[0]),
            geojson::Value::Polygon(vec![vec![
                vec![10.0, 20.0],
                vec![11.0, 20.0],
                vec![11.0, 21.0],
                vec![10.0, 21.0],
                vec![10.0, 20.0],
            ]])
        );
    }

    #[test]
    fn test_reversed_arcs_are_stitched() {
        let topology = Topology::from_value(json!({
            "type": "Topology",
            "arcs": [[[0.0, 0.0], [1.0, 0.0]], [[1.0, 0.0], [1.0, 1.0]]],
            "objects": {
                "forward": {"type": "LineString", "arcs": [0, 1]},
                "backward": {"type": "LineString", "arcs": [-2, -1]}
            }
        }))
        .unwrap();

        let forward = topology.object_features("forward").unwrap();
        assert_eq!(
            coords(&forward[0]),
            geojson::Value::LineString(vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![1.0, 1.0]])
        );

        let backward = topology.object_features("backward").unwrap();
        assert_eq!(
            coords(&backward[0]),
            geojson::Value::LineString(vec![vec![1.0, 1.0], vec![1.0, 0.0], vec![0.0, 0.0]])
        );
    }

    #[test]
    fn test_points_and_null_geometry() {
        let topology = Topology::from_value(json!({
            "type": "Topology",
            "transform": {"scale": [2.0, 3.0], "translate": [1.0, 1.0]},
            "arcs": [],
            "objects": {
                "places": {
                    "type": "GeometryCollection",
                    "geometries": [
                        {"type": "Point", "coordinates": [1, 1], "id": 7, "properties": {"id": 7}},
                        {"type": null, "properties": {"id": 8}}
                    ]
                }
            }
        }))
        .unwrap();

        let features = topology.first_object_features().unwrap();
        assert_eq!(coords(&features[0]), geojson::Value::Point(vec![3.0, 4.0]));
        assert!(matches!(features[0].id, Some(Id::Number(_))));
        assert!(features[1].geometry.is_none());
        assert_eq!(features[1].property("id"), Some(&json!(8)));
    }

    #[test]
    fn test_first_object_uses_document_order() {
        let topology = Topology::from_value(json!({
            "type": "Topology",
            "arcs": [],
            "objects": {
                "zeta": {"type": "Point", "coordinates": [0, 0]},
                "alpha": {"type": "Point", "coordinates": [5, 5]}
            }
        }))
        .unwrap();

        let names: Vec<&str> = topology.object_names().collect();
        assert_eq!(names, ["zeta", "alpha"]);
        let features = topology.first_object_features().unwrap();
        assert_eq!(coords(&features[0]), geojson::Value::Point(vec![0.0, 0.0]));
    }

    #[test]
    fn test_bad_arc_index() {
        let topology = Topology::from_value(json!({
            "type": "Topology",
            "arcs": [],
            "objects": {"line": {"type": "LineString", "arcs": [3]}}
        }))
        .unwrap();
        assert!(matches!(
            topology.first_object_features(),
            Err(MapError::InvalidTopology(_))
        ));
    }

    #[test]
    fn test_no_objects() {
        let topology = Topology::from_value(json!({"type": "Topology", "objects": {}})).unwrap();
        assert!(topology.first_object_features().is_err());
    }
}
