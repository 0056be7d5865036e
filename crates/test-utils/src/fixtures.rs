//! Common test fixtures for gistmap tests.
//!
//! Documents are returned as `serde_json::Value` so every crate can feed them
//! through its own parsing code.

use serde_json::{json, Value};

/// Fixture URLs used across crates.
pub mod urls {
    /// A spreadsheet document URL (new-style).
    pub const SPREADSHEET: &str =
        "https://docs.google.com/spreadsheets/d/1AbCdEfGhIjKlMn/edit#gid=0";

    /// A spreadsheet document URL (old-style `ccc?key=`).
    pub const LEGACY_SPREADSHEET: &str =
        "https://docs.google.com/spreadsheet/ccc?key=0AkLegacyKey&usp=sharing";

    /// Static JSON rows.
    pub const JSON_ROWS: &str = "https://data.example.org/rows.json";

    /// Point feature collection.
    pub const POINTS: &str = "https://data.example.org/cities.geojson";

    /// Polygon feature collection.
    pub const REGIONS: &str = "https://data.example.org/regions.geojson";

    /// Topology document.
    pub const TOPOLOGY: &str = "https://data.example.org/regions.topojson";

    /// Configuration served by path.
    pub const CONFIG: &str = "https://maps.example.org/map.json";

    /// Gist id.
    pub const GIST_ID: &str = "5f1e2d3c";
}

/// Two square regions (`id` 1 and 2) side by side.
pub fn regions() -> Value {
    json!({
        "type": "FeatureCollection",
        "features": [
            square_feature(json!(1), 0.0, 0.0),
            square_feature(json!(2), 0.0, 1.0)
        ]
    })
}

/// A single square feature with the given `id` property.
pub fn single_region(id: Value) -> Value {
    json!({
        "type": "FeatureCollection",
        "features": [square_feature(id, 0.0, 0.0)]
    })
}

fn square_feature(id: Value, lat: f64, lng: f64) -> Value {
    json!({
        "type": "Feature",
        "properties": {"id": id},
        "geometry": {
            "type": "Polygon",
            "coordinates": [[
                [lng, lat],
                [lng + 1.0, lat],
                [lng + 1.0, lat + 1.0],
                [lng, lat + 1.0],
                [lng, lat]
            ]]
        }
    })
}

/// Three cities as point features (`ids` "a", "b", "c").
pub fn cities() -> Value {
    json!({
        "type": "FeatureCollection",
        "features": [
            point_feature("a", 26.10, 44.43),
            point_feature("b", 23.60, 46.77),
            point_feature("c", 27.59, 47.16)
        ]
    })
}

fn point_feature(id: &str, lng: f64, lat: f64) -> Value {
    json!({
        "type": "Feature",
        "properties": {"id": id, "name": format!("city-{}", id)},
        "geometry": {"type": "Point", "coordinates": [lng, lat]}
    })
}

/// The two regions of [`regions`] as a quantized topology sharing one edge.
pub fn regions_topology() -> Value {
    json!({
        "type": "Topology",
        "transform": {"scale": [1.0, 1.0], "translate": [0.0, 0.0]},
        "arcs": [
            [[1, 0], [0, 1]],
            [[1, 1], [-1, 0], [0, -1], [1, 0]],
            [[1, 0], [1, 0], [0, 1], [-1, 0]]
        ],
        "objects": {
            "regions": {
                "type": "GeometryCollection",
                "geometries": [
                    {"type": "Polygon", "arcs": [[0, 1]], "properties": {"id": 1}},
                    {"type": "Polygon", "arcs": [[2, -1]], "properties": {"id": 2}}
                ]
            }
        }
    })
}

/// Rows for [`regions`]: values 10 and 30.
pub fn region_rows() -> Value {
    json!([
        {"id": "1", "name": "North", "value": "10"},
        {"id": "2", "name": "South", "value": "30"}
    ])
}

/// Spreadsheet CSV export for [`cities`]; `c` is missing.
pub const CITY_SHEET_CSV: &str = "\
ID,Name,Population
a,Bucharest,1800000
b,Cluj,300000
";

/// A minimal map configuration.
pub fn config() -> Value {
    json!({
        "layers": [
            {"type": "background", "source": "osm"},
            {"type": "choropleth", "data": urls::JSON_ROWS, "features": urls::REGIONS}
        ]
    })
}

/// A gist API payload embedding `config` as its `map.json` file.
pub fn gist_payload(config: &Value) -> Value {
    json!({
        "id": urls::GIST_ID,
        "files": {
            "map.json": {
                "filename": "map.json",
                "content": config.to_string()
            }
        }
    })
}
