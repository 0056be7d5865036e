//! Map configuration documents.
//!
//! A configuration is a JSON object with an ordered `layers` array. Each layer
//! is tagged by its `type` field; the set of layer kinds is closed so every
//! renderer dispatch can `match` exhaustively. Unrecognized tags and layers
//! with malformed fields are kept as [`LayerConfig::Unknown`] and
//! [`LayerConfig::Invalid`] so that one bad layer never rejects the whole map.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::{MapError, MapResult};

/// Column read for numeric values when a layer does not name one.
pub const DEFAULT_DATA_COLUMN: &str = "value";

/// Root configuration document.
#[derive(Debug, Clone)]
pub struct Configuration {
    raw: Value,
    pub layers: Vec<LayerConfig>,
}

impl Configuration {
    /// Build from an already-parsed JSON document.
    pub fn from_value(raw: Value) -> MapResult<Self> {
        if !raw.is_object() {
            return Err(MapError::InvalidConfig(
                "configuration must be a JSON object".to_string(),
            ));
        }

        let layers = match raw.get("layers") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items.iter().map(LayerConfig::from_value).collect(),
            Some(_) => {
                return Err(MapError::InvalidConfig(
                    "'layers' must be an array".to_string(),
                ))
            }
        };

        Ok(Self { raw, layers })
    }

    /// Parse configuration JSON text.
    pub fn from_json(text: &str) -> MapResult<Self> {
        let raw: Value = serde_json::from_str(text)?;
        Self::from_value(raw)
    }

    /// The document exactly as it was loaded.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Pretty-printed document, two-space indented, for the editor view.
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(&self.raw).unwrap_or_default()
    }
}

/// A single layer descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerConfig {
    Tiles(TilesLayer),
    Background(BackgroundLayer),
    Choropleth(ThematicLayer),
    Bubble(ThematicLayer),
    /// A `type` tag no renderer handles (or no tag at all).
    Unknown { kind: Option<String> },
    /// A known tag whose fields failed to parse.
    Invalid { kind: String, message: String },
}

impl LayerConfig {
    /// Classify a raw layer object by its `type` tag.
    pub fn from_value(value: &Value) -> Self {
        let kind = value.get("type").and_then(Value::as_str);
        match kind {
            Some("tiles") => parse_fields(value, "tiles", LayerConfig::Tiles),
            Some("background") => parse_fields(value, "background", LayerConfig::Background),
            Some("choropleth") => parse_fields(value, "choropleth", LayerConfig::Choropleth),
            Some("bubble") => parse_fields(value, "bubble", LayerConfig::Bubble),
            other => LayerConfig::Unknown {
                kind: other.map(str::to_string),
            },
        }
    }

    /// The layer's `type` tag.
    pub fn kind(&self) -> &str {
        match self {
            LayerConfig::Tiles(_) => "tiles",
            LayerConfig::Background(_) => "background",
            LayerConfig::Choropleth(_) => "choropleth",
            LayerConfig::Bubble(_) => "bubble",
            LayerConfig::Unknown { kind } => kind.as_deref().unwrap_or(""),
            LayerConfig::Invalid { kind, .. } => kind,
        }
    }
}

fn parse_fields<T, F>(value: &Value, kind: &str, wrap: F) -> LayerConfig
where
    T: for<'de> Deserialize<'de>,
    F: FnOnce(T) -> LayerConfig,
{
    match T::deserialize(value) {
        Ok(fields) => wrap(fields),
        Err(err) => LayerConfig::Invalid {
            kind: kind.to_string(),
            message: err.to_string(),
        },
    }
}

impl<'de> Deserialize<'de> for LayerConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(LayerConfig::from_value(&value))
    }
}

/// Raster tiles from an explicit URL template.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TilesLayer {
    pub src: String,
    #[serde(default)]
    pub attribution: Option<String>,
}

/// A named, well-known background tile source.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BackgroundLayer {
    pub source: String,
}

/// Data-driven layer: attribute rows joined to features by `id`.
///
/// Shared by choropleth and bubble layers; each reads the fields it needs.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ThematicLayer {
    /// Attribute data source URL.
    pub data: String,
    /// Feature geometry source URL.
    pub features: String,
    #[serde(rename = "dataColumn", default)]
    pub data_column: Option<String>,
    /// Bubble stroke/fill color.
    #[serde(default)]
    pub color: Option<String>,
    /// Explicit choropleth color/value range.
    #[serde(rename = "colorRange", default)]
    pub color_range: Option<ColorRange>,
}

impl ThematicLayer {
    /// Column holding the numeric value for each row.
    pub fn value_column(&self) -> &str {
        self.data_column.as_deref().unwrap_or(DEFAULT_DATA_COLUMN)
    }
}

/// Explicit value range with the colors at each end.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ColorRange {
    pub min: RangeStop,
    pub max: RangeStop,
}

/// One end of a [`ColorRange`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RangeStop {
    pub color: String,
    pub value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_all_layer_kinds() {
        let config = Configuration::from_value(json!({
            "layers": [
                {"type": "tiles", "src": "foo", "attribution": "bar"},
                {"type": "background", "source": "osm"},
                {"type": "choropleth", "data": "d", "features": "f"},
                {"type": "bubble", "data": "d", "features": "f", "dataColumn": "pop", "color": "#800"}
            ]
        }))
        .unwrap();

        assert_eq!(config.layers.len(), 4);
        assert_eq!(
            config.layers[0],
            LayerConfig::Tiles(TilesLayer {
                src: "foo".to_string(),
                attribution: Some("bar".to_string()),
            })
        );
        assert_eq!(config.layers[1].kind(), "background");
        match &config.layers[2] {
            LayerConfig::Choropleth(layer) => assert_eq!(layer.value_column(), "value"),
            other => panic!("expected choropleth, got {:?}", other),
        }
        match &config.layers[3] {
            LayerConfig::Bubble(layer) => {
                assert_eq!(layer.value_column(), "pop");
                assert_eq!(layer.color.as_deref(), Some("#800"));
            }
            other => panic!("expected bubble, got {:?}", other),
        }
    }

    #[test]
    fn test_color_range_field() {
        let layer = LayerConfig::from_value(&json!({
            "type": "choropleth",
            "data": "d",
            "features": "f",
            "colorRange": {
                "min": {"color": "#fff", "value": 0},
                "max": {"color": "#000", "value": 100}
            }
        }));
        let LayerConfig::Choropleth(layer) = layer else {
            panic!("expected choropleth");
        };
        let range = layer.color_range.unwrap();
        assert_eq!(range.min.value, 0.0);
        assert_eq!(range.max.color, "#000");
    }

    #[test]
    fn test_unknown_and_invalid_layers_do_not_fail_config() {
        let config = Configuration::from_value(json!({
            "layers": [
                {"type": "heatmap"},
                {"src": "no-type"},
                {"type": "tiles"}
            ]
        }))
        .unwrap();

        assert_eq!(
            config.layers[0],
            LayerConfig::Unknown {
                kind: Some("heatmap".to_string())
            }
        );
        assert_eq!(config.layers[1], LayerConfig::Unknown { kind: None });
        assert!(matches!(config.layers[2], LayerConfig::Invalid { .. }));
    }

    #[test]
    fn test_missing_layers_is_empty() {
        let config = Configuration::from_value(json!({})).unwrap();
        assert!(config.layers.is_empty());
    }

    #[test]
    fn test_rejects_non_object() {
        assert!(Configuration::from_value(json!([1, 2])).is_err());
        assert!(Configuration::from_value(json!({"layers": 3})).is_err());
    }

    #[test]
    fn test_pretty_json_preserves_document() {
        let config = Configuration::from_json(r#"{"title":"x","layers":[]}"#).unwrap();
        let pretty = config.to_pretty_json();
        assert!(pretty.starts_with("{\n  \"title\": \"x\""));
        let reparsed: Value = serde_json::from_str(&pretty).unwrap();
        assert_eq!(&reparsed, config.raw());
    }
}
