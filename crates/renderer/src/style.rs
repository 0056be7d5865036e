//! Path and circle styles handed to the map surface.

use serde::Serialize;

use crate::color::Color;

/// Stroke weight for choropleth outlines and bubble borders.
pub const DEFAULT_WEIGHT: f64 = 1.0;
/// Fill opacity of choropleth polygons.
pub const DEFAULT_FILL_OPACITY: f64 = 0.5;
/// Default choropleth ramp: low end.
pub const DEFAULT_LOW_COLOR: Color = Color::new(0xaa, 0xaa, 0xaa);
/// Default choropleth ramp: high end.
pub const DEFAULT_HIGH_COLOR: Color = Color::new(0x00, 0x33, 0x88);
/// Default bubble color (`#008`).
pub const DEFAULT_BUBBLE_COLOR: Color = Color::new(0x00, 0x00, 0x88);

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathStyle {
    pub weight: f64,
    pub fill_color: Color,
    pub fill_opacity: f64,
}

impl PathStyle {
    /// Choropleth fill with the default outline weight and opacity.
    pub fn filled(fill_color: Color) -> Self {
        Self {
            weight: DEFAULT_WEIGHT,
            fill_color,
            fill_opacity: DEFAULT_FILL_OPACITY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CircleStyle {
    pub weight: f64,
    pub color: Color,
    pub fill_color: Color,
}

impl CircleStyle {
    /// Stroke and fill in the same color.
    pub fn solid(color: Color) -> Self {
        Self {
            weight: DEFAULT_WEIGHT,
            color,
            fill_color: color,
        }
    }
}
