//! The drawing surface abstraction.
//!
//! Layer strategies never talk to a concrete map engine. They build
//! [`TileLayer`], [`FeatureLayer`] and [`Circle`] values and hand them to a
//! [`MapSurface`]; the engine behind the trait owns projection, panning,
//! zooming and the actual drawing.

use geojson::Feature;
use map_common::feature::feature_bounds;
use map_common::{LatLng, LatLngBounds};
use serde::Serialize;

use crate::popup::Popup;
use crate::style::{CircleStyle, PathStyle};

/// A raster tile layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileLayer {
    /// URL template with `{s}`, `{z}`, `{x}`, `{y}` placeholders.
    pub url: String,
    pub attribution: Option<String>,
}

/// A GeoJSON feature with its style and click popup.
#[derive(Debug, Clone, Serialize)]
pub struct StyledFeature {
    pub feature: Feature,
    pub style: PathStyle,
    pub popup: Popup,
}

/// A group of styled features added in one call.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FeatureLayer {
    pub features: Vec<StyledFeature>,
}

impl FeatureLayer {
    pub fn new(features: Vec<StyledFeature>) -> Self {
        Self { features }
    }

    /// Combined bounds of every feature with coordinates.
    pub fn bounds(&self) -> Option<LatLngBounds> {
        self.features
            .iter()
            .filter_map(|f| feature_bounds(&f.feature))
            .reduce(|acc, b| acc.union(&b))
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// A circle with a radius in meters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Circle {
    pub center: LatLng,
    pub radius: f64,
    pub style: CircleStyle,
    pub popup: Popup,
}

/// A live map instance.
///
/// Once [`MapSurface::remove`] has been called the instance is dead:
/// implementations must ignore any further drawing.
pub trait MapSurface: Send + 'static {
    fn add_tile_layer(&mut self, layer: TileLayer);

    fn add_feature_layer(&mut self, layer: FeatureLayer);

    fn add_circle(&mut self, circle: Circle);

    fn fit_bounds(&mut self, bounds: LatLngBounds);

    fn open_popup(&mut self, popup: Popup);

    /// Tear the instance down and release its resources.
    fn remove(&mut self);

    fn is_removed(&self) -> bool;
}

/// Creates fresh map instances.
pub trait MapFactory: Send + Sync + 'static {
    type Map: MapSurface;

    fn create(&self) -> Self::Map;
}
