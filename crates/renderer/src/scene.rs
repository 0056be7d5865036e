//! Headless map surface.
//!
//! [`SceneMap`] records every draw call into a serializable [`Scene`]. The
//! HTTP service returns scenes to its clients, and tests inspect them.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use map_common::LatLngBounds;
use serde::Serialize;
use tracing::{debug, warn};

use crate::popup::Popup;
use crate::surface::{Circle, FeatureLayer, MapFactory, MapSurface, TileLayer};

/// Everything drawn into one map instance.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Scene {
    pub tile_layers: Vec<TileLayer>,
    pub feature_layers: Vec<FeatureLayer>,
    pub circles: Vec<Circle>,
    pub viewport: Option<LatLngBounds>,
    pub popup: Option<Popup>,
}

impl Scene {
    /// All styled features across feature layers, in draw order.
    pub fn features(&self) -> impl Iterator<Item = &crate::surface::StyledFeature> {
        self.feature_layers.iter().flat_map(|l| l.features.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.tile_layers.is_empty() && self.feature_layers.is_empty() && self.circles.is_empty()
    }
}

#[derive(Debug)]
pub struct SceneMap {
    id: u64,
    scene: Scene,
    removed: bool,
    ignored_draws: usize,
    live: Arc<AtomicUsize>,
}

impl SceneMap {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Draw calls dropped because they arrived after removal.
    pub fn ignored_draws(&self) -> usize {
        self.ignored_draws
    }

    /// Simulate a click on a feature: opens its popup.
    pub fn click_feature(&mut self, layer: usize, index: usize) -> Option<&Popup> {
        let popup = self
            .scene
            .feature_layers
            .get(layer)?
            .features
            .get(index)?
            .popup
            .clone();
        self.open_popup(popup);
        self.scene.popup.as_ref()
    }

    /// Simulate a click on a circle: opens its popup.
    pub fn click_circle(&mut self, index: usize) -> Option<&Popup> {
        let popup = self.scene.circles.get(index)?.popup.clone();
        self.open_popup(popup);
        self.scene.popup.as_ref()
    }

    fn accept(&mut self, what: &str) -> bool {
        if self.removed {
            self.ignored_draws += 1;
            warn!(map = self.id, call = what, "Draw call on removed map ignored");
            false
        } else {
            true
        }
    }
}

impl MapSurface for SceneMap {
    fn add_tile_layer(&mut self, layer: TileLayer) {
        if self.accept("add_tile_layer") {
            self.scene.tile_layers.push(layer);
        }
    }

    fn add_feature_layer(&mut self, layer: FeatureLayer) {
        if self.accept("add_feature_layer") {
            self.scene.feature_layers.push(layer);
        }
    }

    fn add_circle(&mut self, circle: Circle) {
        if self.accept("add_circle") {
            self.scene.circles.push(circle);
        }
    }

    fn fit_bounds(&mut self, bounds: LatLngBounds) {
        if self.accept("fit_bounds") {
            self.scene.viewport = Some(bounds);
        }
    }

    fn open_popup(&mut self, popup: Popup) {
        if self.accept("open_popup") {
            self.scene.popup = Some(popup);
        }
    }

    fn remove(&mut self) {
        if !self.removed {
            self.removed = true;
            self.live.fetch_sub(1, Ordering::SeqCst);
            debug!(map = self.id, "Map removed");
        }
    }

    fn is_removed(&self) -> bool {
        self.removed
    }
}

impl Drop for SceneMap {
    fn drop(&mut self) {
        if !self.removed {
            self.live.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

/// Creates [`SceneMap`]s and counts how many are alive.
#[derive(Debug, Default)]
pub struct SceneFactory {
    live: Arc<AtomicUsize>,
    created: AtomicU64,
}

impl SceneFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instances created and neither removed nor dropped.
    pub fn live_maps(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn created(&self) -> u64 {
        self.created.load(Ordering::SeqCst)
    }
}

impl MapFactory for SceneFactory {
    type Map = SceneMap;

    fn create(&self) -> SceneMap {
        let id = self.created.fetch_add(1, Ordering::SeqCst) + 1;
        self.live.fetch_add(1, Ordering::SeqCst);
        debug!(map = id, "Map created");
        SceneMap {
            id,
            scene: Scene::default(),
            removed: false,
            ignored_draws: 0,
            live: Arc::clone(&self.live),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use map_common::{AttributeRow, LatLng};

    use crate::style::CircleStyle;
    use crate::style::DEFAULT_BUBBLE_COLOR;

    fn circle() -> Circle {
        let at = LatLng::new(44.43, 26.10);
        Circle {
            center: at,
            radius: 10.0,
            style: CircleStyle::solid(DEFAULT_BUBBLE_COLOR),
            popup: Popup::for_row(at, &AttributeRow::default()),
        }
    }

    #[test]
    fn test_live_counter() {
        let factory = SceneFactory::new();
        let mut first = factory.create();
        let second = factory.create();
        assert_eq!(factory.live_maps(), 2);
        first.remove();
        first.remove();
        assert_eq!(factory.live_maps(), 1);
        drop(second);
        assert_eq!(factory.live_maps(), 0);
        drop(first);
        assert_eq!(factory.live_maps(), 0);
        assert_eq!(factory.created(), 2);
    }

    #[test]
    fn test_removed_map_ignores_draws() {
        let factory = SceneFactory::new();
        let mut map = factory.create();
        map.add_circle(circle());
        map.remove();
        map.add_circle(circle());
        map.fit_bounds(LatLngBounds::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(map.scene().circles.len(), 1);
        assert!(map.scene().viewport.is_none());
        assert_eq!(map.ignored_draws(), 2);
    }

    #[test]
    fn test_click_circle_opens_popup() {
        let factory = SceneFactory::new();
        let mut map = factory.create();
        map.add_circle(circle());
        let popup = map.click_circle(0).unwrap();
        assert_eq!(popup.at, LatLng::new(44.43, 26.10));
        assert!(map.click_circle(3).is_none());
    }

    #[test]
    fn test_scene_serializes() {
        let factory = SceneFactory::new();
        let mut map = factory.create();
        map.add_tile_layer(TileLayer {
            url: "foo".into(),
            attribution: Some("bar".into()),
        });
        let json = serde_json::to_value(map.scene()).unwrap();
        assert_eq!(json["tile_layers"][0]["url"], "foo");
        assert!(json["viewport"].is_null());
    }
}
