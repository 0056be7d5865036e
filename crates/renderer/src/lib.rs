//! Visual encoding and map surfaces for gistmap.
//!
//! - Colors: hex parsing and Lab-space interpolation
//! - Scales: choropleth color ramps and area-proportional bubble radii
//! - Popups: attribute tables rendered as HTML
//! - Surfaces: the [`MapSurface`] trait and a headless [`SceneMap`]

pub mod color;
pub mod popup;
pub mod scale;
pub mod scene;
pub mod style;
pub mod surface;

pub use color::{Color, Lab};
pub use popup::{render_properties_table, Popup};
pub use scale::{BubbleScale, ColorScale, LinearScale, NO_DATA_COLOR};
pub use scene::{Scene, SceneFactory, SceneMap};
pub use style::{CircleStyle, PathStyle};
pub use surface::{Circle, FeatureLayer, MapFactory, MapSurface, StyledFeature, TileLayer};
