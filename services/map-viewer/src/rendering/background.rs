//! Well-known background tile sources.

use map_common::config::BackgroundLayer;
use map_common::Diagnostic;
use renderer::{MapSurface, TileLayer};

use super::LayerContext;

pub const OSM_TILES: &str = "http://{s}.tile.osm.org/{z}/{x}/{y}.png";
pub const OSM_ATTRIBUTION: &str =
    "&copy; <a href=\"http://osm.org/copyright\">OpenStreetMap</a> contributors";

/// Tile layer for a named background source.
pub fn background_tiles(source: &str) -> Option<TileLayer> {
    match source {
        "osm" => Some(TileLayer {
            url: OSM_TILES.to_string(),
            attribution: Some(OSM_ATTRIBUTION.to_string()),
        }),
        _ => None,
    }
}

pub async fn render<M: MapSurface>(
    ctx: &LayerContext<M>,
    layer: &BackgroundLayer,
) -> Result<(), Diagnostic> {
    let tiles = background_tiles(&layer.source).ok_or_else(|| Diagnostic::UnknownBackgroundSource {
        layer: ctx.index,
        name: layer.source.clone(),
    })?;
    ctx.draw(|map| map.add_tile_layer(tiles)).await;
    Ok(())
}
