//! Raster tile layers from an explicit URL template.

use map_common::config::TilesLayer;
use map_common::Diagnostic;
use renderer::{MapSurface, TileLayer};

use super::LayerContext;

pub async fn render<M: MapSurface>(
    ctx: &LayerContext<M>,
    layer: &TilesLayer,
) -> Result<(), Diagnostic> {
    let tiles = TileLayer {
        url: layer.src.clone(),
        attribution: layer.attribution.clone(),
    };
    ctx.draw(|map| map.add_tile_layer(tiles)).await;
    Ok(())
}
