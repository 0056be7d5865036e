//! Choropleth layers: polygons shaded by a joined attribute value.

use geojson::Feature;
use map_common::config::ThematicLayer;
use map_common::feature::{feature_bounds, feature_id};
use map_common::{DataTable, Diagnostic, LatLng};
use renderer::style::{DEFAULT_HIGH_COLOR, DEFAULT_LOW_COLOR};
use renderer::{ColorScale, FeatureLayer, MapSurface, PathStyle, Popup, StyledFeature, NO_DATA_COLOR};
use tracing::{debug, instrument};

use super::loaders::{load_thematic, parse_color};
use super::LayerContext;

#[instrument(skip_all, fields(layer = ctx.index, data = %layer.data))]
pub async fn render<M: MapSurface>(
    ctx: &LayerContext<M>,
    layer: &ThematicLayer,
) -> Result<(), Diagnostic> {
    let (table, features) = load_thematic(ctx, layer).await?;
    let scale = color_scale(ctx, layer, &table)?;
    let styled = style_features(features, &table, layer.value_column(), scale.as_ref());

    let styled = FeatureLayer::new(styled);
    let bounds = styled.bounds();
    debug!(features = styled.len(), "Drawing choropleth");

    ctx.draw(|map| {
        map.add_feature_layer(styled);
        if let Some(bounds) = bounds {
            map.fit_bounds(bounds);
        }
    })
    .await;
    Ok(())
}

/// The configured color range, or the default ramp over the value extent.
/// `None` when no row holds a numeric value.
fn color_scale<M: MapSurface>(
    ctx: &LayerContext<M>,
    layer: &ThematicLayer,
    table: &DataTable,
) -> Result<Option<ColorScale>, Diagnostic> {
    if let Some(range) = &layer.color_range {
        let low = parse_color(ctx, &range.min.color)?;
        let high = parse_color(ctx, &range.max.color)?;
        return Ok(Some(ColorScale::new((range.min.value, range.max.value), low, high)));
    }

    Ok(table
        .extent(layer.value_column())
        .map(|domain| ColorScale::new(domain, DEFAULT_LOW_COLOR, DEFAULT_HIGH_COLOR)))
}

/// Style every feature with its joined row; features without a row get an
/// empty one.
pub fn style_features(
    features: Vec<Feature>,
    table: &DataTable,
    column: &str,
    scale: Option<&ColorScale>,
) -> Vec<StyledFeature> {
    features
        .into_iter()
        .map(|feature| {
            let row = feature_id(&feature)
                .and_then(|id| table.lookup(id))
                .cloned()
                .unwrap_or_default();
            let value = row.number(column);
            let fill = scale.map_or(NO_DATA_COLOR, |s| s.fill(value));
            let center = feature_bounds(&feature)
                .map(|b| b.center())
                .unwrap_or_else(|| LatLng::new(0.0, 0.0));

            StyledFeature {
                style: PathStyle::filled(fill),
                popup: Popup::for_row(center, &row),
                feature,
            }
        })
        .collect()
}
