//! Proportional-symbol layers: one circle per joined feature, area scaled
//! to the row's value.

use map_common::config::ThematicLayer;
use map_common::feature::{feature_id, first_position};
use map_common::{Diagnostic, LatLngBounds};
use renderer::style::DEFAULT_BUBBLE_COLOR;
use renderer::{BubbleScale, Circle, CircleStyle, MapSurface, Popup};
use tracing::{debug, instrument};

use super::loaders::{load_thematic, parse_color};
use super::LayerContext;

#[instrument(skip_all, fields(layer = ctx.index, data = %layer.data))]
pub async fn render<M: MapSurface>(
    ctx: &LayerContext<M>,
    layer: &ThematicLayer,
) -> Result<(), Diagnostic> {
    let color = match &layer.color {
        Some(text) => parse_color(ctx, text)?,
        None => DEFAULT_BUBBLE_COLOR,
    };
    let style = CircleStyle::solid(color);

    let (table, features) = load_thematic(ctx, layer).await?;
    let column = layer.value_column();
    let scale = BubbleScale::new(table.max(column).unwrap_or(f64::NAN));

    let mut circles = Vec::new();
    let mut bounds: Option<LatLngBounds> = None;
    for feature in &features {
        let Some(row) = feature_id(feature).and_then(|id| table.lookup(id)) else {
            continue;
        };
        // Non-point geometries sit at their first vertex.
        let Some(center) = first_position(feature) else {
            continue;
        };
        let Some(radius) = scale.radius(row.number(column)) else {
            continue;
        };

        match bounds.as_mut() {
            Some(b) => b.extend(center),
            None => bounds = Some(LatLngBounds::from_point(center)),
        }
        circles.push(Circle {
            center,
            radius,
            style,
            popup: Popup::for_row(center, row),
        });
    }

    let Some(bounds) = bounds else {
        return Err(Diagnostic::EmptyLayer { layer: ctx.index });
    };

    debug!(circles = circles.len(), "Drawing bubbles");
    ctx.draw(|map| {
        for circle in circles {
            map.add_circle(circle);
        }
        map.fit_bounds(bounds);
    })
    .await;
    Ok(())
}
