//! Data and feature acquisition shared by the thematic layers.

use geojson::Feature;
use map_common::config::ThematicLayer;
use map_common::{DataTable, Diagnostic, FeatureDocument, MapError};
use renderer::{Color, MapSurface};
use serde_json::Value;
use tracing::debug;

use super::LayerContext;

/// Attribute rows for a layer's `data` URL.
pub async fn load_rows<M: MapSurface>(
    ctx: &LayerContext<M>,
    data: &str,
) -> Result<DataTable, Diagnostic> {
    ctx.sources.fetch_rows(data).await.map_err(|err| match err {
        MapError::UnknownDataSource(data) => Diagnostic::UnknownDataSource {
            layer: ctx.index,
            data,
        },
        other => ctx.fetch_failed(other),
    })
}

/// Features of a FeatureCollection, or of the first object of a topology.
pub async fn load_features<M: MapSurface>(
    ctx: &LayerContext<M>,
    url: &str,
) -> Result<Vec<Feature>, Diagnostic> {
    let payload = ctx
        .sources
        .fetch_json(url)
        .await
        .map_err(|err| ctx.fetch_failed(err))?;

    let features = FeatureDocument::from_value(Value::clone(&payload))
        .and_then(FeatureDocument::into_features)
        .map_err(|err| Diagnostic::UnrecognizedFeatureDocument {
            layer: ctx.index,
            features: url.to_string(),
            message: err.to_string(),
        })?;

    debug!(url, count = features.len(), "Loaded features");
    Ok(features)
}

/// Rows then features. A data source that cannot be read aborts the layer
/// before any geometry is fetched.
pub async fn load_thematic<M: MapSurface>(
    ctx: &LayerContext<M>,
    layer: &ThematicLayer,
) -> Result<(DataTable, Vec<Feature>), Diagnostic> {
    let table = load_rows(ctx, &layer.data).await?;
    let features = load_features(ctx, &layer.features).await?;
    Ok((table, features))
}

pub fn parse_color<M: MapSurface>(ctx: &LayerContext<M>, text: &str) -> Result<Color, Diagnostic> {
    text.parse().map_err(|_| Diagnostic::InvalidColor {
        layer: ctx.index,
        color: text.to_string(),
    })
}
