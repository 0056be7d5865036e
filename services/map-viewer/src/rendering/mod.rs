//! Layer renderer registry.
//!
//! Each layer kind has its own strategy module. [`render_layer`] dispatches
//! one layer descriptor to its strategy and turns a failed strategy into a
//! diagnostic; the other layers of the map are unaffected.

pub mod background;
pub mod bubble;
pub mod choropleth;
pub mod loaders;
pub mod tiles;

use std::sync::Arc;

use map_common::{Diagnostic, DiagnosticSink, LayerConfig, MapError};
use metrics::counter;
use renderer::MapSurface;
use storage::SourceClient;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

/// Everything a layer strategy needs: the live map, the sources, the
/// diagnostics stream and the render's cancellation token.
pub struct LayerContext<M: MapSurface> {
    pub index: usize,
    pub map: Arc<Mutex<M>>,
    pub sources: SourceClient,
    pub diagnostics: DiagnosticSink,
    pub cancel: CancellationToken,
}

impl<M: MapSurface> LayerContext<M> {
    /// Run `draw` against the map unless the render has been cancelled or the
    /// map torn down. Returns whether the draw happened.
    ///
    /// The lock is held only for the synchronous draw.
    pub async fn draw<F>(&self, draw: F) -> bool
    where
        F: FnOnce(&mut M),
    {
        if self.cancel.is_cancelled() {
            return false;
        }
        let mut map = self.map.lock().await;
        if self.cancel.is_cancelled() || map.is_removed() {
            debug!(layer = self.index, "Skipping draw into torn-down map");
            return false;
        }
        draw(&mut map);
        true
    }

    pub fn fetch_failed(&self, err: MapError) -> Diagnostic {
        Diagnostic::FetchFailed {
            layer: Some(self.index),
            message: err.to_string(),
        }
    }
}

impl<M: MapSurface> Clone for LayerContext<M> {
    fn clone(&self) -> Self {
        Self {
            index: self.index,
            map: Arc::clone(&self.map),
            sources: self.sources.clone(),
            diagnostics: self.diagnostics.clone(),
            cancel: self.cancel.clone(),
        }
    }
}

/// Render one layer, reporting failure as a diagnostic.
#[instrument(skip_all, fields(layer = ctx.index, kind = layer.kind()))]
pub async fn render_layer<M: MapSurface>(ctx: LayerContext<M>, layer: LayerConfig) {
    let kind = layer.kind().to_string();

    let outcome = match &layer {
        LayerConfig::Tiles(tiles) => tiles::render(&ctx, tiles).await,
        LayerConfig::Background(background) => background::render(&ctx, background).await,
        LayerConfig::Choropleth(thematic) => choropleth::render(&ctx, thematic).await,
        LayerConfig::Bubble(thematic) => bubble::render(&ctx, thematic).await,
        LayerConfig::Unknown { kind } => Err(Diagnostic::UnknownLayerType {
            layer: ctx.index,
            kind: kind.clone(),
        }),
        LayerConfig::Invalid { kind, message } => Err(Diagnostic::InvalidLayer {
            layer: ctx.index,
            kind: kind.clone(),
            message: message.clone(),
        }),
    };

    if ctx.cancel.is_cancelled() {
        debug!("Layer abandoned after map teardown");
        return;
    }

    match outcome {
        Ok(()) => {
            counter!("gistmap_layers_rendered_total", "kind" => kind).increment(1);
            info!("Layer rendered");
        }
        Err(diagnostic) => {
            counter!("gistmap_layers_failed_total", "kind" => kind).increment(1);
            ctx.diagnostics.emit(diagnostic);
        }
    }
}
