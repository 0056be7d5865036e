//! Structured diagnostics.
//!
//! Every abandoned unit of work (an unknown layer type, an unreachable data
//! source, a document of the wrong shape) is reported as a [`Diagnostic`]
//! instead of an error: the rest of the map keeps rendering. Diagnostics are
//! logged and broadcast to any subscriber (UI, tests). A sink can also carry
//! an unbounded collector, which records every diagnostic regardless of how
//! far behind the broadcast subscribers fall.

use serde::Serialize;
use thiserror::Error;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tokio::sync::mpsc;
use tracing::warn;

/// Default number of undelivered diagnostics kept per subscriber.
pub const DEFAULT_CAPACITY: usize = 256;

/// A non-fatal problem encountered while loading or rendering a map.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum Diagnostic {
    #[error("Could not match a provider for parameters {keys:?}")]
    NoProvider { keys: Vec<String> },

    #[error("Failed to load configuration: {message}")]
    ConfigError { message: String },

    #[error("Unknown layer type {kind:?} (layer {layer})")]
    UnknownLayerType { layer: usize, kind: Option<String> },

    #[error("Invalid {kind} layer {layer}: {message}")]
    InvalidLayer {
        layer: usize,
        kind: String,
        message: String,
    },

    #[error("Unknown background tile source '{name}' (layer {layer})")]
    UnknownBackgroundSource { layer: usize, name: String },

    #[error("Unknown data source '{data}' (layer {layer})")]
    UnknownDataSource { layer: usize, data: String },

    #[error("Unknown document type in '{features}' (layer {layer}): {message}")]
    UnrecognizedFeatureDocument {
        layer: usize,
        features: String,
        message: String,
    },

    #[error("Invalid color '{color}' (layer {layer})")]
    InvalidColor { layer: usize, color: String },

    #[error("Fetch failed (layer {layer:?}): {message}")]
    FetchFailed {
        layer: Option<usize>,
        message: String,
    },

    #[error("Layer {layer} has nothing to draw")]
    EmptyLayer { layer: usize },
}

impl Diagnostic {
    /// Short machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Diagnostic::NoProvider { .. } => "no_provider",
            Diagnostic::ConfigError { .. } => "config_error",
            Diagnostic::UnknownLayerType { .. } => "unknown_layer_type",
            Diagnostic::InvalidLayer { .. } => "invalid_layer",
            Diagnostic::UnknownBackgroundSource { .. } => "unknown_background_source",
            Diagnostic::UnknownDataSource { .. } => "unknown_data_source",
            Diagnostic::UnrecognizedFeatureDocument { .. } => "unrecognized_feature_document",
            Diagnostic::InvalidColor { .. } => "invalid_color",
            Diagnostic::FetchFailed { .. } => "fetch_failed",
            Diagnostic::EmptyLayer { .. } => "empty_layer",
        }
    }

    /// Layer the diagnostic refers to, if any.
    pub fn layer(&self) -> Option<usize> {
        match self {
            Diagnostic::NoProvider { .. } | Diagnostic::ConfigError { .. } => None,
            Diagnostic::FetchFailed { layer, .. } => *layer,
            Diagnostic::UnknownLayerType { layer, .. }
            | Diagnostic::InvalidLayer { layer, .. }
            | Diagnostic::UnknownBackgroundSource { layer, .. }
            | Diagnostic::UnknownDataSource { layer, .. }
            | Diagnostic::UnrecognizedFeatureDocument { layer, .. }
            | Diagnostic::InvalidColor { layer, .. }
            | Diagnostic::EmptyLayer { layer } => Some(*layer),
        }
    }
}

/// Broadcast channel for diagnostics. Cloning shares the channel.
#[derive(Debug, Clone)]
pub struct DiagnosticSink {
    tx: broadcast::Sender<Diagnostic>,
    collector: Option<mpsc::UnboundedSender<Diagnostic>>,
}

impl DiagnosticSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx, collector: None }
    }

    /// Attach an unbounded collector that keeps every later diagnostic.
    pub fn with_collector(mut self) -> (Self, mpsc::UnboundedReceiver<Diagnostic>) {
        let (tx, rx) = mpsc::unbounded_channel();
        self.collector = Some(tx);
        (self, rx)
    }

    /// Log a diagnostic and deliver it to current subscribers.
    pub fn emit(&self, diagnostic: Diagnostic) {
        warn!(code = diagnostic.code(), "{}", diagnostic);
        if let Some(collector) = &self.collector {
            let _ = collector.send(diagnostic.clone());
        }
        // No subscribers is fine: the log line is the record.
        let _ = self.tx.send(diagnostic);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Diagnostic> {
        self.tx.subscribe()
    }
}

impl Default for DiagnosticSink {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// Collect every diagnostic currently queued on a receiver.
pub fn drain(receiver: &mut broadcast::Receiver<Diagnostic>) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    loop {
        match receiver.try_recv() {
            Ok(diagnostic) => out.push(diagnostic),
            Err(TryRecvError::Lagged(skipped)) => {
                warn!(skipped, "Diagnostic subscriber lagged");
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
        }
    }
    out
}

/// Collect every diagnostic recorded by a collector so far.
pub fn collect(receiver: &mut mpsc::UnboundedReceiver<Diagnostic>) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    while let Ok(diagnostic) = receiver.try_recv() {
        out.push(diagnostic);
    }
    out
}
