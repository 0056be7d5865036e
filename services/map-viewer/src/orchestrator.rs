//! Map lifecycle: one live map instance, rebuilt on every render.
//!
//! A render tears down the previous map (cancelling its token, aborting its
//! layer tasks and removing the instance), creates a fresh one and spawns one
//! task per layer. Layers complete in no particular order. Because every
//! draw re-checks the token under the map lock, nothing from an earlier
//! render ever lands in a newer or removed map.

use std::sync::Arc;

use map_common::{
    Configuration, Diagnostic, DiagnosticSink, MapError, QueryArgs,
};
use renderer::{MapFactory, MapSurface};
use storage::{Provider, SourceClient};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::rendering::{render_layer, LayerContext};

/// Bootstrap parameter that enables the live editor.
pub const DEVEL_PARAM: &str = "devel";

/// Failure to apply edited configuration text. Nothing is rendered.
#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("JSON parse error: {0}")]
    Parse(String),

    #[error(transparent)]
    Config(MapError),
}

/// Contents of the live configuration editor and its message panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorView {
    text: String,
    message: Option<String>,
}

impl EditorView {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Error shown after the last failed apply, if any.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn set_message(&mut self, message: Option<String>) {
        self.message = message;
    }
}

struct LiveMap<M> {
    map: Arc<Mutex<M>>,
    cancel: CancellationToken,
    tasks: JoinSet<()>,
}

impl<M: MapSurface> LiveMap<M> {
    async fn teardown(mut self) {
        self.cancel.cancel();
        self.tasks.abort_all();
        self.map.lock().await.remove();
        while self.tasks.join_next().await.is_some() {}
    }
}

pub struct MapOrchestrator<F: MapFactory> {
    factory: F,
    sources: SourceClient,
    diagnostics: DiagnosticSink,
    editor: Option<EditorView>,
    current: Option<LiveMap<F::Map>>,
}

impl<F: MapFactory> MapOrchestrator<F> {
    pub fn new(factory: F, sources: SourceClient, diagnostics: DiagnosticSink) -> Self {
        Self {
            factory,
            sources,
            diagnostics,
            editor: None,
            current: None,
        }
    }

    /// Attach a live editor view; later renders write the configuration to it.
    pub fn enable_editor(&mut self) {
        self.editor.get_or_insert_with(EditorView::default);
    }

    pub fn editor(&self) -> Option<&EditorView> {
        self.editor.as_ref()
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn diagnostics(&self) -> &DiagnosticSink {
        &self.diagnostics
    }

    /// The map created by the latest render.
    pub fn current_map(&self) -> Option<Arc<Mutex<F::Map>>> {
        self.current.as_ref().map(|live| Arc::clone(&live.map))
    }

    /// Replace the current map with a fresh one showing `config`.
    ///
    /// Returns once every layer task is spawned; use [`Self::settle`] to wait
    /// for them.
    #[instrument(skip_all, fields(layers = config.layers.len()))]
    pub async fn render(&mut self, config: &Configuration) {
        if let Some(editor) = self.editor.as_mut() {
            editor.set_text(config.to_pretty_json());
        }

        if let Some(previous) = self.current.take() {
            previous.teardown().await;
            debug!("Previous map torn down");
        }

        let map = Arc::new(Mutex::new(self.factory.create()));
        let cancel = CancellationToken::new();
        let mut tasks = JoinSet::new();

        for (index, layer) in config.layers.iter().enumerate() {
            let ctx = LayerContext {
                index,
                map: Arc::clone(&map),
                sources: self.sources.clone(),
                diagnostics: self.diagnostics.clone(),
                cancel: cancel.clone(),
            };
            tasks.spawn(render_layer(ctx, layer.clone()));
        }

        info!("Map render started");
        self.current = Some(LiveMap { map, cancel, tasks });
    }

    /// Wait for every layer of the current render to finish.
    pub async fn settle(&mut self) {
        let Some(live) = self.current.as_mut() else {
            return;
        };
        while let Some(result) = live.tasks.join_next().await {
            if let Err(err) = result {
                if err.is_panic() {
                    warn!(error = %err, "Layer task panicked");
                }
            }
        }
    }

    /// Resolve the configuration from bootstrap parameters and render it.
    ///
    /// Failures are emitted as diagnostics and also returned.
    #[instrument(skip_all)]
    pub async fn load(&mut self, args: &QueryArgs) -> Result<(), Diagnostic> {
        if args.contains_key(DEVEL_PARAM) {
            self.enable_editor();
        }

        let provider = match Provider::from_args(args) {
            Ok(provider) => provider,
            Err(_) => {
                let mut keys: Vec<String> = args.keys().map(str::to_string).collect();
                keys.sort();
                return Err(self.report(Diagnostic::NoProvider { keys }));
            }
        };

        match provider.resolve(&self.sources).await {
            Ok(config) => {
                self.render(&config).await;
                Ok(())
            }
            Err(err @ (MapError::FetchFailed { .. } | MapError::Timeout)) => {
                Err(self.report(Diagnostic::FetchFailed {
                    layer: None,
                    message: err.to_string(),
                }))
            }
            Err(err) => Err(self.report(Diagnostic::ConfigError {
                message: err.to_string(),
            })),
        }
    }

    /// Live editor apply: parse `text` and re-render with it.
    ///
    /// A failure is also shown in the editor's message panel; a successful
    /// apply clears it.
    pub async fn apply_editor_text(&mut self, text: &str) -> Result<(), ApplyError> {
        let editor = self.editor.get_or_insert_with(EditorView::default);
        editor.set_text(text);

        let parsed = serde_json::from_str(text)
            .map_err(|e| ApplyError::Parse(e.to_string()))
            .and_then(|raw| Configuration::from_value(raw).map_err(ApplyError::Config));
        match parsed {
            Ok(config) => {
                editor.set_message(None);
                self.render(&config).await;
                Ok(())
            }
            Err(err) => {
                editor.set_message(Some(err.to_string()));
                Err(err)
            }
        }
    }

    fn report(&self, diagnostic: Diagnostic) -> Diagnostic {
        self.diagnostics.emit(diagnostic.clone());
        diagnostic
    }
}
