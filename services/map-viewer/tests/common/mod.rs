//! Shared helpers for the map viewer integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use map_common::diagnostics::drain;
use map_common::{Configuration, Diagnostic, DiagnosticSink};
use map_viewer::MapOrchestrator;
use renderer::{Scene, SceneFactory};
use serde_json::Value;
use storage::{FetchCache, MemoryFetcher, SourceClient};
use tokio::sync::broadcast::Receiver;

pub struct Harness {
    pub viewer: MapOrchestrator<SceneFactory>,
    pub fetcher: Arc<MemoryFetcher>,
    diagnostics: Receiver<Diagnostic>,
}

impl Harness {
    pub fn new(fetcher: MemoryFetcher) -> Self {
        let fetcher = Arc::new(fetcher);
        let sources = SourceClient::new(fetcher.clone(), Arc::new(FetchCache::new()))
            .with_gist_api("https://gists.test");
        let sink = DiagnosticSink::default();
        let diagnostics = sink.subscribe();
        Self {
            viewer: MapOrchestrator::new(SceneFactory::new(), sources, sink),
            fetcher,
            diagnostics,
        }
    }

    /// Render `config` and wait for every layer.
    pub async fn render(&mut self, config: Value) -> Scene {
        let config = Configuration::from_value(config).unwrap();
        self.viewer.render(&config).await;
        self.viewer.settle().await;
        self.scene().await
    }

    pub async fn scene(&self) -> Scene {
        let map = self.viewer.current_map().expect("no map rendered");
        let scene = map.lock().await.scene().clone();
        scene
    }

    pub fn diagnostics(&mut self) -> Vec<Diagnostic> {
        drain(&mut self.diagnostics)
    }
}
