//! Map rendering endpoints.

use std::sync::Arc;

use axum::{
    extract::{Extension, RawQuery},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use map_common::diagnostics::collect;
use map_common::{parse_query_string, Diagnostic, DiagnosticSink};
use renderer::{Scene, SceneFactory};
use serde::Serialize;
use serde_json::json;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::instrument;

use crate::orchestrator::MapOrchestrator;
use crate::state::AppState;

/// Body of a successful render.
#[derive(Debug, Serialize)]
pub struct MapResponse {
    pub scene: Scene,
    pub diagnostics: Vec<Diagnostic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editor: Option<String>,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "message": message.into() }))).into_response()
}

/// A fresh orchestrator whose diagnostics are all kept for the response.
fn orchestrator(
    state: &AppState,
) -> (MapOrchestrator<SceneFactory>, UnboundedReceiver<Diagnostic>) {
    let (sink, diagnostics) = DiagnosticSink::default().with_collector();
    let orchestrator = MapOrchestrator::new(SceneFactory::new(), state.sources.clone(), sink);
    (orchestrator, diagnostics)
}

/// Wait for the render to finish and collect the scene and diagnostics.
async fn finish(
    mut orchestrator: MapOrchestrator<SceneFactory>,
    mut diagnostics: UnboundedReceiver<Diagnostic>,
) -> MapResponse {
    orchestrator.settle().await;

    let scene = match orchestrator.current_map() {
        Some(map) => map.lock().await.scene().clone(),
        None => Scene::default(),
    };

    MapResponse {
        scene,
        diagnostics: collect(&mut diagnostics),
        editor: orchestrator.editor().map(|e| e.text().to_string()),
    }
}

/// GET /map?gist=<id> | /map?path=<url> [&devel]
#[instrument(skip(state))]
pub async fn map_handler(
    Extension(state): Extension<Arc<AppState>>,
    RawQuery(query): RawQuery,
) -> Response {
    let args = match parse_query_string(query.as_deref().unwrap_or("")) {
        Ok(args) => args,
        Err(err) => return error_response(StatusCode::BAD_REQUEST, err.to_string()),
    };

    let (mut orchestrator, diagnostics) = orchestrator(&state);
    // Failures are already on the diagnostics stream.
    let _ = orchestrator.load(&args).await;

    Json(finish(orchestrator, diagnostics).await).into_response()
}

/// POST /devel/apply with the edited configuration JSON as the body.
#[instrument(skip(state, body))]
pub async fn devel_apply_handler(
    Extension(state): Extension<Arc<AppState>>,
    body: String,
) -> Response {
    let (mut orchestrator, diagnostics) = orchestrator(&state);

    match orchestrator.apply_editor_text(&body).await {
        Ok(()) => Json(finish(orchestrator, diagnostics).await).into_response(),
        Err(err) => error_response(StatusCode::BAD_REQUEST, err.to_string()),
    }
}
