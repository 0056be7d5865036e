//! Thematic map viewer service library.
//!
//! Exposes the layer renderer registry, the map orchestrator and the HTTP
//! router so they can be exercised by tests.

pub mod handlers;
pub mod orchestrator;
pub mod rendering;
pub mod state;

use std::sync::Arc;

use axum::{
    extract::Extension,
    routing::{get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

pub use orchestrator::{ApplyError, EditorView, MapOrchestrator};
pub use state::AppState;

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/map", get(handlers::map_handler))
        .route("/devel/apply", post(handlers::devel_apply_handler))
        .route("/health", get(handlers::health_handler))
        .route("/metrics", get(handlers::metrics_handler))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}
