//! HTTP routes
//!
//! The WebSocket endpoint plus a couple of plain JSON endpoints for
//! monitoring. Everything else falls through to the static directory.

use axum::{extract::State, routing::get, Json, Router};
use std::path::Path;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::hub::AppState;
use crate::state::SessionSnapshot;
use crate::ws;

/// GET /health
pub async fn health() -> &'static str {
    "ok"
}

/// Public session snapshot: phase, round number, players and host.
///
/// GET /api/state
pub async fn session_state(State(state): State<Arc<AppState>>) -> Json<SessionSnapshot> {
    Json(state.snapshot().await)
}

pub fn router(state: Arc<AppState>, static_dir: &Path) -> Router {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/health", get(health))
        .route("/api/state", get(session_state))
        .fallback_service(ServeDir::new(static_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
