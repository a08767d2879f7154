//! Redraft HTTP server
//!
//! `POST /api/analysis`, `POST /api/rewrite` and `POST /api/analyze-changes`
//! answer with `text/event-stream` bodies of `data: <frame json>` events,
//! terminated by `data: [DONE]`.

pub mod logging;
pub mod routes;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

pub use state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/api/analysis", post(routes::analysis))
        .route("/api/rewrite", post(routes::rewrite))
        .route("/api/analyze-changes", post(routes::analyze_changes))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
