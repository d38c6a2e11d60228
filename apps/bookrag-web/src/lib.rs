//! bookrag-web
//!
//! Browser front end for the question-answering pipeline.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

pub mod error;
pub mod handlers;
pub mod state;

pub use state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/api/status", get(handlers::status))
        .route("/api/query", post(handlers::query))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
