use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;

pub mod error;
pub mod handlers;

/// Largest accepted request body (CSV uploads included).
pub const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

/// API routes; static assets are attached by the binary.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok\n" }))
        .route("/api/upload", post(handlers::upload))
        .route("/api/files", get(handlers::list_files))
        .route("/api/notion-register", post(handlers::notion_register))
        .route("/api/test-notion", post(handlers::test_notion))
        .route("/api/download", post(handlers::download))
        .route("/api/download-zip", post(handlers::download_zip))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
