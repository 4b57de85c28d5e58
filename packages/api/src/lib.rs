//! HTTP surface and AWS collaborators for Fairlist.

pub mod bedrock;
pub mod config;
pub mod error;
pub mod handlers;
pub mod speech;
pub mod state;
pub mod storage;

use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::AppConfig;
pub use error::ApiError;
pub use state::AppState;

/// Any origin when `origins` is empty, otherwise exactly those origins.
pub fn cors_layer(origins: &[HeaderValue]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }
    CorsLayer::permissive().allow_origin(AllowOrigin::list(origins.iter().cloned()))
}

pub fn router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/", get(handlers::health))
        .route("/api/audit", post(handlers::audit))
        .route("/api/generate", post(handlers::generate))
        .route("/api/audio", post(handlers::audio))
        .route("/api/upload-url", post(handlers::upload_url))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
