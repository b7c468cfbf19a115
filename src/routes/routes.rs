//! Defines routes for the upload relay.
//!
//! ## Structure
//! - `GET  /`             — landing page with the upload form
//! - `POST /upload`       — store one multipart `file` part as `{id}.zip`
//!   (any other method answers 405)
//! - `GET  /file/{name}`  — download a stored archive
//! - `GET  /healthz`, `GET /readyz` — liveness and readiness probes

use crate::{
    handlers::{
        file_handlers::{download_file, method_not_allowed, upload_file},
        health_handlers::{healthz, readyz},
        index_handlers::index,
    },
    state::AppState,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

/// Build the application router with its state attached.
///
/// The body limit on `/upload` comes from `max_upload_size` and covers the
/// whole multipart body, boundaries included.
pub fn routes(state: AppState) -> Router {
    let max_upload_size = state.config.max_upload_size;

    Router::new()
        .route("/", get(index))
        .route(
            "/upload",
            post(upload_file)
                .fallback(method_not_allowed)
                .layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/file/{name}", get(download_file))
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
