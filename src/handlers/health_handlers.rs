//! Liveness and readiness probes.
//!
//! `/healthz` never touches the disk. `/readyz` proves the storage directory
//! accepts writes, which is the only thing an upload depends on.

use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Serialize)]
pub struct Liveness {
    status: &'static str,
}

#[derive(Serialize)]
pub struct Readiness {
    status: &'static str,
    storage_writable: bool,
    checked_at: DateTime<Utc>,
}

/// `GET /healthz`
pub async fn healthz() -> Json<Liveness> {
    Json(Liveness { status: "ok" })
}

/// `GET /readyz` — 200 when the storage probe passes, 503 otherwise.
pub async fn readyz(State(state): State<AppState>) -> (StatusCode, Json<Readiness>) {
    let ready = match state.storage.probe_disk().await {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(
                "readiness probe failed in {}: {}",
                state.storage.base_path.display(),
                err
            );
            false
        }
    };

    let body = Readiness {
        status: if ready { "ok" } else { "error" },
        storage_writable: ready,
        checked_at: Utc::now(),
    };

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}
