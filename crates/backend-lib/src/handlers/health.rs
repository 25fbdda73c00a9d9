// ============================
// inventory-backend-lib/src/handlers/health.rs
// ============================
//! Health-check handler. No auth, slow-path ping only.
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use inventory_common::{HealthResponse, HealthStatus};

use crate::AppState;

/// `GET /health` — reports the connection state. Degraded still serves
/// requests and still reports 200; only an unreachable store is a 503.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let status = state.connection.health().await;
    let code = match status {
        HealthStatus::Ok | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Error => StatusCode::SERVICE_UNAVAILABLE,
    };
    (code, Json(HealthResponse { status }))
}
