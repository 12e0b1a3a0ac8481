//! System health snapshot handler.

use crate::models::SystemHealthResponse;
use crate::routes::AppState;
use axum::{extract::State, Json};
use std::sync::Arc;

/// Handler for GET /api/v1/system/health
///
/// Always 200; provider failures are reported as `critical`.
#[tracing::instrument(skip_all, name = "chaos.handlers.system_health")]
pub async fn system_health(State(state): State<Arc<AppState>>) -> Json<SystemHealthResponse> {
    Json(state.system_health.snapshot().await)
}
