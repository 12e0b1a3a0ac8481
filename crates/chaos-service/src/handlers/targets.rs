//! Target selection handler.
//!
//! - `POST /api/v1/targets/select` - pick a random eligible instance

use super::json_body;
use crate::errors::ChaosError;
use crate::models::{SelectTargetRequest, SelectTargetResponse};
use crate::routes::AppState;
use axum::{body::Bytes, extract::State, Json};
use std::sync::Arc;
use tracing::instrument;

/// Handler for POST /api/v1/targets/select
///
/// # Response
///
/// - 200 OK: Instance selected
/// - 400 Bad Request: `autoScalingGroupName` missing or body malformed
/// - 404 Not Found: Scaling group does not exist
/// - 409 Conflict: No eligible instances
/// - 500 Internal Server Error: Compute API failure
#[instrument(skip_all, name = "chaos.handlers.select_target")]
pub async fn select_target(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<SelectTargetResponse>, ChaosError> {
    let request: SelectTargetRequest = json_body(&body)?;
    let response = state.target_selector.select(&request).await?;
    Ok(Json(response))
}
