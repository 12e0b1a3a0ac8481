//! Health validation handler.

use super::json_body;
use crate::errors::ChaosError;
use crate::models::{HealthValidationResponse, ValidateHealthRequest};
use crate::routes::AppState;
use axum::{body::Bytes, extract::State, Json};
use std::sync::Arc;
use tracing::instrument;

/// Handler for POST /api/v1/health/validate
///
/// An unhealthy verdict is still a 200; callers branch on `healthy`.
///
/// # Response
///
/// - 200 OK: Verdict computed
/// - 400 Bad Request: `targetGroupArn` missing, an ARN malformed, or body malformed
/// - 500 Internal Server Error: Target health query failed
#[instrument(skip_all, name = "chaos.handlers.validate_health")]
pub async fn validate_health(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<HealthValidationResponse>, ChaosError> {
    let request: ValidateHealthRequest = json_body(&body)?;
    let response = state.health_validator.validate(&request).await?;
    Ok(Json(response))
}
