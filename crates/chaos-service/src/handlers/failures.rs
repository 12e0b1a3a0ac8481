//! Failure injection handler.
//!
//! - `POST /api/v1/failures/inject` - terminate an opted-in instance
//!
//! # Security
//!
//! The chaos tag is checked against a fresh lookup inside the service; there
//! is no request field that skips it.

use super::json_body;
use crate::errors::ChaosError;
use crate::models::{InjectFailureRequest, InjectFailureResponse};
use crate::routes::AppState;
use axum::{body::Bytes, extract::State, Json};
use std::sync::Arc;
use tracing::instrument;

/// Handler for POST /api/v1/failures/inject
///
/// # Response
///
/// - 200 OK: `terminated`, `validated` (dry run) or `skipped`
/// - 400 Bad Request: `instanceId` missing or body malformed
/// - 404 Not Found: Instance not found
/// - 409 Conflict: Instance not tagged as a chaos target
/// - 500 Internal Server Error: Compute API failure
#[instrument(skip_all, name = "chaos.handlers.inject_failure")]
pub async fn inject_failure(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<InjectFailureResponse>, ChaosError> {
    let request: InjectFailureRequest = json_body(&body)?;
    let response = state.failure_injector.inject(&request).await?;
    Ok(Json(response))
}
