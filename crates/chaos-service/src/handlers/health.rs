//! Health check handlers.
//!
//! - `/health`: Liveness probe - returns OK if the process is running
//! - `/ready`: Readiness probe - checks the compute API answers

use crate::models::ReadinessResponse;
use crate::providers::observed;
use crate::routes::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;

/// Liveness probe handler.
///
/// Does NOT check any dependencies.
pub async fn health_check() -> &'static str {
    "OK"
}

/// Readiness probe handler.
///
/// Describes the configured scaling group. A missing group still counts as
/// ready: the API answered. Returns 200 if ready, 503 if not.
///
/// ## Security
///
/// The error message is generic; the provider error is logged server-side.
#[tracing::instrument(skip_all, name = "chaos.health.readiness")]
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let probe = observed(
        "autoscaling",
        "describe_auto_scaling_groups",
        state
            .providers
            .compute
            .describe_scaling_group(&state.config.target_asg_name),
    )
    .await;

    match probe {
        Ok(_) => (
            StatusCode::OK,
            Json(ReadinessResponse {
                status: "ready",
                compute_api: Some("available"),
                error: None,
            }),
        ),
        Err(e) => {
            tracing::warn!(
                target: "chaos.handlers.health",
                error = %e,
                "Readiness check failed: compute API error"
            );
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadinessResponse {
                    status: "not_ready",
                    compute_api: Some("unavailable"),
                    error: Some("Service dependencies unavailable".to_string()),
                }),
            )
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_check() {
        let result = health_check().await;
        assert_eq!(result, "OK");
    }

    #[test]
    fn test_readiness_response_serialization() {
        let ready = ReadinessResponse {
            status: "ready",
            compute_api: Some("available"),
            error: None,
        };

        let json = serde_json::to_string(&ready).unwrap();
        assert!(json.contains("\"status\":\"ready\""));
        assert!(json.contains("\"compute_api\":\"available\""));
        assert!(!json.contains("\"error\""));

        let not_ready = ReadinessResponse {
            status: "not_ready",
            compute_api: Some("unavailable"),
            error: Some("Service dependencies unavailable".to_string()),
        };

        let json = serde_json::to_string(&not_ready).unwrap();
        assert!(json.contains("\"status\":\"not_ready\""));
        assert!(json.contains("\"error\":\"Service dependencies unavailable\""));
    }
}
