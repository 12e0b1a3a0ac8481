//! Chaos Service error types.
//!
//! Four error kinds, uniform across every handler:
//!
//! - Validation: caller input missing or malformed (400)
//! - Domain: a deliberate refusal such as "no eligible targets" (404/409)
//! - Provider: an external cloud API failed; code and message pass through (500)
//! - Internal: anything else (500, generic message; detail is logged)

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use common::error::ProviderError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Codes for deliberate, non-failure refusals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DomainErrorCode {
    /// Filtering left no instance eligible for selection.
    NoEligibleTargets,
    /// The instance does not carry the true-valued chaos target tag.
    NotChaosTarget,
    /// The instance does not exist or is not visible.
    InstanceNotFound,
    /// The scaling group does not exist.
    ScalingGroupNotFound,
}

impl DomainErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DomainErrorCode::NoEligibleTargets => "NoEligibleTargets",
            DomainErrorCode::NotChaosTarget => "NotChaosTarget",
            DomainErrorCode::InstanceNotFound => "InstanceNotFound",
            DomainErrorCode::ScalingGroupNotFound => "ScalingGroupNotFound",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            DomainErrorCode::InstanceNotFound | DomainErrorCode::ScalingGroupNotFound => {
                StatusCode::NOT_FOUND
            }
            DomainErrorCode::NoEligibleTargets | DomainErrorCode::NotChaosTarget => {
                StatusCode::CONFLICT
            }
        }
    }
}

impl fmt::Display for DomainErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chaos Service error type.
///
/// Maps to HTTP status codes:
/// - Validation: 400 Bad Request
/// - Domain: 404 Not Found (missing resources) or 409 Conflict (refusals)
/// - Provider, Internal: 500 Internal Server Error
#[derive(Debug, Error)]
pub enum ChaosError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{code}: {message}")]
    Domain {
        code: DomainErrorCode,
        message: String,
    },

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ChaosError {
    /// Build a domain error.
    pub fn domain(code: DomainErrorCode, message: impl Into<String>) -> Self {
        ChaosError::Domain {
            code,
            message: message.into(),
        }
    }

    /// Returns the HTTP status code for this error (for metrics recording).
    pub fn status_code(&self) -> u16 {
        self.status().as_u16()
    }

    /// Domain code if this is a domain refusal.
    pub fn domain_code(&self) -> Option<DomainErrorCode> {
        match self {
            ChaosError::Domain { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Bounded label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ChaosError::Validation(_) => "validation",
            ChaosError::Domain { .. } => "domain",
            ChaosError::Provider(_) => "provider",
            ChaosError::Internal(_) => "internal",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ChaosError::Validation(_) => StatusCode::BAD_REQUEST,
            ChaosError::Domain { code, .. } => code.status(),
            ChaosError::Provider(_) | ChaosError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<DomainErrorCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_code: Option<String>,
    message: String,
    timestamp: DateTime<Utc>,
}

impl IntoResponse for ChaosError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ChaosError::Validation(message) => ErrorResponse {
                error: "ValidationError",
                code: None,
                error_code: None,
                message,
                timestamp: Utc::now(),
            },
            ChaosError::Domain { code, message } => ErrorResponse {
                error: "DomainError",
                code: Some(code),
                error_code: None,
                message,
                timestamp: Utc::now(),
            },
            ChaosError::Provider(err) => {
                tracing::error!(target: "chaos.provider", code = %err.code, error = %err.message, "Provider API call failed");
                ErrorResponse {
                    error: "AWSError",
                    code: None,
                    error_code: Some(err.code),
                    message: format!("AWS API error: {}", err.message),
                    timestamp: Utc::now(),
                }
            }
            ChaosError::Internal(detail) => {
                // Log actual error server-side, return generic message to client
                tracing::error!(target: "chaos.internal", error = %detail, "Internal error");
                ErrorResponse {
                    error: "InternalError",
                    code: None,
                    error_code: None,
                    message: "An internal error occurred".to_string(),
                    timestamp: Utc::now(),
                }
            }
        };

        (status, Json(body)).into_response()
    }
}
