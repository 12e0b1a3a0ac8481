//! HTTP request handlers for the Chaos Service.

pub mod failures;
pub mod health;
pub mod metrics;
pub mod system;
pub mod targets;
pub mod validation;

pub use failures::inject_failure;
pub use health::{health_check, readiness_check};
pub use metrics::metrics_handler;
pub use system::system_health;
pub use targets::select_target;
pub use validation::validate_health;

use crate::errors::ChaosError;
use axum::body::Bytes;
use serde::de::DeserializeOwned;

/// Decode a JSON request body.
///
/// An empty body decodes as the request's default so the missing-parameter
/// checks report it. Malformed JSON is a validation error (400), not axum's
/// 422.
pub(crate) fn json_body<T>(body: &Bytes) -> Result<T, ChaosError>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }

    serde_json::from_slice(body)
        .map_err(|e| ChaosError::Validation(format!("Invalid JSON body: {e}")))
}
