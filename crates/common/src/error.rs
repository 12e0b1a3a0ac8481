//! Provider error type shared by every cloud API adapter.

use thiserror::Error;

/// Code used when a provider failure carries no service error code
/// (transport failures, timeouts, unparseable responses).
pub const UNKNOWN_ERROR_CODE: &str = "Unknown";

/// A failure reported by an external compute, load-balancing or metrics API.
///
/// The provider-supplied code and message are carried verbatim so callers can
/// surface them unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct ProviderError {
    /// Provider error code (e.g. `UnauthorizedOperation`, `Throttling`).
    pub code: String,
    /// Provider error message.
    pub message: String,
}

impl ProviderError {
    /// Create a provider error from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create a provider error without a service error code.
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(UNKNOWN_ERROR_CODE, message)
    }
}

/// Result type alias using `ProviderError`
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_code_and_message() {
        let err = ProviderError::new("UnauthorizedOperation", "You are not authorized");
        assert_eq!(err.to_string(), "UnauthorizedOperation: You are not authorized");
    }

    #[test]
    fn test_unknown_code() {
        let err = ProviderError::unknown("connection reset");
        assert_eq!(err.code, UNKNOWN_ERROR_CODE);
        assert_eq!(err.message, "connection reset");
    }
}
