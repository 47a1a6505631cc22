//! Response types and fixed wire strings used by the gateway.

use serde::{Deserialize, Serialize};

/// Body returned for every failed unseal request, whatever the cause.
///
/// Callers must not be able to tell a wrong key from a missing file, so the
/// gateway never varies this message.
pub const FAILURE_MESSAGE: &str = "Sorry, unable to decrypt the file.";

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// JSON error body for requests that never reach the unseal route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short machine-readable error code (e.g. `"not_found"`).
    pub code: String,
    /// Human-readable description safe to expose to callers.
    pub message: String,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Response body for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall service status: `"ok"` or `"degraded"`.
    pub status: String,
    /// Whether the configured base directory currently exists.
    pub base_dir_available: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_response_new() {
        let e = ErrorResponse::new("not_found", "no such route");
        assert_eq!(e.code, "not_found");
        assert!(e.message.contains("no such route"));
    }

    #[test]
    fn health_response_field_names() {
        let h = HealthResponse {
            status: "ok".into(),
            base_dir_available: true,
        };
        let json = serde_json::to_value(&h).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["base_dir_available"], true);
    }

    #[test]
    fn failure_message_is_generic() {
        let lower = FAILURE_MESSAGE.to_lowercase();
        assert!(!lower.contains("key"));
        assert!(!lower.contains("not found"));
    }
}
