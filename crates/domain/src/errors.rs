//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for SegLens
///
/// Each variant corresponds to one failure class of the lookup pipeline.
/// Errors bubble unmodified to the orchestrator boundary; only the
/// orchestrator applies retry logic (and only for authentication-class
/// failures).
#[derive(Error, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum SegLensError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SegLensError {
    /// HTTP-equivalent status code for the request shell.
    ///
    /// Not-found and timeout outcomes are surfaced distinctly (404/504)
    /// instead of collapsing everything into 500.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidInput(_) => 400,
            Self::NotFound(_) => 404,
            Self::Timeout(_) => 504,
            Self::Config(_)
            | Self::Auth(_)
            | Self::Execution(_)
            | Self::Network(_)
            | Self::Internal(_) => 500,
        }
    }

    /// Whether this failure is authentication-class.
    ///
    /// True for `Auth` itself, and for `Network` failures whose message
    /// carries a 401/403 status or authorization wording (remote backends
    /// report stale credentials both ways).
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        match self {
            Self::Auth(_) => true,
            Self::Network(msg) => {
                let msg = msg.to_lowercase();
                msg.contains("401")
                    || msg.contains("403")
                    || msg.contains("unauthorized")
                    || msg.contains("forbidden")
            }
            _ => false,
        }
    }
}

/// Result type alias for SegLens operations
pub type Result<T> = std::result::Result<T, SegLensError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_variants_to_http_statuses() {
        assert_eq!(SegLensError::InvalidInput("missing id".into()).http_status(), 400);
        assert_eq!(SegLensError::NotFound("no elements".into()).http_status(), 404);
        assert_eq!(SegLensError::Timeout("poll ceiling".into()).http_status(), 504);
        assert_eq!(SegLensError::Config("missing var".into()).http_status(), 500);
        assert_eq!(SegLensError::Network("boom".into()).http_status(), 500);
    }

    #[test]
    fn auth_variant_is_auth_failure() {
        assert!(SegLensError::Auth("token exchange failed".into()).is_auth_failure());
    }

    #[test]
    fn network_with_auth_status_is_auth_failure() {
        assert!(SegLensError::Network("remote call failed (HTTP 401)".into()).is_auth_failure());
        assert!(SegLensError::Network("HTTP 403 Forbidden".into()).is_auth_failure());
        assert!(SegLensError::Network("Unauthorized request".into()).is_auth_failure());
    }

    #[test]
    fn other_failures_are_not_auth_class() {
        assert!(!SegLensError::Network("HTTP 500 internal".into()).is_auth_failure());
        assert!(!SegLensError::NotFound("no match".into()).is_auth_failure());
        assert!(!SegLensError::Timeout("ceiling".into()).is_auth_failure());
    }

    #[test]
    fn serializes_with_type_and_message_tags() {
        let err = SegLensError::NotFound("task 42".into());
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["type"], "NotFound");
        assert_eq!(json["message"], "task 42");
    }
}
