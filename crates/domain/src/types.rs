//! Common data types used throughout the application

use serde::{Deserialize, Serialize};

/// Successful lookup payload returned to the request shell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupResponse {
    pub segment_ids: Vec<String>,
}

/// Failure payload returned to the request shell.
///
/// Carries a human-readable message only; the HTTP-equivalent status comes
/// from [`crate::SegLensError::http_status`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl From<&crate::SegLensError> for ErrorBody {
    fn from(err: &crate::SegLensError) -> Self {
        Self { error: err.to_string() }
    }
}
