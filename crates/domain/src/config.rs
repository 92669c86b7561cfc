//! Configuration structures
//!
//! Deployment parameters for the reporting backend plus lookup tuning
//! knobs. Loaded by `seglens-infra::config::loader` from environment
//! variables or a config file.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_POLL_MAX_ATTEMPTS, TOKEN_SAFETY_MARGIN_MS,
};

/// Top-level application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub gooddata: GoodDataConfig,
    #[serde(default)]
    pub lookup: LookupConfig,
}

/// Deployment parameters for the GoodData-style reporting backend.
///
/// All of these are fixed per deployment, never user-supplied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoodDataConfig {
    /// Base URL of the reporting API (e.g. "https://secure.gooddata.com")
    pub base_url: String,
    /// Login for credential-based authentication
    pub username: String,
    /// Password for credential-based authentication
    pub password: String,
    /// Workspace (project) identifier
    pub workspace_id: String,
    /// Object identifier of the fixed report definition
    pub report_id: String,
    /// Object identifier of the "external ID" attribute display form used
    /// as the filter dimension
    pub external_id_display_form: String,
}

/// Tuning knobs for the lookup pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupConfig {
    /// Maximum number of result-poll attempts before giving up
    pub poll_max_attempts: u32,
    /// Fixed delay between poll attempts in milliseconds
    pub poll_interval_ms: u64,
    /// Tokens are refreshed this many milliseconds before actual expiry
    pub token_safety_margin_ms: i64,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            poll_max_attempts: DEFAULT_POLL_MAX_ATTEMPTS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            token_safety_margin_ms: TOKEN_SAFETY_MARGIN_MS,
        }
    }
}
