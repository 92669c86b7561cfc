//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// Credential lifetimes
/// Platform-documented session token lifetime (14 days).
pub const SESSION_TOKEN_TTL_SECS: i64 = 14 * 24 * 60 * 60;
/// Conservative access token lifetime, shorter than the platform's real
/// one to bound staleness exposure.
pub const ACCESS_TOKEN_TTL_SECS: i64 = 10 * 60;
/// Tokens are treated as expired this long before their actual expiry.
pub const TOKEN_SAFETY_MARGIN_MS: i64 = 60_000;

// Result polling
pub const DEFAULT_POLL_MAX_ATTEMPTS: u32 = 10;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

// HTTP
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const USER_AGENT: &str = concat!("seglens/", env!("CARGO_PKG_VERSION"));
