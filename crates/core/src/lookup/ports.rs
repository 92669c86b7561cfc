//! Port interfaces for the segment lookup pipeline
//!
//! These traits define the boundaries between core business logic
//! and infrastructure implementations.

use async_trait::async_trait;
use seglens_domain::Result;
use tokio_util::sync::CancellationToken;

/// Opaque identifier of one value within the filter dimension, meaningful
/// only to the reporting engine.
pub type ElementRef = String;

/// Opaque URI identifying an in-flight or completed report run.
pub type ExecutionHandle = String;

/// Access token handed to the orchestrator by the credential layer.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// The bearer secret passed to all reporting calls
    pub secret: String,
    /// Whether the token was served from cache rather than freshly minted.
    /// The retry policy only re-authenticates when a cached token failed.
    pub from_cache: bool,
}

/// Trait for issuing and invalidating access tokens
///
/// Implementations own the two-tier credential cache (long-lived session
/// token, short-lived access token) and must serialize refreshes.
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    /// Return a currently valid access token, refreshing credentials as
    /// needed
    async fn access_token(&self) -> Result<IssuedToken>;

    /// Drop all cached credentials so the next call re-authenticates from
    /// scratch
    async fn invalidate(&self);
}

/// Trait for the reporting engine operations used by a lookup
#[async_trait]
pub trait ReportingGateway: Send + Sync {
    /// Resolve an external task identifier to filter element references.
    ///
    /// Fails with `SegLensError::NotFound` when the identifier matches no
    /// element in the filter dimension.
    async fn resolve_elements(
        &self,
        access_token: &str,
        external_id: &str,
    ) -> Result<Vec<ElementRef>>;

    /// Launch a report execution restricted to the given elements and
    /// return its handle
    async fn start_execution(
        &self,
        access_token: &str,
        elements: &[ElementRef],
    ) -> Result<ExecutionHandle>;

    /// Poll the execution handle until the raw tabular payload is ready,
    /// the attempt ceiling is reached, or `cancel` fires
    async fn await_result(
        &self,
        access_token: &str,
        handle: &ExecutionHandle,
        cancel: &CancellationToken,
    ) -> Result<String>;
}
