//! Segment lookup service - core business logic

use std::sync::Arc;

use seglens_domain::{Result, SegLensError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::ports::{AccessTokenSource, ReportingGateway};
use super::tabular::parse_segment_ids;

/// Orchestrates a single lookup: credentials, element resolution, report
/// execution, result polling and parsing.
///
/// On an authentication-class failure while a cached access token was in
/// use, the whole pipeline is retried exactly once with freshly minted
/// credentials. Every other failure, and a second failure after the
/// retry, propagates to the caller unmodified.
pub struct SegmentLookupService {
    tokens: Arc<dyn AccessTokenSource>,
    gateway: Arc<dyn ReportingGateway>,
}

impl SegmentLookupService {
    /// Create a new lookup service
    pub fn new(tokens: Arc<dyn AccessTokenSource>, gateway: Arc<dyn ReportingGateway>) -> Self {
        Self { tokens, gateway }
    }

    /// Look up the segment IDs associated with an external task identifier.
    ///
    /// `cancel` aborts result polling early when the upstream request is
    /// done waiting.
    pub async fn lookup(
        &self,
        external_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>> {
        let external_id = external_id.trim();
        if external_id.is_empty() {
            return Err(SegLensError::InvalidInput(
                "external task identifier is required".to_string(),
            ));
        }

        let issued = self.tokens.access_token().await?;

        match self.run_pipeline(&issued.secret, external_id, cancel).await {
            Err(err) if err.is_auth_failure() && issued.from_cache => {
                warn!(error = %err, "cached credentials rejected, re-authenticating once");
                self.tokens.invalidate().await;
                let fresh = self.tokens.access_token().await?;
                self.run_pipeline(&fresh.secret, external_id, cancel).await
            }
            outcome => outcome,
        }
    }

    async fn run_pipeline(
        &self,
        access_token: &str,
        external_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>> {
        let elements = self.gateway.resolve_elements(access_token, external_id).await?;
        debug!(external_id, elements = elements.len(), "resolved filter elements");

        let handle = self.gateway.start_execution(access_token, &elements).await?;
        debug!(%handle, "report execution started");

        let raw = self.gateway.await_result(access_token, &handle, cancel).await?;
        Ok(parse_segment_ids(&raw))
    }
}
