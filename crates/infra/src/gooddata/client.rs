//! Reporting API client for filtered raw report execution

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use seglens_core::{ElementRef, ExecutionHandle, ReportingGateway};
use seglens_domain::{GoodDataConfig, LookupConfig, Result, SegLensError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use super::types::{
    ElementFilter, ElementsResponse, ExecutionContext, RawExecutionRequest, RawExecutionResponse,
    ReportRequest,
};
use crate::http::HttpClient;

const ACCESS_TOKEN_HEADER: &str = "X-GDC-AuthTT";

/// Client for the element lookup, report execution and result polling
/// endpoints.
///
/// Workspace, report and filter dimension are fixed per deployment; only
/// the external identifier and the filter elements vary per lookup.
pub struct GoodDataClient {
    http: HttpClient,
    base: Url,
    workspace_id: String,
    report_id: String,
    display_form: String,
    poll_max_attempts: u32,
    poll_interval: Duration,
}

impl GoodDataClient {
    /// Create a client for one deployment.
    pub fn new(http: HttpClient, gooddata: &GoodDataConfig, lookup: &LookupConfig) -> Result<Self> {
        let base = Url::parse(&gooddata.base_url).map_err(|err| {
            SegLensError::Config(format!(
                "invalid reporting base url '{}': {err}",
                gooddata.base_url
            ))
        })?;

        Ok(Self {
            http,
            base,
            workspace_id: gooddata.workspace_id.clone(),
            report_id: gooddata.report_id.clone(),
            display_form: gooddata.external_id_display_form.clone(),
            poll_max_attempts: lookup.poll_max_attempts,
            poll_interval: Duration::from_millis(lookup.poll_interval_ms),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|err| SegLensError::Internal(format!("invalid endpoint path '{path}': {err}")))
    }

    fn object_uri(&self, object_id: &str) -> String {
        format!("/gdc/md/{}/obj/{}", self.workspace_id, object_id)
    }

    fn error_for_status(status: StatusCode, call: &str) -> SegLensError {
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            SegLensError::Auth(format!("{call} rejected (HTTP {status})"))
        } else {
            SegLensError::Network(format!("{call} failed (HTTP {status})"))
        }
    }
}

#[async_trait]
impl ReportingGateway for GoodDataClient {
    async fn resolve_elements(
        &self,
        access_token: &str,
        external_id: &str,
    ) -> Result<Vec<ElementRef>> {
        let url = self.endpoint(&format!(
            "/gdc/md/{}/obj/{}/elements",
            self.workspace_id, self.display_form
        ))?;

        let builder = self
            .http
            .request(Method::GET, url)
            .header(ACCESS_TOKEN_HEADER, access_token)
            .query(&[("filter", external_id)]);
        let response = self.http.send(builder).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::error_for_status(status, "element lookup"));
        }

        let parsed: ElementsResponse = response.json().await.map_err(|err| {
            SegLensError::Internal(format!("failed to parse element lookup response: {err}"))
        })?;

        let elements = parsed.into_uris();
        if elements.is_empty() {
            return Err(SegLensError::NotFound(format!(
                "no elements match external id '{external_id}'"
            )));
        }

        debug!(external_id, count = elements.len(), "matched filter elements");
        Ok(elements)
    }

    async fn start_execution(
        &self,
        access_token: &str,
        elements: &[ElementRef],
    ) -> Result<ExecutionHandle> {
        let url =
            self.endpoint(&format!("/gdc/app/projects/{}/execute/raw", self.workspace_id))?;

        let body = RawExecutionRequest {
            report_req: ReportRequest {
                report: self.object_uri(&self.report_id),
                context: ExecutionContext {
                    filters: vec![ElementFilter::list(
                        self.object_uri(&self.display_form),
                        elements.to_vec(),
                    )],
                },
            },
        };

        let builder = self
            .http
            .request(Method::POST, url)
            .header(ACCESS_TOKEN_HEADER, access_token)
            .json(&body);
        let response = self.http.send(builder).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::error_for_status(status, "report execution"));
        }

        let parsed: RawExecutionResponse = response.json().await.map_err(|err| {
            SegLensError::Internal(format!("failed to parse execution response: {err}"))
        })?;

        parsed.uri.ok_or_else(|| {
            SegLensError::Execution("execution response missing uri field".to_string())
        })
    }

    async fn await_result(
        &self,
        access_token: &str,
        handle: &ExecutionHandle,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let url = self.endpoint(handle)?;

        for attempt in 1..=self.poll_max_attempts {
            let builder =
                self.http.request(Method::GET, url.clone()).header(ACCESS_TOKEN_HEADER, access_token);
            let response = self.http.send(builder).await?;
            let status = response.status();

            // 202 means the computation is still running; anything else is
            // terminal.
            if status == StatusCode::ACCEPTED {
                debug!(attempt, max_attempts = self.poll_max_attempts, "report not ready yet");

                if attempt < self.poll_max_attempts {
                    tokio::select! {
                        () = cancel.cancelled() => {
                            warn!(attempt, "result polling cancelled by caller");
                            return Err(SegLensError::Timeout(
                                "result polling cancelled before the report was ready".to_string(),
                            ));
                        }
                        () = tokio::time::sleep(self.poll_interval) => {}
                    }
                }
                continue;
            }

            if !status.is_success() {
                return Err(Self::error_for_status(status, "report result fetch"));
            }

            return response.text().await.map_err(|err| {
                SegLensError::Network(format!("failed to read report payload: {err}"))
            });
        }

        Err(SegLensError::Timeout(format!(
            "report not ready after {} attempts",
            self.poll_max_attempts
        )))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn test_client(base_url: String) -> GoodDataClient {
        test_client_with_polling(base_url, 3, 10)
    }

    fn test_client_with_polling(
        base_url: String,
        poll_max_attempts: u32,
        poll_interval_ms: u64,
    ) -> GoodDataClient {
        let gooddata = GoodDataConfig {
            base_url,
            username: "svc@example.com".to_string(),
            password: "secret".to_string(),
            workspace_id: "ws1".to_string(),
            report_id: "123".to_string(),
            external_id_display_form: "456".to_string(),
        };
        let lookup = LookupConfig {
            poll_max_attempts,
            poll_interval_ms,
            token_safety_margin_ms: 60_000,
        };

        let http = HttpClient::new().expect("http client");
        GoodDataClient::new(http, &gooddata, &lookup).expect("client")
    }

    #[tokio::test]
    async fn resolves_matching_elements() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gdc/md/ws1/obj/456/elements"))
            .and(query_param("filter", "TASK-7"))
            .and(header(ACCESS_TOKEN_HEADER, "tt-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "attributeElements": { "elements": [
                    { "uri": "/gdc/md/ws1/obj/456/elements?id=1", "title": "TASK-7" }
                ]}
            })))
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let elements = client.resolve_elements("tt-1", "TASK-7").await.expect("elements");

        assert_eq!(elements, vec!["/gdc/md/ws1/obj/456/elements?id=1"]);
    }

    #[tokio::test]
    async fn zero_matches_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gdc/md/ws1/obj/456/elements"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "attributeElements": { "elements": [] }
            })))
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let err = client.resolve_elements("tt-1", "TASK-404").await.unwrap_err();

        assert!(matches!(err, SegLensError::NotFound(_)));
        assert!(err.to_string().contains("TASK-404"));
    }

    #[tokio::test]
    async fn rejected_element_lookup_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gdc/md/ws1/obj/456/elements"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let err = client.resolve_elements("tt-stale", "TASK-7").await.unwrap_err();

        assert!(matches!(err, SegLensError::Auth(_)));
    }

    #[tokio::test]
    async fn execution_launch_sends_element_filter_and_returns_handle() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/gdc/app/projects/ws1/execute/raw"))
            .and(header(ACCESS_TOKEN_HEADER, "tt-1"))
            .and(body_partial_json(serde_json::json!({
                "report_req": {
                    "report": "/gdc/md/ws1/obj/123",
                    "context": { "filters": [{
                        "uri": "/gdc/md/ws1/obj/456",
                        "constraint": {
                            "type": "list",
                            "elements": ["/gdc/md/ws1/obj/456/elements?id=1"]
                        }
                    }]}
                }
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "uri": "/gdc/app/projects/ws1/execute/raw/run-1"
            })))
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let handle = client
            .start_execution("tt-1", &["/gdc/md/ws1/obj/456/elements?id=1".to_string()])
            .await
            .expect("handle");

        assert_eq!(handle, "/gdc/app/projects/ws1/execute/raw/run-1");
    }

    #[tokio::test]
    async fn execution_response_without_uri_is_execution_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/gdc/app/projects/ws1/execute/raw"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let err = client.start_execution("tt-1", &["e1".to_string()]).await.unwrap_err();

        assert!(matches!(err, SegLensError::Execution(_)));
    }

    #[tokio::test]
    async fn polling_returns_payload_once_ready() {
        let server = MockServer::start().await;
        let attempts = Arc::new(AtomicUsize::new(0));
        let attempts_clone = attempts.clone();
        Mock::given(method("GET"))
            .and(path("/gdc/app/projects/ws1/execute/raw/run-1"))
            .respond_with(move |_req: &wiremock::Request| {
                let current = attempts_clone.fetch_add(1, Ordering::SeqCst);
                if current < 2 {
                    ResponseTemplate::new(202)
                } else {
                    ResponseTemplate::new(200).set_body_string("segment_id\n111\n")
                }
            })
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let payload = client
            .await_result(
                "tt-1",
                &"/gdc/app/projects/ws1/execute/raw/run-1".to_string(),
                &CancellationToken::new(),
            )
            .await
            .expect("payload");

        assert_eq!(payload, "segment_id\n111\n");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn polling_ceiling_yields_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gdc/app/projects/ws1/execute/raw/run-1"))
            .respond_with(ResponseTemplate::new(202))
            .expect(3)
            .mount(&server)
            .await;

        let client = test_client_with_polling(server.uri(), 3, 10);
        let err = client
            .await_result(
                "tt-1",
                &"/gdc/app/projects/ws1/execute/raw/run-1".to_string(),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, SegLensError::Timeout(_)));
        assert!(err.to_string().contains("3 attempts"));
    }

    #[tokio::test]
    async fn poll_error_status_propagates_immediately() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gdc/app/projects/ws1/execute/raw/run-1"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let err = client
            .await_result(
                "tt-1",
                &"/gdc/app/projects/ws1/execute/raw/run-1".to_string(),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, SegLensError::Network(_)));
    }

    #[tokio::test]
    async fn rejected_poll_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gdc/app/projects/ws1/execute/raw/run-1"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let err = client
            .await_result(
                "tt-1",
                &"/gdc/app/projects/ws1/execute/raw/run-1".to_string(),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, SegLensError::Auth(_)));
    }

    #[tokio::test]
    async fn cancellation_aborts_polling_between_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gdc/app/projects/ws1/execute/raw/run-1"))
            .respond_with(ResponseTemplate::new(202))
            .mount(&server)
            .await;

        // Long interval: without cancellation this test would sit in the
        // sleep for minutes.
        let client = test_client_with_polling(server.uri(), 10, 60_000);
        let cancel = CancellationToken::new();
        let cancel_clone = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            cancel_clone.cancel();
        });

        let err = client
            .await_result(
                "tt-1",
                &"/gdc/app/projects/ws1/execute/raw/run-1".to_string(),
                &cancel,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, SegLensError::Timeout(_)));
        assert!(err.to_string().contains("cancelled"));
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
    }
}
