//! Wire types for the reporting API
//!
//! Request and response shapes for the login, token-exchange, element
//! lookup and raw report execution endpoints. Token fields are optional on
//! the way in so a missing field surfaces as an authentication error
//! rather than a deserialization failure.

use serde::{Deserialize, Serialize};

// =============================================================================
// Authentication
// =============================================================================

/// Body of `POST /gdc/account/login`
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    #[serde(rename = "postUserLogin")]
    pub post_user_login: PostUserLogin<'a>,
}

#[derive(Debug, Serialize)]
pub struct PostUserLogin<'a> {
    pub login: &'a str,
    pub password: &'a str,
    pub remember: u8,
    pub verify_level: u8,
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    #[serde(rename = "userLogin", default)]
    pub user_login: Option<UserLogin>,
}

#[derive(Debug, Deserialize)]
pub struct UserLogin {
    #[serde(default)]
    pub token: Option<String>,
}

impl LoginResponse {
    /// Session token, if the response carried one.
    pub fn into_token(self) -> Option<String> {
        self.user_login.and_then(|login| login.token)
    }
}

/// Response of `GET /gdc/account/token`
#[derive(Debug, Deserialize)]
pub struct TokenExchangeResponse {
    #[serde(rename = "userToken", default)]
    pub user_token: Option<UserToken>,
}

#[derive(Debug, Deserialize)]
pub struct UserToken {
    #[serde(default)]
    pub token: Option<String>,
}

impl TokenExchangeResponse {
    /// Access token, if the response carried one.
    pub fn into_token(self) -> Option<String> {
        self.user_token.and_then(|token| token.token)
    }
}

// =============================================================================
// Element lookup
// =============================================================================

/// Response of `GET /gdc/md/{workspace}/obj/{display_form}/elements`
#[derive(Debug, Deserialize)]
pub struct ElementsResponse {
    #[serde(rename = "attributeElements", default)]
    pub attribute_elements: Option<AttributeElements>,
}

#[derive(Debug, Deserialize)]
pub struct AttributeElements {
    #[serde(default)]
    pub elements: Vec<AttributeElement>,
}

/// One value of the filter dimension
#[derive(Debug, Clone, Deserialize)]
pub struct AttributeElement {
    pub uri: String,
    #[serde(default)]
    pub title: Option<String>,
}

impl ElementsResponse {
    /// Element references carried by the response (possibly empty).
    pub fn into_uris(self) -> Vec<String> {
        self.attribute_elements
            .map(|wrapper| wrapper.elements)
            .unwrap_or_default()
            .into_iter()
            .map(|element| element.uri)
            .collect()
    }
}

// =============================================================================
// Raw report execution
// =============================================================================

/// Body of `POST /gdc/app/projects/{workspace}/execute/raw`
#[derive(Debug, Serialize)]
pub struct RawExecutionRequest {
    pub report_req: ReportRequest,
}

#[derive(Debug, Serialize)]
pub struct ReportRequest {
    /// Metadata URI of the fixed report definition
    pub report: String,
    pub context: ExecutionContext,
}

#[derive(Debug, Serialize)]
pub struct ExecutionContext {
    pub filters: Vec<ElementFilter>,
}

/// Positive filter restricting one attribute to an explicit element list
#[derive(Debug, Serialize)]
pub struct ElementFilter {
    /// Metadata URI of the filtered display form
    pub uri: String,
    pub constraint: FilterConstraint,
}

#[derive(Debug, Serialize)]
pub struct FilterConstraint {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub elements: Vec<String>,
}

impl ElementFilter {
    /// Restrict `display_form_uri` to exactly `elements`.
    pub fn list(display_form_uri: String, elements: Vec<String>) -> Self {
        Self { uri: display_form_uri, constraint: FilterConstraint { kind: "list", elements } }
    }
}

/// Response of the raw execution launch
#[derive(Debug, Deserialize)]
pub struct RawExecutionResponse {
    #[serde(default)]
    pub uri: Option<String>,
}
