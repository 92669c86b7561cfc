//! Credential management for the reporting API
//!
//! Two-tier token cache: a long-lived session token obtained from a
//! credential login, and a short-lived access token exchanged from it.
//! The expensive login only recurs on the session lifetime (~14 days);
//! the cheap exchange recurs on the access lifetime (~10 minutes).
//!
//! The cache lives behind a `tokio::sync::Mutex` held for the whole of
//! `access_token`, so concurrent lookups that find an expired token wait
//! for a single refresh instead of racing their own.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::{Method, StatusCode};
use seglens_core::{AccessTokenSource, IssuedToken};
use seglens_domain::constants::{ACCESS_TOKEN_TTL_SECS, SESSION_TOKEN_TTL_SECS};
use seglens_domain::{GoodDataConfig, Result, SegLensError};
use tokio::sync::Mutex;
use tracing::{debug, info};
use url::Url;

use super::types::{LoginRequest, LoginResponse, PostUserLogin, TokenExchangeResponse};
use crate::http::HttpClient;

const SESSION_TOKEN_HEADER: &str = "X-GDC-AuthSST";

/// Session-scoped credential state for the reporting API.
///
/// One instance is shared across all lookups of a process; it is never
/// persisted.
pub struct GoodDataAuthenticator {
    http: HttpClient,
    base: Url,
    username: String,
    password: String,
    safety_margin_ms: i64,
    cache: Mutex<CredentialCache>,
}

/// The two token slots with their independent expirations.
///
/// A slot is only ever replaced wholesale (token and expiry together);
/// `clear` drops all four fields unconditionally.
#[derive(Debug, Default)]
struct CredentialCache {
    session_token: Option<String>,
    session_expires_at: Option<DateTime<Utc>>,
    access_token: Option<String>,
    access_expires_at: Option<DateTime<Utc>>,
}

impl CredentialCache {
    fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Whether a token with the given expiry is still usable at `now`.
///
/// False for an absent expiry, and false from `expiry - margin` onwards:
/// a token about to lapse mid-pipeline is treated as already expired.
fn is_valid(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>, safety_margin_ms: i64) -> bool {
    match expires_at {
        Some(expiry) => now < expiry - Duration::milliseconds(safety_margin_ms),
        None => false,
    }
}

impl GoodDataAuthenticator {
    /// Create an authenticator for one deployment's credentials.
    pub fn new(http: HttpClient, config: &GoodDataConfig, safety_margin_ms: i64) -> Result<Self> {
        let base = Url::parse(&config.base_url).map_err(|err| {
            SegLensError::Config(format!("invalid reporting base url '{}': {err}", config.base_url))
        })?;

        Ok(Self {
            http,
            base,
            username: config.username.clone(),
            password: config.password.clone(),
            safety_margin_ms,
            cache: Mutex::new(CredentialCache::default()),
        })
    }

    /// Perform the credential login and return a session token with its
    /// expiry.
    async fn obtain_session_token(&self) -> Result<(String, DateTime<Utc>)> {
        let url = self.endpoint("/gdc/account/login")?;
        let body = LoginRequest {
            post_user_login: PostUserLogin {
                login: &self.username,
                password: &self.password,
                remember: 0,
                verify_level: 2,
            },
        };

        let response = self.http.send(self.http.request(Method::POST, url).json(&body)).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(auth_call_error(status, "login"));
        }

        let parsed: LoginResponse = response
            .json()
            .await
            .map_err(|err| SegLensError::Internal(format!("failed to parse login response: {err}")))?;
        let token = parsed
            .into_token()
            .ok_or_else(|| SegLensError::Auth("login response missing token field".to_string()))?;

        Ok((token, Utc::now() + Duration::seconds(SESSION_TOKEN_TTL_SECS)))
    }

    /// Exchange the session token for a short-lived access token.
    ///
    /// Callers must hold a valid session token.
    async fn obtain_access_token(&self, session_token: &str) -> Result<(String, DateTime<Utc>)> {
        let url = self.endpoint("/gdc/account/token")?;

        let response = self
            .http
            .send(self.http.request(Method::GET, url).header(SESSION_TOKEN_HEADER, session_token))
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(auth_call_error(status, "token exchange"));
        }

        let parsed: TokenExchangeResponse = response.json().await.map_err(|err| {
            SegLensError::Internal(format!("failed to parse token exchange response: {err}"))
        })?;
        let token = parsed.into_token().ok_or_else(|| {
            SegLensError::Auth("token exchange response missing token field".to_string())
        })?;

        Ok((token, Utc::now() + Duration::seconds(ACCESS_TOKEN_TTL_SECS)))
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|err| SegLensError::Internal(format!("invalid endpoint path '{path}': {err}")))
    }

    #[cfg(test)]
    async fn force_expire_access_token(&self) {
        let mut cache = self.cache.lock().await;
        cache.access_expires_at = Some(Utc::now() - Duration::seconds(1));
    }

    #[cfg(test)]
    async fn force_expire_session_token(&self) {
        let mut cache = self.cache.lock().await;
        cache.session_expires_at = Some(Utc::now() - Duration::seconds(1));
    }

    #[cfg(test)]
    async fn snapshot(&self) -> (bool, bool) {
        let cache = self.cache.lock().await;
        (cache.session_token.is_some(), cache.access_token.is_some())
    }
}

fn auth_call_error(status: StatusCode, call: &str) -> SegLensError {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        SegLensError::Auth(format!("{call} rejected (HTTP {status})"))
    } else {
        SegLensError::Network(format!("{call} failed (HTTP {status})"))
    }
}

#[async_trait]
impl AccessTokenSource for GoodDataAuthenticator {
    async fn access_token(&self) -> Result<IssuedToken> {
        // Held across the refresh: concurrent callers queue behind one
        // in-flight login/exchange instead of issuing redundant ones.
        let mut cache = self.cache.lock().await;
        let now = Utc::now();

        if is_valid(cache.access_expires_at, now, self.safety_margin_ms) {
            if let Some(token) = cache.access_token.clone() {
                debug!("serving cached access token");
                return Ok(IssuedToken { secret: token, from_cache: true });
            }
        }

        if !is_valid(cache.session_expires_at, now, self.safety_margin_ms) {
            let (session_token, expires_at) = self.obtain_session_token().await?;
            cache.session_token = Some(session_token);
            cache.session_expires_at = Some(expires_at);
            info!("session token refreshed");
        }

        let session_token = cache.session_token.clone().ok_or_else(|| {
            SegLensError::Internal("session token absent after refresh".to_string())
        })?;

        let (access_token, expires_at) = self.obtain_access_token(&session_token).await?;
        cache.access_token = Some(access_token.clone());
        cache.access_expires_at = Some(expires_at);
        debug!("access token refreshed");

        Ok(IssuedToken { secret: access_token, from_cache: false })
    }

    async fn invalidate(&self) {
        self.cache.lock().await.clear();
        info!("credential cache invalidated");
    }
}
