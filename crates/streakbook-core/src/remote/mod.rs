//! Hosted backend: a PostgREST record store and a GoTrue identity provider.
//!
//! Both share a [`RestClient`], which owns a current-thread tokio runtime so
//! the synchronous [`crate::store::RecordStore`] and
//! [`crate::identity::IdentityProvider`] seams can drive async `reqwest`.
//! Every request is bounded by the configured timeout.

pub mod auth;
pub mod store;

pub use auth::RestAuth;
pub use store::RestStore;

use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::StoreError;
use crate::storage::HostedConfig;

pub struct RestClient {
    base_url: Url,
    anon_key: String,
    http: Client,
    runtime: tokio::runtime::Runtime,
    timeout: Duration,
}

/// A fully read HTTP response.
#[derive(Debug)]
pub struct RestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

/// Error body returned by PostgREST.
#[derive(Debug, Default, Deserialize)]
struct PostgrestError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl RestClient {
    pub fn new(base_url: &str, anon_key: &str, timeout: Duration) -> Result<Self, StoreError> {
        let mut raw = base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base_url = Url::parse(&raw)
            .map_err(|e| StoreError::Unknown(format!("invalid hosted url '{base_url}': {e}")))?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| StoreError::Unavailable(format!("failed to start runtime: {e}")))?;

        Ok(Self {
            base_url,
            anon_key: anon_key.to_string(),
            http: Client::new(),
            runtime,
            timeout,
        })
    }

    pub fn from_config(hosted: &HostedConfig, timeout: Duration) -> Result<Self, StoreError> {
        let hosted = hosted.resolved();
        if !hosted.is_configured() {
            return Err(StoreError::Unavailable(
                "hosted backend selected but hosted.url / hosted.anon_key are not set".into(),
            ));
        }
        Self::new(&hosted.url, &hosted.anon_key, timeout)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve `path` (e.g. `rest/v1/profiles`) against the base URL.
    pub fn endpoint(&self, path: &str) -> Result<Url, StoreError> {
        self.base_url
            .join(path)
            .map_err(|e| StoreError::Unknown(format!("invalid endpoint '{path}': {e}")))
    }

    /// Start a request carrying the project key. Without a user token the
    /// anon key doubles as bearer.
    pub fn request(&self, method: Method, url: Url, bearer: Option<&str>) -> RequestBuilder {
        let token = bearer.unwrap_or(&self.anon_key);
        self.http
            .request(method, url)
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {token}"))
    }

    /// Send and read the whole response, whatever its status.
    pub fn execute(&self, request: RequestBuilder) -> Result<RestResponse, StoreError> {
        let response = self.runtime.block_on(async {
            tokio::time::timeout(self.timeout, async {
                let resp = request.send().await?;
                let status = resp.status();
                let headers = resp.headers().clone();
                let body = resp.text().await?;
                Ok::<_, reqwest::Error>(RestResponse {
                    status,
                    headers,
                    body,
                })
            })
            .await
        })??;
        debug!(status = %response.status, "hosted response");
        Ok(response)
    }
}

impl RestResponse {
    /// Map a PostgREST failure onto the store error kinds. Successful
    /// responses pass through.
    pub fn into_store_result(self) -> Result<Self, StoreError> {
        if self.status.is_success() {
            return Ok(self);
        }

        let err: PostgrestError = serde_json::from_str(&self.body).unwrap_or_default();
        let message = err
            .message
            .clone()
            .unwrap_or_else(|| format!("HTTP {}", self.status));
        let status = self.status.as_u16();

        Err(match err.code.as_deref() {
            Some("PGRST116") => StoreError::NotFound(message),
            Some("23505") | Some("23503") => StoreError::Conflict(message),
            _ => match status {
                404 | 406 => StoreError::NotFound(message),
                409 => StoreError::Conflict(message),
                408 | 429 => StoreError::Unavailable(message),
                s if s >= 500 => StoreError::Unavailable(message),
                _ => StoreError::Unknown(message),
            },
        })
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, StoreError> {
        serde_json::from_str(&self.body)
            .map_err(|e| StoreError::Unknown(format!("unexpected response body: {e}")))
    }

    /// Total row count from a `Content-Range: a-b/total` header.
    pub fn total_count(&self) -> Option<u64> {
        self.headers
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total)
    }
}

/// Parse the total out of `0-9/42` or `*/0`. An unknown total (`*`) is `None`.
pub fn parse_content_range_total(value: &str) -> Option<u64> {
    let (_, total) = value.trim().rsplit_once('/')?;
    total.parse().ok()
}
