use anyhow::{anyhow, Result};
use bytes::Bytes;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::config::AppConfig;
use crate::http::ApiError;
use crate::infra::storage::Credentials;

const USER_AGENT: &str = concat!("iknowaspot/", env!("CARGO_PKG_VERSION"));

/// HTTP client for the spot API.
///
/// Authenticated calls return `Ok(None)` without touching the network when
/// no token is stored; callers treat that as "no data".
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    credentials: Credentials,
}

impl ApiClient {
    pub fn new(config: &AppConfig, credentials: Credentials) -> Result<Self> {
        Self::with_base_url(
            config.api_url.clone(),
            Duration::from_secs(config.http_timeout_seconds),
            credentials,
        )
    }

    pub fn with_base_url(base_url: Url, timeout: Duration, credentials: Credentials) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url,
            credentials,
        })
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn url(&self, route: &[String]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("api url cannot be a base: {}", self.base_url))?
            .pop_if_empty()
            .extend(route);
        Ok(url)
    }

    pub async fn get_authed(&self, route: &[String]) -> Result<Option<Value>> {
        let Some(request) = self.authed(Method::GET, route).await? else {
            return Ok(None);
        };
        self.send(request).await.map(Some)
    }

    pub async fn post_authed<B: Serialize + ?Sized>(
        &self,
        route: &[String],
        body: &B,
    ) -> Result<Option<Value>> {
        let Some(request) = self.authed(Method::POST, route).await? else {
            return Ok(None);
        };
        self.send(request.json(body)).await.map(Some)
    }

    pub async fn post_authed_empty(&self, route: &[String]) -> Result<Option<Value>> {
        let Some(request) = self.authed(Method::POST, route).await? else {
            return Ok(None);
        };
        self.send(request).await.map(Some)
    }

    /// POST without credentials (sign-in, registration, presigning).
    pub async fn post_public<B: Serialize + ?Sized>(&self, route: &[String], body: &B) -> Result<Value> {
        let url = self.url(route)?;
        self.send(self.client.post(url).json(body)).await
    }

    /// Raw upload to a presigned URL. The URL is absolute and unrelated to the API base.
    pub async fn put_bytes(&self, upload_url: &str, content_type: &str, body: Bytes) -> Result<()> {
        let url = Url::parse(upload_url).map_err(|err| anyhow!("invalid upload url: {}", err))?;
        let request = self
            .client
            .put(url)
            .header(CONTENT_TYPE, content_type)
            .body(body);
        self.send(request).await?;
        Ok(())
    }

    async fn authed(&self, method: Method, route: &[String]) -> Result<Option<RequestBuilder>> {
        let Some(token) = self.credentials.token().await else {
            tracing::debug!(route = ?route, "no access token, skipping request");
            return Ok(None);
        };
        let url = self.url(route)?;
        let request = self
            .client
            .request(method, url)
            .header(AUTHORIZATION, format!("Bearer {}", token));
        Ok(Some(request))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value> {
        let response = request.send().await.map_err(ApiError::from)?;
        let status = response.status();
        let url = response.url().clone();
        let bytes = response.bytes().await.map_err(ApiError::from)?;
        let body = decode_body(&bytes);

        tracing::debug!(url = %url, status = %status, "api response");

        if !status.is_success() {
            return Err(ApiError::from_response(status, &body).into());
        }

        Ok(body)
    }
}

/// Empty bodies decode as `null`; non-JSON bodies are kept as a string.
fn decode_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}
