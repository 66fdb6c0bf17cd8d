//! Authenticated JSON client for the GitHub REST API.
//!
//! One request in, one decoded JSON document out. Nothing is retried here.

use crate::error::ApiError;
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde_json::Value;
use std::time::{Duration, Instant};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!("gh-dispatch/", env!("CARGO_PKG_VERSION"));

/// Query string pairs. Values are owned so callers can format numbers inline.
pub type Query<'a> = [(&'a str, String)];

#[async_trait]
pub trait CiApi: Send + Sync {
    async fn get(&self, path: &str, query: &Query<'_>) -> Result<Value, ApiError>;
    async fn post(&self, path: &str, body: &Value) -> Result<Value, ApiError>;
}

pub struct GithubClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl GithubClient {
    /// `base_url` is the REST root, e.g. `https://api.github.com/`.
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self, ApiError> {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|source| ApiError::Transport {
                url: base_url.clone(),
                source,
            })?;
        Ok(Self {
            http,
            base_url,
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let req = self
            .http
            .request(method, url)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION);
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send(&self, method: Method, req: RequestBuilder, url: String) -> Result<Value, ApiError> {
        let start = Instant::now();
        let resp = req.send().await.map_err(|source| ApiError::Transport {
            url: url.clone(),
            source,
        })?;
        let status = resp.status();
        let bytes = resp.bytes().await.map_err(|source| ApiError::Transport {
            url: url.clone(),
            source,
        })?;

        tracing::debug!(
            %method,
            url = %url,
            status = status.as_u16(),
            elapsed_ms = start.elapsed().as_millis(),
            "request completed"
        );

        if !status.is_success() {
            return Err(ApiError::Http {
                status: status.as_u16(),
                message: error_message(&bytes, status.canonical_reason()),
                url,
            });
        }
        decode_body(&bytes, &url)
    }
}

#[async_trait]
impl CiApi for GithubClient {
    async fn get(&self, path: &str, query: &Query<'_>) -> Result<Value, ApiError> {
        let url = self.url(path);
        let req = self.request(Method::GET, &url).query(query);
        self.send(Method::GET, req, url).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        let url = self.url(path);
        let req = self.request(Method::POST, &url).json(body);
        self.send(Method::POST, req, url).await
    }
}

/// Empty bodies (GitHub answers dispatches with 204) decode to `null`.
pub fn decode_body(bytes: &[u8], url: &str) -> Result<Value, ApiError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(bytes).map_err(|source| ApiError::MalformedResponse {
        url: url.to_string(),
        source,
    })
}

/// Prefers GitHub's `{"message": ...}` error body, then the raw text, then the reason phrase.
fn error_message(bytes: &[u8], reason: Option<&str>) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(bytes) {
        if let Some(Value::String(msg)) = map.get("message") {
            return msg.clone();
        }
    }
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim();
    if text.is_empty() {
        reason.unwrap_or("request failed").to_string()
    } else {
        text.to_string()
    }
}
