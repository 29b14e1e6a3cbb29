//! Request execution
//!
//! Performs one HTTP call. A `RequestStrategy` turns a `RequestSpec` into a
//! reqwest request and a `ResponseAdapter` turns a successful body into JSON.
//! Non-2xx responses become `ApiError::Http` with the server's error envelope
//! attached. Typed decoding happens in the API facades, not here.

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::error::ApiError;

// ============================================================================
// REQUESTS
// ============================================================================

/// HTTP verbs used by the APIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        };
        write!(f, "{}", name)
    }
}

/// One API call, relative to the context's base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    /// Path appended to the base URL (e.g. "/api/v1/version")
    pub path: String,
    pub method: HttpMethod,
    pub query_params: Vec<(String, String)>,
    pub json_body: Option<Value>,
}

impl RequestSpec {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: HttpMethod::Get,
            query_params: Vec::new(),
            json_body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            path: path.into(),
            method: HttpMethod::Post,
            query_params: Vec::new(),
            json_body: Some(body),
        }
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: HttpMethod::Put,
            ..Self::post(path, body)
        }
    }

    pub fn delete(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: HttpMethod::Delete,
            ..Self::post(path, body)
        }
    }

    /// Appends a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query_params.push((key.into(), value.to_string()));
        self
    }
}

// ============================================================================
// STRATEGIES
// ============================================================================

/// Builds the outgoing request.
pub trait RequestStrategy: Send + Sync {
    fn build(&self, client: &Client, url: &str, spec: &RequestSpec) -> RequestBuilder;
}

/// Default strategy: JSON in, JSON out.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRequestStrategy;

impl RequestStrategy for JsonRequestStrategy {
    fn build(&self, client: &Client, url: &str, spec: &RequestSpec) -> RequestBuilder {
        let builder = match spec.method {
            HttpMethod::Get => client.get(url),
            HttpMethod::Post => client.post(url),
            HttpMethod::Put => client.put(url),
            HttpMethod::Delete => client.delete(url),
        };

        let mut builder = builder.header(ACCEPT, "application/json");
        if !spec.query_params.is_empty() {
            builder = builder.query(&spec.query_params);
        }
        if let Some(body) = &spec.json_body {
            builder = builder.json(body);
        }
        builder
    }
}

/// Converts a successful response body into JSON.
pub trait ResponseAdapter: Send + Sync {
    /// # Arguments
    ///
    /// * `content_type` - Value of the `Content-Type` header, if any
    /// * `body` - Raw response body
    fn adapt(&self, content_type: Option<&str>, body: &str) -> Result<Value, ApiError>;
}

/// Default adapter.
///
/// - Empty body: `null`
/// - `text/*` content: the text as a JSON string
/// - Anything else: strict JSON parse
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonResponseAdapter;

impl ResponseAdapter for JsonResponseAdapter {
    fn adapt(&self, content_type: Option<&str>, body: &str) -> Result<Value, ApiError> {
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        if let Some(content_type) = content_type {
            if content_type.trim().to_ascii_lowercase().starts_with("text/") {
                return Ok(Value::String(body.to_string()));
            }
        }

        serde_json::from_str(body).map_err(|e| ApiError::MalformedResponse {
            reason: format!("Response body is not valid JSON: {}", e),
            body: body.to_string(),
        })
    }
}

// ============================================================================
// EXECUTOR
// ============================================================================

/// Executes single requests with a fixed strategy and adapter.
#[derive(Clone)]
pub struct RequestExecutor {
    strategy: Arc<dyn RequestStrategy>,
    adapter: Arc<dyn ResponseAdapter>,
}

impl Default for RequestExecutor {
    fn default() -> Self {
        Self::new(Arc::new(JsonRequestStrategy), Arc::new(JsonResponseAdapter))
    }
}

impl fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestExecutor").finish_non_exhaustive()
    }
}

impl RequestExecutor {
    pub fn new(strategy: Arc<dyn RequestStrategy>, adapter: Arc<dyn ResponseAdapter>) -> Self {
        Self { strategy, adapter }
    }

    /// Sends one request and returns the adapted body.
    ///
    /// # Arguments
    ///
    /// * `client` - HTTP client
    /// * `url` - Absolute URL (base URL + request path)
    /// * `spec` - Method, query and body
    ///
    /// # Returns
    ///
    /// * `Ok(Value)` - Adapted 2xx body
    /// * `Err(ApiError::Http)` - Non-2xx status, with the error envelope when present
    /// * `Err(ApiError::Network)` - No response was received
    /// * `Err(ApiError::MalformedResponse)` - 2xx body rejected by the adapter
    pub async fn execute(
        &self,
        client: &Client,
        url: &str,
        spec: &RequestSpec,
    ) -> Result<Value, ApiError> {
        debug!("{} {}", spec.method, url);

        let response = self.strategy.build(client, url, spec).send().await?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = response.text().await?;

        debug!("{} {} -> {}", spec.method, url, status);

        if !status.is_success() {
            return Err(ApiError::from_status(status.as_u16(), body));
        }

        self.adapter.adapt(content_type.as_deref(), &body)
    }
}
