//! Resilient request pipeline
//!
//! `ApiBase` owns everything a facade needs to talk to one service: the HTTP
//! client, the resolved context, the request executor and the rate limiters.
//! Every call goes through the same fixed stack:
//!
//! ```text
//! with_backoff (outermost) -> RateLimiter::acquire -> RequestExecutor::execute
//! ```
//!
//! Each retry therefore takes a fresh rate-limit permit.

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::backoff::with_backoff;
use super::rate_limiter::LimiterRegistry;
use super::request::{RequestExecutor, RequestSpec};
use crate::config::{Context, ContextOverride, ServiceKind};
use crate::error::{ApiError, ConfigError};

/// Per-request transport timeout. A timeout counts as a transient failure.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared request pipeline for one service.
#[derive(Debug)]
pub struct ApiBase {
    service: ServiceKind,
    client: Client,
    context: Context,
    executor: RequestExecutor,
    limiters: LimiterRegistry,
}

impl ApiBase {
    /// Creates a pipeline with a default HTTP client and executor.
    ///
    /// # Returns
    ///
    /// * `Ok(ApiBase)` - Pipeline ready for use
    /// * `Err(ApiError::Network)` - The HTTP client could not be built
    pub fn new(service: ServiceKind, context: Context) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .no_proxy() // Avoid macOS system-configuration issues in tests
            .build()?;
        Ok(Self::with_parts(
            service,
            context,
            client,
            RequestExecutor::default(),
        ))
    }

    /// Creates a pipeline around an existing HTTP client and executor.
    pub fn with_parts(
        service: ServiceKind,
        context: Context,
        client: Client,
        executor: RequestExecutor,
    ) -> Self {
        Self {
            service,
            client,
            context,
            executor,
            limiters: LimiterRegistry::new(),
        }
    }

    pub fn service(&self) -> ServiceKind {
        self.service
    }

    /// The client-level context. Never modified by per-call overrides.
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Returns the context for one call with `overrides` merged in.
    pub fn context_with_override(
        &self,
        overrides: Option<&ContextOverride>,
    ) -> Result<Context, ConfigError> {
        match overrides {
            Some(overrides) => self.context.merged(self.service, overrides),
            None => Ok(self.context.clone()),
        }
    }

    /// Runs one request through backoff, rate limiting and execution.
    ///
    /// # Arguments
    ///
    /// * `spec` - Request to send
    /// * `overrides` - Per-call context overrides
    ///
    /// # Returns
    ///
    /// * `Ok(Value)` - Adapted response body
    /// * `Err(ApiError)` - First non-transient error, or the last transient one
    pub async fn fetch(
        &self,
        spec: &RequestSpec,
        overrides: Option<&ContextOverride>,
    ) -> Result<Value, ApiError> {
        let context = self.context_with_override(overrides)?;
        let limiter = self.limiters.limiter_for(&context.limiter_opts).await;
        let url = format!("{}{}", context.base_url, spec.path);

        with_backoff(&context.backoff_opts, || {
            let limiter = Arc::clone(&limiter);
            let url = url.as_str();
            async move {
                let permit = limiter.acquire().await;
                if !permit.waited().is_zero() {
                    debug!(
                        "Rate limiter delayed {} {} by {:?}",
                        spec.method,
                        url,
                        permit.waited()
                    );
                }
                self.executor.execute(&self.client, url, spec).await
            }
        })
        .await
    }

    /// Same as [`ApiBase::fetch`], decoding the body into `T`.
    pub async fn fetch_as<T: DeserializeOwned>(
        &self,
        spec: &RequestSpec,
        overrides: Option<&ContextOverride>,
    ) -> Result<T, ApiError> {
        let value = self.fetch(spec, overrides).await?;
        decode(value)
    }
}

/// Decodes a JSON value into a typed response.
///
/// # Returns
///
/// * `Ok(T)` - Decoded value
/// * `Err(ApiError::MalformedResponse)` - The value does not have the expected shape
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    T::deserialize(&value).map_err(|e| ApiError::MalformedResponse {
        reason: format!(
            "Unexpected response shape for {}: {}",
            std::any::type_name::<T>(),
            e
        ),
        body: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Version {
        version: String,
    }

    #[test]
    fn test_decode_typed_value() {
        let decoded: Version = decode(json!({ "version": "v2" })).unwrap();
        assert_eq!(decoded.version, "v2");
    }

    #[test]
    fn test_decode_wrong_shape_keeps_body() {
        let err = decode::<Version>(json!({ "unexpected": 1 })).unwrap_err();
        match err {
            ApiError::MalformedResponse { reason, body } => {
                assert!(reason.contains("Version"));
                assert_eq!(body, r#"{"unexpected":1}"#);
            }
            other => panic!("Expected MalformedResponse, got {:?}", other),
        }
    }
}
