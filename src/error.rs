//! Error Types
//!
//! Typed failures surfaced by the API clients. Every error carries enough
//! information to decide whether the request may be retried.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{Env, ServiceKind, SupportedChainId};

// ============================================================================
// ERROR ENVELOPE
// ============================================================================

/// Structured error object returned by the order book on non-2xx responses.
///
/// ```json
/// { "errorType": "NotFound", "description": "Order was not found" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// Machine-readable error category (e.g. "NotFound", "InvalidSignature")
    pub error_type: String,
    /// Human-readable description
    pub description: String,
    /// Optional error-specific payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

// ============================================================================
// CLASSIFICATION
// ============================================================================

/// Coarse classification used by the retry wrapper and by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 5xx, 429, transport failures and timeouts. Retried.
    Transient,
    /// 4xx other than 429 and client-side validation. Never retried.
    Client,
    /// The response body could not be decoded. Never retried.
    Malformed,
    /// Unknown chain, environment or endpoint. Never retried.
    Config,
}

/// Errors that know whether repeating the failed operation may succeed.
pub trait Retryable {
    /// Returns true if the operation that produced this error may be retried.
    fn is_transient(&self) -> bool;
}

// ============================================================================
// CONFIG ERRORS
// ============================================================================

/// Errors raised while resolving endpoints and contexts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Unsupported chain ID {chain_id}")]
    UnsupportedChain { chain_id: u64 },

    #[error("No {service} endpoint for chain {chain} in {env} environment")]
    UnsupportedService {
        service: ServiceKind,
        env: Env,
        chain: SupportedChainId,
    },

    #[error("Unknown environment '{0}' (expected 'prod' or 'staging')")]
    UnknownEnv(String),

    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

// ============================================================================
// API ERRORS
// ============================================================================

/// Errors returned by every API call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-2xx status.
    #[error("API request failed with HTTP {status}: {body}")]
    Http {
        status: u16,
        /// Parsed error envelope, when the body had one
        error: Option<ErrorBody>,
        /// Raw response body
        body: String,
    },

    /// The request never produced a response (connect error, timeout, reset).
    #[error("HTTP transport error: {0}")]
    Network(#[from] reqwest::Error),

    /// A 2xx body could not be parsed or did not match the expected shape.
    #[error("Malformed response: {reason}")]
    MalformedResponse { reason: String, body: String },

    /// Arguments rejected before any request was sent.
    #[error("Invalid request: {0}")]
    Validation(String),

    /// The subgraph answered with GraphQL errors.
    #[error("GraphQL query failed: {}", messages.join("; "))]
    Graphql { messages: Vec<String> },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ApiError {
    /// Builds an `Http` error from a status code and raw body, keeping the
    /// structured envelope when the body contains one.
    pub fn from_status(status: u16, body: String) -> Self {
        let error = serde_json::from_str::<ErrorBody>(&body).ok();
        ApiError::Http {
            status,
            error,
            body,
        }
    }

    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Http { status, .. } => {
                if *status == 429 || (500..600).contains(status) {
                    ErrorKind::Transient
                } else {
                    ErrorKind::Client
                }
            }
            // Builder errors mean the request itself is invalid
            ApiError::Network(e) if e.is_builder() => ErrorKind::Client,
            ApiError::Network(_) => ErrorKind::Transient,
            ApiError::MalformedResponse { .. } => ErrorKind::Malformed,
            ApiError::Validation(_) | ApiError::Graphql { .. } => ErrorKind::Client,
            ApiError::Config(_) => ErrorKind::Config,
        }
    }

    /// HTTP status of the failed response, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            ApiError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Structured error envelope, if the server sent one.
    pub fn error_body(&self) -> Option<&ErrorBody> {
        match self {
            ApiError::Http { error, .. } => error.as_ref(),
            _ => None,
        }
    }

    /// Shortcut for `error_body().error_type`.
    pub fn error_type(&self) -> Option<&str> {
        self.error_body().map(|e| e.error_type.as_str())
    }

    /// Shortcut for `error_body().description`.
    pub fn description(&self) -> Option<&str> {
        self.error_body().map(|e| e.description.as_str())
    }
}

impl Retryable for ApiError {
    fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_envelope_is_preserved() {
        let err = ApiError::from_status(
            404,
            r#"{"errorType":"NotFound","description":"Order was not found"}"#.to_string(),
        );
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.error_type(), Some("NotFound"));
        assert_eq!(err.description(), Some("Order was not found"));
        assert_eq!(err.kind(), ErrorKind::Client);
    }

    #[test]
    fn test_non_json_error_body_is_kept_raw() {
        let err = ApiError::from_status(502, "Bad Gateway".to_string());
        assert!(err.error_body().is_none());
        assert!(err.is_transient());
        assert!(err.to_string().contains("Bad Gateway"));
    }

    #[test]
    fn test_status_classification() {
        assert!(ApiError::from_status(429, String::new()).is_transient());
        assert!(ApiError::from_status(500, String::new()).is_transient());
        assert!(ApiError::from_status(599, String::new()).is_transient());
        assert!(!ApiError::from_status(400, String::new()).is_transient());
        assert!(!ApiError::from_status(404, String::new()).is_transient());
        assert!(!ApiError::Validation("bad".into()).is_transient());
        assert_eq!(
            ApiError::MalformedResponse {
                reason: "x".into(),
                body: String::new()
            }
            .kind(),
            ErrorKind::Malformed
        );
        assert_eq!(
            ApiError::from(ConfigError::UnsupportedChain { chain_id: 5 }).kind(),
            ErrorKind::Config
        );
    }
}
