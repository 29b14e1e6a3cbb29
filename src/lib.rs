//! CoW Protocol API client library
//!
//! Typed clients for the order book REST API and the protocol subgraph.
//! All requests go through one resilient pipeline: retry with exponential
//! backoff around a shared rate limiter around the raw HTTP call.

pub mod common;
pub mod config;
pub mod error;
pub mod order_book;
pub mod subgraph;

// Re-export commonly used types
pub use common::{BackoffOptions, Jitter, LimiterOptions};
pub use config::{ApiConfig, ClientConfig, Context, ContextOverride, Env, ServiceKind, SupportedChainId};
pub use error::{ApiError, ConfigError, ErrorBody, ErrorKind, Retryable};
pub use order_book::OrderBookApi;
pub use subgraph::SubgraphClient;
