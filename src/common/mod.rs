//! Request pipeline shared by the API clients
//!
//! Decorators are applied in a fixed order: backoff (outermost), then rate
//! limiting, then the raw HTTP call.

pub mod api_base;
pub mod backoff;
pub mod rate_limiter;
pub mod request;

pub use api_base::ApiBase;
pub use backoff::{with_backoff, BackoffOptions, Jitter};
pub use rate_limiter::{LimiterOptions, LimiterRegistry, Permit, RateLimiter};
pub use request::{
    HttpMethod, JsonRequestStrategy, JsonResponseAdapter, RequestExecutor, RequestSpec,
    RequestStrategy, ResponseAdapter,
};
