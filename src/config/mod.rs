//! Configuration Management Module
//!
//! Resolves the API endpoint for an (environment, chain) pair and holds the
//! per-client request context. Call sites may pass a `ContextOverride`; it is
//! merged into a copy of the client context and never mutates it.

pub mod file;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::common::backoff::BackoffOptions;
use crate::common::rate_limiter::LimiterOptions;
use crate::error::ConfigError;

pub use file::{BackoffConfig, ClientConfig, LimiterConfig};

// ============================================================================
// ENVIRONMENTS AND CHAINS
// ============================================================================

/// Deployment environment of the protocol services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Env {
    /// Production services
    #[default]
    Prod,
    /// Staging ("barn") services
    Staging,
}

impl fmt::Display for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Env::Prod => write!(f, "prod"),
            Env::Staging => write!(f, "staging"),
        }
    }
}

impl FromStr for Env {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "prod" | "production" => Ok(Env::Prod),
            "staging" | "barn" => Ok(Env::Staging),
            other => Err(ConfigError::UnknownEnv(other.to_string())),
        }
    }
}

/// Chains with a deployed order book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SupportedChainId {
    Mainnet,
    GnosisChain,
    ArbitrumOne,
    Sepolia,
}

impl SupportedChainId {
    /// All supported chains.
    pub const ALL: [SupportedChainId; 4] = [
        SupportedChainId::Mainnet,
        SupportedChainId::GnosisChain,
        SupportedChainId::ArbitrumOne,
        SupportedChainId::Sepolia,
    ];

    /// Numeric EIP-155 chain ID.
    pub fn id(self) -> u64 {
        match self {
            SupportedChainId::Mainnet => 1,
            SupportedChainId::GnosisChain => 100,
            SupportedChainId::ArbitrumOne => 42161,
            SupportedChainId::Sepolia => 11155111,
        }
    }

    /// Network segment used in order book URLs.
    fn network_path(self) -> &'static str {
        match self {
            SupportedChainId::Mainnet => "mainnet",
            SupportedChainId::GnosisChain => "xdai",
            SupportedChainId::ArbitrumOne => "arbitrum_one",
            SupportedChainId::Sepolia => "sepolia",
        }
    }
}

impl TryFrom<u64> for SupportedChainId {
    type Error = ConfigError;

    fn try_from(chain_id: u64) -> Result<Self, Self::Error> {
        SupportedChainId::ALL
            .into_iter()
            .find(|c| c.id() == chain_id)
            .ok_or(ConfigError::UnsupportedChain { chain_id })
    }
}

impl fmt::Display for SupportedChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.network_path(), self.id())
    }
}

// ============================================================================
// ENDPOINT RESOLUTION
// ============================================================================

const ORDER_BOOK_PROD_URL: &str = "https://api.cow.fi";
const ORDER_BOOK_STAGING_URL: &str = "https://barn.api.cow.fi";
const SUBGRAPH_BASE_URL: &str = "https://api.thegraph.com/subgraphs/name/cowprotocol";

/// Remote service an API client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    OrderBook,
    Subgraph,
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceKind::OrderBook => write!(f, "order book"),
            ServiceKind::Subgraph => write!(f, "subgraph"),
        }
    }
}

impl ServiceKind {
    /// Returns the base URL of this service for a chain and environment.
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - Base URL without a trailing slash
    /// * `Err(ConfigError::UnsupportedService)` - No deployment for this pair
    pub fn base_url(self, env: Env, chain: SupportedChainId) -> Result<String, ConfigError> {
        match self {
            ServiceKind::OrderBook => {
                let host = match env {
                    Env::Prod => ORDER_BOOK_PROD_URL,
                    Env::Staging => ORDER_BOOK_STAGING_URL,
                };
                Ok(format!("{}/{}", host, chain.network_path()))
            }
            ServiceKind::Subgraph => {
                let name = match (env, chain) {
                    (Env::Prod, SupportedChainId::Mainnet) => "cow",
                    (Env::Prod, SupportedChainId::GnosisChain) => "cow-gc",
                    (Env::Staging, SupportedChainId::Mainnet) => "cow-staging",
                    (Env::Staging, SupportedChainId::GnosisChain) => "cow-gc-staging",
                    _ => {
                        return Err(ConfigError::UnsupportedService {
                            service: self,
                            env,
                            chain,
                        })
                    }
                };
                Ok(format!("{}/{}", SUBGRAPH_BASE_URL, name))
            }
        }
    }
}

/// Resolved endpoint for one service, environment and chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub service: ServiceKind,
    pub env: Env,
    pub chain_id: SupportedChainId,
    pub base_url: String,
}

impl ApiConfig {
    /// Resolves the endpoint for a numeric chain ID.
    ///
    /// # Arguments
    ///
    /// * `service` - Which remote service to resolve
    /// * `env` - Deployment environment
    /// * `chain_id` - EIP-155 chain ID
    ///
    /// # Returns
    ///
    /// * `Ok(ApiConfig)` - Resolved endpoint
    /// * `Err(ConfigError)` - Unknown chain, or no endpoint for this service
    pub fn resolve(service: ServiceKind, env: Env, chain_id: u64) -> Result<Self, ConfigError> {
        let chain_id = SupportedChainId::try_from(chain_id)?;
        Self::for_chain(service, env, chain_id)
    }

    /// Same as [`ApiConfig::resolve`] for an already validated chain.
    pub fn for_chain(
        service: ServiceKind,
        env: Env,
        chain_id: SupportedChainId,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            service,
            env,
            chain_id,
            base_url: service.base_url(env, chain_id)?,
        })
    }

    /// Default request context for this endpoint.
    pub fn context(&self) -> Context {
        Context {
            env: self.env,
            chain_id: self.chain_id,
            base_url: self.base_url.clone(),
            backoff_opts: BackoffOptions::default(),
            limiter_opts: LimiterOptions::default(),
        }
    }
}

// ============================================================================
// REQUEST CONTEXT
// ============================================================================

/// Settings applied to every request made by a client.
#[derive(Debug, Clone, PartialEq)]
pub struct Context {
    pub env: Env,
    pub chain_id: SupportedChainId,
    /// Base URL; request paths are appended to it
    pub base_url: String,
    pub backoff_opts: BackoffOptions,
    pub limiter_opts: LimiterOptions,
}

/// Per-call overrides. Unset fields keep the client's value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextOverride {
    pub env: Option<Env>,
    pub chain_id: Option<SupportedChainId>,
    pub base_url: Option<String>,
    pub backoff_opts: Option<BackoffOptions>,
    pub limiter_opts: Option<LimiterOptions>,
}

impl ContextOverride {
    pub fn with_env(mut self, env: Env) -> Self {
        self.env = Some(env);
        self
    }

    pub fn with_chain_id(mut self, chain_id: SupportedChainId) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_backoff(mut self, backoff_opts: BackoffOptions) -> Self {
        self.backoff_opts = Some(backoff_opts);
        self
    }

    pub fn with_limiter(mut self, limiter_opts: LimiterOptions) -> Self {
        self.limiter_opts = Some(limiter_opts);
        self
    }
}

impl Context {
    /// Returns a copy of this context with `overrides` applied.
    ///
    /// When the environment or chain changes and no explicit base URL is
    /// given, the base URL is re-resolved for `service`.
    ///
    /// # Returns
    ///
    /// * `Ok(Context)` - Merged context
    /// * `Err(ConfigError)` - The override selects an unsupported endpoint or an invalid URL
    pub fn merged(
        &self,
        service: ServiceKind,
        overrides: &ContextOverride,
    ) -> Result<Context, ConfigError> {
        let mut merged = self.clone();

        if let Some(env) = overrides.env {
            merged.env = env;
        }
        if let Some(chain_id) = overrides.chain_id {
            merged.chain_id = chain_id;
        }

        match &overrides.base_url {
            Some(base_url) => merged.base_url = validate_base_url(base_url)?,
            None if merged.env != self.env || merged.chain_id != self.chain_id => {
                merged.base_url = service.base_url(merged.env, merged.chain_id)?;
            }
            None => {}
        }

        if let Some(backoff_opts) = &overrides.backoff_opts {
            merged.backoff_opts = backoff_opts.clone();
        }
        if let Some(limiter_opts) = &overrides.limiter_opts {
            merged.limiter_opts = limiter_opts.clone();
        }

        Ok(merged)
    }
}

/// Checks that `url` is absolute and strips any trailing slash.
pub fn validate_base_url(url: &str) -> Result<String, ConfigError> {
    let parsed = url::Url::parse(url).map_err(|e| ConfigError::InvalidBaseUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    if parsed.cannot_be_a_base() {
        return Err(ConfigError::InvalidBaseUrl {
            url: url.to_string(),
            reason: "URL cannot be used as a base".to_string(),
        });
    }
    Ok(url.trim_end_matches('/').to_string())
}
