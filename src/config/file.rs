//! Client configuration file
//!
//! TOML configuration for the command-line client. Durations are expressed in
//! milliseconds.

use serde::{Deserialize, Serialize};
use std::env::VarError;
use std::time::Duration;

use super::{validate_base_url, ApiConfig, Context, Env, ServiceKind, SupportedChainId};
use crate::common::backoff::{BackoffOptions, Jitter};
use crate::common::rate_limiter::LimiterOptions;

/// Environment variable holding the configuration file path.
pub const CONFIG_PATH_ENV: &str = "ORDERBOOK_CONFIG_PATH";

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "config/orderbook.toml";

// ============================================================================
// CONFIGURATION STRUCTURES
// ============================================================================

/// Top-level client configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Deployment environment ("prod" or "staging")
    #[serde(default)]
    pub env: Env,
    /// EIP-155 chain ID
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    /// Explicit base URL, replacing the resolved endpoint (e.g. a local order book)
    #[serde(default)]
    pub base_url: Option<String>,
    /// Retry policy
    #[serde(default)]
    pub backoff: BackoffConfig,
    /// Outbound rate limit
    #[serde(default)]
    pub limiter: LimiterConfig,
}

/// Retry policy settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Maximum number of attempts, including the first one
    #[serde(default = "default_max_tries")]
    pub max_tries: Option<u32>,
    /// Maximum total time spent retrying in milliseconds (omit for no limit)
    #[serde(default)]
    pub max_time_ms: Option<u64>,
    /// Delay before the first retry in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    /// Upper bound for a single delay in milliseconds
    #[serde(default)]
    pub max_delay_ms: Option<u64>,
    /// Jitter strategy ("full" or "equal")
    #[serde(default)]
    pub jitter: Option<Jitter>,
}

/// Rate limit settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimiterConfig {
    /// Calls allowed per period
    #[serde(default = "default_max_calls")]
    pub max_calls: u32,
    /// Period length in milliseconds
    #[serde(default = "default_period_ms")]
    pub period_ms: u64,
}

fn default_chain_id() -> u64 {
    SupportedChainId::Mainnet.id()
}

fn default_max_tries() -> Option<u32> {
    BackoffOptions::default().max_tries
}

fn default_initial_delay_ms() -> u64 {
    BackoffOptions::default().initial_delay.as_millis() as u64
}

fn default_max_calls() -> u32 {
    LimiterOptions::default().max_calls
}

fn default_period_ms() -> u64 {
    LimiterOptions::default().period.as_millis() as u64
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            env: Env::default(),
            chain_id: default_chain_id(),
            base_url: None,
            backoff: BackoffConfig::default(),
            limiter: LimiterConfig::default(),
        }
    }
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            max_tries: default_max_tries(),
            max_time_ms: None,
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: None,
            jitter: None,
        }
    }
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            max_calls: default_max_calls(),
            period_ms: default_period_ms(),
        }
    }
}

impl From<&BackoffConfig> for BackoffOptions {
    fn from(config: &BackoffConfig) -> Self {
        BackoffOptions {
            max_tries: config.max_tries,
            max_time: config.max_time_ms.map(Duration::from_millis),
            jitter: config.jitter,
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            max_delay: config.max_delay_ms.map(Duration::from_millis),
        }
    }
}

impl From<&LimiterConfig> for LimiterOptions {
    fn from(config: &LimiterConfig) -> Self {
        LimiterOptions {
            max_calls: config.max_calls,
            period: Duration::from_millis(config.period_ms),
        }
    }
}

// ============================================================================
// CONFIGURATION LOADING AND VALIDATION
// ============================================================================

impl ClientConfig {
    /// Loads configuration from `ORDERBOOK_CONFIG_PATH` or the default path.
    ///
    /// A missing default file yields the default configuration; a missing file
    /// named by the environment variable, or a variable that is not valid
    /// Unicode, is an error.
    pub fn load() -> anyhow::Result<Self> {
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::load_from_path(Some(&path)),
            Err(VarError::NotUnicode(raw)) => Err(anyhow::anyhow!(
                "{} is not valid Unicode: {:?}",
                CONFIG_PATH_ENV,
                raw
            )),
            Err(VarError::NotPresent) if std::path::Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::load_from_path(Some(DEFAULT_CONFIG_PATH))
            }
            Err(VarError::NotPresent) => Ok(Self::default()),
        }
    }

    /// Loads and validates configuration from a TOML file.
    ///
    /// # Arguments
    ///
    /// * `path` - File path; `None` uses the default location
    ///
    /// # Returns
    ///
    /// * `Ok(ClientConfig)` - Parsed and validated configuration
    /// * `Err(anyhow::Error)` - File missing, unparsable or invalid
    pub fn load_from_path(path: Option<&str>) -> anyhow::Result<Self> {
        let path = path.unwrap_or(DEFAULT_CONFIG_PATH);

        if !std::path::Path::new(path).exists() {
            return Err(anyhow::anyhow!(
                "Configuration file '{}' not found. Please copy the template:\n\
                cp config/orderbook.template.toml {}",
                path,
                path
            ));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read configuration file '{}': {}", path, e))?;
        let config: ClientConfig = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse configuration file '{}': {}", path, e))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// Checks:
    /// - The chain ID is supported
    /// - The base URL, if set, is an absolute URL
    /// - Retry and rate limit bounds are non-zero
    pub fn validate(&self) -> anyhow::Result<()> {
        SupportedChainId::try_from(self.chain_id)?;

        if let Some(base_url) = &self.base_url {
            validate_base_url(base_url)?;
        }

        if self.backoff.max_tries == Some(0) {
            anyhow::bail!("Configuration error: backoff.max_tries must be at least 1");
        }
        if self.limiter.max_calls == 0 {
            anyhow::bail!("Configuration error: limiter.max_calls must be at least 1");
        }
        if self.limiter.period_ms == 0 {
            anyhow::bail!("Configuration error: limiter.period_ms must be at least 1");
        }

        Ok(())
    }

    /// Builds the request context for `service`.
    pub fn to_context(&self, service: ServiceKind) -> anyhow::Result<Context> {
        let api_config = ApiConfig::resolve(service, self.env, self.chain_id)?;
        let mut context = api_config.context();

        if let Some(base_url) = &self.base_url {
            context.base_url = validate_base_url(base_url)?;
        }
        context.backoff_opts = BackoffOptions::from(&self.backoff);
        context.limiter_opts = LimiterOptions::from(&self.limiter);

        Ok(context)
    }
}
