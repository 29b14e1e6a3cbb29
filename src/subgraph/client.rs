//! Subgraph Client
//!
//! Runs GraphQL queries against the protocol's subgraph through the same
//! backoff and rate-limit pipeline as the order book client.

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::models::{GraphqlResponse, LastDaysVolume, LastHoursVolume, Totals};
use crate::common::api_base::{decode, ApiBase};
use crate::common::request::{RequestExecutor, RequestSpec};
use crate::config::{ApiConfig, Context, ContextOverride, Env, ServiceKind, SupportedChainId};
use crate::error::ApiError;

// ============================================================================
// QUERIES
// ============================================================================

const TOTALS_QUERY: &str = r#"query Totals {
  totals {
    tokens
    orders
    traders
    settlements
    volumeUsd
    volumeEth
    feesUsd
    feesEth
  }
}"#;

const LAST_DAYS_VOLUME_QUERY: &str = r#"query LastDaysVolume($days: Int!) {
  dailyTotals(orderBy: timestamp, orderDirection: desc, first: $days) {
    timestamp
    volumeUsd
  }
}"#;

const LAST_HOURS_VOLUME_QUERY: &str = r#"query LastHoursVolume($hours: Int!) {
  hourlyTotals(orderBy: timestamp, orderDirection: desc, first: $hours) {
    timestamp
    volumeUsd
  }
}"#;

// ============================================================================
// SUBGRAPH CLIENT
// ============================================================================

/// GraphQL client for the protocol subgraph.
#[derive(Debug)]
pub struct SubgraphClient {
    base: ApiBase,
}

impl SubgraphClient {
    /// Creates a client for the given environment and chain.
    ///
    /// # Returns
    ///
    /// * `Ok(SubgraphClient)` - Client for the resolved subgraph
    /// * `Err(ApiError::Config)` - No subgraph is deployed for this chain
    pub fn new(env: Env, chain_id: SupportedChainId) -> Result<Self, ApiError> {
        let config = ApiConfig::for_chain(ServiceKind::Subgraph, env, chain_id)?;
        Self::from_context(config.context())
    }

    /// Creates a client from a fully specified context.
    pub fn from_context(context: Context) -> Result<Self, ApiError> {
        Ok(Self {
            base: ApiBase::new(ServiceKind::Subgraph, context)?,
        })
    }

    /// Creates a client around an existing HTTP client and executor.
    pub fn with_parts(context: Context, client: Client, executor: RequestExecutor) -> Self {
        Self {
            base: ApiBase::with_parts(ServiceKind::Subgraph, context, client, executor),
        }
    }

    pub fn context(&self) -> &Context {
        self.base.context()
    }

    /// Runs a GraphQL query and decodes its `data` into `T`.
    ///
    /// # Arguments
    ///
    /// * `query` - GraphQL document
    /// * `variables` - Query variables as a JSON object
    /// * `overrides` - Per-call context overrides
    ///
    /// # Returns
    ///
    /// * `Ok(T)` - Decoded `data`
    /// * `Err(ApiError::Graphql)` - The subgraph reported errors
    /// * `Err(ApiError::MalformedResponse)` - No `data`, or `data` of the wrong shape
    pub async fn query<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
        overrides: Option<&ContextOverride>,
    ) -> Result<T, ApiError> {
        let spec = RequestSpec::post("", json!({ "query": query, "variables": variables }));
        let raw = self.base.fetch(&spec, overrides).await?;
        let response: GraphqlResponse<Value> = decode(raw)?;

        if !response.errors.is_empty() {
            return Err(ApiError::Graphql {
                messages: response.errors.into_iter().map(|e| e.message).collect(),
            });
        }

        match response.data {
            Some(data) => decode(data),
            None => Err(ApiError::MalformedResponse {
                reason: "GraphQL response has neither data nor errors".to_string(),
                body: String::new(),
            }),
        }
    }

    /// Protocol-wide totals.
    pub async fn totals(&self, overrides: Option<&ContextOverride>) -> Result<Totals, ApiError> {
        self.query(TOTALS_QUERY, json!({}), overrides).await
    }

    /// Daily volume for the last `days` days, newest first.
    pub async fn last_days_volume(
        &self,
        days: u32,
        overrides: Option<&ContextOverride>,
    ) -> Result<LastDaysVolume, ApiError> {
        self.query(LAST_DAYS_VOLUME_QUERY, json!({ "days": days }), overrides)
            .await
    }

    /// Hourly volume for the last `hours` hours, newest first.
    pub async fn last_hours_volume(
        &self,
        hours: u32,
        overrides: Option<&ContextOverride>,
    ) -> Result<LastHoursVolume, ApiError> {
        self.query(LAST_HOURS_VOLUME_QUERY, json!({ "hours": hours }), overrides)
            .await
    }
}
