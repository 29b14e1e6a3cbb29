//! Order Book API Client
//!
//! Typed methods for the order book REST endpoints. Every method builds a
//! `RequestSpec`, sends it through the shared pipeline (backoff, rate limit,
//! execute) and decodes the JSON into the declared result type.

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use super::models::{
    Address, AppDataHash, AppDataObject, NativePriceResponse, Order, OrderCancellation,
    OrderCreation, OrderQuoteRequest, OrderQuoteResponse, OrderQuoteSide, OrderQuoteValidity,
    OrderUid, SolverCompetitionId, SolverCompetitionResponse, TotalSurplus, Trade,
    TransactionHash,
};
use crate::common::api_base::ApiBase;
use crate::common::request::{RequestExecutor, RequestSpec};
use crate::config::{ApiConfig, Context, ContextOverride, Env, ServiceKind, SupportedChainId};
use crate::error::ApiError;

/// Default page size for `get_orders_by_owner`.
pub const DEFAULT_ORDERS_LIMIT: u32 = 1000;

/// Largest page size accepted by the order book.
pub const MAX_ORDERS_LIMIT: u32 = 1000;

/// Body of `POST /api/v1/quote`: request, side and validity merged into one object.
#[derive(Serialize)]
struct QuoteBody<'a> {
    #[serde(flatten)]
    request: &'a OrderQuoteRequest,
    #[serde(flatten)]
    side: &'a OrderQuoteSide,
    #[serde(flatten)]
    validity: Option<OrderQuoteValidity>,
}

// ============================================================================
// ORDER BOOK CLIENT
// ============================================================================

/// Client for the order book API of one environment and chain.
///
/// Holds one HTTP client and one set of rate limiters; share the instance
/// between tasks instead of creating one per call.
#[derive(Debug)]
pub struct OrderBookApi {
    base: ApiBase,
}

impl OrderBookApi {
    /// Creates a client for the given environment and chain.
    ///
    /// # Returns
    ///
    /// * `Ok(OrderBookApi)` - Client using the resolved endpoint and default policies
    /// * `Err(ApiError)` - The HTTP client could not be built
    pub fn new(env: Env, chain_id: SupportedChainId) -> Result<Self, ApiError> {
        let config = ApiConfig::for_chain(ServiceKind::OrderBook, env, chain_id)?;
        Self::from_context(config.context())
    }

    /// Creates a client from a fully specified context.
    pub fn from_context(context: Context) -> Result<Self, ApiError> {
        Ok(Self {
            base: ApiBase::new(ServiceKind::OrderBook, context)?,
        })
    }

    /// Creates a client around an existing HTTP client and executor.
    pub fn with_parts(context: Context, client: Client, executor: RequestExecutor) -> Self {
        Self {
            base: ApiBase::with_parts(ServiceKind::OrderBook, context, client, executor),
        }
    }

    /// The client-level context.
    pub fn context(&self) -> &Context {
        self.base.context()
    }

    // ------------------------------------------------------------------------
    // Version and links
    // ------------------------------------------------------------------------

    /// Fetches the order book service version (`GET /api/v1/version`).
    pub async fn get_version(&self, overrides: Option<&ContextOverride>) -> Result<String, ApiError> {
        self.base
            .fetch_as(&RequestSpec::get("/api/v1/version"), overrides)
            .await
    }

    /// Returns the API link of an order. Performs no request.
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - `base_url + "/api/v1/orders/" + uid`
    /// * `Err(ApiError::Config)` - `overrides` selects an unsupported endpoint
    pub fn get_order_link(
        &self,
        order_uid: &OrderUid,
        overrides: Option<&ContextOverride>,
    ) -> Result<String, ApiError> {
        let context = self.base.context_with_override(overrides)?;
        Ok(format!("{}/api/v1/orders/{}", context.base_url, order_uid))
    }

    // ------------------------------------------------------------------------
    // Trades
    // ------------------------------------------------------------------------

    /// Lists trades of an owner (`GET /api/v1/trades?owner=`).
    pub async fn get_trades_by_owner(
        &self,
        owner: &Address,
        overrides: Option<&ContextOverride>,
    ) -> Result<Vec<Trade>, ApiError> {
        let spec = RequestSpec::get("/api/v1/trades").query("owner", owner);
        self.base.fetch_as(&spec, overrides).await
    }

    /// Lists trades of an order (`GET /api/v1/trades?orderUid=`).
    pub async fn get_trades_by_order_uid(
        &self,
        order_uid: &OrderUid,
        overrides: Option<&ContextOverride>,
    ) -> Result<Vec<Trade>, ApiError> {
        let spec = RequestSpec::get("/api/v1/trades").query("orderUid", order_uid);
        self.base.fetch_as(&spec, overrides).await
    }

    // ------------------------------------------------------------------------
    // Orders
    // ------------------------------------------------------------------------

    /// Lists orders of an owner, newest first.
    ///
    /// # Arguments
    ///
    /// * `owner` - Order owner
    /// * `limit` - Page size, `1..=1000` (default 1000)
    /// * `offset` - Number of orders to skip (default 0)
    /// * `overrides` - Per-call context overrides
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<Order>)` - One page of orders
    /// * `Err(ApiError::Validation)` - `limit` out of range; no request is sent
    /// * `Err(ApiError)` - Request or decoding failed
    pub async fn get_orders_by_owner(
        &self,
        owner: &Address,
        limit: Option<u32>,
        offset: Option<u32>,
        overrides: Option<&ContextOverride>,
    ) -> Result<Vec<Order>, ApiError> {
        let limit = limit.unwrap_or(DEFAULT_ORDERS_LIMIT);
        if limit == 0 || limit > MAX_ORDERS_LIMIT {
            return Err(ApiError::Validation(format!(
                "limit must be between 1 and {}, got {}",
                MAX_ORDERS_LIMIT, limit
            )));
        }

        let spec = RequestSpec::get(format!("/api/v1/account/{}/orders", owner))
            .query("limit", limit)
            .query("offset", offset.unwrap_or(0));
        self.base.fetch_as(&spec, overrides).await
    }

    /// Fetches one order (`GET /api/v1/orders/{uid}`).
    pub async fn get_order_by_uid(
        &self,
        order_uid: &OrderUid,
        overrides: Option<&ContextOverride>,
    ) -> Result<Order, ApiError> {
        let spec = RequestSpec::get(format!("/api/v1/orders/{}", order_uid));
        self.base.fetch_as(&spec, overrides).await
    }

    /// Lists orders settled in a transaction (`GET /api/v1/transactions/{tx}/orders`).
    pub async fn get_tx_orders(
        &self,
        tx_hash: &TransactionHash,
        overrides: Option<&ContextOverride>,
    ) -> Result<Vec<Order>, ApiError> {
        let spec = RequestSpec::get(format!("/api/v1/transactions/{}/orders", tx_hash));
        self.base.fetch_as(&spec, overrides).await
    }

    /// Submits a signed order (`POST /api/v1/orders`).
    ///
    /// # Returns
    ///
    /// * `Ok(OrderUid)` - UID assigned by the order book
    /// * `Err(ApiError)` - Order rejected or request failed
    pub async fn post_order(
        &self,
        order: &OrderCreation,
        overrides: Option<&ContextOverride>,
    ) -> Result<OrderUid, ApiError> {
        let spec = RequestSpec::post("/api/v1/orders", to_body(order)?);
        self.base.fetch_as(&spec, overrides).await
    }

    /// Cancels orders with a signed cancellation (`DELETE /api/v1/orders`).
    pub async fn delete_order(
        &self,
        cancellation: &OrderCancellation,
        overrides: Option<&ContextOverride>,
    ) -> Result<(), ApiError> {
        if cancellation.order_uids.is_empty() {
            return Err(ApiError::Validation(
                "cancellation must name at least one order".to_string(),
            ));
        }

        let spec = RequestSpec::delete("/api/v1/orders", to_body(cancellation)?);
        self.base.fetch(&spec, overrides).await?;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Quotes, prices and surplus
    // ------------------------------------------------------------------------

    /// Requests a price quote (`POST /api/v1/quote`).
    ///
    /// # Arguments
    ///
    /// * `request` - Tokens, owner and order options
    /// * `side` - Which amount is fixed
    /// * `validity` - Requested validity; `None` lets the server choose
    /// * `overrides` - Per-call context overrides
    pub async fn post_quote(
        &self,
        request: &OrderQuoteRequest,
        side: &OrderQuoteSide,
        validity: Option<OrderQuoteValidity>,
        overrides: Option<&ContextOverride>,
    ) -> Result<OrderQuoteResponse, ApiError> {
        let body = to_body(&QuoteBody {
            request,
            side,
            validity,
        })?;
        self.base
            .fetch_as(&RequestSpec::post("/api/v1/quote", body), overrides)
            .await
    }

    /// Fetches a token's price in the native token (`GET /api/v1/token/{token}/native_price`).
    pub async fn get_native_price(
        &self,
        token: &Address,
        overrides: Option<&ContextOverride>,
    ) -> Result<NativePriceResponse, ApiError> {
        let spec = RequestSpec::get(format!("/api/v1/token/{}/native_price", token));
        self.base.fetch_as(&spec, overrides).await
    }

    /// Fetches a user's total surplus (`GET /api/v1/users/{user}/total_surplus`).
    pub async fn get_total_surplus(
        &self,
        user: &Address,
        overrides: Option<&ContextOverride>,
    ) -> Result<TotalSurplus, ApiError> {
        let spec = RequestSpec::get(format!("/api/v1/users/{}/total_surplus", user));
        self.base.fetch_as(&spec, overrides).await
    }

    // ------------------------------------------------------------------------
    // App data
    // ------------------------------------------------------------------------

    /// Fetches an app data document by hash (`GET /api/v1/app_data/{hash}`).
    pub async fn get_app_data(
        &self,
        app_data_hash: &AppDataHash,
        overrides: Option<&ContextOverride>,
    ) -> Result<AppDataObject, ApiError> {
        let spec = RequestSpec::get(format!("/api/v1/app_data/{}", app_data_hash));
        self.base.fetch_as(&spec, overrides).await
    }

    /// Registers an app data document (`PUT /api/v1/app_data[/{hash}]`).
    ///
    /// Without a hash the order book computes it.
    ///
    /// # Returns
    ///
    /// * `Ok(AppDataHash)` - Hash under which the document is stored
    /// * `Err(ApiError)` - Document rejected (e.g. hash mismatch) or request failed
    pub async fn put_app_data(
        &self,
        app_data: &AppDataObject,
        app_data_hash: Option<&AppDataHash>,
        overrides: Option<&ContextOverride>,
    ) -> Result<AppDataHash, ApiError> {
        let path = match app_data_hash {
            Some(hash) => format!("/api/v1/app_data/{}", hash),
            None => "/api/v1/app_data".to_string(),
        };
        let spec = RequestSpec::put(path, to_body(app_data)?);
        self.base.fetch_as(&spec, overrides).await
    }

    // ------------------------------------------------------------------------
    // Solver competition
    // ------------------------------------------------------------------------

    /// Fetches a solver competition by auction ID or the latest one.
    pub async fn get_solver_competition(
        &self,
        id: SolverCompetitionId,
        overrides: Option<&ContextOverride>,
    ) -> Result<SolverCompetitionResponse, ApiError> {
        let spec = RequestSpec::get(format!("/api/v1/solver_competition/{}", id));
        self.base.fetch_as(&spec, overrides).await
    }

    /// Fetches the solver competition that produced a settlement transaction.
    pub async fn get_solver_competition_by_tx_hash(
        &self,
        tx_hash: &TransactionHash,
        overrides: Option<&ContextOverride>,
    ) -> Result<SolverCompetitionResponse, ApiError> {
        let spec = RequestSpec::get(format!(
            "/api/v1/solver_competition/by_tx_hash/{}",
            tx_hash
        ));
        self.base.fetch_as(&spec, overrides).await
    }
}

/// Serializes a request body.
fn to_body<T: Serialize>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value)
        .map_err(|e| ApiError::Validation(format!("Failed to serialize request body: {}", e)))
}
