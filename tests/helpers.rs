//! Shared test helpers for API client tests
//!
//! This module provides constants and helper functions used by the integration tests.

#![allow(dead_code)]

use cow_api::{
    BackoffOptions, Context, Env, LimiterOptions, OrderBookApi, SubgraphClient, SupportedChainId,
};
use serde_json::{json, Value};
use std::time::Duration;

// ============================================================================
// CONSTANTS
// ============================================================================

// --------------------------------- IDs ----------------------------------

/// Dummy order UID (56 bytes: order digest, owner, validTo)
pub const DUMMY_ORDER_UID: &str = "0x0000000000000000000000000000000000000000000000000000000000000001\
0000000000000000000000000000000000000002ffffffff";

/// Short order UID accepted as-is by the client
pub const DUMMY_SHORT_ORDER_UID: &str = "0xabc";

/// Dummy transaction hash (64 hex characters)
pub const DUMMY_TX_HASH: &str =
    "0x0000000000000000000000000000000000000000000000000000000000000003";

/// Dummy app data hash (64 hex characters)
pub const DUMMY_APP_DATA_HASH: &str =
    "0x0000000000000000000000000000000000000000000000000000000000000004";

// -------------------------------- USERS ---------------------------------

/// Dummy order owner (EVM format, 40 hex characters)
pub const DUMMY_OWNER_ADDR: &str = "0x0000000000000000000000000000000000000002";

// -------------------------------- TOKENS --------------------------------

/// Dummy sell token (EVM format, 40 hex characters)
pub const DUMMY_SELL_TOKEN_ADDR: &str = "0x000000000000000000000000000000000000000a";

/// Dummy buy token (EVM format, 40 hex characters)
pub const DUMMY_BUY_TOKEN_ADDR: &str = "0x000000000000000000000000000000000000000b";

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Retry policy with millisecond delays so tests against a real server stay fast.
pub fn fast_backoff(max_tries: u32) -> BackoffOptions {
    BackoffOptions {
        max_tries: Some(max_tries),
        max_time: None,
        jitter: None,
        initial_delay: Duration::from_millis(5),
        max_delay: Some(Duration::from_millis(20)),
    }
}

/// Context pointing at a mock server, with fast retries and a permissive rate limit.
pub fn mock_context(base_url: &str, max_tries: u32) -> Context {
    Context {
        env: Env::Prod,
        chain_id: SupportedChainId::Mainnet,
        base_url: base_url.trim_end_matches('/').to_string(),
        backoff_opts: fast_backoff(max_tries),
        limiter_opts: LimiterOptions {
            max_calls: 100,
            period: Duration::from_secs(1),
        },
    }
}

/// Order book client talking to a mock server.
pub fn mock_order_book(base_url: &str, max_tries: u32) -> OrderBookApi {
    OrderBookApi::from_context(mock_context(base_url, max_tries))
        .expect("Failed to create order book client")
}

/// Subgraph client talking to a mock server.
pub fn mock_subgraph(base_url: &str) -> SubgraphClient {
    SubgraphClient::from_context(mock_context(base_url, 3))
        .expect("Failed to create subgraph client")
}

/// Minimal order JSON as returned by the order book.
pub fn order_json(uid: &str) -> Value {
    json!({
        "uid": uid,
        "status": "open",
    })
}

/// Full order JSON with every commonly populated field.
pub fn full_order_json(uid: &str) -> Value {
    json!({
        "uid": uid,
        "status": "fulfilled",
        "owner": DUMMY_OWNER_ADDR,
        "sellToken": DUMMY_SELL_TOKEN_ADDR,
        "buyToken": DUMMY_BUY_TOKEN_ADDR,
        "sellAmount": "1000000000000000000",
        "buyAmount": "2000000",
        "validTo": 4294967295u32,
        "appData": DUMMY_APP_DATA_HASH,
        "feeAmount": "0",
        "kind": "sell",
        "partiallyFillable": false,
        "sellTokenBalance": "erc20",
        "buyTokenBalance": "erc20",
        "signingScheme": "eip712",
        "signature": "0x01",
        "creationDate": "2024-01-01T00:00:00.000000Z",
        "class": "limit",
        "executedSellAmount": "1000000000000000000",
        "executedBuyAmount": "2000000",
        "invalidated": false,
    })
}
