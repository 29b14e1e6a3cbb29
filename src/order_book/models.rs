//! Order Book Data Model
//!
//! Request and response shapes of the order book REST API. Field names follow
//! the API's camelCase wire format. Identifier newtypes are plain strings and
//! are not validated on construction; the server is the authority on format.

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use sha3::{Digest, Keccak256};
use std::fmt;

// ============================================================================
// IDENTIFIERS
// ============================================================================

macro_rules! string_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_newtype!(
    /// Unique order identifier (order digest ‖ owner ‖ validTo, hex encoded).
    OrderUid
);
string_newtype!(
    /// 20-byte account or token address, hex encoded.
    Address
);
string_newtype!(
    /// Transaction hash, hex encoded.
    TransactionHash
);
string_newtype!(
    /// keccak-256 hash of the full app data document, hex encoded.
    AppDataHash
);
string_newtype!(
    /// Token amount in atoms as a decimal string.
    TokenAmount
);

// ============================================================================
// ENUMERATIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderKind {
    Buy,
    Sell,
}

/// Lifecycle state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderStatus {
    PresignaturePending,
    Open,
    Fulfilled,
    Cancelled,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderClass {
    Market,
    Limit,
    Liquidity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SigningScheme {
    Eip712,
    EthSign,
    PreSign,
    Eip1271,
}

/// Where sell tokens are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SellTokenSource {
    #[default]
    Erc20,
    Internal,
    External,
}

/// Where bought tokens are sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuyTokenDestination {
    #[default]
    Erc20,
    Internal,
}

/// Trade-off between quote latency and quote accuracy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceQuality {
    Fast,
    #[default]
    Optimal,
    Verified,
}

// ============================================================================
// ORDERS AND TRADES
// ============================================================================

/// Order as stored by the order book.
///
/// Only `uid` and `status` are always present; every other field is optional
/// so partial records (e.g. from older API versions) still decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub uid: OrderUid,
    pub status: OrderStatus,
    #[serde(default)]
    pub owner: Option<Address>,
    #[serde(default)]
    pub sell_token: Option<Address>,
    #[serde(default)]
    pub buy_token: Option<Address>,
    #[serde(default)]
    pub receiver: Option<Address>,
    #[serde(default)]
    pub sell_amount: Option<TokenAmount>,
    #[serde(default)]
    pub buy_amount: Option<TokenAmount>,
    #[serde(default)]
    pub valid_to: Option<u32>,
    #[serde(default)]
    pub app_data: Option<String>,
    #[serde(default)]
    pub full_app_data: Option<String>,
    #[serde(default)]
    pub fee_amount: Option<TokenAmount>,
    #[serde(default)]
    pub kind: Option<OrderKind>,
    #[serde(default)]
    pub partially_fillable: Option<bool>,
    #[serde(default)]
    pub sell_token_balance: Option<SellTokenSource>,
    #[serde(default)]
    pub buy_token_balance: Option<BuyTokenDestination>,
    #[serde(default)]
    pub signing_scheme: Option<SigningScheme>,
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub creation_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub class: Option<OrderClass>,
    #[serde(default)]
    pub executed_sell_amount: Option<TokenAmount>,
    #[serde(default)]
    pub executed_sell_amount_before_fees: Option<TokenAmount>,
    #[serde(default)]
    pub executed_buy_amount: Option<TokenAmount>,
    #[serde(default)]
    pub executed_fee_amount: Option<TokenAmount>,
    #[serde(default)]
    pub invalidated: Option<bool>,
    #[serde(default)]
    pub quote_id: Option<i64>,
}

/// Settlement of (part of) an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub block_number: u64,
    pub log_index: u64,
    pub order_uid: OrderUid,
    pub owner: Address,
    pub sell_token: Address,
    pub buy_token: Address,
    pub sell_amount: TokenAmount,
    pub sell_amount_before_fees: TokenAmount,
    pub buy_amount: TokenAmount,
    /// Absent while the settlement is not yet indexed
    #[serde(default)]
    pub tx_hash: Option<TransactionHash>,
}

/// Signed order submitted to `POST /api/v1/orders`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreation {
    pub sell_token: Address,
    pub buy_token: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<Address>,
    pub sell_amount: TokenAmount,
    pub buy_amount: TokenAmount,
    pub valid_to: u32,
    pub fee_amount: TokenAmount,
    pub kind: OrderKind,
    pub partially_fillable: bool,
    #[serde(default)]
    pub sell_token_balance: SellTokenSource,
    #[serde(default)]
    pub buy_token_balance: BuyTokenDestination,
    pub signing_scheme: SigningScheme,
    pub signature: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote_id: Option<i64>,
    /// Full app data JSON, or its hash
    pub app_data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_data_hash: Option<AppDataHash>,
}

/// Signed cancellation of one or more orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCancellation {
    pub order_uids: Vec<OrderUid>,
    pub signature: String,
    pub signing_scheme: SigningScheme,
}

// ============================================================================
// QUOTES
// ============================================================================

/// Quote request without the side and validity parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderQuoteRequest {
    pub sell_token: Address,
    pub buy_token: Address,
    pub from: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_data_hash: Option<AppDataHash>,
    #[serde(default)]
    pub sell_token_balance: SellTokenSource,
    #[serde(default)]
    pub buy_token_balance: BuyTokenDestination,
    #[serde(default)]
    pub price_quality: PriceQuality,
    #[serde(default = "default_signing_scheme")]
    pub signing_scheme: SigningScheme,
    #[serde(default)]
    pub onchain_order: bool,
    #[serde(default)]
    pub partially_fillable: bool,
}

fn default_signing_scheme() -> SigningScheme {
    SigningScheme::Eip712
}

impl OrderQuoteRequest {
    /// Quote request with default balances, quality and signing scheme.
    pub fn new(sell_token: Address, buy_token: Address, from: Address) -> Self {
        Self {
            sell_token,
            buy_token,
            from,
            receiver: None,
            app_data: None,
            app_data_hash: None,
            sell_token_balance: SellTokenSource::default(),
            buy_token_balance: BuyTokenDestination::default(),
            price_quality: PriceQuality::default(),
            signing_scheme: default_signing_scheme(),
            onchain_order: false,
            partially_fillable: false,
        }
    }
}

/// Which amount of the trade is fixed by the quote request.
///
/// Serialized flat, e.g. `{"kind": "sell", "sellAmountBeforeFee": "100"}`.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderQuoteSide {
    /// Sell exactly this amount, fees taken from it
    SellAmountBeforeFee(TokenAmount),
    /// Sell this amount plus the fee
    SellAmountAfterFee(TokenAmount),
    /// Buy exactly this amount
    BuyAmountAfterFee(TokenAmount),
}

impl Serialize for OrderQuoteSide {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let (kind, field, amount) = match self {
            OrderQuoteSide::SellAmountBeforeFee(a) => ("sell", "sellAmountBeforeFee", a),
            OrderQuoteSide::SellAmountAfterFee(a) => ("sell", "sellAmountAfterFee", a),
            OrderQuoteSide::BuyAmountAfterFee(a) => ("buy", "buyAmountAfterFee", a),
        };
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("kind", kind)?;
        map.serialize_entry(field, amount)?;
        map.end()
    }
}

/// Requested validity of the quoted order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderQuoteValidity {
    /// Absolute expiry as a Unix timestamp
    ValidTo(u32),
    /// Relative expiry in seconds
    ValidFor(u32),
}

impl Serialize for OrderQuoteValidity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            OrderQuoteValidity::ValidTo(v) => map.serialize_entry("validTo", v)?,
            OrderQuoteValidity::ValidFor(v) => map.serialize_entry("validFor", v)?,
        }
        map.end()
    }
}

/// Order parameters proposed by a quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderParameters {
    pub sell_token: Address,
    pub buy_token: Address,
    #[serde(default)]
    pub receiver: Option<Address>,
    pub sell_amount: TokenAmount,
    pub buy_amount: TokenAmount,
    pub valid_to: u32,
    pub app_data: String,
    pub fee_amount: TokenAmount,
    pub kind: OrderKind,
    pub partially_fillable: bool,
    #[serde(default)]
    pub sell_token_balance: SellTokenSource,
    #[serde(default)]
    pub buy_token_balance: BuyTokenDestination,
    #[serde(default)]
    pub signing_scheme: Option<SigningScheme>,
}

/// Response of `POST /api/v1/quote`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderQuoteResponse {
    pub quote: OrderParameters,
    #[serde(default)]
    pub from: Option<Address>,
    pub expiration: DateTime<Utc>,
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub verified: bool,
}

// ============================================================================
// PRICES AND SURPLUS
// ============================================================================

/// Price of a token in the chain's native token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativePriceResponse {
    pub price: f64,
}

/// Total surplus earned by a user across all trades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalSurplus {
    pub total_surplus: TokenAmount,
}

// ============================================================================
// SOLVER COMPETITION
// ============================================================================

/// Which solver competition to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SolverCompetitionId {
    #[default]
    Latest,
    Auction(u64),
}

impl fmt::Display for SolverCompetitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverCompetitionId::Latest => write!(f, "latest"),
            SolverCompetitionId::Auction(id) => write!(f, "{}", id),
        }
    }
}

/// One solver's proposed solution in a competition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolverSettlement {
    #[serde(default)]
    pub solver: Option<String>,
    #[serde(default)]
    pub solver_address: Option<Address>,
    #[serde(default)]
    pub objective: Option<serde_json::Value>,
    #[serde(default)]
    pub score: Option<TokenAmount>,
    #[serde(default)]
    pub ranking: Option<u32>,
    #[serde(default)]
    pub clearing_prices: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    pub orders: Vec<serde_json::Value>,
    #[serde(default)]
    pub call_data: Option<String>,
}

/// Record of a solver competition for one auction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolverCompetitionResponse {
    pub auction_id: u64,
    #[serde(default)]
    pub transaction_hash: Option<TransactionHash>,
    #[serde(default)]
    pub gas_price: Option<f64>,
    #[serde(default)]
    pub liquidity_collected_block: Option<u64>,
    #[serde(default)]
    pub competition_simulation_block: Option<u64>,
    #[serde(default)]
    pub auction: Option<serde_json::Value>,
    #[serde(default)]
    pub solutions: Vec<SolverSettlement>,
}

// ============================================================================
// APP DATA
// ============================================================================

/// Full app data document as stored by the order book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppDataObject {
    /// JSON document, as an exact string
    pub full_app_data: String,
}

impl AppDataObject {
    pub fn new(full_app_data: impl Into<String>) -> Self {
        Self {
            full_app_data: full_app_data.into(),
        }
    }

    /// keccak-256 of the exact `full_app_data` bytes, `0x`-prefixed.
    pub fn app_data_hash(&self) -> AppDataHash {
        let digest = Keccak256::digest(self.full_app_data.as_bytes());
        AppDataHash(format!("0x{}", hex::encode(digest)))
    }
}
