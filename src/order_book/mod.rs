//! Order book REST API

pub mod api;
pub mod models;

pub use api::{OrderBookApi, DEFAULT_ORDERS_LIMIT, MAX_ORDERS_LIMIT};
pub use models::*;
