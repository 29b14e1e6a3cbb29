//! Subgraph query results

use serde::{Deserialize, Serialize};

/// GraphQL response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphqlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphqlError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphqlError {
    pub message: String,
}

/// Protocol-wide running totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Total {
    pub tokens: String,
    pub orders: String,
    pub traders: String,
    pub settlements: String,
    #[serde(default)]
    pub volume_usd: Option<String>,
    #[serde(default)]
    pub volume_eth: Option<String>,
    #[serde(default)]
    pub fees_usd: Option<String>,
    #[serde(default)]
    pub fees_eth: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub totals: Vec<Total>,
}

/// Traded volume in one time bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeBucket {
    /// Bucket start as a Unix timestamp
    pub timestamp: i64,
    #[serde(default)]
    pub volume_usd: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastDaysVolume {
    pub daily_totals: Vec<VolumeBucket>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastHoursVolume {
    pub hourly_totals: Vec<VolumeBucket>,
}
