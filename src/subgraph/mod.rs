//! Protocol subgraph queries

pub mod client;
pub mod models;

pub use client::SubgraphClient;
pub use models::{LastDaysVolume, LastHoursVolume, Total, Totals, VolumeBucket};
