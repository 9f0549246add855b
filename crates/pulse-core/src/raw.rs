// crates/pulse-core/src/raw.rs

//! Raw document shapes as they come from the upstream JSON.
//!
//! NOTE: These types mirror the external dataset's layout. They are only the
//! parse-time schema; the extractor turns them into [`crate::FlatRecord`]s
//! and nothing else in the crate sees them.

use serde::Deserialize;
use std::collections::BTreeMap;

/// Envelope shared by every document. `success`, `code` and
/// `responseTimestamp` are ignored; `data` is mandatory.
#[derive(Debug, Deserialize)]
pub struct Document<T> {
    pub data: T,
}

/// `{ "type": "TOTAL", "count": 123, "amount": 4567.0 }`
#[derive(Debug, Deserialize)]
pub struct MetricRaw {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    pub count: i64,
    pub amount: f64,
}

// -----------------------------------------------------------------------------
// aggregated/{transaction,insurance}
// -----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct AggregatedTransactionData {
    #[serde(rename = "transactionData")]
    pub transaction_data: Vec<TransactionEntryRaw>,
}

/// A transaction category. Upstream nests the figures in
/// `paymentInstruments`; hand-made or trimmed documents carry them inline.
#[derive(Debug, Deserialize)]
pub struct TransactionEntryRaw {
    pub name: String,
    #[serde(rename = "paymentInstruments", default)]
    pub payment_instruments: Vec<MetricRaw>,
    #[serde(default)]
    pub count: Option<i64>,
    #[serde(default)]
    pub amount: Option<f64>,
}

// -----------------------------------------------------------------------------
// aggregated/user
// -----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct AggregatedUserData {
    /// `null` for every quarter after the dataset stopped publishing brands.
    #[serde(rename = "usersByDevice", default)]
    pub users_by_device: Option<Vec<DeviceRaw>>,
}

#[derive(Debug, Deserialize)]
pub struct DeviceRaw {
    pub brand: String,
    pub count: i64,
    pub percentage: f64,
}

// -----------------------------------------------------------------------------
// map/{transaction,insurance}/hover
// -----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct MapTransactionData {
    #[serde(rename = "hoverDataList")]
    pub hover_data_list: Vec<HoverEntryRaw>,
}

#[derive(Debug, Deserialize)]
pub struct HoverEntryRaw {
    pub name: String,
    pub metric: Vec<MetricRaw>,
}

// -----------------------------------------------------------------------------
// map/user/hover
// -----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct MapUserData {
    /// Keyed by district name. A BTreeMap keeps iteration reproducible.
    #[serde(rename = "hoverData")]
    pub hover_data: BTreeMap<String, HoverUsersRaw>,
}

#[derive(Debug, Deserialize)]
pub struct HoverUsersRaw {
    #[serde(rename = "registeredUsers")]
    pub registered_users: i64,
    #[serde(rename = "appOpens")]
    pub app_opens: i64,
}

// -----------------------------------------------------------------------------
// top/{transaction,insurance}
// -----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct TopTransactionData {
    #[serde(default)]
    pub states: Option<Vec<TopMetricRaw>>,
    #[serde(default)]
    pub districts: Option<Vec<TopMetricRaw>>,
    #[serde(default)]
    pub pincodes: Option<Vec<TopMetricRaw>>,
}

#[derive(Debug, Deserialize)]
pub struct TopMetricRaw {
    #[serde(rename = "entityName")]
    pub entity_name: String,
    pub metric: MetricRaw,
}

// -----------------------------------------------------------------------------
// top/user
// -----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct TopUserData {
    #[serde(default)]
    pub states: Option<Vec<TopUsersRaw>>,
    #[serde(default)]
    pub districts: Option<Vec<TopUsersRaw>>,
    #[serde(default)]
    pub pincodes: Option<Vec<TopUsersRaw>>,
}

#[derive(Debug, Deserialize)]
pub struct TopUsersRaw {
    pub name: String,
    #[serde(rename = "registeredUsers")]
    pub registered_users: i64,
}
