// crates/pulse-core/src/extract.rs

//! # Record Extractor
//!
//! Parses one document against its category's schema and flattens it into
//! [`FlatRecord`]s. The whole document is validated before the first record
//! is produced, so a malformed file never yields a partial sequence.

use crate::category::Category;
use crate::error::{PulseError, Result};
use crate::raw::{
    AggregatedTransactionData, AggregatedUserData, Document, MapTransactionData, MapUserData,
    TopMetricRaw, TopTransactionData, TopUserData, TopUsersRaw,
};
use crate::record::{EntityLevel, Entry, FlatRecord, Slice};
use crate::walker::{open_document, DocumentPath};
use serde::de::DeserializeOwned;
use std::io::Read;
use std::path::Path;

/// Lazy sequence of records produced from one document.
/// Box<dyn ...> lets every category return its own iterator type behind a
/// single interface.
pub type Records = Box<dyn Iterator<Item = FlatRecord>>;

type Entries = Box<dyn Iterator<Item = Entry>>;

/// Opens `doc` and extracts it with the rule for `doc.category`.
pub fn extract_document(doc: &DocumentPath) -> Result<Records> {
    let reader = open_document(&doc.path)?;
    extract(doc.category, doc.slice.clone(), reader, &doc.path)
}

/// Convenience for documents already in memory (tests, benches, demos).
pub fn extract_str(category: Category, slice: Slice, json: &str) -> Result<Records> {
    extract(category, slice, json.as_bytes(), Path::new("<memory>"))
}

/// Extracts records from `reader`. `origin` only labels errors.
///
/// # Example
///
/// ```rust
/// use pulse_core::{extract_str, Category, Entry, Slice};
///
/// let json = r#"{"data":{"transactionData":[
///     {"name":"Recharge","count":100,"amount":5000.0}
/// ]}}"#;
/// let records: Vec<_> =
///     extract_str(Category::AggregatedTransaction, Slice::new("india", 2022, 1), json)
///         .unwrap()
///         .collect();
///
/// assert_eq!(records.len(), 1);
/// assert_eq!(
///     records[0].entry,
///     Entry::Transaction { name: "Recharge".into(), count: 100, amount: 5000.0 }
/// );
/// ```
pub fn extract<R: Read>(
    category: Category,
    slice: Slice,
    reader: R,
    origin: &Path,
) -> Result<Records> {
    let entries: Entries = match category {
        Category::AggregatedTransaction | Category::AggregatedInsurance => {
            transactions(parse(reader, origin)?, origin)?
        }
        Category::AggregatedUser => devices(parse(reader, origin)?),
        Category::MapTransaction | Category::MapInsurance => district_metrics(parse(reader, origin)?),
        Category::MapUser => district_users(parse(reader, origin)?),
        Category::TopTransaction | Category::TopInsurance => top_metrics(parse(reader, origin)?),
        Category::TopUser => top_users(parse(reader, origin)?),
    };
    Ok(Box::new(
        entries.map(move |entry| FlatRecord::new(slice.clone(), entry)),
    ))
}

fn parse<T: DeserializeOwned, R: Read>(reader: R, origin: &Path) -> Result<T> {
    let doc: Document<T> =
        serde_json::from_reader(reader).map_err(|e| PulseError::parse(origin, e.to_string()))?;
    Ok(doc.data)
}

// -----------------------------------------------------------------------------
// FLATTENING RULES (one per shape)
// -----------------------------------------------------------------------------

fn transactions(data: AggregatedTransactionData, origin: &Path) -> Result<Entries> {
    if let Some(bad) = data
        .transaction_data
        .iter()
        .find(|e| e.payment_instruments.is_empty() && (e.count.is_none() || e.amount.is_none()))
    {
        return Err(PulseError::parse(
            origin,
            format!(
                "transaction entry `{}` has neither paymentInstruments nor count/amount",
                bad.name
            ),
        ));
    }

    Ok(Box::new(data.transaction_data.into_iter().flat_map(|e| {
        let rows: Vec<Entry> = if e.payment_instruments.is_empty() {
            vec![Entry::Transaction {
                name: e.name,
                count: e.count.unwrap_or_default(),
                amount: e.amount.unwrap_or_default(),
            }]
        } else {
            e.payment_instruments
                .into_iter()
                .map(|m| Entry::Transaction {
                    name: e.name.clone(),
                    count: m.count,
                    amount: m.amount,
                })
                .collect()
        };
        rows
    })))
}

fn devices(data: AggregatedUserData) -> Entries {
    Box::new(
        data.users_by_device
            .unwrap_or_default()
            .into_iter()
            .map(|d| Entry::Device {
                brand: d.brand,
                count: d.count,
                percentage: d.percentage,
            }),
    )
}

fn district_metrics(data: MapTransactionData) -> Entries {
    Box::new(data.hover_data_list.into_iter().flat_map(|h| {
        let district = h.name;
        h.metric
            .into_iter()
            .map(move |m| Entry::DistrictMetric {
                district: district.clone(),
                count: m.count,
                amount: m.amount,
            })
    }))
}

fn district_users(data: MapUserData) -> Entries {
    Box::new(
        data.hover_data
            .into_iter()
            .map(|(district, u)| Entry::DistrictUsers {
                district,
                registered_users: u.registered_users,
                app_opens: u.app_opens,
            }),
    )
}

fn top_metrics(data: TopTransactionData) -> Entries {
    fn level(list: Option<Vec<TopMetricRaw>>, level: EntityLevel) -> impl Iterator<Item = Entry> {
        list.unwrap_or_default().into_iter().map(move |t| Entry::TopMetric {
            level,
            entity: t.entity_name,
            count: t.metric.count,
            amount: t.metric.amount,
        })
    }
    Box::new(
        level(data.states, EntityLevel::State)
            .chain(level(data.districts, EntityLevel::District))
            .chain(level(data.pincodes, EntityLevel::Pincode)),
    )
}

fn top_users(data: TopUserData) -> Entries {
    fn level(list: Option<Vec<TopUsersRaw>>, level: EntityLevel) -> impl Iterator<Item = Entry> {
        list.unwrap_or_default().into_iter().map(move |t| Entry::TopUsers {
            level,
            entity: t.name,
            registered_users: t.registered_users,
        })
    }
    Box::new(
        level(data.states, EntityLevel::State)
            .chain(level(data.districts, EntityLevel::District))
            .chain(level(data.pincodes, EntityLevel::Pincode)),
    )
}
