// crates/pulse-core/src/record.rs

//! The flattened, table-ready form of a document.

use crate::category::Shape;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Path-derived coordinates shared by every record of one document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slice {
    /// Upstream directory slug (`tamil-nadu`), or `india` for country-level files.
    pub state: String,
    pub year: u16,
    /// 1..=4
    pub quarter: u8,
}

impl Slice {
    pub fn new(state: impl Into<String>, year: u16, quarter: u8) -> Self {
        Self {
            state: state.into(),
            year,
            quarter,
        }
    }
}

impl fmt::Display for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} Q{}", self.state, self.year, self.quarter)
    }
}

/// Which list of a `top/*` document an entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityLevel {
    State,
    District,
    Pincode,
}

impl EntityLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityLevel::State => "state",
            EntityLevel::District => "district",
            EntityLevel::Pincode => "pincode",
        }
    }
}

impl FromStr for EntityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "state" => Ok(EntityLevel::State),
            "district" => Ok(EntityLevel::District),
            "pincode" => Ok(EntityLevel::Pincode),
            other => Err(format!("unknown entity level `{other}`")),
        }
    }
}

/// The scalar payload of a record. One variant per flattening rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entry {
    Transaction {
        name: String,
        count: i64,
        amount: f64,
    },
    Device {
        brand: String,
        count: i64,
        percentage: f64,
    },
    DistrictMetric {
        district: String,
        count: i64,
        amount: f64,
    },
    DistrictUsers {
        district: String,
        registered_users: i64,
        app_opens: i64,
    },
    TopMetric {
        level: EntityLevel,
        entity: String,
        count: i64,
        amount: f64,
    },
    TopUsers {
        level: EntityLevel,
        entity: String,
        registered_users: i64,
    },
}

impl Entry {
    pub fn shape(&self) -> Shape {
        match self {
            Entry::Transaction { .. } => Shape::Transaction,
            Entry::Device { .. } => Shape::Device,
            Entry::DistrictMetric { .. } => Shape::DistrictMetric,
            Entry::DistrictUsers { .. } => Shape::DistrictUsers,
            Entry::TopMetric { .. } => Shape::TopMetric,
            Entry::TopUsers { .. } => Shape::TopUsers,
        }
    }
}

/// One row-to-be: the document's slice plus one leaf entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatRecord {
    #[serde(flatten)]
    pub slice: Slice,
    pub entry: Entry,
}

impl FlatRecord {
    pub fn new(slice: Slice, entry: Entry) -> Self {
        Self { slice, entry }
    }
}
