// crates/pulse-core/src/category.rs

//! # Dataset Categories
//!
//! The upstream tree holds nine document families. Each family has its own
//! JSON shape, its own flattening rule and its own table. This module is the
//! single registry tying the three together.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// SQL affinity of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
}

impl ColumnType {
    pub fn sql(self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub ty: ColumnType,
}

impl Column {
    const fn new(name: &'static str, ty: ColumnType) -> Self {
        Self { name, ty }
    }
}

/// Columns every table starts with; they come from the document path.
pub const SLICE_COLUMNS: &[Column] = &[
    Column::new("state", ColumnType::Text),
    Column::new("year", ColumnType::Integer),
    Column::new("quarter", ColumnType::Integer),
];

/// The flattening rule for a category. Categories sharing a shape share the
/// entry columns but still land in separate tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Transaction,
    Device,
    DistrictMetric,
    DistrictUsers,
    TopMetric,
    TopUsers,
}

const TRANSACTION_COLUMNS: &[Column] = &[
    Column::new("transaction_type", ColumnType::Text),
    Column::new("transaction_count", ColumnType::Integer),
    Column::new("transaction_amount", ColumnType::Real),
];

const DEVICE_COLUMNS: &[Column] = &[
    Column::new("user_brand", ColumnType::Text),
    Column::new("user_count", ColumnType::Integer),
    Column::new("user_percentage", ColumnType::Real),
];

const DISTRICT_METRIC_COLUMNS: &[Column] = &[
    Column::new("district", ColumnType::Text),
    Column::new("transaction_count", ColumnType::Integer),
    Column::new("transaction_amount", ColumnType::Real),
];

const DISTRICT_USERS_COLUMNS: &[Column] = &[
    Column::new("district", ColumnType::Text),
    Column::new("registered_users", ColumnType::Integer),
    Column::new("app_opens", ColumnType::Integer),
];

const TOP_METRIC_COLUMNS: &[Column] = &[
    Column::new("entity_level", ColumnType::Text),
    Column::new("entity_name", ColumnType::Text),
    Column::new("transaction_count", ColumnType::Integer),
    Column::new("transaction_amount", ColumnType::Real),
];

const TOP_USERS_COLUMNS: &[Column] = &[
    Column::new("entity_level", ColumnType::Text),
    Column::new("entity_name", ColumnType::Text),
    Column::new("registered_users", ColumnType::Integer),
];

impl Shape {
    pub const ALL: [Shape; 6] = [
        Shape::Transaction,
        Shape::Device,
        Shape::DistrictMetric,
        Shape::DistrictUsers,
        Shape::TopMetric,
        Shape::TopUsers,
    ];

    /// Entry columns, in insert order.
    pub fn columns(self) -> &'static [Column] {
        match self {
            Shape::Transaction => TRANSACTION_COLUMNS,
            Shape::Device => DEVICE_COLUMNS,
            Shape::DistrictMetric => DISTRICT_METRIC_COLUMNS,
            Shape::DistrictUsers => DISTRICT_USERS_COLUMNS,
            Shape::TopMetric => TOP_METRIC_COLUMNS,
            Shape::TopUsers => TOP_USERS_COLUMNS,
        }
    }
}

/// One upstream document family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    AggregatedTransaction,
    AggregatedUser,
    AggregatedInsurance,
    MapTransaction,
    MapUser,
    MapInsurance,
    TopTransaction,
    TopUser,
    TopInsurance,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::AggregatedTransaction,
        Category::AggregatedUser,
        Category::AggregatedInsurance,
        Category::MapTransaction,
        Category::MapUser,
        Category::MapInsurance,
        Category::TopTransaction,
        Category::TopUser,
        Category::TopInsurance,
    ];

    /// Name accepted by [`FromStr`] and printed by [`fmt::Display`].
    pub fn name(self) -> &'static str {
        match self {
            Category::AggregatedTransaction => "aggregated-transaction",
            Category::AggregatedUser => "aggregated-user",
            Category::AggregatedInsurance => "aggregated-insurance",
            Category::MapTransaction => "map-transaction",
            Category::MapUser => "map-user",
            Category::MapInsurance => "map-insurance",
            Category::TopTransaction => "top-transaction",
            Category::TopUser => "top-user",
            Category::TopInsurance => "top-insurance",
        }
    }

    /// Directory below the dataset root holding this family's documents.
    pub fn source_dir(self) -> &'static str {
        match self {
            Category::AggregatedTransaction => "aggregated/transaction",
            Category::AggregatedUser => "aggregated/user",
            Category::AggregatedInsurance => "aggregated/insurance",
            Category::MapTransaction => "map/transaction/hover",
            Category::MapUser => "map/user/hover",
            Category::MapInsurance => "map/insurance/hover",
            Category::TopTransaction => "top/transaction",
            Category::TopUser => "top/user",
            Category::TopInsurance => "top/insurance",
        }
    }

    pub fn table(self) -> &'static str {
        match self {
            Category::AggregatedTransaction => "agg_trans",
            Category::AggregatedUser => "agg_user",
            Category::AggregatedInsurance => "agg_insurance",
            Category::MapTransaction => "map_trans",
            Category::MapUser => "map_user",
            Category::MapInsurance => "map_insurance",
            Category::TopTransaction => "top_trans",
            Category::TopUser => "top_user",
            Category::TopInsurance => "top_insurance",
        }
    }

    pub fn shape(self) -> Shape {
        match self {
            Category::AggregatedTransaction | Category::AggregatedInsurance => Shape::Transaction,
            Category::AggregatedUser => Shape::Device,
            Category::MapTransaction | Category::MapInsurance => Shape::DistrictMetric,
            Category::MapUser => Shape::DistrictUsers,
            Category::TopTransaction | Category::TopInsurance => Shape::TopMetric,
            Category::TopUser => Shape::TopUsers,
        }
    }

    /// `CREATE TABLE IF NOT EXISTS` plus the slice index for this category.
    pub fn create_sql(self) -> String {
        let table = self.table();
        let columns = SLICE_COLUMNS
            .iter()
            .chain(self.shape().columns())
            .map(|c| format!("    {} {} NOT NULL", c.name, c.ty.sql()))
            .collect::<Vec<_>>()
            .join(",\n");
        format!(
            "CREATE TABLE IF NOT EXISTS {table} (\n    id INTEGER PRIMARY KEY AUTOINCREMENT,\n{columns}\n);\n\
             CREATE INDEX IF NOT EXISTS idx_{table}_slice ON {table}(year, quarter, state);\n"
        )
    }

    /// Comma-separated insert column list (everything but `id`).
    pub fn insert_columns(self) -> String {
        SLICE_COLUMNS
            .iter()
            .chain(self.shape().columns())
            .map(|c| c.name)
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn column_count(self) -> usize {
        SLICE_COLUMNS.len() + self.shape().columns().len()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = String;

    /// Accepts the kebab-case name or the table name (`agg_trans`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.name() == needle || c.table() == needle)
            .ok_or_else(|| {
                let known: Vec<&str> = Category::ALL.iter().map(|c| c.name()).collect();
                format!("unknown category `{s}` (expected one of: {})", known.join(", "))
            })
    }
}
