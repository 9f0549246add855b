// crates/pulse-core/src/query.rs

//! # Query Layer
//!
//! Parameterized reads over a [`Store`]. Filters combine conjunctively and
//! omitted filters match everything. A filter that matches nothing yields
//! an empty `Vec`, never an error.
//!
//! Only whitelisted identifiers (table and column names from
//! [`Category`] / [`Ranking`]) are ever spliced into SQL text; every user
//! value is bound as a `?` parameter.

use crate::category::{Category, Shape};
use crate::error::{PulseError, Result};
use crate::record::{EntityLevel, Entry, FlatRecord, Slice};
use crate::store::Store;
use crate::text::state_slug;
use rusqlite::types::{Type, Value};
use rusqlite::{params_from_iter, Row};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// The `state` value carried by country-level documents.
pub const COUNTRY_ROLLUP: &str = "india";

// -----------------------------------------------------------------------------
// FILTER
// -----------------------------------------------------------------------------

/// `state AND year AND quarter`, each optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceFilter {
    pub state: Option<String>,
    pub year: Option<u16>,
    pub quarter: Option<u8>,
}

impl SliceFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn year(mut self, year: u16) -> Self {
        self.year = Some(year);
        self
    }

    pub fn quarter(mut self, quarter: u8) -> Self {
        self.quarter = Some(quarter);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(q) = self.quarter {
            if !(1..=4).contains(&q) {
                return Err(PulseError::invalid_query(format!(
                    "quarter must be between 1 and 4, got {q}"
                )));
            }
        }
        if self.year == Some(0) {
            return Err(PulseError::invalid_query("year must be positive"));
        }
        if let Some(s) = &self.state {
            if state_slug(s).is_empty() {
                return Err(PulseError::invalid_query("state filter is empty"));
            }
        }
        Ok(())
    }

    /// The state filter in upstream slug form.
    pub fn state_key(&self) -> Option<String> {
        self.state.as_deref().map(state_slug)
    }

    /// In-memory counterpart of the SQL predicate.
    pub fn matches(&self, slice: &Slice) -> bool {
        self.state_key().map_or(true, |s| s == slice.state)
            && self.year.map_or(true, |y| y == slice.year)
            && self.quarter.map_or(true, |q| q == slice.quarter)
    }

    /// `WHERE 1=1 AND …` plus its bound values.
    fn where_clause(&self) -> Result<(String, Vec<Value>)> {
        self.validate()?;
        let mut sql = String::from("WHERE 1=1");
        let mut params = Vec::new();
        if let Some(state) = self.state_key() {
            sql.push_str(" AND state = ?");
            params.push(Value::Text(state));
        }
        if let Some(year) = self.year {
            sql.push_str(" AND year = ?");
            params.push(Value::Integer(i64::from(year)));
        }
        if let Some(quarter) = self.quarter {
            sql.push_str(" AND quarter = ?");
            params.push(Value::Integer(i64::from(quarter)));
        }
        Ok((sql, params))
    }

    /// Like [`Self::where_clause`], but leaves out country-level rows unless
    /// the filter names them. Those rows already total the states.
    fn aggregate_where(&self) -> Result<(String, Vec<Value>)> {
        let (mut sql, mut params) = self.where_clause()?;
        if self.state_key().is_none() {
            sql.push_str(" AND state <> ?");
            params.push(Value::Text(COUNTRY_ROLLUP.to_string()));
        }
        Ok((sql, params))
    }
}

// -----------------------------------------------------------------------------
// RESULT ROWS
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateAmount {
    pub state: String,
    pub total_amount: f64,
    pub avg_amount: f64,
    pub total_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub state: String,
    /// District or pincode; equals `state` for state rankings.
    pub entity: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandShare {
    pub brand: String,
    pub total_users: i64,
    pub avg_share: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateValue {
    pub state: String,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarterTotal {
    pub year: u16,
    pub quarter: u8,
    pub total_amount: f64,
    pub total_count: i64,
}

// -----------------------------------------------------------------------------
// RANKINGS
// -----------------------------------------------------------------------------

/// The dashboard's top-N leaderboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Ranking {
    StatesByTransactionAmount,
    DistrictsByTransactionAmount,
    PincodesByTransactionAmount,
    StatesByInsurancePremium,
    DistrictsByInsurancePremium,
    PincodesByInsurancePremium,
    StatesByRegisteredUsers,
    DistrictsByRegisteredUsers,
    PincodesByRegisteredUsers,
}

impl Ranking {
    pub const ALL: [Ranking; 9] = [
        Ranking::StatesByTransactionAmount,
        Ranking::DistrictsByTransactionAmount,
        Ranking::PincodesByTransactionAmount,
        Ranking::StatesByInsurancePremium,
        Ranking::DistrictsByInsurancePremium,
        Ranking::PincodesByInsurancePremium,
        Ranking::StatesByRegisteredUsers,
        Ranking::DistrictsByRegisteredUsers,
        Ranking::PincodesByRegisteredUsers,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Ranking::StatesByTransactionAmount => "states-by-transaction-amount",
            Ranking::DistrictsByTransactionAmount => "districts-by-transaction-amount",
            Ranking::PincodesByTransactionAmount => "pincodes-by-transaction-amount",
            Ranking::StatesByInsurancePremium => "states-by-insurance-premium",
            Ranking::DistrictsByInsurancePremium => "districts-by-insurance-premium",
            Ranking::PincodesByInsurancePremium => "pincodes-by-insurance-premium",
            Ranking::StatesByRegisteredUsers => "states-by-registered-users",
            Ranking::DistrictsByRegisteredUsers => "districts-by-registered-users",
            Ranking::PincodesByRegisteredUsers => "pincodes-by-registered-users",
        }
    }

    pub fn category(self) -> Category {
        match self {
            Ranking::StatesByTransactionAmount => Category::AggregatedTransaction,
            Ranking::DistrictsByTransactionAmount => Category::MapTransaction,
            Ranking::PincodesByTransactionAmount => Category::TopTransaction,
            Ranking::StatesByInsurancePremium => Category::AggregatedInsurance,
            Ranking::DistrictsByInsurancePremium => Category::MapInsurance,
            Ranking::PincodesByInsurancePremium => Category::TopInsurance,
            Ranking::StatesByRegisteredUsers | Ranking::DistrictsByRegisteredUsers => {
                Category::MapUser
            }
            Ranking::PincodesByRegisteredUsers => Category::TopUser,
        }
    }

    /// (entity expression, value expression, extra predicate)
    fn sql_parts(self) -> (&'static str, &'static str, &'static str) {
        match self {
            Ranking::StatesByTransactionAmount | Ranking::StatesByInsurancePremium => {
                ("state", "SUM(transaction_amount)", "")
            }
            Ranking::DistrictsByTransactionAmount | Ranking::DistrictsByInsurancePremium => {
                ("district", "SUM(transaction_amount)", "")
            }
            Ranking::PincodesByTransactionAmount | Ranking::PincodesByInsurancePremium => (
                "entity_name",
                "SUM(transaction_amount)",
                " AND entity_level = 'pincode'",
            ),
            Ranking::StatesByRegisteredUsers => ("state", "SUM(registered_users)", ""),
            Ranking::DistrictsByRegisteredUsers => ("district", "SUM(registered_users)", ""),
            Ranking::PincodesByRegisteredUsers => (
                "entity_name",
                "SUM(registered_users)",
                " AND entity_level = 'pincode'",
            ),
        }
    }
}

impl fmt::Display for Ranking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Ranking {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Ranking::ALL
            .into_iter()
            .find(|r| r.name() == needle)
            .ok_or_else(|| {
                let known: Vec<&str> = Ranking::ALL.iter().map(|r| r.name()).collect();
                format!("unknown ranking `{s}` (expected one of: {})", known.join(", "))
            })
    }
}

// -----------------------------------------------------------------------------
// QUERY TRAIT
// -----------------------------------------------------------------------------

/// The read operations the dashboard needs.
pub trait DashboardQueries {
    /// Raw Table Rows rebuilt as records, in insertion order.
    fn rows(&self, category: Category, filter: &SliceFilter) -> Result<Vec<FlatRecord>>;

    /// Per-state amount totals for `agg_trans` / `agg_insurance`, optionally
    /// restricted to one transaction type (case-insensitive).
    fn state_amounts(
        &self,
        category: Category,
        filter: &SliceFilter,
        transaction_type: Option<&str>,
    ) -> Result<Vec<StateAmount>>;

    /// Top `limit` entries of a leaderboard, largest first.
    fn rank(&self, ranking: Ranking, filter: &SliceFilter, limit: usize)
        -> Result<Vec<RankedEntry>>;

    /// Users and average share per device brand, largest first.
    fn device_brands(&self, filter: &SliceFilter) -> Result<Vec<BrandShare>>;

    fn app_opens_by_state(&self, filter: &SliceFilter) -> Result<Vec<StateValue>>;

    /// Amount and count per (year, quarter), chronological.
    fn quarterly_trend(
        &self,
        category: Category,
        filter: &SliceFilter,
        transaction_type: Option<&str>,
    ) -> Result<Vec<QuarterTotal>>;

    /// Distinct transaction type names, sorted.
    fn transaction_types(&self, category: Category) -> Result<Vec<String>>;

    /// Distinct years present, ascending.
    fn years(&self, category: Category) -> Result<Vec<u16>>;
}

impl DashboardQueries for Store {
    fn rows(&self, category: Category, filter: &SliceFilter) -> Result<Vec<FlatRecord>> {
        let (where_sql, params) = filter.where_clause()?;
        let sql = format!(
            "SELECT {} FROM {} {where_sql} ORDER BY id",
            category.insert_columns(),
            category.table()
        );
        let shape = category.shape();
        fetch(self, &sql, &params, |row| {
            Ok(FlatRecord::new(slice_from_row(row)?, entry_from_row(shape, row)?))
        })
    }

    fn state_amounts(
        &self,
        category: Category,
        filter: &SliceFilter,
        transaction_type: Option<&str>,
    ) -> Result<Vec<StateAmount>> {
        require_shape(category, Shape::Transaction)?;
        let (mut where_sql, mut params) = filter.aggregate_where()?;
        push_type_filter(&mut where_sql, &mut params, transaction_type);
        let sql = format!(
            "SELECT state, SUM(transaction_amount), AVG(transaction_amount), SUM(transaction_count) \
             FROM {} {where_sql} GROUP BY state ORDER BY state",
            category.table()
        );
        fetch(self, &sql, &params, |row| {
            Ok(StateAmount {
                state: row.get(0)?,
                total_amount: row.get(1)?,
                avg_amount: row.get(2)?,
                total_count: row.get(3)?,
            })
        })
    }

    fn rank(
        &self,
        ranking: Ranking,
        filter: &SliceFilter,
        limit: usize,
    ) -> Result<Vec<RankedEntry>> {
        if limit == 0 {
            return Err(PulseError::invalid_query("limit must be at least 1"));
        }
        let (entity, value, extra) = ranking.sql_parts();
        let (where_sql, mut params) = filter.aggregate_where()?;
        params.push(Value::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));
        let sql = format!(
            "SELECT state, {entity}, {value} AS total FROM {} {where_sql}{extra} \
             GROUP BY state, {entity} ORDER BY total DESC, state, {entity} LIMIT ?",
            ranking.category().table()
        );
        fetch(self, &sql, &params, |row| {
            Ok(RankedEntry {
                state: row.get(0)?,
                entity: row.get(1)?,
                value: row.get(2)?,
            })
        })
    }

    fn device_brands(&self, filter: &SliceFilter) -> Result<Vec<BrandShare>> {
        let (where_sql, params) = filter.aggregate_where()?;
        let sql = format!(
            "SELECT user_brand, SUM(user_count) AS total_users, AVG(user_percentage) \
             FROM {} {where_sql} GROUP BY user_brand ORDER BY total_users DESC, user_brand",
            Category::AggregatedUser.table()
        );
        fetch(self, &sql, &params, |row| {
            Ok(BrandShare {
                brand: row.get(0)?,
                total_users: row.get(1)?,
                avg_share: row.get(2)?,
            })
        })
    }

    fn app_opens_by_state(&self, filter: &SliceFilter) -> Result<Vec<StateValue>> {
        let (where_sql, params) = filter.aggregate_where()?;
        let sql = format!(
            "SELECT state, SUM(app_opens) FROM {} {where_sql} GROUP BY state ORDER BY state",
            Category::MapUser.table()
        );
        fetch(self, &sql, &params, |row| {
            Ok(StateValue {
                state: row.get(0)?,
                value: row.get(1)?,
            })
        })
    }

    fn quarterly_trend(
        &self,
        category: Category,
        filter: &SliceFilter,
        transaction_type: Option<&str>,
    ) -> Result<Vec<QuarterTotal>> {
        require_shape(category, Shape::Transaction)?;
        let (mut where_sql, mut params) = filter.aggregate_where()?;
        push_type_filter(&mut where_sql, &mut params, transaction_type);
        let sql = format!(
            "SELECT year, quarter, SUM(transaction_amount), SUM(transaction_count) \
             FROM {} {where_sql} GROUP BY year, quarter ORDER BY year, quarter",
            category.table()
        );
        fetch(self, &sql, &params, |row| {
            Ok(QuarterTotal {
                year: row.get(0)?,
                quarter: row.get(1)?,
                total_amount: row.get(2)?,
                total_count: row.get(3)?,
            })
        })
    }

    fn transaction_types(&self, category: Category) -> Result<Vec<String>> {
        require_shape(category, Shape::Transaction)?;
        let sql = format!(
            "SELECT DISTINCT transaction_type FROM {} ORDER BY transaction_type",
            category.table()
        );
        fetch(self, &sql, &[], |row| row.get(0))
    }

    fn years(&self, category: Category) -> Result<Vec<u16>> {
        let sql = format!("SELECT DISTINCT year FROM {} ORDER BY year", category.table());
        fetch(self, &sql, &[], |row| row.get(0))
    }
}

// -----------------------------------------------------------------------------
// HELPERS
// -----------------------------------------------------------------------------

fn fetch<T, F>(store: &Store, sql: &str, params: &[Value], f: F) -> Result<Vec<T>>
where
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    debug!(sql, params = params.len(), "query");
    let mut stmt = store
        .conn()
        .prepare(sql)
        .map_err(PulseError::query_backend)?;
    let rows = stmt
        .query_map(params_from_iter(params.iter()), f)
        .map_err(PulseError::query_backend)?;
    rows.collect::<rusqlite::Result<Vec<T>>>()
        .map_err(PulseError::query_backend)
}

fn require_shape(category: Category, shape: Shape) -> Result<()> {
    if category.shape() == shape {
        Ok(())
    } else {
        Err(PulseError::invalid_query(format!(
            "{category} has no transaction_type column; use aggregated-transaction or aggregated-insurance"
        )))
    }
}

fn push_type_filter(sql: &mut String, params: &mut Vec<Value>, transaction_type: Option<&str>) {
    if let Some(t) = transaction_type {
        sql.push_str(" AND LOWER(transaction_type) = LOWER(?)");
        params.push(Value::Text(t.to_string()));
    }
}

fn slice_from_row(row: &Row<'_>) -> rusqlite::Result<Slice> {
    Ok(Slice {
        state: row.get(0)?,
        year: row.get(1)?,
        quarter: row.get(2)?,
    })
}

fn level_from_row(row: &Row<'_>, idx: usize) -> rusqlite::Result<EntityLevel> {
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e: String| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into())
    })
}

/// Columns 3.. of a `rows` result, decoded by shape.
fn entry_from_row(shape: Shape, row: &Row<'_>) -> rusqlite::Result<Entry> {
    Ok(match shape {
        Shape::Transaction => Entry::Transaction {
            name: row.get(3)?,
            count: row.get(4)?,
            amount: row.get(5)?,
        },
        Shape::Device => Entry::Device {
            brand: row.get(3)?,
            count: row.get(4)?,
            percentage: row.get(5)?,
        },
        Shape::DistrictMetric => Entry::DistrictMetric {
            district: row.get(3)?,
            count: row.get(4)?,
            amount: row.get(5)?,
        },
        Shape::DistrictUsers => Entry::DistrictUsers {
            district: row.get(3)?,
            registered_users: row.get(4)?,
            app_opens: row.get(5)?,
        },
        Shape::TopMetric => Entry::TopMetric {
            level: level_from_row(row, 3)?,
            entity: row.get(4)?,
            count: row.get(5)?,
            amount: row.get(6)?,
        },
        Shape::TopUsers => Entry::TopUsers {
            level: level_from_row(row, 3)?,
            entity: row.get(4)?,
            registered_users: row.get(5)?,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(state: &str, year: u16, quarter: u8, name: &str, count: i64, amount: f64) -> FlatRecord {
        FlatRecord::new(
            Slice::new(state, year, quarter),
            Entry::Transaction {
                name: name.into(),
                count,
                amount,
            },
        )
    }

    fn seeded() -> Store {
        let mut store = Store::open_in_memory().unwrap();
        store
            .load(
                Category::AggregatedTransaction,
                vec![
                    tx("goa", 2022, 1, "Recharge", 10, 100.0),
                    tx("goa", 2022, 1, "Merchant payments", 5, 300.0),
                    tx("kerala", 2022, 1, "Recharge", 20, 200.0),
                    tx("kerala", 2022, 2, "Recharge", 1, 50.0),
                    tx("india", 2022, 1, "Recharge", 30, 300.0),
                ],
            )
            .unwrap();
        store
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        assert!(SliceFilter::new().quarter(5).validate().unwrap_err().is_query());
        assert!(SliceFilter::new().quarter(0).validate().is_err());
        assert!(SliceFilter::new().year(0).validate().is_err());
        assert!(SliceFilter::new().state("   ").validate().is_err());
        assert!(SliceFilter::new().state("Goa").year(2022).quarter(4).validate().is_ok());
    }

    #[test]
    fn matches_mirrors_sql_predicate() {
        let slice = Slice::new("jammu-&-kashmir", 2021, 3);
        assert!(SliceFilter::new().matches(&slice));
        assert!(SliceFilter::new().state("Jammu & Kashmir").quarter(3).matches(&slice));
        assert!(!SliceFilter::new().year(2020).matches(&slice));
    }

    #[test]
    fn rows_filter_conjunctively() {
        let store = seeded();
        assert_eq!(store.rows(Category::AggregatedTransaction, &SliceFilter::new()).unwrap().len(), 5);
        let kerala_q1 = SliceFilter::new().state("Kerala").quarter(1);
        let rows = store.rows(Category::AggregatedTransaction, &kerala_q1).unwrap();
        assert_eq!(rows, vec![tx("kerala", 2022, 1, "Recharge", 20, 200.0)]);
    }

    #[test]
    fn unmatched_filter_is_empty_not_error() {
        let store = seeded();
        let rows = store
            .rows(Category::AggregatedTransaction, &SliceFilter::new().year(2018))
            .unwrap();
        assert!(rows.is_empty());
        assert!(store
            .rank(Ranking::StatesByTransactionAmount, &SliceFilter::new().year(2018), 10)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn invalid_filter_is_a_query_error() {
        let store = seeded();
        let err = store
            .rows(Category::AggregatedTransaction, &SliceFilter::new().quarter(9))
            .unwrap_err();
        assert!(err.is_query());
    }

    #[test]
    fn state_amounts_skip_country_rollup() {
        let store = seeded();
        let q1 = SliceFilter::new().year(2022).quarter(1);
        let totals = store
            .state_amounts(Category::AggregatedTransaction, &q1, None)
            .unwrap();
        let states: Vec<&str> = totals.iter().map(|t| t.state.as_str()).collect();
        assert_eq!(states, vec!["goa", "kerala"]);
        assert_eq!(totals[0].total_amount, 400.0);
        assert_eq!(totals[0].avg_amount, 200.0);
        assert_eq!(totals[0].total_count, 15);

        let india = store
            .state_amounts(Category::AggregatedTransaction, &q1.clone().state("india"), None)
            .unwrap();
        assert_eq!(india.len(), 1);
        assert_eq!(india[0].total_amount, 300.0);
    }

    #[test]
    fn transaction_type_filter_ignores_case() {
        let store = seeded();
        let totals = store
            .state_amounts(Category::AggregatedTransaction, &SliceFilter::new(), Some("RECHARGE"))
            .unwrap();
        assert_eq!(totals.iter().map(|t| t.total_count).sum::<i64>(), 31);
    }

    #[test]
    fn state_amounts_reject_non_transaction_tables() {
        let store = seeded();
        let err = store
            .state_amounts(Category::MapUser, &SliceFilter::new(), None)
            .unwrap_err();
        assert!(err.is_query());
    }

    #[test]
    fn rank_orders_descending_and_limits() {
        let store = seeded();
        let top = store
            .rank(Ranking::StatesByTransactionAmount, &SliceFilter::new(), 1)
            .unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].state, "goa");
        assert_eq!(top[0].value, 400.0);

        assert!(store
            .rank(Ranking::StatesByTransactionAmount, &SliceFilter::new(), 0)
            .unwrap_err()
            .is_query());
    }

    #[test]
    fn trend_types_and_years() {
        let store = seeded();
        let trend = store
            .quarterly_trend(Category::AggregatedTransaction, &SliceFilter::new().year(2022), None)
            .unwrap();
        assert_eq!(trend.len(), 2);
        assert_eq!((trend[0].quarter, trend[0].total_amount), (1, 600.0));
        assert_eq!((trend[1].quarter, trend[1].total_count), (2, 1));

        assert_eq!(
            store.transaction_types(Category::AggregatedTransaction).unwrap(),
            vec!["Merchant payments".to_string(), "Recharge".to_string()]
        );
        assert_eq!(store.years(Category::AggregatedTransaction).unwrap(), vec![2022]);
        assert!(store.years(Category::TopUser).unwrap().is_empty());
    }

    #[test]
    fn rows_rebuild_top_entries() {
        let mut store = Store::open_in_memory().unwrap();
        let record = FlatRecord::new(
            Slice::new("goa", 2023, 2),
            Entry::TopUsers {
                level: EntityLevel::Pincode,
                entity: "403001".into(),
                registered_users: 77,
            },
        );
        store.load(Category::TopUser, vec![record.clone()]).unwrap();
        assert_eq!(store.rows(Category::TopUser, &SliceFilter::new()).unwrap(), vec![record]);

        let ranked = store
            .rank(Ranking::PincodesByRegisteredUsers, &SliceFilter::new(), 10)
            .unwrap();
        assert_eq!(ranked[0].entity, "403001");
        assert_eq!(ranked[0].value, 77.0);
    }

    #[test]
    fn ranking_names_parse_back() {
        for r in Ranking::ALL {
            assert_eq!(r.name().parse::<Ranking>().unwrap(), r);
        }
        assert!("top-states".parse::<Ranking>().is_err());
    }
}
