// crates/pulse-core/src/store.rs

//! # Bulk Loader
//!
//! A [`Store`] owns one SQLite connection. There is no process-wide
//! connection: callers open a store for an operation and the connection is
//! closed when the value is dropped, on every exit path.

use crate::category::Category;
use crate::config::check_database_url;
use crate::error::{PulseError, Result};
use crate::record::{Entry, FlatRecord};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::path::Path;
use tracing::{debug, info};

/// Bound-parameter ceiling per statement (SQLite's historical default).
const MAX_PARAMS: usize = 999;

/// Relational store holding one table per [`Category`].
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (or create) a file-backed store and make sure every table exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref()).map_err(PulseError::Storage)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(PulseError::Storage)?;
        Self::init(conn)
    }

    /// Open from a connection string.
    ///
    /// - `:memory:` or `sqlite::memory:` -> in-memory database
    /// - `sqlite://path/to.db` -> file at `path/to.db`
    /// - anything else is taken as a file path
    ///
    /// Server URLs (`postgres://`, `mysql://`) are a [`PulseError::Config`].
    pub fn open_url(url: &str) -> Result<Self> {
        let url = url.trim();
        check_database_url(url)?;
        match url {
            "" => Err(PulseError::Config("database url is empty".into())),
            ":memory:" | "sqlite::memory:" => Self::open_in_memory(),
            other => Self::open(other.strip_prefix("sqlite://").unwrap_or(other)),
        }
    }

    fn init(conn: Connection) -> Result<Self> {
        let ddl: String = Category::ALL.iter().map(|c| c.create_sql()).collect();
        conn.execute_batch(&ddl).map_err(PulseError::Storage)?;
        Ok(Self { conn })
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Insert every record into `category`'s table in one transaction, using
    /// multi-row `INSERT … VALUES` statements. Returns the number of rows
    /// written.
    ///
    /// Every record must carry the entry shape of `category`; otherwise
    /// nothing is written.
    pub fn load<I>(&mut self, category: Category, records: I) -> Result<usize>
    where
        I: IntoIterator<Item = FlatRecord>,
    {
        self.write(category, records.into_iter().collect(), false)
    }

    /// Like [`Store::load`], but the table is emptied first in the same
    /// transaction. On failure the table keeps its previous rows.
    pub fn replace<I>(&mut self, category: Category, records: I) -> Result<usize>
    where
        I: IntoIterator<Item = FlatRecord>,
    {
        self.write(category, records.into_iter().collect(), true)
    }

    fn write(
        &mut self,
        category: Category,
        records: Vec<FlatRecord>,
        clear: bool,
    ) -> Result<usize> {
        if records.is_empty() && !clear {
            return Ok(0);
        }

        let expected = category.shape();
        if let Some(bad) = records.iter().find(|r| r.entry.shape() != expected) {
            return Err(PulseError::StorageShape(format!(
                "{:?} entry for {} cannot go into table {}",
                bad.entry.shape(),
                bad.slice,
                category.table()
            )));
        }

        let width = category.column_count();
        let rows_per_stmt = (MAX_PARAMS / width).max(1);

        let tx = self.conn.transaction().map_err(PulseError::Storage)?;
        if clear {
            let removed = tx
                .execute(&format!("DELETE FROM {}", category.table()), [])
                .map_err(PulseError::Storage)?;
            debug!(table = category.table(), removed, "cleared table");
        }
        {
            let mut values: Vec<Value> = Vec::with_capacity(rows_per_stmt * width);
            for chunk in records.chunks(rows_per_stmt) {
                values.clear();
                for record in chunk {
                    push_values(record, &mut values);
                }
                let sql = insert_sql(category, chunk.len());
                let mut stmt = tx.prepare_cached(&sql).map_err(PulseError::Storage)?;
                stmt.execute(params_from_iter(values.iter()))
                    .map_err(PulseError::Storage)?;
                debug!(table = category.table(), rows = chunk.len(), "batch inserted");
            }
        }
        tx.commit().map_err(PulseError::Storage)?;

        info!(table = category.table(), rows = records.len(), "loaded");
        Ok(records.len())
    }

    /// Delete every row of `category`'s table. Returns the rows removed.
    pub fn clear(&mut self, category: Category) -> Result<usize> {
        let sql = format!("DELETE FROM {}", category.table());
        self.conn.execute(&sql, []).map_err(PulseError::Storage)
    }

    /// Row count per table, in [`Category::ALL`] order.
    pub fn row_counts(&self) -> Result<Vec<(Category, i64)>> {
        Category::ALL
            .iter()
            .map(|&c| {
                let sql = format!("SELECT COUNT(*) FROM {}", c.table());
                let n: i64 = self
                    .conn
                    .query_row(&sql, [], |r| r.get(0))
                    .map_err(PulseError::Storage)?;
                Ok((c, n))
            })
            .collect()
    }
}

fn insert_sql(category: Category, rows: usize) -> String {
    let placeholders = vec!["?"; category.column_count()].join(", ");
    let tuple = format!("({placeholders})");
    let body = vec![tuple.as_str(); rows].join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES {}",
        category.table(),
        category.insert_columns(),
        body
    )
}

/// Column values in `Category::insert_columns` order.
fn push_values(record: &FlatRecord, out: &mut Vec<Value>) {
    out.push(Value::Text(record.slice.state.clone()));
    out.push(Value::Integer(i64::from(record.slice.year)));
    out.push(Value::Integer(i64::from(record.slice.quarter)));
    match &record.entry {
        Entry::Transaction {
            name,
            count,
            amount,
        } => {
            out.push(Value::Text(name.clone()));
            out.push(Value::Integer(*count));
            out.push(Value::Real(*amount));
        }
        Entry::Device {
            brand,
            count,
            percentage,
        } => {
            out.push(Value::Text(brand.clone()));
            out.push(Value::Integer(*count));
            out.push(Value::Real(*percentage));
        }
        Entry::DistrictMetric {
            district,
            count,
            amount,
        } => {
            out.push(Value::Text(district.clone()));
            out.push(Value::Integer(*count));
            out.push(Value::Real(*amount));
        }
        Entry::DistrictUsers {
            district,
            registered_users,
            app_opens,
        } => {
            out.push(Value::Text(district.clone()));
            out.push(Value::Integer(*registered_users));
            out.push(Value::Integer(*app_opens));
        }
        Entry::TopMetric {
            level,
            entity,
            count,
            amount,
        } => {
            out.push(Value::Text(level.as_str().to_string()));
            out.push(Value::Text(entity.clone()));
            out.push(Value::Integer(*count));
            out.push(Value::Real(*amount));
        }
        Entry::TopUsers {
            level,
            entity,
            registered_users,
        } => {
            out.push(Value::Text(level.as_str().to_string()));
            out.push(Value::Text(entity.clone()));
            out.push(Value::Integer(*registered_users));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Slice;

    fn recharge(state: &str, amount: f64) -> FlatRecord {
        FlatRecord::new(
            Slice::new(state, 2022, 1),
            Entry::Transaction {
                name: "Recharge".into(),
                count: 100,
                amount,
            },
        )
    }

    fn count(store: &Store, category: Category) -> i64 {
        store
            .row_counts()
            .unwrap()
            .into_iter()
            .find(|(c, _)| *c == category)
            .map(|(_, n)| n)
            .unwrap()
    }

    #[test]
    fn fresh_store_has_empty_tables() {
        let store = Store::open_in_memory().unwrap();
        let counts = store.row_counts().unwrap();
        assert_eq!(counts.len(), 9);
        assert!(counts.iter().all(|(_, n)| *n == 0));
    }

    #[test]
    fn load_inserts_every_record() {
        let mut store = Store::open_in_memory().unwrap();
        let rows = vec![recharge("goa", 1.0), recharge("kerala", 2.0), recharge("india", 3.0)];
        assert_eq!(store.load(Category::AggregatedTransaction, rows).unwrap(), 3);
        assert_eq!(count(&store, Category::AggregatedTransaction), 3);
        assert_eq!(count(&store, Category::AggregatedInsurance), 0);
    }

    #[test]
    fn load_spans_multiple_statements() {
        let mut store = Store::open_in_memory().unwrap();
        let rows: Vec<FlatRecord> = (0..1000u32).map(|i| recharge("goa", f64::from(i))).collect();
        assert_eq!(store.load(Category::AggregatedTransaction, rows).unwrap(), 1000);
        assert_eq!(count(&store, Category::AggregatedTransaction), 1000);
    }

    #[test]
    fn empty_load_is_a_no_op() {
        let mut store = Store::open_in_memory().unwrap();
        assert_eq!(store.load(Category::MapUser, Vec::new()).unwrap(), 0);
    }

    #[test]
    fn mismatched_entry_aborts_whole_load() {
        let mut store = Store::open_in_memory().unwrap();
        let rows = vec![
            recharge("goa", 1.0),
            FlatRecord::new(
                Slice::new("goa", 2022, 1),
                Entry::DistrictUsers {
                    district: "north goa".into(),
                    registered_users: 1,
                    app_opens: 1,
                },
            ),
        ];
        let err = store.load(Category::AggregatedTransaction, rows).unwrap_err();
        assert!(err.is_storage());
        assert_eq!(count(&store, Category::AggregatedTransaction), 0);
    }

    #[test]
    fn clear_empties_one_table() {
        let mut store = Store::open_in_memory().unwrap();
        store
            .load(Category::AggregatedTransaction, vec![recharge("goa", 1.0)])
            .unwrap();
        assert_eq!(store.clear(Category::AggregatedTransaction).unwrap(), 1);
        assert_eq!(count(&store, Category::AggregatedTransaction), 0);
    }

    #[test]
    fn replace_swaps_table_contents() {
        let mut store = Store::open_in_memory().unwrap();
        store
            .load(
                Category::AggregatedTransaction,
                vec![recharge("goa", 1.0), recharge("goa", 2.0)],
            )
            .unwrap();
        let written = store
            .replace(Category::AggregatedTransaction, vec![recharge("kerala", 3.0)])
            .unwrap();
        assert_eq!(written, 1);
        assert_eq!(count(&store, Category::AggregatedTransaction), 1);

        assert_eq!(store.replace(Category::AggregatedTransaction, Vec::new()).unwrap(), 0);
        assert_eq!(count(&store, Category::AggregatedTransaction), 0);
    }

    #[test]
    fn failed_replace_keeps_previous_rows() {
        let mut store = Store::open_in_memory().unwrap();
        store
            .load(Category::AggregatedTransaction, vec![recharge("goa", 1.0)])
            .unwrap();
        store
            .conn
            .execute_batch(
                "CREATE TRIGGER agg_trans_reject BEFORE INSERT ON agg_trans \
                 BEGIN SELECT RAISE(ABORT, 'disk gone'); END;",
            )
            .unwrap();

        let err = store
            .replace(Category::AggregatedTransaction, vec![recharge("kerala", 2.0)])
            .unwrap_err();
        assert!(err.is_storage());
        assert!(err.to_string().contains("disk gone"));
        assert_eq!(count(&store, Category::AggregatedTransaction), 1);
    }

    #[test]
    fn open_url_variants() {
        assert!(Store::open_url(":memory:").is_ok());
        assert!(Store::open_url("sqlite::memory:").is_ok());
        assert!(matches!(Store::open_url("  "), Err(PulseError::Config(_))));
        assert!(matches!(
            Store::open_url("postgres://u:p@host/db"),
            Err(PulseError::Config(_))
        ));

        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("pulse.db");
        let url = format!("sqlite://{}", db.display());
        drop(Store::open_url(&url).unwrap());
        assert!(db.exists());
    }

    #[test]
    fn insert_sql_repeats_tuples() {
        let sql = insert_sql(Category::TopUser, 2);
        assert_eq!(
            sql,
            "INSERT INTO top_user (state, year, quarter, entity_level, entity_name, registered_users) \
             VALUES (?, ?, ?, ?, ?, ?), (?, ?, ?, ?, ?, ?)"
        );
    }
}
