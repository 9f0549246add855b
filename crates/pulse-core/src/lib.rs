// crates/pulse-core/src/lib.rs

//! # pulse-core
//!
//! Loads the PhonePe Pulse JSON dataset into SQLite and answers the
//! dashboard's aggregate questions over it.
//!
//! ```text
//! data/<category>/…/<state>/<year>/<quarter>.json
//!     -> SourceTree (walker)  -> extract() -> FlatRecord
//!     -> Store::load          -> one table per Category
//!     -> DashboardQueries     -> typed result rows -> render
//! ```
//!
//! ```no_run
//! use pulse_core::{DashboardQueries, Ingestor, SliceFilter, SourceTree, Store};
//!
//! let tree = SourceTree::new("data")?;
//! let mut store = Store::open("pulse.db")?;
//! let report = Ingestor::new(&tree, &mut store).run()?;
//! println!("loaded {} rows", report.rows());
//!
//! let q1 = SliceFilter::new().year(2022).quarter(1);
//! for brand in store.device_brands(&q1)? {
//!     println!("{}: {}", brand.brand, brand.total_users);
//! }
//! # Ok::<(), pulse_core::PulseError>(())
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod category;
pub mod config;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod query;
// Parse-time schema of the upstream documents
#[doc(hidden)]
pub mod raw;
pub mod record;
pub mod render;
pub mod store;
pub mod text;
pub mod walker;

// Re-exports
pub use crate::category::{Category, Shape};
pub use crate::config::Settings;
pub use crate::error::{PulseError, Result};
pub use crate::extract::{extract, extract_document, extract_str, Records};
pub use crate::ingest::{CategoryReport, IngestReport, Ingestor};
pub use crate::query::{
    BrandShare, DashboardQueries, QuarterTotal, RankedEntry, Ranking, SliceFilter, StateAmount,
    StateValue,
};
pub use crate::record::{EntityLevel, Entry, FlatRecord, Slice};
pub use crate::store::Store;
pub use crate::walker::{DocumentPath, SourceTree};
