//! pulse-cli
//! =========
//!
//! Command-line interface for `pulse-core`: loads the PhonePe Pulse dataset
//! into SQLite and prints the dashboard aggregates.
//!
//! The binary (`pulse`) is the deliverable; this library target only carries
//! the overview so the crate has a rendered documentation page.
//!
//! Quick start
//! -----------
//!
//! ```text
//! git clone https://github.com/PhonePe/pulse.git
//! PULSE_DATA_DIR=pulse/data pulse ingest
//! pulse stats
//! pulse summary --year 2022 --quarter 1
//! pulse top states-by-transaction-amount -n 5
//! pulse brands --state karnataka --json
//! ```
//!
//! For programmatic access use the `pulse-core` crate directly.
#![cfg_attr(docsrs, feature(doc_cfg))]
