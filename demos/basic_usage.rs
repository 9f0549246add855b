//! Basic usage example for pulse-rs
//!
//! This example demonstrates how to:
//! - Lay out a tiny data tree the way the upstream checkout does
//! - Ingest it into an in-memory store
//! - Read the flattened rows back with and without a filter

use pulse_core::{
    Category, DashboardQueries, Ingestor, PulseError, SliceFilter, SourceTree, Store,
};
use std::fs;
use std::path::Path;

fn write(root: &Path, rel: &str, body: &str) -> std::io::Result<()> {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, body)
}

fn main() -> Result<(), PulseError> {
    println!("=== pulse-rs Basic Usage Example ===\n");

    let dir = tempfile::tempdir()?;
    let root = dir.path();
    write(
        root,
        "aggregated/transaction/country/india/2022/1.json",
        r#"{"data":{"transactionData":[{"name":"Recharge","count":100,"amount":5000.0}]}}"#,
    )?;
    write(
        root,
        "aggregated/transaction/country/india/state/tamil-nadu/2022/1.json",
        r#"{"data":{"transactionData":[
            {"name":"Recharge","paymentInstruments":[{"type":"TOTAL","count":42,"amount":2100.5}]},
            {"name":"Merchant payments","paymentInstruments":[{"type":"TOTAL","count":18,"amount":9000.0}]}
        ]}}"#,
    )?;
    write(
        root,
        "aggregated/transaction/country/india/state/tamil-nadu/2022/2.json",
        r#"{"data":{"transactionData":[
            {"name":"Recharge","paymentInstruments":[{"type":"TOTAL","count":50,"amount":2500.0}]}
        ]}}"#,
    )?;

    // Example 1: Ingest
    println!("--- Example 1: Ingest the tree ---");
    let tree = SourceTree::new(root)?;
    let mut store = Store::open_in_memory()?;
    let report = Ingestor::new(&tree, &mut store)
        .categories(&[Category::AggregatedTransaction])
        .run()?;
    for c in &report.categories {
        println!(
            "{} -> {}: {} documents, {} rows",
            c.category,
            c.category.table(),
            c.documents,
            c.rows
        );
    }
    println!();

    // Example 2: Every row
    println!("--- Example 2: All rows ---");
    for record in store.rows(Category::AggregatedTransaction, &SliceFilter::new())? {
        println!("  {} {:?}", record.slice, record.entry);
    }
    println!();

    // Example 3: Filtered rows; display names are folded to slugs
    println!("--- Example 3: Tamil Nadu, 2022 Q1 ---");
    let filter = SliceFilter::new().state("Tamil Nadu").year(2022).quarter(1);
    for record in store.rows(Category::AggregatedTransaction, &filter)? {
        println!("  {:?}", record.entry);
    }
    println!();

    // Example 4: Nothing matches -> empty, not an error
    println!("--- Example 4: A quarter with no data ---");
    let none = store.rows(
        Category::AggregatedTransaction,
        &SliceFilter::new().year(2022).quarter(4),
    )?;
    println!("  rows: {}", none.len());

    Ok(())
}
