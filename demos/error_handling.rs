//! Error handling example for pulse-rs
//!
//! Shows what each failure mode looks like and which ones are not failures
//! at all (an empty query result).

use pulse_core::{
    extract_str, Category, DashboardQueries, Ingestor, PulseError, Ranking, Slice, SliceFilter,
    SourceTree, Store,
};
use std::fs;

fn main() -> Result<(), PulseError> {
    println!("=== pulse-rs Error Handling Example ===\n");

    // Example 1: Missing data directory
    println!("--- Example 1: Data directory that does not exist ---");
    match SourceTree::new("/definitely/not/here") {
        Ok(_) => println!("  unexpected: tree opened"),
        Err(e) => println!("  ✗ {e}"),
    }
    println!();

    // Example 2: A document that does not fit its category
    println!("--- Example 2: Malformed document ---");
    let slice = Slice::new("punjab", 2022, 1);
    match extract_str(
        Category::AggregatedTransaction,
        slice,
        r#"{"data":{"transactionData":"oops"}}"#,
    ) {
        Ok(records) => println!("  unexpected: {} records", records.count()),
        Err(e) => println!("  ✗ parse error: {}", e.is_parse()),
    }
    println!();

    // Example 3: One bad file aborts the whole ingest
    println!("--- Example 3: Ingest stops at the first bad file ---");
    let dir = tempfile::tempdir()?;
    let good = dir
        .path()
        .join("aggregated/transaction/country/india/state/goa/2022");
    fs::create_dir_all(&good)?;
    fs::write(
        good.join("1.json"),
        r#"{"data":{"transactionData":[{"name":"Recharge","count":1,"amount":10.0}]}}"#,
    )?;
    fs::write(good.join("2.json"), "{ not json")?;
    let tree = SourceTree::new(dir.path())?;
    let mut store = Store::open_in_memory()?;
    match Ingestor::new(&tree, &mut store).run() {
        Ok(report) => println!("  unexpected: {} rows", report.rows()),
        Err(e) => println!("  ✗ {e}"),
    }
    let left = store.rows(Category::AggregatedTransaction, &SliceFilter::new())?;
    println!("  rows left behind: {}", left.len());
    println!();

    // Example 4: Invalid filter values are query errors
    println!("--- Example 4: Invalid filters ---");
    for filter in [
        SliceFilter::new().quarter(7),
        SliceFilter::new().year(0),
        SliceFilter::new().state("   "),
    ] {
        match store.rows(Category::AggregatedTransaction, &filter) {
            Ok(rows) => println!("  unexpected: {} rows", rows.len()),
            Err(e) => println!("  ✗ query error ({}): {e}", e.is_query()),
        }
    }
    match store.rank(Ranking::StatesByTransactionAmount, &SliceFilter::new(), 0) {
        Ok(_) => println!("  unexpected: limit 0 accepted"),
        Err(e) => println!("  ✗ {e}"),
    }
    println!();

    // Example 5: No match is an empty result
    println!("--- Example 5: Valid filter, no data ---");
    let rows = store.rows(
        Category::MapUser,
        &SliceFilter::new().state("Kerala").year(2030),
    )?;
    println!("  ✓ {} rows", rows.len());

    // Example 6: Configuration
    println!("\n--- Example 6: Unsupported database URL ---");
    match Store::open_url("") {
        Ok(_) => println!("  unexpected: opened"),
        Err(e) => println!("  ✗ {e}"),
    }

    Ok(())
}
