//! Dashboard queries example for pulse-rs
//!
//! Builds a small multi-category tree, loads it, then runs the aggregate
//! queries the dashboard is drawn from and renders them in the terminal.

use pulse_core::render::{bar_chart, percent, table, thousands};
use pulse_core::text::display_name;
use pulse_core::{
    Category, DashboardQueries, Ingestor, PulseError, Ranking, SliceFilter, SourceTree, Store,
};
use std::fs;
use std::path::Path;

fn write(root: &Path, rel: &str, body: String) -> std::io::Result<()> {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, body)
}

fn main() -> Result<(), PulseError> {
    println!("=== pulse-rs Dashboard Queries Example ===\n");

    let dir = tempfile::tempdir()?;
    let root = dir.path();

    let states = [
        ("karnataka", 9_000, 18_500_000.0, "bengaluru urban", "560001", 6_100_000),
        ("maharashtra", 11_000, 21_000_000.0, "pune", "411001", 4_800_000),
        ("goa", 700, 1_200_000.0, "north goa", "403001", 350_000),
    ];
    for (year, scale) in [(2021u16, 1.0f64), (2022, 1.4)] {
        for (state, count, amount, district, pincode, users) in states {
            let count = (count as f64 * scale) as i64;
            let amount = amount * scale;
            write(
                root,
                &format!("aggregated/transaction/country/india/state/{state}/{year}/1.json"),
                format!(
                    r#"{{"data":{{"transactionData":[
                        {{"name":"Peer-to-peer payments","paymentInstruments":[{{"type":"TOTAL","count":{count},"amount":{amount}}}]}},
                        {{"name":"Recharge & bill payments","paymentInstruments":[{{"type":"TOTAL","count":{},"amount":{}}}]}}
                    ]}}}}"#,
                    count / 3,
                    amount / 10.0
                ),
            )?;
            write(
                root,
                &format!("aggregated/user/country/india/state/{state}/{year}/1.json"),
                format!(
                    r#"{{"data":{{"usersByDevice":[
                        {{"brand":"Xiaomi","count":{},"percentage":0.6}},
                        {{"brand":"Samsung","count":{},"percentage":0.4}}
                    ]}}}}"#,
                    users * 6 / 10,
                    users * 4 / 10
                ),
            )?;
            write(
                root,
                &format!("map/user/hover/country/india/state/{state}/{year}/1.json"),
                format!(
                    r#"{{"data":{{"hoverData":{{"{district}":{{"registeredUsers":{users},"appOpens":{}}}}}}}}}"#,
                    users * 12
                ),
            )?;
            write(
                root,
                &format!("top/transaction/country/india/state/{state}/{year}/1.json"),
                format!(
                    r#"{{"data":{{"states":null,"districts":null,
                        "pincodes":[{{"entityName":"{pincode}","metric":{{"type":"TOTAL","count":{count},"amount":{amount}}}}}]}}}}"#
                ),
            )?;
        }
    }

    let tree = SourceTree::new(root)?;
    let mut store = Store::open_in_memory()?;
    let report = Ingestor::new(&tree, &mut store).run()?;
    println!(
        "Loaded {} rows from {} documents\n",
        report.rows(),
        report.documents()
    );

    let q1_2022 = SliceFilter::new().year(2022).quarter(1);

    // Example 1: State totals as a table
    println!("--- Example 1: Transaction totals, 2022 Q1 ---");
    let totals = store.state_amounts(
        Category::AggregatedTransaction,
        &q1_2022,
        None,
    )?;
    let grand: f64 = totals.iter().map(|t| t.total_amount).sum();
    let rows: Vec<Vec<String>> = totals
        .iter()
        .map(|t| {
            vec![
                display_name(&t.state),
                thousands(t.total_amount),
                thousands(t.total_count as f64),
                percent(t.total_amount, grand),
            ]
        })
        .collect();
    print!("{}", table(&["State", "Amount", "Count", "Share"], &rows));
    println!();

    // Example 2: One transaction type only
    println!("--- Example 2: Recharge & bill payments only ---");
    let recharge = store.state_amounts(
        Category::AggregatedTransaction,
        &q1_2022,
        Some("recharge & bill payments"),
    )?;
    for t in &recharge {
        println!("  {:<14} {}", display_name(&t.state), thousands(t.total_amount));
    }
    println!();

    // Example 3: Leaderboards
    for ranking in [
        Ranking::StatesByTransactionAmount,
        Ranking::PincodesByTransactionAmount,
        Ranking::DistrictsByRegisteredUsers,
    ] {
        let top = store.rank(ranking, &q1_2022, 3)?;
        let items: Vec<(String, f64)> = top.iter().map(|e| (e.entity.clone(), e.value)).collect();
        print!("{}", bar_chart(&ranking.to_string(), &items, 30));
        println!();
    }

    // Example 4: Device brands and app opens
    let brands = store.device_brands(&q1_2022)?;
    let items: Vec<(String, f64)> = brands
        .iter()
        .map(|b| (b.brand.clone(), b.total_users as f64))
        .collect();
    print!("{}", bar_chart("Users by brand", &items, 30));
    println!();

    let opens = store.app_opens_by_state(&SliceFilter::new().state("Karnataka"))?;
    for s in &opens {
        println!("App opens in {}: {}", display_name(&s.state), thousands(s.value as f64));
    }
    println!();

    // Example 5: Quarter-over-quarter trend
    let trend = store.quarterly_trend(
        Category::AggregatedTransaction,
        &SliceFilter::new(),
        None,
    )?;
    let items: Vec<(String, f64)> = trend
        .iter()
        .map(|t| (format!("{} Q{}", t.year, t.quarter), t.total_amount))
        .collect();
    print!("{}", bar_chart("Quarterly transaction amount", &items, 30));

    Ok(())
}
