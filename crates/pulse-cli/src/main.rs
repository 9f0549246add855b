//! pulse — Command-line interface for pulse-core
//!
//! Loads the PhonePe Pulse dataset into a SQLite database and prints the
//! dashboard's aggregates as tables and bar charts in the terminal.
//!
//! Usage examples
//! --------------
//!
//! - Load everything below ./data into ./pulse.db
//!   $ pulse ingest
//!
//! - Reload only the user maps, replacing what was there
//!   $ pulse ingest -c map-user --replace
//!
//! - Row counts per table
//!   $ pulse stats
//!
//! - Transaction totals per state for 2022 Q1
//!   $ pulse summary -y 2022 -q 1
//!
//! - Top 10 districts by transaction amount in Karnataka
//!   $ pulse top districts-by-transaction-amount -s karnataka -y 2023 -q 4
//!
//! - Same, as JSON
//!   $ pulse --json top districts-by-transaction-amount -s karnataka
//!
//! Configuration
//! -------------
//!
//! `PULSE_DATA_DIR`, `PULSE_DATABASE_URL` and `RUST_LOG` are read from the
//! environment (or a `.env` file) once at start-up; `--data-dir` and
//! `--database` override them.
mod args;

use crate::args::{CliArgs, Commands};
use anyhow::Context;
use clap::Parser;
use pulse_core::render::{bar_chart, percent, table, thousands};
use pulse_core::text::display_name;
use pulse_core::{DashboardQueries, Entry, Ingestor, Settings, SourceTree, Store};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

const CHART_WIDTH: usize = 40;

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let settings = Settings::global()
        .with_overrides(args.data_dir.clone(), args.database.clone())
        .context("reading configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&settings.log_filter))
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!(?settings, "configuration");

    let data_dir = settings.data_dir;
    let database = settings.database_url;

    // One store per invocation; closed when `store` drops.
    let mut store =
        Store::open_url(&database).with_context(|| format!("opening database {database}"))?;

    match args.command {
        Commands::Ingest {
            categories,
            replace,
        } => {
            let tree = SourceTree::new(&data_dir)
                .with_context(|| format!("reading data directory {}", data_dir.display()))?;
            let report = Ingestor::new(&tree, &mut store)
                .categories(&categories)
                .replace(replace)
                .run()
                .context("ingestion aborted")?;

            if args.json {
                print_json(&report)?;
            } else {
                let rows: Vec<Vec<String>> = report
                    .categories
                    .iter()
                    .map(|c| {
                        vec![
                            c.category.to_string(),
                            c.category.table().to_string(),
                            thousands(c.documents as f64),
                            thousands(c.rows as f64),
                        ]
                    })
                    .collect();
                print!("{}", table(&["Category", "Table", "Documents", "Rows"], &rows));
                println!(
                    "Loaded {} rows from {} documents into {database}",
                    thousands(report.rows() as f64),
                    thousands(report.documents() as f64)
                );
            }
        }

        Commands::Stats => {
            let counts = store.row_counts()?;
            if args.json {
                let map: Vec<(String, i64)> = counts
                    .iter()
                    .map(|(c, n)| (c.table().to_string(), *n))
                    .collect();
                print_json(&map)?;
            } else {
                println!("Database statistics ({database}):");
                for (category, n) in counts {
                    println!("  {:<14} {:>12}", category.table(), thousands(n as f64));
                }
            }
        }

        Commands::Rows {
            category,
            filter,
            limit,
        } => {
            let rows = store.rows(category, &filter.to_filter())?;
            let shown: Vec<_> = rows.into_iter().take(limit).collect();
            if args.json {
                print_json(&shown)?;
            } else if shown.is_empty() {
                println!("No rows in {} matching the filter", category.table());
            } else {
                let body: Vec<Vec<String>> = shown
                    .iter()
                    .map(|r| {
                        let mut cells = vec![
                            r.slice.state.clone(),
                            r.slice.year.to_string(),
                            r.slice.quarter.to_string(),
                        ];
                        cells.extend(entry_cells(&r.entry));
                        cells
                    })
                    .collect();
                let mut headers = vec!["state", "year", "quarter"];
                headers.extend(category.shape().columns().iter().map(|c| c.name));
                print!("{}", table(&headers, &body));
            }
        }

        Commands::Summary {
            category,
            transaction_type,
            filter,
        } => {
            let totals =
                store.state_amounts(category, &filter.to_filter(), transaction_type.as_deref())?;
            if args.json {
                print_json(&totals)?;
            } else {
                let grand: f64 = totals.iter().map(|t| t.total_amount).sum();
                let rows: Vec<Vec<String>> = totals
                    .iter()
                    .map(|t| {
                        vec![
                            display_name(&t.state),
                            thousands(t.total_amount),
                            thousands(t.avg_amount),
                            thousands(t.total_count as f64),
                            percent(t.total_amount, grand),
                        ]
                    })
                    .collect();
                print!(
                    "{}",
                    table(&["State", "Total Amount", "Avg Amount", "Count", "Share"], &rows)
                );
            }
        }

        Commands::Top {
            ranking,
            limit,
            filter,
        } => {
            let entries = store.rank(ranking, &filter.to_filter(), limit)?;
            if args.json {
                print_json(&entries)?;
            } else {
                let items: Vec<(String, f64)> = entries
                    .iter()
                    .map(|e| {
                        let label = if e.entity == e.state {
                            display_name(&e.state)
                        } else {
                            format!("{} ({})", e.entity, display_name(&e.state))
                        };
                        (label, e.value)
                    })
                    .collect();
                print!("{}", bar_chart(&format!("Top {limit}: {ranking}"), &items, CHART_WIDTH));
            }
        }

        Commands::Brands { filter } => {
            let brands = store.device_brands(&filter.to_filter())?;
            if args.json {
                print_json(&brands)?;
            } else {
                let items: Vec<(String, f64)> = brands
                    .iter()
                    .map(|b| (b.brand.clone(), b.total_users as f64))
                    .collect();
                print!("{}", bar_chart("Registered users by device brand", &items, CHART_WIDTH));
            }
        }

        Commands::Opens { filter } => {
            let opens = store.app_opens_by_state(&filter.to_filter())?;
            if args.json {
                print_json(&opens)?;
            } else {
                let items: Vec<(String, f64)> = opens
                    .iter()
                    .map(|s| (display_name(&s.state), s.value as f64))
                    .collect();
                print!("{}", bar_chart("App opens by state", &items, CHART_WIDTH));
            }
        }

        Commands::Trend {
            category,
            transaction_type,
            filter,
        } => {
            let trend =
                store.quarterly_trend(category, &filter.to_filter(), transaction_type.as_deref())?;
            if args.json {
                print_json(&trend)?;
            } else {
                let items: Vec<(String, f64)> = trend
                    .iter()
                    .map(|t| (format!("{} Q{}", t.year, t.quarter), t.total_amount))
                    .collect();
                let title = match &transaction_type {
                    Some(t) => format!("Quarterly {t} amount ({category})"),
                    None => format!("Quarterly amount ({category})"),
                };
                print!("{}", bar_chart(&title, &items, CHART_WIDTH));
            }
        }

        Commands::Types { category } => {
            let types = store.transaction_types(category)?;
            if args.json {
                print_json(&types)?;
            } else {
                for t in types {
                    println!("{t}");
                }
            }
        }

        Commands::Years { category } => {
            let years = store.years(category)?;
            if args.json {
                print_json(&years)?;
            } else {
                for y in years {
                    println!("{y}");
                }
            }
        }
    }

    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Entry values in `Shape::columns` order, formatted for a table cell.
fn entry_cells(entry: &Entry) -> Vec<String> {
    match entry {
        Entry::Transaction {
            name,
            count,
            amount,
        } => vec![name.clone(), count.to_string(), format!("{amount:.2}")],
        Entry::Device {
            brand,
            count,
            percentage,
        } => vec![brand.clone(), count.to_string(), format!("{percentage:.4}")],
        Entry::DistrictMetric {
            district,
            count,
            amount,
        } => vec![district.clone(), count.to_string(), format!("{amount:.2}")],
        Entry::DistrictUsers {
            district,
            registered_users,
            app_opens,
        } => vec![
            district.clone(),
            registered_users.to_string(),
            app_opens.to_string(),
        ],
        Entry::TopMetric {
            level,
            entity,
            count,
            amount,
        } => vec![
            level.as_str().to_string(),
            entity.clone(),
            count.to_string(),
            format!("{amount:.2}"),
        ],
        Entry::TopUsers {
            level,
            entity,
            registered_users,
        } => vec![
            level.as_str().to_string(),
            entity.clone(),
            registered_users.to_string(),
        ],
    }
}
