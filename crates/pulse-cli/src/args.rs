use clap::{Args, Parser, Subcommand};
use pulse_core::{Category, Ranking, SliceFilter};
use std::path::PathBuf;

/// CLI arguments for pulse-cli
#[derive(Debug, Parser)]
#[command(
    name = "pulse",
    version,
    about = "Load the PhonePe Pulse dataset into SQLite and query it"
)]
pub struct CliArgs {
    /// Root of the upstream data/ checkout (default: $PULSE_DATA_DIR or ./data)
    #[arg(short = 'd', long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,

    /// SQLite file or :memory: (default: $PULSE_DATABASE_URL or pulse.db)
    #[arg(long = "database", global = true)]
    pub database: Option<String>,

    /// Print results as JSON instead of tables and charts
    #[arg(long = "json", global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// `--state/--year/--quarter`, shared by every query command.
#[derive(Debug, Clone, Args)]
pub struct FilterArgs {
    /// State name or slug (e.g. "Tamil Nadu", andaman-&-nicobar-islands)
    #[arg(short = 's', long = "state")]
    pub state: Option<String>,

    #[arg(short = 'y', long = "year")]
    pub year: Option<u16>,

    /// 1-4
    #[arg(short = 'q', long = "quarter")]
    pub quarter: Option<u8>,
}

impl FilterArgs {
    pub fn to_filter(&self) -> SliceFilter {
        SliceFilter {
            state: self.state.clone(),
            year: self.year,
            quarter: self.quarter,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Walk the data directory and load every document into the database
    Ingest {
        /// Only these categories (repeatable, e.g. -c map-user -c top-user)
        #[arg(short = 'c', long = "category")]
        categories: Vec<Category>,

        /// Empty each table before loading it
        #[arg(long)]
        replace: bool,
    },

    /// Show row counts per table
    Stats,

    /// Print stored rows of one category
    Rows {
        /// Category name or table name (e.g. aggregated-user, agg_user)
        category: Category,

        #[command(flatten)]
        filter: FilterArgs,

        /// Maximum rows to print
        #[arg(short = 'n', long, default_value_t = 50)]
        limit: usize,
    },

    /// Transaction totals per state
    Summary {
        #[arg(short = 'c', long = "category", default_value = "aggregated-transaction")]
        category: Category,

        /// Restrict to one transaction type (case-insensitive)
        #[arg(short = 't', long = "type")]
        transaction_type: Option<String>,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Top-N leaderboard (e.g. districts-by-transaction-amount)
    Top {
        ranking: Ranking,

        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Registered users per device brand
    Brands {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// App opens per state
    Opens {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Amount per quarter
    Trend {
        #[arg(short = 'c', long = "category", default_value = "aggregated-transaction")]
        category: Category,

        #[arg(short = 't', long = "type")]
        transaction_type: Option<String>,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Distinct transaction types
    Types {
        #[arg(short = 'c', long = "category", default_value = "aggregated-transaction")]
        category: Category,
    },

    /// Years present in a table
    Years {
        #[arg(short = 'c', long = "category", default_value = "aggregated-transaction")]
        category: Category,
    },
}
