//! Command-line interface definitions.
//!
//! Defines the `marketrun` command tree with `clap`. Every command accepts the
//! global `--json`, `--quiet`, `--color`, `--config` and `--database` flags.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;

use super::paths;
use crate::domain::expense::{ExpenseKind, SplitMethod};
use crate::domain::order::OrderStatus;

/// Multi-store purchasing: consolidate demand, allocate batch costs, bill stores
#[derive(Parser, Debug)]
#[command(name = "marketrun")]
#[command(version, about)]
pub struct Cli {
    /// Color output mode [auto, always, never]
    #[arg(
        long,
        global = true,
        default_value = "auto",
        hide_possible_values = true
    )]
    pub color: ColorChoice,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to the configuration file
    #[arg(short, long, global = true, default_value_os_t = paths::default_config())]
    pub config: PathBuf,

    /// Override the ledger database path
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Color output mode for terminal rendering.
#[derive(Clone, Debug, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect automatically
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show outstanding demand to buy
    Consolidate(ConsolidateArgs),

    /// Record and inspect purchase batches
    #[command(subcommand)]
    Batch(BatchCommand),

    /// Generate, inspect and confirm daily bills
    #[command(subcommand)]
    Bill(BillCommand),

    /// Submit and manage store orders
    #[command(subcommand)]
    Order(OrderCommand),

    /// Record shared expenses
    #[command(subcommand)]
    Expense(ExpenseCommand),

    /// Import and inspect the catalog
    #[command(subcommand)]
    Catalog(CatalogCommand),

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Arguments for `marketrun consolidate`.
#[derive(Parser, Debug)]
pub struct ConsolidateArgs {
    /// Group by market stall instead of by product
    #[arg(long)]
    pub by_stall: bool,

    /// Only orders for this delivery date (YYYY-MM-DD; stall view only)
    #[arg(long, requires = "by_stall")]
    pub date: Option<NaiveDate>,
}

#[derive(Subcommand, Debug)]
pub enum BatchCommand {
    /// Submit a purchase batch from a TOML file and allocate its cost
    Submit {
        /// Batch file
        file: PathBuf,
    },
    /// Show one batch with its items
    Show {
        /// Batch id
        id: String,
    },
    /// List batches, newest first
    List,
}

#[derive(Subcommand, Debug)]
pub enum BillCommand {
    /// Generate (or regenerate) bills for a delivery date
    Generate {
        /// Delivery date (YYYY-MM-DD)
        date: NaiveDate,
    },
    /// List bills
    List {
        /// Only bills for this date
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Only bills for this store (name or id)
        #[arg(long)]
        store: Option<String>,
    },
    /// Show one bill with its detail
    Show {
        /// Bill id
        id: String,
    },
    /// Confirm a bill
    Confirm {
        /// Bill id
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum OrderCommand {
    /// Submit an order from a TOML file
    Submit {
        /// Order file
        file: PathBuf,
    },
    /// List orders
    List {
        /// Only orders in this status
        #[arg(long)]
        status: Option<OrderStatus>,
        /// Only orders for this store (name or id)
        #[arg(long)]
        store: Option<String>,
        /// Only orders for this delivery date
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Show one order with its items
    Show {
        /// Order id
        id: String,
    },
    /// Approve a pending order
    Approve {
        /// Order id
        id: String,
    },
    /// Cancel an order that is not yet delivered
    Cancel {
        /// Order id
        id: String,
    },
}

/// Arguments for `marketrun expense add`.
#[derive(Parser, Debug)]
pub struct ExpenseAddArgs {
    /// Expense date (YYYY-MM-DD)
    #[arg(long)]
    pub date: NaiveDate,

    /// transport, labor, ice or other
    #[arg(long)]
    pub kind: ExpenseKind,

    /// Amount to split across the stores billed that day
    #[arg(long)]
    pub amount: Decimal,

    /// equal or proportional
    #[arg(long, default_value = "equal")]
    pub split: SplitMethod,

    /// Free-text description
    #[arg(long)]
    pub description: Option<String>,

    /// User recording the expense
    #[arg(long, default_value = "operator")]
    pub by: String,
}

#[derive(Subcommand, Debug)]
pub enum ExpenseCommand {
    /// Record a shared expense
    Add(ExpenseAddArgs),
    /// List expenses, newest first
    List {
        /// Only expenses on this date
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Delete an expense
    Remove {
        /// Expense id
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum CatalogCommand {
    /// Upsert stores, stalls, categories and products from a TOML file
    Import {
        /// Catalog seed file
        file: PathBuf,
    },
    /// Show the whole catalog
    Show,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Write a documented configuration template
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Display the effective configuration with defaults applied
    Show,
    /// Validate the configuration file
    Validate,
}
