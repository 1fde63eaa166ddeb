//! SQLite persistence adapter.
//!
//! Provides the SQLite-backed [`ledger::SqliteLedger`] using Diesel ORM.

pub mod database;
pub mod ledger;

pub use ledger::SqliteLedger;
