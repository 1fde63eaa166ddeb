//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`ledger`] - [`TempLedger`](ledger::TempLedger), a migrated SQLite
//!   ledger in a temporary directory.
//! - [`domain`] - A fixed seeded catalog plus builders for order and batch
//!   lines.

pub mod domain;
pub mod ledger;
