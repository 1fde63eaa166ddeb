//! Marketrun - back office for a multi-store purchasing run.
//!
//! Stores submit orders for a delivery date, a purchaser buys the combined
//! demand at the market in batches, and each batch's cost is allocated back
//! to the ordering stores in proportion to what they asked for. Daily bills
//! then charge every store for its allocated items plus its share of the
//! day's transport, labor and other expenses.
//!
//! # Architecture
//!
//! - [`domain`] - Pure types and arithmetic: allocation, consolidation,
//!   status projection and bill computation
//! - [`port`] - The [`Ledger`](port::outbound::ledger::Ledger) unit-of-work trait
//! - [`application`] - Use-case services generic over a ledger
//! - [`adapter`] - SQLite ledger (Diesel) and the `marketrun` CLI
//! - [`infrastructure`] - Configuration, logging and wiring
//! - [`error`] - Error types for the crate
//!
//! # Example
//!
//! ```no_run
//! use marketrun::adapter::outbound::sqlite::SqliteLedger;
//! use marketrun::application::ConsolidationService;
//!
//! # async fn run() -> marketrun::error::Result<()> {
//! let ledger = SqliteLedger::open("marketrun.db")?;
//! let demand = ConsolidationService::new(ledger).by_product().await?;
//! for product in demand {
//!     println!("{} {}", product.product_name, product.total_quantity);
//! }
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
