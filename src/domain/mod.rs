//! Ledger-agnostic domain logic.
//!
//! Everything in here is pure: no I/O, no clock reads beyond entity
//! timestamps, and decimal arithmetic only.

pub mod allocation;
pub mod batch;
pub mod bill;
pub mod billing;
pub mod catalog;
pub mod consolidation;
pub mod error;
pub mod expense;
pub mod id;
pub mod money;
pub mod order;
pub mod projection;

// Core domain types
pub use batch::{BatchItem, BatchLine, BatchStatus, PurchaseBatch};
pub use bill::{BillRunSummary, BillStatus, DailyBill};
pub use catalog::{Category, Product, Stall, Store};
pub use consolidation::{ProductDemand, StallGroup, StoreNeed};
pub use error::DomainError;
pub use expense::{ExpenseKind, SharedExpense, SplitMethod};
pub use order::{Fulfillment, Order, OrderItem, OrderLine, OrderStatus};
