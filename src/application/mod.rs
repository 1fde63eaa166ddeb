//! Application services (use cases).
//!
//! Each service is generic over a [`Ledger`](crate::port::outbound::ledger::Ledger),
//! validates its input, runs one unit of work and leaves the arithmetic to
//! [`crate::domain`].

pub mod billing;
pub mod catalog;
pub mod consolidation;
pub mod expense;
pub mod order;
pub mod purchasing;

pub use billing::BillingService;
pub use catalog::CatalogService;
pub use consolidation::ConsolidationService;
pub use expense::ExpenseService;
pub use order::OrderService;
pub use purchasing::PurchasingService;
