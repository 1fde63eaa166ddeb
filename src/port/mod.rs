//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! ```text
//!   CLI adapter ──▶ application services ──▶ Ledger port ◀── SQLite adapter
//! ```

pub mod outbound;
