//! Infrastructure layer.
//!
//! Technical concerns that support the application without containing
//! business logic: configuration, logging and ledger wiring.
//!
//! # Submodules
//!
//! - [`bootstrap`] - Composition root for the ledger and services
//! - [`config`] - Configuration loading, validation and logging setup

pub mod bootstrap;
pub mod config;
