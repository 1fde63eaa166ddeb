//! CLI module graph.

pub mod batch;
pub mod bill;
pub mod catalog;
pub mod command;
pub mod config;
pub mod consolidate;
pub mod context;
pub mod diagnostic;
pub mod dispatch;
pub mod expense;
pub mod input;
pub mod order;
pub mod output;
pub mod paths;
