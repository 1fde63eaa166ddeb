//! Path utilities for marketrun.
//!
//! Operator files live under `~/.marketrun/`:
//! - `~/.marketrun/config.toml` - main configuration
//! - `~/.marketrun/marketrun.db` - suggested ledger location

use std::path::PathBuf;

/// Returns the marketrun home directory (`~/.marketrun/`).
pub fn home_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".marketrun")
}

/// Returns the default config file path (`~/.marketrun/config.toml`).
pub fn default_config() -> PathBuf {
    home_dir().join("config.toml")
}

/// Returns the suggested ledger path (`~/.marketrun/marketrun.db`).
pub fn default_database() -> PathBuf {
    home_dir().join("marketrun.db")
}
