//! Throwaway SQLite ledgers.
//!
//! Each ledger lives in its own temporary directory, so pooled connections
//! share one database file and tests never see each other's data.

use tempfile::TempDir;

use crate::adapter::outbound::sqlite::SqliteLedger;

/// A migrated ledger that is deleted on drop.
pub struct TempLedger {
    _dir: TempDir,
    ledger: SqliteLedger,
}

impl TempLedger {
    /// Create and migrate a fresh ledger.
    ///
    /// # Panics
    /// Panics if the temporary directory or database cannot be created.
    #[must_use]
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("ledger.db");
        let ledger = SqliteLedger::open(path.to_str().expect("utf-8 temp path"))
            .expect("open sqlite ledger");
        Self { _dir: dir, ledger }
    }

    /// A handle sharing this ledger's pool.
    #[must_use]
    pub fn ledger(&self) -> SqliteLedger {
        self.ledger.clone()
    }
}

impl Default for TempLedger {
    fn default() -> Self {
        Self::new()
    }
}
