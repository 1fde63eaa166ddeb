use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Temporary directory holding a ledger file and the input files written
/// for one CLI test.
pub struct TempDb {
    dir: TempDir,
}

impl TempDb {
    pub fn create() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Path of the ledger database; created on first use by the binary.
    pub fn database(&self) -> PathBuf {
        self.dir.path().join("ledger.db")
    }

    /// A config path that does not exist, so defaults apply.
    pub fn missing_config(&self) -> PathBuf {
        self.dir.path().join("absent.toml")
    }

    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, contents).expect("write temp file");
        path
    }
}
