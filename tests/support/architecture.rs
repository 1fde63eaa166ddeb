//! Source-tree scanning for the layering contract.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// A line of source that matched a forbidden reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub file: String,
    pub line: usize,
    pub text: String,
}

impl fmt::Display for Hit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.file, self.line, self.text.trim())
    }
}

/// One layer of the crate, rooted at a directory under the manifest dir.
pub struct Layer {
    dir: &'static str,
    exempt: Vec<&'static str>,
}

impl Layer {
    pub fn new(dir: &'static str) -> Self {
        Self { dir, exempt: Vec::new() }
    }

    /// Skip a file, given by its name inside the layer directory.
    pub fn except(mut self, file: &'static str) -> Self {
        self.exempt.push(file);
        self
    }

    /// Lines that mention any of `forbidden`, outside exempt files.
    pub fn references_to(&self, forbidden: &[&str]) -> Vec<Hit> {
        self.sources()
            .into_iter()
            .filter(|(path, _)| !self.is_exempt(path))
            .flat_map(|(path, content)| {
                content
                    .lines()
                    .enumerate()
                    .filter(|(_, text)| forbidden.iter().any(|f| text.contains(f)))
                    .map(|(idx, text)| Hit {
                        file: relative(&path),
                        line: idx + 1,
                        text: text.to_string(),
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Lines in `mod.rs` files that are not module declarations,
    /// re-exports, attributes or comments.
    pub fn mod_rs_bodies(&self) -> Vec<Hit> {
        self.sources()
            .into_iter()
            .filter(|(path, _)| path.file_name().is_some_and(|n| n == "mod.rs"))
            .flat_map(|(path, content)| {
                content
                    .lines()
                    .enumerate()
                    .filter(|(_, text)| !is_export_line(text.trim()))
                    .map(|(idx, text)| Hit {
                        file: relative(&path),
                        line: idx + 1,
                        text: text.to_string(),
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    fn is_exempt(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| self.exempt.contains(&n))
    }

    fn sources(&self) -> Vec<(PathBuf, String)> {
        let mut files = Vec::new();
        walk(&manifest_dir().join(self.dir), &mut files);
        files.sort();
        files
            .into_iter()
            .map(|path| {
                let content = fs::read_to_string(&path)
                    .unwrap_or_else(|e| panic!("read {}: {e}", path.display()));
                (path, content)
            })
            .collect()
    }
}

/// Contents of a file relative to the manifest dir.
pub fn read(relative_path: &str) -> String {
    fs::read_to_string(manifest_dir().join(relative_path))
        .unwrap_or_else(|e| panic!("read {relative_path}: {e}"))
}

fn is_export_line(line: &str) -> bool {
    line.is_empty()
        || line.starts_with("//")
        || line.starts_with("#[")
        || line.starts_with("pub mod ")
        || line.starts_with("mod ")
        || line.starts_with("pub use ")
}

fn walk(dir: &Path, files: &mut Vec<PathBuf>) {
    let entries = fs::read_dir(dir).unwrap_or_else(|e| panic!("read dir {}: {e}", dir.display()));
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            walk(&path, files);
        } else if path.extension().is_some_and(|ext| ext == "rs") {
            files.push(path);
        }
    }
}

fn manifest_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

fn relative(path: &Path) -> String {
    path.strip_prefix(manifest_dir())
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}
