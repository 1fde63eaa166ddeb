//! Miette diagnostics for CLI error presentation.
//!
//! Crate errors are mapped to one diagnostic per failure class, each with a
//! stable code and a help line. TOML parse failures keep the offending file so
//! miette can point at the exact span.

use std::path::Path;

use miette::{Diagnostic, NamedSource, Report, SourceSpan};
use thiserror::Error;

use crate::error::{ConfigError, Error};

/// A TOML file (configuration or command input) that failed to parse.
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(marketrun::input))]
pub struct SourceError {
    pub message: String,

    #[source_code]
    pub src: NamedSource<String>,

    #[label("here")]
    pub span: Option<SourceSpan>,

    #[help]
    pub help: Option<String>,
}

impl SourceError {
    #[must_use]
    pub fn new(path: &Path, content: String, err: &toml::de::Error) -> Self {
        Self {
            message: format!("failed to parse {}: {}", path.display(), err.message()),
            src: NamedSource::new(path.display().to_string(), content),
            span: err.span().map(|range| SourceSpan::from((range.start, range.len()))),
            help: None,
        }
    }

    #[must_use]
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(marketrun::config), help("run `marketrun config validate` to check the file"))]
pub struct ConfigDiagnostic {
    pub message: String,
}

#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(marketrun::validation))]
pub struct ValidationDiagnostic {
    pub message: String,
    #[help]
    pub help: Option<String>,
}

#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(marketrun::not_found))]
pub struct NotFoundDiagnostic {
    pub message: String,
    #[help]
    pub help: Option<String>,
}

#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(
    code(marketrun::conflict),
    help("another write got there first; re-run the command to work on fresh data")
)]
pub struct ConflictDiagnostic {
    pub message: String,
}

#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(
    code(marketrun::storage),
    help("check that the database path is writable and not locked by another process")
)]
pub struct StorageDiagnostic {
    pub message: String,
}

fn not_found_help(message: &str) -> Option<String> {
    let hint = if message.starts_with("no delivered orders") {
        "bills are only generated for dates with delivered orders; check `marketrun order list --status delivered`"
    } else if message.starts_with("bill") {
        "list bills with `marketrun bill list`"
    } else if message.starts_with("order") {
        "list orders with `marketrun order list`"
    } else if message.starts_with("batch") {
        "list batches with `marketrun batch list`"
    } else if message.starts_with("expense") {
        "list expenses with `marketrun expense list`"
    } else if message.starts_with("product") || message.starts_with("store") {
        "inspect the catalog with `marketrun catalog show`"
    } else {
        return None;
    };
    Some(hint.to_string())
}

/// Convert a crate error into a rendered diagnostic.
#[must_use]
pub fn report(err: Error) -> Report {
    let message = err.to_string();
    match err {
        Error::Config(_) => Report::new(ConfigDiagnostic { message }),
        Error::Domain(_) => Report::new(ValidationDiagnostic {
            message,
            help: Some("fix the input and retry; nothing was written".to_string()),
        }),
        Error::NotFound(_) => {
            let help = not_found_help(&message);
            Report::new(NotFoundDiagnostic { message, help })
        }
        Error::Conflict(_) => Report::new(ConflictDiagnostic { message }),
        Error::Parse(_) => Report::new(ValidationDiagnostic {
            message,
            help: None,
        }),
        Error::Json(_) | Error::Io(_) | Error::Connection(_) | Error::Database(_) => {
            Report::new(StorageDiagnostic { message })
        }
    }
}

/// Report a configuration load failure, pointing into the file when the
/// failure is a TOML syntax error.
#[must_use]
pub fn config_report(path: &Path, err: Error) -> Report {
    if let Error::Config(ConfigError::Parse(parse)) = &err {
        if let Ok(content) = std::fs::read_to_string(path) {
            return Report::new(
                SourceError::new(path, content, parse)
                    .with_help("see the configuration section of the README for valid keys"),
            );
        }
    }
    report(err)
}

/// Shorthand for mapping crate results into CLI results.
pub trait Reported<T> {
    /// # Errors
    /// Returns the rendered diagnostic for a crate error.
    fn reported(self) -> miette::Result<T>;
}

impl<T> Reported<T> for crate::error::Result<T> {
    fn reported(self) -> miette::Result<T> {
        self.map_err(report)
    }
}
