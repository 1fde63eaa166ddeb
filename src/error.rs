use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::error::DomainError;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Something the caller referred to does not exist.
///
/// Kept apart from validation failures so "nothing to do" can be told from
/// "you asked wrong".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotFoundError {
    #[error("no delivered orders for {date}")]
    NoDeliveredOrders { date: NaiveDate },

    #[error("bill not found: {0}")]
    Bill(String),

    #[error("order not found: {0}")]
    Order(String),

    #[error("batch not found: {0}")]
    Batch(String),

    #[error("expense not found: {0}")]
    Expense(String),

    #[error("product not found: {0}")]
    Product(String),

    #[error("store not found: {0}")]
    Store(String),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// True for input the caller must correct before retrying.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Domain(_))
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// True when a write lost a race or hit a uniqueness constraint.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

impl From<diesel::result::Error> for Error {
    fn from(err: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error as DieselError};

        match err {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                Error::Conflict(info.message().to_string())
            }
            other => Error::Database(other.to_string()),
        }
    }
}
