//! Shared overhead expenses split across the stores billed on a date.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::{ExpenseId, UserId};
use super::money;

/// Kind of overhead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseKind {
    Transport,
    Labor,
    Ice,
    Other,
}

impl ExpenseKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::Labor => "labor",
            Self::Ice => "ice",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ExpenseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExpenseKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transport" => Ok(Self::Transport),
            "labor" | "labour" => Ok(Self::Labor),
            "ice" => Ok(Self::Ice),
            "other" => Ok(Self::Other),
            other => Err(DomainError::InvalidValue {
                field: "expense kind",
                value: other.to_string(),
            }),
        }
    }
}

/// How an expense is divided among participating stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitMethod {
    /// Same share for every store.
    #[default]
    Equal,
    /// Share weighted by each store's item spend.
    Proportional,
}

impl SplitMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "equal",
            Self::Proportional => "proportional",
        }
    }
}

impl fmt::Display for SplitMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SplitMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "equal" => Ok(Self::Equal),
            "proportional" => Ok(Self::Proportional),
            other => Err(DomainError::InvalidValue {
                field: "split method",
                value: other.to_string(),
            }),
        }
    }
}

/// A dated overhead cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedExpense {
    pub id: ExpenseId,
    pub expense_date: NaiveDate,
    pub kind: ExpenseKind,
    pub description: Option<String>,
    pub amount: Decimal,
    pub split_method: SplitMethod,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

impl SharedExpense {
    /// Create a validated expense.
    ///
    /// # Errors
    /// Returns [`DomainError::NonPositiveAmount`] when the amount is not
    /// positive once rounded to cents.
    pub fn try_new(
        expense_date: NaiveDate,
        kind: ExpenseKind,
        description: Option<String>,
        amount: Decimal,
        split_method: SplitMethod,
        created_by: UserId,
    ) -> Result<Self, DomainError> {
        if money::money(amount) <= Decimal::ZERO {
            return Err(DomainError::NonPositiveAmount { amount });
        }
        Ok(Self {
            id: ExpenseId::new(),
            expense_date,
            kind,
            description,
            amount: money::money(amount),
            split_method,
            created_by,
            created_at: Utc::now(),
        })
    }
}
