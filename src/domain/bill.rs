//! Daily bills: one cost statement per store per delivery date.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::expense::{ExpenseKind, SplitMethod};
use super::id::{BillId, ExpenseId, StoreId};

/// Status of a daily bill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillStatus {
    #[default]
    Draft,
    Confirmed,
}

impl BillStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Confirmed => "confirmed",
        }
    }
}

impl fmt::Display for BillStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "confirmed" => Ok(Self::Confirmed),
            other => Err(DomainError::InvalidValue {
                field: "bill status",
                value: other.to_string(),
            }),
        }
    }
}

/// One delivered product on a bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillLine {
    pub product_name: String,
    pub unit: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

/// A store's share of one shared expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseShare {
    pub expense_id: ExpenseId,
    pub kind: ExpenseKind,
    pub description: Option<String>,
    pub total_amount: Decimal,
    pub split_method: SplitMethod,
    pub store_share: Decimal,
}

/// Point-in-time snapshot of how a bill's totals were derived.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BillDetail {
    pub items: Vec<BillLine>,
    pub expenses: Vec<ExpenseShare>,
}

/// Computed totals for one store, before they are persisted as a bill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStatement {
    pub store_id: StoreId,
    pub items_total: Decimal,
    pub shared_total: Decimal,
    pub detail: BillDetail,
}

impl StoreStatement {
    #[must_use]
    pub fn grand_total(&self) -> Decimal {
        self.items_total + self.shared_total
    }
}

/// A persisted daily bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyBill {
    pub id: BillId,
    pub store_id: StoreId,
    /// Resolved from the catalog for presentation; not persisted on the bill.
    pub store_name: Option<String>,
    pub bill_date: NaiveDate,
    pub items_total: Decimal,
    pub shared_total: Decimal,
    pub grand_total: Decimal,
    pub status: BillStatus,
    pub detail: BillDetail,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl DailyBill {
    /// Create a fresh draft bill from a statement.
    #[must_use]
    pub fn draft(bill_date: NaiveDate, statement: StoreStatement) -> Self {
        Self {
            id: BillId::new(),
            grand_total: statement.grand_total(),
            store_id: statement.store_id,
            store_name: None,
            bill_date,
            items_total: statement.items_total,
            shared_total: statement.shared_total,
            status: BillStatus::Draft,
            detail: statement.detail,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Overwrite totals and detail with a recomputed statement.
    ///
    /// Regeneration always reopens the bill as a draft.
    pub fn regenerate(&mut self, statement: StoreStatement) {
        self.items_total = statement.items_total;
        self.shared_total = statement.shared_total;
        self.grand_total = statement.grand_total();
        self.detail = statement.detail;
        self.status = BillStatus::Draft;
        self.updated_at = Some(Utc::now());
    }
}

/// Outcome of one bill generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillRunSummary {
    pub bill_date: NaiveDate,
    pub total_stores: usize,
    pub total_items_amount: Decimal,
    pub total_shared_amount: Decimal,
    pub grand_total: Decimal,
    pub bills: Vec<DailyBill>,
}

impl BillRunSummary {
    #[must_use]
    pub fn from_bills(bill_date: NaiveDate, bills: Vec<DailyBill>) -> Self {
        let mut summary = Self {
            bill_date,
            total_stores: bills.len(),
            total_items_amount: Decimal::ZERO,
            total_shared_amount: Decimal::ZERO,
            grand_total: Decimal::ZERO,
            bills: Vec::new(),
        };
        for bill in &bills {
            summary.total_items_amount += bill.items_total;
            summary.total_shared_amount += bill.shared_total;
            summary.grand_total += bill.grand_total;
        }
        summary.bills = bills;
        summary
    }
}
