//! Shared expense bookkeeping.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::info;

use crate::domain::expense::{ExpenseKind, SharedExpense, SplitMethod};
use crate::domain::id::{ExpenseId, UserId};
use crate::error::{NotFoundError, Result};
use crate::port::outbound::ledger::{ExpenseLedger, Ledger};

/// Fields of a new shared expense.
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub date: NaiveDate,
    pub kind: ExpenseKind,
    pub description: Option<String>,
    pub amount: Decimal,
    pub split_method: SplitMethod,
    pub created_by: UserId,
}

pub struct ExpenseService<L> {
    ledger: L,
}

impl<L: Ledger> ExpenseService<L> {
    pub const fn new(ledger: L) -> Self {
        Self { ledger }
    }

    /// # Errors
    /// Validation error if the amount is not positive.
    pub async fn record(&self, new: NewExpense) -> Result<SharedExpense> {
        let expense = SharedExpense::try_new(
            new.date,
            new.kind,
            new.description,
            new.amount,
            new.split_method,
            new.created_by,
        )?;
        let stored = expense.clone();
        self.ledger.write(move |tx| tx.insert_expense(&stored)).await?;

        info!(
            expense_id = %expense.id,
            date = %expense.expense_date,
            kind = %expense.kind,
            amount = %expense.amount,
            split = %expense.split_method,
            "Expense recorded"
        );
        Ok(expense)
    }

    /// Expenses newest first, optionally for a single date.
    ///
    /// # Errors
    /// Storage errors only.
    pub async fn list(&self, date: Option<NaiveDate>) -> Result<Vec<SharedExpense>> {
        self.ledger.read(move |tx| tx.expenses(date)).await
    }

    /// # Errors
    /// Not-found if no expense has this id.
    pub async fn delete(&self, id: &ExpenseId) -> Result<()> {
        let key = id.clone();
        let deleted = self.ledger.write(move |tx| tx.delete_expense(&key)).await?;
        if !deleted {
            return Err(NotFoundError::Expense(id.to_string()).into());
        }
        info!(expense_id = %id, "Expense deleted");
        Ok(())
    }
}
