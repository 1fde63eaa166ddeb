//! Handlers for `marketrun expense`.

use chrono::NaiveDate;
use tabled::Tabled;

use super::command::{ExpenseAddArgs, ExpenseCommand};
use super::context::Context;
use super::diagnostic::Reported;
use super::output;
use crate::application::expense::NewExpense;
use crate::domain::expense::SharedExpense;
use crate::domain::id::{ExpenseId, UserId};

#[derive(Tabled)]
struct ExpenseRow {
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Split")]
    split: String,
    #[tabled(rename = "Description")]
    description: String,
}

impl From<&SharedExpense> for ExpenseRow {
    fn from(expense: &SharedExpense) -> Self {
        Self {
            id: expense.id.to_string(),
            date: expense.expense_date.to_string(),
            kind: expense.kind.to_string(),
            amount: expense.amount.to_string(),
            split: expense.split_method.to_string(),
            description: expense.description.clone().unwrap_or_default(),
        }
    }
}

/// Execute an `expense` subcommand.
pub async fn execute(ctx: &Context, command: &ExpenseCommand) -> miette::Result<()> {
    match command {
        ExpenseCommand::Add(args) => add(ctx, args).await,
        ExpenseCommand::List { date } => list(ctx, *date).await,
        ExpenseCommand::Remove { id } => remove(ctx, &ExpenseId::from(id.as_str())).await,
    }
}

async fn add(ctx: &Context, args: &ExpenseAddArgs) -> miette::Result<()> {
    let expense = ctx
        .expenses()
        .record(NewExpense {
            date: args.date,
            kind: args.kind,
            description: args.description.clone(),
            amount: args.amount,
            split_method: args.split,
            created_by: UserId::from(args.by.as_str()),
        })
        .await
        .reported()?;

    if output::data("expense.add", &expense) {
        return Ok(());
    }
    output::header(env!("CARGO_PKG_VERSION"));
    output::success(&format!(
        "Recorded {} expense {}",
        expense.kind,
        output::highlight(&expense.id)
    ));
    output::field("Date", expense.expense_date);
    output::field("Amount", expense.amount);
    output::field("Split", expense.split_method);
    output::hint(&format!(
        "regenerate bills with `marketrun bill generate {}` to include it",
        expense.expense_date
    ));
    Ok(())
}

async fn list(ctx: &Context, date: Option<NaiveDate>) -> miette::Result<()> {
    let expenses = ctx.expenses().list(date).await.reported()?;
    if output::data("expense.list", &expenses) {
        return Ok(());
    }
    output::header(env!("CARGO_PKG_VERSION"));
    if expenses.is_empty() {
        output::note("No expenses recorded.");
        return Ok(());
    }
    output::table(expenses.iter().map(ExpenseRow::from));
    Ok(())
}

async fn remove(ctx: &Context, id: &ExpenseId) -> miette::Result<()> {
    ctx.expenses().delete(id).await.reported()?;
    if output::data("expense.remove", &serde_json::json!({ "id": id })) {
        return Ok(());
    }
    output::header(env!("CARGO_PKG_VERSION"));
    output::success(&format!("Removed expense {}", output::highlight(id)));
    Ok(())
}
