//! Handlers for `marketrun bill`.

use chrono::NaiveDate;
use tabled::Tabled;

use super::command::BillCommand;
use super::context::Context;
use super::diagnostic::Reported;
use super::input;
use super::output;
use crate::domain::bill::{BillLine, DailyBill, ExpenseShare};
use crate::domain::id::BillId;

#[derive(Tabled)]
struct BillRow {
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Store")]
    store: String,
    #[tabled(rename = "Items")]
    items: String,
    #[tabled(rename = "Shared")]
    shared: String,
    #[tabled(rename = "Total")]
    total: String,
    #[tabled(rename = "Status")]
    status: String,
}

impl From<&DailyBill> for BillRow {
    fn from(bill: &DailyBill) -> Self {
        Self {
            id: bill.id.to_string(),
            date: bill.bill_date.to_string(),
            store: bill
                .store_name
                .clone()
                .unwrap_or_else(|| bill.store_id.to_string()),
            items: bill.items_total.to_string(),
            shared: bill.shared_total.to_string(),
            total: bill.grand_total.to_string(),
            status: bill.status.to_string(),
        }
    }
}

#[derive(Tabled)]
struct LineRow {
    #[tabled(rename = "Product")]
    product: String,
    #[tabled(rename = "Quantity")]
    quantity: String,
    #[tabled(rename = "Unit price")]
    unit_price: String,
    #[tabled(rename = "Subtotal")]
    subtotal: String,
}

impl From<&BillLine> for LineRow {
    fn from(line: &BillLine) -> Self {
        Self {
            product: line.product_name.clone(),
            quantity: format!("{} {}", line.quantity.normalize(), line.unit),
            unit_price: line.unit_price.to_string(),
            subtotal: line.subtotal.to_string(),
        }
    }
}

#[derive(Tabled)]
struct ShareRow {
    #[tabled(rename = "Expense")]
    kind: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Split")]
    split: String,
    #[tabled(rename = "Share")]
    share: String,
}

impl From<&ExpenseShare> for ShareRow {
    fn from(share: &ExpenseShare) -> Self {
        Self {
            kind: share.kind.to_string(),
            description: share.description.clone().unwrap_or_default(),
            amount: share.total_amount.to_string(),
            split: share.split_method.to_string(),
            share: share.store_share.to_string(),
        }
    }
}

/// Execute a `bill` subcommand.
pub async fn execute(ctx: &Context, command: &BillCommand) -> miette::Result<()> {
    match command {
        BillCommand::Generate { date } => generate(ctx, *date).await,
        BillCommand::List { date, store } => list(ctx, *date, store.as_deref()).await,
        BillCommand::Show { id } => show(ctx, &BillId::from(id.as_str())).await,
        BillCommand::Confirm { id } => confirm(ctx, &BillId::from(id.as_str())).await,
    }
}

async fn generate(ctx: &Context, date: NaiveDate) -> miette::Result<()> {
    let summary = ctx.billing().generate_bills(date).await.reported()?;
    if output::data("bill.generate", &summary) {
        return Ok(());
    }

    output::header(env!("CARGO_PKG_VERSION"));
    output::success(&format!(
        "Generated {} bills for {}",
        summary.total_stores,
        output::highlight(summary.bill_date)
    ));
    output::table(summary.bills.iter().map(BillRow::from));
    output::field("Items", summary.total_items_amount);
    output::field("Shared", summary.total_shared_amount);
    output::field("Grand total", summary.grand_total);
    Ok(())
}

async fn list(ctx: &Context, date: Option<NaiveDate>, store: Option<&str>) -> miette::Result<()> {
    let store_id = match store {
        Some(reference) => {
            let catalog = ctx.snapshot().await.reported()?;
            Some(input::resolve_store(&catalog, reference).reported()?)
        }
        None => None,
    };
    let bills = ctx.billing().list_bills(date, store_id).await.reported()?;
    if output::data("bill.list", &bills) {
        return Ok(());
    }

    output::header(env!("CARGO_PKG_VERSION"));
    if bills.is_empty() {
        output::note("No bills found.");
        output::hint("generate them with `marketrun bill generate <date>`");
        return Ok(());
    }
    output::table(bills.iter().map(BillRow::from));
    Ok(())
}

fn render_bill(bill: &DailyBill) {
    output::section(&format!(
        "{} {}",
        bill.store_name.as_deref().unwrap_or(bill.store_id.as_str()),
        bill.bill_date
    ));
    output::field("Id", &bill.id);
    output::field("Status", bill.status);
    if !bill.detail.items.is_empty() {
        output::table(bill.detail.items.iter().map(LineRow::from));
    }
    if !bill.detail.expenses.is_empty() {
        output::table(bill.detail.expenses.iter().map(ShareRow::from));
    }
    output::field("Items", bill.items_total);
    output::field("Shared", bill.shared_total);
    output::field("Grand total", output::highlight(bill.grand_total));
}

async fn show(ctx: &Context, id: &BillId) -> miette::Result<()> {
    let bill = ctx.billing().get_bill(id).await.reported()?;
    if output::data("bill.show", &bill) {
        return Ok(());
    }
    output::header(env!("CARGO_PKG_VERSION"));
    render_bill(&bill);
    Ok(())
}

async fn confirm(ctx: &Context, id: &BillId) -> miette::Result<()> {
    let bill = ctx.billing().confirm(id).await.reported()?;
    if output::data("bill.confirm", &bill) {
        return Ok(());
    }
    output::header(env!("CARGO_PKG_VERSION"));
    output::success(&format!("Confirmed bill {}", output::highlight(&bill.id)));
    render_bill(&bill);
    Ok(())
}
