//! Handlers for `marketrun batch`.

use std::path::Path;

use rust_decimal::Decimal;
use tabled::Tabled;

use super::command::BatchCommand;
use super::context::Context;
use super::diagnostic::Reported;
use super::input::{self, BatchFile};
use super::output;
use crate::application::catalog::CatalogSnapshot;
use crate::application::purchasing::{BatchReceipt, BatchSubmission};
use crate::domain::batch::{BatchItem, BatchLine, PurchaseBatch};
use crate::domain::id::{BatchId, UserId};

#[derive(Tabled)]
struct BatchRow {
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Market")]
    market: String,
    #[tabled(rename = "Items")]
    items: usize,
    #[tabled(rename = "Total cost")]
    total: String,
}

impl From<&PurchaseBatch> for BatchRow {
    fn from(batch: &PurchaseBatch) -> Self {
        Self {
            id: batch.id.to_string(),
            date: batch.purchase_date.to_string(),
            market: batch.market_location.clone().unwrap_or_default(),
            items: batch.items.len(),
            total: batch.items.iter().map(|i| i.total_cost).sum::<Decimal>().to_string(),
        }
    }
}

#[derive(Tabled)]
struct ItemRow {
    #[tabled(rename = "Product")]
    product: String,
    #[tabled(rename = "Quantity")]
    quantity: String,
    #[tabled(rename = "Cost")]
    cost: String,
    #[tabled(rename = "Unit price")]
    unit_price: String,
}

fn item_row(catalog: &CatalogSnapshot, item: &BatchItem) -> ItemRow {
    let product = catalog.products.iter().find(|p| p.id == item.product_id);
    ItemRow {
        product: product.map_or_else(|| item.product_id.to_string(), |p| p.name.clone()),
        quantity: format!(
            "{} {}",
            item.total_quantity_bought.normalize(),
            product.map_or("", |p| p.unit.as_str())
        ),
        cost: item.total_cost.to_string(),
        unit_price: item.unit_price.to_string(),
    }
}

/// Execute a `batch` subcommand.
pub async fn execute(ctx: &Context, command: &BatchCommand) -> miette::Result<()> {
    match command {
        BatchCommand::Submit { file } => submit(ctx, file).await,
        BatchCommand::Show { id } => show(ctx, &BatchId::from(id.as_str())).await,
        BatchCommand::List => list(ctx).await,
    }
}

async fn submit(ctx: &Context, file: &Path) -> miette::Result<()> {
    let batch: BatchFile = input::read_toml(file)?;
    let catalog = ctx.snapshot().await.reported()?;

    let lines = batch
        .items
        .iter()
        .map(|item| -> crate::error::Result<BatchLine> {
            let product = input::resolve_product(&catalog, &item.product)?;
            Ok(BatchLine::try_new(product, item.quantity, item.cost)?)
        })
        .collect::<crate::error::Result<Vec<_>>>()
        .reported()?;

    let submission = BatchSubmission {
        purchaser_id: UserId::from(batch.purchaser.as_str()),
        market_location: batch.market.or_else(|| ctx.config.purchasing.default_market.clone()),
        purchase_date: batch.date,
        lines,
    };
    let receipt = ctx.purchasing().submit_batch(submission).await.reported()?;

    if output::data("batch.submit", &receipt) {
        return Ok(());
    }
    render_receipt(&catalog, &receipt);
    Ok(())
}

fn render_receipt(catalog: &CatalogSnapshot, receipt: &BatchReceipt) {
    output::header(env!("CARGO_PKG_VERSION"));
    output::success(&format!("Recorded batch {}", output::highlight(&receipt.batch.id)));
    output::field("Date", receipt.batch.purchase_date);
    if let Some(market) = &receipt.batch.market_location {
        output::field("Market", market);
    }
    output::table(receipt.batch.items.iter().map(|i| item_row(catalog, i)));

    output::section("Allocation");
    for line in &receipt.lines {
        let name = catalog
            .products
            .iter()
            .find(|p| p.id == line.product_id)
            .map_or_else(|| line.product_id.to_string(), |p| p.name.clone());
        match &line.plan {
            Some(plan) => output::field(
                &name,
                format!(
                    "{} of {} requested across {} items (ratio {})",
                    plan.quantity_fulfilled().normalize(),
                    plan.total_requested.normalize(),
                    plan.allocations.len(),
                    plan.ratio.round_dp(4).normalize()
                ),
            ),
            None => output::field(&name, output::muted("no outstanding demand")),
        }
    }

    if !receipt.status_changes.is_empty() {
        output::section("Orders");
        for change in &receipt.status_changes {
            output::field(
                change.order_id.as_str(),
                format!("{} -> {}", change.from, output::highlight(change.to)),
            );
        }
    }
}

async fn show(ctx: &Context, id: &BatchId) -> miette::Result<()> {
    let batch = ctx.purchasing().get_batch(id).await.reported()?;
    if output::data("batch.show", &batch) {
        return Ok(());
    }
    let catalog = ctx.snapshot().await.reported()?;

    output::header(env!("CARGO_PKG_VERSION"));
    output::section(&format!("Batch {}", batch.id));
    output::field("Status", batch.status);
    output::field("Date", batch.purchase_date);
    output::field("Purchaser", &batch.purchaser_id);
    output::field("Market", batch.market_location.as_deref().unwrap_or("-"));
    output::table(batch.items.iter().map(|i| item_row(&catalog, i)));
    Ok(())
}

async fn list(ctx: &Context) -> miette::Result<()> {
    let batches = ctx.purchasing().list_batches().await.reported()?;
    if output::data("batch.list", &batches) {
        return Ok(());
    }
    output::header(env!("CARGO_PKG_VERSION"));
    if batches.is_empty() {
        output::note("No batches recorded.");
        return Ok(());
    }
    output::table(batches.iter().map(BatchRow::from));
    Ok(())
}
