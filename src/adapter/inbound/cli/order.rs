//! Handlers for `marketrun order`.

use std::path::Path;

use chrono::NaiveDate;
use tabled::Tabled;

use super::command::OrderCommand;
use super::context::Context;
use super::diagnostic::Reported;
use super::input::{self, OrderFile};
use super::output;
use crate::application::catalog::CatalogSnapshot;
use crate::domain::id::{OrderId, UserId};
use crate::domain::order::{Order, OrderItem, OrderLine, OrderStatus};
use crate::port::outbound::ledger::OrderFilter;

#[derive(Tabled)]
struct OrderRow {
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Store")]
    store: String,
    #[tabled(rename = "Delivery")]
    delivery: String,
    #[tabled(rename = "Items")]
    items: usize,
    #[tabled(rename = "Status")]
    status: String,
}

#[derive(Tabled)]
struct ItemRow {
    #[tabled(rename = "Product")]
    product: String,
    #[tabled(rename = "Requested")]
    requested: String,
    #[tabled(rename = "Fulfilled")]
    fulfilled: String,
    #[tabled(rename = "Cost")]
    cost: String,
    #[tabled(rename = "Notes")]
    notes: String,
}

fn store_name(catalog: &CatalogSnapshot, order: &Order) -> String {
    catalog
        .stores
        .iter()
        .find(|s| s.id == order.store_id)
        .map_or_else(|| order.store_id.to_string(), |s| s.name.clone())
}

fn item_row(catalog: &CatalogSnapshot, item: &OrderItem) -> ItemRow {
    let product = catalog.products.iter().find(|p| p.id == item.product_id);
    let unit = product.map_or("", |p| p.unit.as_str());
    ItemRow {
        product: product.map_or_else(|| item.product_id.to_string(), |p| p.name.clone()),
        requested: format!("{} {unit}", item.quantity_requested.normalize()),
        fulfilled: item
            .fulfillment
            .quantity_fulfilled()
            .map_or_else(|| "-".to_string(), |q| format!("{} {unit}", q.normalize())),
        cost: item
            .fulfillment
            .allocated_cost()
            .map_or_else(|| "-".to_string(), |c| c.to_string()),
        notes: item.notes.clone().unwrap_or_default(),
    }
}

/// Execute an `order` subcommand.
pub async fn execute(ctx: &Context, command: &OrderCommand) -> miette::Result<()> {
    match command {
        OrderCommand::Submit { file } => submit(ctx, file).await,
        OrderCommand::List {
            status,
            store,
            date,
        } => list(ctx, *status, store.as_deref(), *date).await,
        OrderCommand::Show { id } => show(ctx, &OrderId::from(id.as_str())).await,
        OrderCommand::Approve { id } => {
            transition(ctx, &OrderId::from(id.as_str()), OrderStatus::Approved).await
        }
        OrderCommand::Cancel { id } => {
            transition(ctx, &OrderId::from(id.as_str()), OrderStatus::Cancelled).await
        }
    }
}

async fn submit(ctx: &Context, file: &Path) -> miette::Result<()> {
    let order: OrderFile = input::read_toml(file)?;
    let catalog = ctx.snapshot().await.reported()?;

    let store_id = input::resolve_store(&catalog, &order.store).reported()?;
    let lines = order
        .items
        .iter()
        .map(|item| -> crate::error::Result<OrderLine> {
            let product = input::resolve_product(&catalog, &item.product)?;
            let mut line = OrderLine::try_new(product, item.quantity)?;
            line.notes.clone_from(&item.notes);
            Ok(line)
        })
        .collect::<crate::error::Result<Vec<_>>>()
        .reported()?;

    let submitted = ctx
        .orders()
        .submit(
            store_id,
            UserId::from(order.requester.as_str()),
            order.delivery_date,
            lines,
        )
        .await
        .reported()?;

    if output::data("order.submit", &submitted) {
        return Ok(());
    }
    output::header(env!("CARGO_PKG_VERSION"));
    output::success(&format!("Submitted order {}", output::highlight(&submitted.id)));
    render_order(&catalog, &submitted);
    Ok(())
}

async fn list(
    ctx: &Context,
    status: Option<OrderStatus>,
    store: Option<&str>,
    date: Option<NaiveDate>,
) -> miette::Result<()> {
    let catalog = ctx.snapshot().await.reported()?;
    let filter = OrderFilter {
        statuses: status.into_iter().collect(),
        store_id: store
            .map(|reference| input::resolve_store(&catalog, reference))
            .transpose()
            .reported()?,
        delivery_date: date,
    };
    let orders = ctx.orders().list(filter).await.reported()?;
    if output::data("order.list", &orders) {
        return Ok(());
    }

    output::header(env!("CARGO_PKG_VERSION"));
    if orders.is_empty() {
        output::note("No orders found.");
        return Ok(());
    }
    output::table(orders.iter().map(|order| OrderRow {
        id: order.id.to_string(),
        store: store_name(&catalog, order),
        delivery: order.delivery_date.to_string(),
        items: order.items.len(),
        status: order.status.to_string(),
    }));
    Ok(())
}

fn render_order(catalog: &CatalogSnapshot, order: &Order) {
    output::section(&format!("Order {}", order.id));
    output::field("Store", store_name(catalog, order));
    output::field("Requester", &order.requester_id);
    output::field("Delivery", order.delivery_date);
    output::field("Status", output::highlight(order.status));
    output::table(order.items.iter().map(|i| item_row(catalog, i)));
}

async fn show(ctx: &Context, id: &OrderId) -> miette::Result<()> {
    let order = ctx.orders().get(id).await.reported()?;
    if output::data("order.show", &order) {
        return Ok(());
    }
    let catalog = ctx.snapshot().await.reported()?;
    output::header(env!("CARGO_PKG_VERSION"));
    render_order(&catalog, &order);
    Ok(())
}

async fn transition(ctx: &Context, id: &OrderId, to: OrderStatus) -> miette::Result<()> {
    let order = ctx.orders().transition(id, to).await.reported()?;
    if output::data("order.transition", &order) {
        return Ok(());
    }
    output::header(env!("CARGO_PKG_VERSION"));
    output::success(&format!("Order {} is now {}", order.id, output::highlight(order.status)));
    Ok(())
}
