//! Handlers for `marketrun catalog`.

use std::path::Path;

use tabled::Tabled;

use super::command::CatalogCommand;
use super::context::Context;
use super::diagnostic::Reported;
use super::input;
use super::output;
use crate::application::catalog::{CatalogSeed, CatalogSnapshot};

#[derive(Tabled)]
struct StoreRow {
    #[tabled(rename = "Store")]
    name: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Id")]
    id: String,
}

#[derive(Tabled)]
struct StallRow {
    #[tabled(rename = "#")]
    sort: i32,
    #[tabled(rename = "Stall")]
    name: String,
    #[tabled(rename = "Location")]
    location: String,
}

#[derive(Tabled)]
struct ProductRow {
    #[tabled(rename = "Product")]
    name: String,
    #[tabled(rename = "Unit")]
    unit: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Stall")]
    stall: String,
    #[tabled(rename = "Reference price")]
    price: String,
}

/// Execute a `catalog` subcommand.
pub async fn execute(ctx: &Context, command: &CatalogCommand) -> miette::Result<()> {
    match command {
        CatalogCommand::Import { file } => import(ctx, file).await,
        CatalogCommand::Show => show(ctx).await,
    }
}

async fn import(ctx: &Context, file: &Path) -> miette::Result<()> {
    let seed: CatalogSeed = input::read_toml(file)?;
    let summary = ctx.catalog().import(seed).await.reported()?;
    if output::data("catalog.import", &summary) {
        return Ok(());
    }
    output::header(env!("CARGO_PKG_VERSION"));
    output::success(&format!("Imported {}", output::highlight(file.display())));
    output::field("Stores", summary.stores);
    output::field("Stalls", summary.stalls);
    output::field("Categories", summary.categories);
    output::field("Products", summary.products);
    Ok(())
}

async fn show(ctx: &Context) -> miette::Result<()> {
    let catalog = ctx.snapshot().await.reported()?;
    if output::data("catalog.show", &catalog) {
        return Ok(());
    }
    output::header(env!("CARGO_PKG_VERSION"));
    if catalog.stores.is_empty() && catalog.products.is_empty() {
        output::note("The catalog is empty.");
        output::hint("load one with `marketrun catalog import <file>`");
        return Ok(());
    }
    render(&catalog);
    Ok(())
}

fn render(catalog: &CatalogSnapshot) {
    output::section("Stores");
    output::table(catalog.stores.iter().map(|s| StoreRow {
        name: s.name.clone(),
        address: s.address.clone().unwrap_or_default(),
        id: s.id.to_string(),
    }));

    if !catalog.stalls.is_empty() {
        output::section("Stalls");
        output::table(catalog.stalls.iter().map(|s| StallRow {
            sort: s.sort_order,
            name: s.name.clone(),
            location: s.location.clone().unwrap_or_default(),
        }));
    }

    output::section("Products");
    output::table(catalog.products.iter().map(|p| ProductRow {
        name: p.name.clone(),
        unit: p.unit.clone(),
        category: catalog
            .categories
            .iter()
            .find(|c| c.id == p.category_id)
            .map_or_else(|| p.category_id.to_string(), |c| c.name.clone()),
        stall: p
            .default_stall_id
            .as_ref()
            .and_then(|id| catalog.stalls.iter().find(|s| &s.id == id))
            .map(|s| s.name.clone())
            .unwrap_or_default(),
        price: p.price_reference.map(|d| d.to_string()).unwrap_or_default(),
    }));
}
