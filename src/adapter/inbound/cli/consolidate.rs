//! Handler for `marketrun consolidate`.

use tabled::Tabled;

use super::command::ConsolidateArgs;
use super::context::Context;
use super::diagnostic::Reported;
use super::output;
use crate::domain::consolidation::ProductDemand;

#[derive(Tabled)]
struct DemandRow {
    #[tabled(rename = "Product")]
    product: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Total")]
    total: String,
    #[tabled(rename = "Stores")]
    stores: String,
}

impl From<&ProductDemand> for DemandRow {
    fn from(demand: &ProductDemand) -> Self {
        let stores = demand
            .breakdown
            .iter()
            .map(|need| format!("{} {}", need.store_name, need.quantity.normalize()))
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            product: demand.product_name.clone(),
            category: demand.category_name.clone(),
            total: format!("{} {}", demand.total_quantity.normalize(), demand.unit),
            stores,
        }
    }
}

/// Execute `consolidate`.
pub async fn execute(ctx: &Context, args: &ConsolidateArgs) -> miette::Result<()> {
    let service = ctx.consolidation();

    if args.by_stall {
        let groups = service.by_stall(args.date).await.reported()?;
        if output::data("consolidate.by_stall", &groups) {
            return Ok(());
        }
        output::header(env!("CARGO_PKG_VERSION"));
        if groups.is_empty() {
            output::note("Nothing left to buy.");
            return Ok(());
        }
        for group in &groups {
            output::section(&group.stall_name);
            output::table(group.items.iter().map(DemandRow::from));
        }
        return Ok(());
    }

    let demand = service.by_product().await.reported()?;
    if output::data("consolidate.by_product", &demand) {
        return Ok(());
    }
    output::header(env!("CARGO_PKG_VERSION"));
    if demand.is_empty() {
        output::note("Nothing left to buy.");
        return Ok(());
    }
    output::section("Outstanding demand");
    output::table(demand.iter().map(DemandRow::from));
    Ok(())
}
