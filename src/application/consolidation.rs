//! Consolidation service: what still has to be bought, for whom.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;

use crate::domain::catalog::{Category, Product, Stall, Store};
use crate::domain::consolidation::{self, DemandLine, ProductDemand, StallGroup};
use crate::domain::id::{CategoryId, ProductId, StallId, StoreId};
use crate::domain::order::Order;
use crate::error::Result;
use crate::port::outbound::ledger::{CatalogLedger, Ledger, LedgerTx, OrderFilter, OrderLedger};

/// Read-only views over outstanding demand.
pub struct ConsolidationService<L> {
    ledger: L,
}

impl<L: Ledger> ConsolidationService<L> {
    pub const fn new(ledger: L) -> Self {
        Self { ledger }
    }

    /// Outstanding demand per product with a per-store breakdown.
    ///
    /// # Errors
    /// Fails only on storage errors; no demand is an empty list.
    pub async fn by_product(&self) -> Result<Vec<ProductDemand>> {
        let lines = self.ledger.read(outstanding_demand).await?;
        let demand = consolidation::by_product(&lines);
        debug!(products = demand.len(), "Consolidated demand by product");
        Ok(demand)
    }

    /// Outstanding demand per stall, optionally for one delivery date.
    ///
    /// # Errors
    /// Fails only on storage errors; no demand is an empty list.
    pub async fn by_stall(&self, date: Option<NaiveDate>) -> Result<Vec<StallGroup>> {
        let lines = self.ledger.read(outstanding_demand).await?;
        let groups = consolidation::by_stall(&lines, date);
        debug!(stalls = groups.len(), date = ?date, "Consolidated demand by stall");
        Ok(groups)
    }
}

fn keyed<K, V, F>(values: Vec<V>, key: F) -> HashMap<K, V>
where
    K: std::hash::Hash + Eq,
    F: Fn(&V) -> K,
{
    values.into_iter().map(|v| (key(&v), v)).collect()
}

/// Unallocated, approved items of outstanding orders joined with the catalog.
fn outstanding_demand(tx: &mut dyn LedgerTx) -> Result<Vec<DemandLine>> {
    let orders = tx.orders(&OrderFilter::outstanding())?;
    let stores: HashMap<StoreId, Store> = keyed(tx.stores()?, |s| s.id.clone());
    let products: HashMap<ProductId, Product> = keyed(tx.products()?, |p| p.id.clone());
    let categories: HashMap<CategoryId, Category> = keyed(tx.categories()?, |c| c.id.clone());
    let stalls: HashMap<StallId, Stall> = keyed(tx.stalls()?, |s| s.id.clone());

    Ok(orders
        .iter()
        .flat_map(|order| demand_lines(order, &stores, &products, &categories, &stalls))
        .collect())
}

fn demand_lines<'a>(
    order: &'a Order,
    stores: &'a HashMap<StoreId, Store>,
    products: &'a HashMap<ProductId, Product>,
    categories: &'a HashMap<CategoryId, Category>,
    stalls: &'a HashMap<StallId, Stall>,
) -> impl Iterator<Item = DemandLine> + 'a {
    let store_name = stores
        .get(&order.store_id)
        .map_or_else(|| order.store_id.to_string(), |s| s.name.clone());

    order
        .items
        .iter()
        .filter(|item| !item.fulfillment.is_allocated() && item.approved() > Decimal::ZERO)
        .filter_map(move |item| {
            let product = products.get(&item.product_id)?;
            let category = categories.get(&product.category_id);
            Some(DemandLine {
                product_id: product.id.clone(),
                product_name: product.name.clone(),
                unit: product.unit.clone(),
                price_reference: product.price_reference,
                category_name: category.map(|c| c.name.clone()).unwrap_or_default(),
                category_sort: category.map_or(i32::MAX, |c| c.sort_order),
                stall: product
                    .default_stall_id
                    .as_ref()
                    .and_then(|id| stalls.get(id))
                    .cloned(),
                store_id: order.store_id.clone(),
                store_name: store_name.clone(),
                delivery_date: order.delivery_date,
                quantity: item.approved(),
            })
        })
}
