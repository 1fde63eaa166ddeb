//! Consolidated purchasing demand across stores.
//!
//! Demand lines are aggregated in one pass into keyed accumulators; ordering
//! is applied only when the views are produced.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::catalog::Stall;
use super::id::{ProductId, StallId, StoreId};

/// Name of the bucket holding products without a stall.
pub const UNASSIGNED_STALL: &str = "Unassigned";

/// One outstanding order item joined with the catalog data needed to group it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemandLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub unit: String,
    pub price_reference: Option<Decimal>,
    pub category_name: String,
    pub category_sort: i32,
    pub stall: Option<Stall>,
    pub store_id: StoreId,
    pub store_name: String,
    pub delivery_date: NaiveDate,
    pub quantity: Decimal,
}

/// Outstanding quantity of one product for one store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreNeed {
    pub store_id: StoreId,
    pub store_name: String,
    pub quantity: Decimal,
}

/// Outstanding demand for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDemand {
    pub product_id: ProductId,
    pub product_name: String,
    pub unit: String,
    pub category_name: String,
    pub price_reference: Option<Decimal>,
    pub total_quantity: Decimal,
    pub breakdown: Vec<StoreNeed>,
}

/// Products to buy at one stall.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StallGroup {
    /// `None` for the unassigned bucket.
    pub stall: Option<Stall>,
    pub stall_name: String,
    pub items: Vec<ProductDemand>,
}

#[derive(Debug)]
struct ProductAccumulator {
    demand: ProductDemand,
    category_sort: i32,
    stores: BTreeMap<StoreId, StoreNeed>,
}

impl ProductAccumulator {
    fn new(line: &DemandLine) -> Self {
        Self {
            demand: ProductDemand {
                product_id: line.product_id.clone(),
                product_name: line.product_name.clone(),
                unit: line.unit.clone(),
                category_name: line.category_name.clone(),
                price_reference: line.price_reference,
                total_quantity: Decimal::ZERO,
                breakdown: Vec::new(),
            },
            category_sort: line.category_sort,
            stores: BTreeMap::new(),
        }
    }

    fn add(&mut self, line: &DemandLine) {
        self.demand.total_quantity += line.quantity;
        self.stores
            .entry(line.store_id.clone())
            .or_insert_with(|| StoreNeed {
                store_id: line.store_id.clone(),
                store_name: line.store_name.clone(),
                quantity: Decimal::ZERO,
            })
            .quantity += line.quantity;
    }

    fn finish(self) -> ProductDemand {
        let mut breakdown: Vec<StoreNeed> = self.stores.into_values().collect();
        breakdown.sort_by(|a, b| a.store_name.cmp(&b.store_name));
        ProductDemand {
            breakdown,
            ..self.demand
        }
    }
}

fn accumulate<'a, I>(lines: I) -> HashMap<ProductId, ProductAccumulator>
where
    I: IntoIterator<Item = &'a DemandLine>,
{
    let mut products: HashMap<ProductId, ProductAccumulator> = HashMap::new();
    for line in lines {
        if line.quantity <= Decimal::ZERO {
            continue;
        }
        products
            .entry(line.product_id.clone())
            .or_insert_with(|| ProductAccumulator::new(line))
            .add(line);
    }
    products
}

/// Demand grouped by product, ordered by category then product name.
#[must_use]
pub fn by_product(lines: &[DemandLine]) -> Vec<ProductDemand> {
    let mut products: Vec<ProductAccumulator> = accumulate(lines).into_values().collect();
    products.sort_by(|a, b| {
        a.category_sort
            .cmp(&b.category_sort)
            .then_with(|| a.demand.category_name.cmp(&b.demand.category_name))
            .then_with(|| a.demand.product_name.cmp(&b.demand.product_name))
    });
    products.into_iter().map(ProductAccumulator::finish).collect()
}

/// Demand grouped by stall, optionally restricted to one delivery date.
///
/// Stalls are ordered by their sort order; the unassigned bucket is last.
/// Products within a stall are ordered by name.
#[must_use]
pub fn by_stall(lines: &[DemandLine], date: Option<NaiveDate>) -> Vec<StallGroup> {
    let mut buckets: HashMap<Option<StallId>, (Option<Stall>, Vec<&DemandLine>)> = HashMap::new();
    for line in lines
        .iter()
        .filter(|line| date.map_or(true, |d| line.delivery_date == d))
    {
        buckets
            .entry(line.stall.as_ref().map(|s| s.id.clone()))
            .or_insert_with(|| (line.stall.clone(), Vec::new()))
            .1
            .push(line);
    }

    let mut groups: Vec<StallGroup> = buckets
        .into_values()
        .map(|(stall, lines)| {
            let mut items: Vec<ProductDemand> = accumulate(lines)
                .into_values()
                .map(ProductAccumulator::finish)
                .collect();
            items.sort_by(|a, b| a.product_name.cmp(&b.product_name));
            StallGroup {
                stall_name: stall
                    .as_ref()
                    .map_or_else(|| UNASSIGNED_STALL.to_string(), |s| s.name.clone()),
                stall,
                items,
            }
        })
        .filter(|group| !group.items.is_empty())
        .collect();

    groups.sort_by(|a, b| match (&a.stall, &b.stall) {
        (Some(x), Some(y)) => x.sort_order.cmp(&y.sort_order).then_with(|| x.name.cmp(&y.name)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    groups
}
