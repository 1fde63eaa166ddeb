//! Bill computation: per-store item totals plus shared expense shares.
//!
//! Pure functions over already-loaded delivered orders and expenses. The
//! billing service wraps them in a ledger transaction and persists the
//! resulting [`StoreStatement`]s.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;

use super::bill::{BillDetail, BillLine, ExpenseShare, StoreStatement};
use super::catalog::Product;
use super::expense::{SharedExpense, SplitMethod};
use super::id::{ProductId, StoreId};
use super::money;
use super::order::Order;

const UNKNOWN_PRODUCT: &str = "Unknown";
const DEFAULT_UNIT: &str = "pcs";

#[derive(Debug, Default)]
struct StoreAccumulator {
    items_total: Decimal,
    shared_total: Decimal,
    detail: BillDetail,
}

/// Sum allocated item costs per store and capture the line detail.
///
/// Missing costs count as zero. Lines with no cost are totalled but not
/// listed in the detail.
fn item_totals(
    orders: &[Order],
    products: &HashMap<ProductId, Product>,
) -> BTreeMap<StoreId, StoreAccumulator> {
    let mut stores: BTreeMap<StoreId, StoreAccumulator> = BTreeMap::new();

    for order in orders {
        let acc = stores.entry(order.store_id.clone()).or_default();
        for item in &order.items {
            let cost = item.fulfillment.allocated_cost().unwrap_or(Decimal::ZERO);
            acc.items_total += cost;
            if cost <= Decimal::ZERO {
                continue;
            }

            let unit_price = match item.fulfillment.quantity_fulfilled() {
                Some(q) if q > Decimal::ZERO => money::money(cost / q),
                _ => Decimal::ZERO,
            };
            let product = products.get(&item.product_id);
            acc.detail.items.push(BillLine {
                product_name: product.map_or_else(|| UNKNOWN_PRODUCT.to_string(), |p| p.name.clone()),
                unit: product.map_or_else(|| DEFAULT_UNIT.to_string(), |p| p.unit.clone()),
                quantity: item.billed_quantity(),
                unit_price,
                subtotal: cost,
            });
        }
    }

    stores
}

/// Weights used to split `expense` across stores with the given item spend.
///
/// Equal splits, and proportional splits on a day with no item spend, weigh
/// every store the same.
fn split_weights(expense: &SharedExpense, store_items: &[Decimal], all_items: Decimal) -> Vec<Decimal> {
    match expense.split_method {
        SplitMethod::Proportional if all_items > Decimal::ZERO => store_items.to_vec(),
        _ => vec![Decimal::ONE; store_items.len()],
    }
}

/// Compute one statement per participating store.
///
/// A store participates when it has at least one delivered order in
/// `orders`. Expenses are split only among participating stores. Statements
/// come back ordered by store id.
#[must_use]
pub fn compute_statements(
    orders: &[Order],
    products: &HashMap<ProductId, Product>,
    expenses: &[SharedExpense],
) -> Vec<StoreStatement> {
    let mut stores = item_totals(orders, products);
    if stores.is_empty() {
        return Vec::new();
    }

    let store_items: Vec<Decimal> = stores.values().map(|s| s.items_total).collect();
    let all_items = money::sum(store_items.iter().copied());

    for expense in expenses {
        let weights = split_weights(expense, &store_items, all_items);
        let shares = money::apportion(expense.amount, &weights, money::MONEY_SCALE);
        for (acc, share) in stores.values_mut().zip(shares) {
            acc.shared_total += share;
            acc.detail.expenses.push(ExpenseShare {
                expense_id: expense.id.clone(),
                kind: expense.kind,
                description: expense.description.clone(),
                total_amount: expense.amount,
                split_method: expense.split_method,
                store_share: share,
            });
        }
    }

    stores
        .into_iter()
        .map(|(store_id, acc)| StoreStatement {
            store_id,
            items_total: money::money(acc.items_total),
            shared_total: acc.shared_total,
            detail: acc.detail,
        })
        .collect()
}
