//! Allocation of a purchased quantity and its cost onto outstanding demand.
//!
//! Every candidate item receives the same fulfillment ratio,
//! `min(bought / requested, 1)`, so a short purchase under-fulfills all stores
//! proportionally and an over-purchase never hands out more than was asked
//! for. Rounded shares are apportioned with largest remainders, so the
//! fulfilled quantities sum to exactly `min(bought, requested)` and the
//! allocated costs sum to that quantity at the batch's unit price.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::batch::BatchLine;
use super::id::{OrderId, OrderItemId};
use super::money::{self, MONEY_SCALE, QUANTITY_SCALE};

/// An unallocated order item that may receive part of a purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationCandidate {
    pub item_id: OrderItemId,
    pub order_id: OrderId,
    pub quantity_approved: Decimal,
}

/// What one order item receives from a batch line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemAllocation {
    pub item_id: OrderItemId,
    pub order_id: OrderId,
    pub quantity_fulfilled: Decimal,
    pub allocated_cost: Decimal,
}

/// Result of distributing one batch line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationPlan {
    pub total_requested: Decimal,
    pub ratio: Decimal,
    pub allocations: Vec<ItemAllocation>,
}

impl AllocationPlan {
    /// Orders owning at least one allocated item.
    #[must_use]
    pub fn touched_orders(&self) -> BTreeSet<OrderId> {
        self.allocations.iter().map(|a| a.order_id.clone()).collect()
    }

    /// Total quantity handed out.
    #[must_use]
    pub fn quantity_fulfilled(&self) -> Decimal {
        money::sum(self.allocations.iter().map(|a| a.quantity_fulfilled))
    }

    /// Total cost handed out.
    #[must_use]
    pub fn allocated_cost(&self) -> Decimal {
        money::sum(self.allocations.iter().map(|a| a.allocated_cost))
    }
}

/// Fulfillment ratio for `bought` against `requested`, capped at one.
///
/// Returns `None` when nothing was requested.
#[must_use]
pub fn fulfillment_ratio(bought: Decimal, requested: Decimal) -> Option<Decimal> {
    if requested <= Decimal::ZERO {
        return None;
    }
    Some((bought / requested).min(Decimal::ONE))
}

/// Distribute a validated batch line across `candidates`.
///
/// Candidates with no approved quantity are ignored. Returns `None` when no
/// demand is left, in which case the purchase is recorded without touching
/// any order.
#[must_use]
pub fn plan(line: &BatchLine, candidates: &[AllocationCandidate]) -> Option<AllocationPlan> {
    let eligible: Vec<&AllocationCandidate> = candidates
        .iter()
        .filter(|c| c.quantity_approved > Decimal::ZERO)
        .collect();
    if eligible.is_empty() {
        return None;
    }

    let total_requested = money::sum(eligible.iter().map(|c| c.quantity_approved));
    let ratio = fulfillment_ratio(line.quantity, total_requested)?;

    let approved: Vec<Decimal> = eligible.iter().map(|c| c.quantity_approved).collect();
    let delivered_total = money::quantity(line.quantity.min(total_requested));
    let quantities = money::apportion(delivered_total, &approved, QUANTITY_SCALE);

    let cost_total = money::money(delivered_total * line.unit_price());
    let costs = money::apportion(cost_total, &quantities, MONEY_SCALE);

    let allocations = eligible
        .into_iter()
        .zip(quantities)
        .zip(costs)
        .map(|((candidate, quantity_fulfilled), allocated_cost)| ItemAllocation {
            item_id: candidate.item_id.clone(),
            order_id: candidate.order_id.clone(),
            quantity_fulfilled,
            allocated_cost,
        })
        .collect();

    Some(AllocationPlan {
        total_requested,
        ratio,
        allocations,
    })
}
