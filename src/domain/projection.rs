//! Order status projection after an allocation pass.

use super::order::{Order, OrderItem, OrderStatus};

/// Status an order should hold given the allocation state of its items.
///
/// Returns `None` for an order with no items: such orders are never moved by
/// the projector.
#[must_use]
pub fn project_items(items: &[OrderItem]) -> Option<OrderStatus> {
    if items.is_empty() {
        return None;
    }
    if items.iter().all(|item| item.fulfillment.is_allocated()) {
        Some(OrderStatus::Delivered)
    } else {
        Some(OrderStatus::Purchasing)
    }
}

/// Projected status for `order`, or `None` when it must be left untouched.
///
/// Cancelled and delivered orders are never revived.
#[must_use]
pub fn project(order: &Order) -> Option<OrderStatus> {
    if !order.status.is_outstanding() {
        return None;
    }
    project_items(&order.items).filter(|status| *status != order.status)
}
