//! Purchase orders and their items.
//!
//! An order belongs to one store and carries one item per product. Items move
//! from [`Fulfillment::Unallocated`] to [`Fulfillment::Allocated`] exactly once,
//! when a purchase batch for their product is recorded.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::{OrderId, OrderItemId, ProductId, StoreId, UserId};
use super::money;

/// Lifecycle status of a purchase order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Approved,
    Purchasing,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Statuses whose items are still owed to the store.
    pub const OUTSTANDING: [OrderStatus; 3] = [Self::Pending, Self::Approved, Self::Purchasing];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Purchasing => "purchasing",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// True when items of an order in this status can still receive purchases.
    #[must_use]
    pub fn is_outstanding(self) -> bool {
        Self::OUTSTANDING.contains(&self)
    }

    /// Statuses an operator may explicitly move an order to from `self`.
    ///
    /// `purchasing` and `delivered` never appear here: only the status
    /// projection that runs after an allocation sets them.
    #[must_use]
    pub const fn explicit_targets(self) -> &'static [OrderStatus] {
        match self {
            Self::Pending => &[Self::Approved, Self::Cancelled],
            Self::Approved | Self::Purchasing => &[Self::Cancelled],
            Self::Delivered | Self::Cancelled => &[],
        }
    }

    /// Validate an explicit transition request.
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidTransition`] when `to` is not reachable.
    pub fn transition_to(self, to: OrderStatus) -> Result<OrderStatus, DomainError> {
        if self.explicit_targets().contains(&to) {
            Ok(to)
        } else {
            Err(DomainError::InvalidTransition { from: self, to })
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "purchasing" => Ok(Self::Purchasing),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(DomainError::InvalidValue {
                field: "order status",
                value: other.to_string(),
            }),
        }
    }
}

/// Allocation state of an order item.
///
/// Write-once: an item is allocated by the first batch that buys its product
/// and is never revisited afterwards, even when the batch only partially
/// covered it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Fulfillment {
    #[default]
    Unallocated,
    Allocated {
        /// Quantity actually delivered. Absent only on legacy rows.
        quantity: Option<Decimal>,
        /// Cost charged to the store for this item.
        cost: Decimal,
    },
}

impl Fulfillment {
    /// Rebuild the state from the nullable persisted columns.
    #[must_use]
    pub fn from_columns(quantity_fulfilled: Option<Decimal>, allocated_cost: Option<Decimal>) -> Self {
        match allocated_cost {
            Some(cost) => Self::Allocated {
                quantity: quantity_fulfilled,
                cost,
            },
            None => Self::Unallocated,
        }
    }

    #[must_use]
    pub const fn is_allocated(&self) -> bool {
        matches!(self, Self::Allocated { .. })
    }

    #[must_use]
    pub const fn allocated_cost(&self) -> Option<Decimal> {
        match self {
            Self::Allocated { cost, .. } => Some(*cost),
            Self::Unallocated => None,
        }
    }

    #[must_use]
    pub const fn quantity_fulfilled(&self) -> Option<Decimal> {
        match self {
            Self::Allocated { quantity, .. } => *quantity,
            Self::Unallocated => None,
        }
    }
}

/// One line of a purchase order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity_requested: Decimal,
    /// Quantity the purchaser should buy; defaults to the requested quantity.
    pub quantity_approved: Option<Decimal>,
    pub fulfillment: Fulfillment,
    pub notes: Option<String>,
}

impl OrderItem {
    /// Approved quantity, treating a missing approval as zero.
    #[must_use]
    pub fn approved(&self) -> Decimal {
        self.quantity_approved.unwrap_or(Decimal::ZERO)
    }

    /// Quantity shown on a bill: fulfilled when known, else approved.
    #[must_use]
    pub fn billed_quantity(&self) -> Decimal {
        self.fulfillment
            .quantity_fulfilled()
            .or(self.quantity_approved)
            .unwrap_or(Decimal::ZERO)
    }
}

/// A purchase order with its items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub store_id: StoreId,
    pub requester_id: UserId,
    pub delivery_date: NaiveDate,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

/// A requested line of a new order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: Decimal,
    #[serde(default)]
    pub notes: Option<String>,
}

impl OrderLine {
    /// Create a validated order line.
    ///
    /// # Errors
    /// Returns [`DomainError::NonPositiveQuantity`] when the quantity is not
    /// positive at storage precision.
    pub fn try_new(product_id: ProductId, quantity: Decimal) -> Result<Self, DomainError> {
        let line = Self {
            product_id,
            quantity,
            notes: None,
        };
        line.validate()?;
        Ok(line)
    }

    /// Re-check the invariants of a deserialized line.
    ///
    /// # Errors
    /// Returns [`DomainError::NonPositiveQuantity`] when the quantity rounds
    /// to zero or below at storage precision.
    pub fn validate(&self) -> Result<(), DomainError> {
        if money::quantity(self.quantity) <= Decimal::ZERO {
            return Err(DomainError::NonPositiveQuantity {
                product: self.product_id.clone(),
                quantity: self.quantity,
            });
        }
        Ok(())
    }
}

impl Order {
    /// Build a new pending order, auto-approving every requested quantity.
    ///
    /// # Errors
    /// Rejects empty orders, non-positive quantities and repeated products.
    pub fn submit(
        store_id: StoreId,
        requester_id: UserId,
        delivery_date: NaiveDate,
        lines: Vec<OrderLine>,
    ) -> Result<Self, DomainError> {
        if lines.is_empty() {
            return Err(DomainError::EmptyOrder);
        }
        let mut seen = HashSet::with_capacity(lines.len());
        for line in &lines {
            line.validate()?;
            if !seen.insert(&line.product_id) {
                return Err(DomainError::DuplicateProduct {
                    product: line.product_id.clone(),
                });
            }
        }

        let id = OrderId::new();
        let mut items: Vec<OrderItem> = Vec::with_capacity(lines.len());
        for line in lines {
            let quantity = money::quantity(line.quantity);
            items.push(OrderItem {
                id: OrderItemId::new(),
                order_id: id.clone(),
                product_id: line.product_id,
                quantity_requested: quantity,
                quantity_approved: Some(quantity),
                fulfillment: Fulfillment::Unallocated,
                notes: line.notes,
            });
        }
        Ok(Self {
            id,
            store_id,
            requester_id,
            delivery_date,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
            items,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
    }

    #[test]
    fn status_roundtrips_through_str() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Approved,
            OrderStatus::Purchasing,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn outstanding_statuses() {
        assert!(OrderStatus::Pending.is_outstanding());
        assert!(OrderStatus::Purchasing.is_outstanding());
        assert!(!OrderStatus::Delivered.is_outstanding());
        assert!(!OrderStatus::Cancelled.is_outstanding());
    }

    #[test]
    fn projector_statuses_are_not_explicit_targets() {
        assert!(OrderStatus::Pending
            .transition_to(OrderStatus::Purchasing)
            .is_err());
        assert!(OrderStatus::Purchasing
            .transition_to(OrderStatus::Delivered)
            .is_err());
        assert_eq!(
            OrderStatus::Pending.transition_to(OrderStatus::Approved),
            Ok(OrderStatus::Approved)
        );
        assert_eq!(
            OrderStatus::Purchasing.transition_to(OrderStatus::Cancelled),
            Ok(OrderStatus::Cancelled)
        );
    }

    #[test]
    fn terminal_statuses_reject_everything() {
        assert!(OrderStatus::Delivered
            .transition_to(OrderStatus::Cancelled)
            .is_err());
        assert!(OrderStatus::Cancelled
            .transition_to(OrderStatus::Approved)
            .is_err());
    }

    #[test]
    fn submit_auto_approves_requested_quantity() {
        let order = Order::submit(
            StoreId::from("s1"),
            UserId::from("u1"),
            date(),
            vec![OrderLine::try_new(ProductId::from("p1"), dec!(2.5)).unwrap()],
        )
        .unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].quantity_approved, Some(dec!(2.5)));
        assert_eq!(order.items[0].order_id, order.id);
        assert!(!order.items[0].fulfillment.is_allocated());
    }

    #[test]
    fn submit_rejects_duplicate_products() {
        let lines = vec![
            OrderLine::try_new(ProductId::from("p1"), dec!(1)).unwrap(),
            OrderLine::try_new(ProductId::from("p1"), dec!(2)).unwrap(),
        ];
        let result = Order::submit(StoreId::from("s1"), UserId::from("u1"), date(), lines);
        assert!(matches!(result, Err(DomainError::DuplicateProduct { .. })));
    }

    #[test]
    fn submit_rejects_empty_orders() {
        let result = Order::submit(StoreId::from("s1"), UserId::from("u1"), date(), vec![]);
        assert_eq!(result.unwrap_err(), DomainError::EmptyOrder);
    }

    #[test]
    fn order_line_rejects_zero_quantity() {
        assert!(OrderLine::try_new(ProductId::from("p"), Decimal::ZERO).is_err());
    }

    #[test]
    fn order_line_rejects_quantity_below_storage_precision() {
        assert!(matches!(
            OrderLine::try_new(ProductId::from("p"), dec!(0.0004)),
            Err(DomainError::NonPositiveQuantity { .. })
        ));

        let line = OrderLine::try_new(ProductId::from("p"), dec!(0.0005)).unwrap();
        let order = Order::submit(StoreId::from("s1"), UserId::from("u1"), date(), vec![line]).unwrap();
        assert_eq!(order.items[0].quantity_requested, dec!(0.001));
    }

    #[test]
    fn fulfillment_from_columns() {
        assert_eq!(Fulfillment::from_columns(None, None), Fulfillment::Unallocated);
        assert_eq!(
            Fulfillment::from_columns(Some(dec!(8)), Some(dec!(64000))).allocated_cost(),
            Some(dec!(64000))
        );
        // A cost without a quantity still counts as allocated.
        assert!(Fulfillment::from_columns(None, Some(dec!(1))).is_allocated());
    }

    #[test]
    fn billed_quantity_falls_back_to_approved() {
        let item = OrderItem {
            id: OrderItemId::new(),
            order_id: OrderId::new(),
            product_id: ProductId::from("p"),
            quantity_requested: dec!(5),
            quantity_approved: Some(dec!(4)),
            fulfillment: Fulfillment::Allocated {
                quantity: None,
                cost: dec!(10),
            },
            notes: None,
        };
        assert_eq!(item.billed_quantity(), dec!(4));
    }
}
