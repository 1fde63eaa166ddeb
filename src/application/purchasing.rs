//! Purchasing service: record batches and allocate their cost to orders.
//!
//! A submission is one unit of work. The batch, every batch item, every
//! allocation and the resulting order status changes commit together or not
//! at all.

use std::collections::BTreeSet;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::domain::allocation::{self, AllocationPlan};
use crate::domain::batch::{self, BatchItem, BatchLine, BatchStatus, PurchaseBatch};
use crate::domain::id::{BatchId, OrderId, ProductId, UserId};
use crate::domain::order::OrderStatus;
use crate::domain::projection;
use crate::error::{NotFoundError, Result};
use crate::port::outbound::ledger::{CatalogLedger, Ledger, LedgerTx, OrderLedger, PurchaseLedger};

/// A purchasing trip as reported by the purchaser.
#[derive(Debug, Clone)]
pub struct BatchSubmission {
    pub purchaser_id: UserId,
    pub market_location: Option<String>,
    /// Defaults to today (UTC).
    pub purchase_date: Option<NaiveDate>,
    pub lines: Vec<BatchLine>,
}

/// How one batch line was spread over outstanding demand.
#[derive(Debug, Clone, Serialize)]
pub struct LineOutcome {
    pub product_id: ProductId,
    /// `None` when nothing was owed for the product.
    pub plan: Option<AllocationPlan>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusChange {
    pub order_id: OrderId,
    pub from: OrderStatus,
    pub to: OrderStatus,
}

/// Everything a batch submission changed.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReceipt {
    pub batch: PurchaseBatch,
    pub lines: Vec<LineOutcome>,
    pub status_changes: Vec<StatusChange>,
}

impl BatchReceipt {
    /// Number of order items that received an allocation.
    #[must_use]
    pub fn allocated_items(&self) -> usize {
        self.lines
            .iter()
            .filter_map(|l| l.plan.as_ref())
            .map(|p| p.allocations.len())
            .sum()
    }
}

pub struct PurchasingService<L> {
    ledger: L,
}

impl<L: Ledger> PurchasingService<L> {
    pub const fn new(ledger: L) -> Self {
        Self { ledger }
    }

    /// Record a finalized batch, allocate every line and project the
    /// statuses of the orders it touched.
    ///
    /// # Errors
    /// Validation errors for empty batches, non-positive quantity or cost
    /// and repeated products; not-found for unknown products; conflict if
    /// another writer allocated the same order item first. Any error rolls
    /// the whole submission back.
    pub async fn submit_batch(&self, submission: BatchSubmission) -> Result<BatchReceipt> {
        batch::validate_lines(&submission.lines)?;

        let batch = PurchaseBatch {
            id: BatchId::new(),
            purchaser_id: submission.purchaser_id,
            purchase_date: submission
                .purchase_date
                .unwrap_or_else(|| Utc::now().date_naive()),
            market_location: submission.market_location,
            status: BatchStatus::Finalized,
            created_at: Utc::now(),
            items: Vec::new(),
        };
        let lines = submission.lines;

        let receipt = self
            .ledger
            .write(move |tx| record_batch(tx, batch, &lines))
            .await?;

        info!(
            batch_id = %receipt.batch.id,
            lines = receipt.lines.len(),
            allocated_items = receipt.allocated_items(),
            status_changes = receipt.status_changes.len(),
            "Batch submitted"
        );
        Ok(receipt)
    }

    /// # Errors
    /// Not-found if no batch has this id.
    pub async fn get_batch(&self, id: &BatchId) -> Result<PurchaseBatch> {
        let key = id.clone();
        self.ledger
            .read(move |tx| tx.batch(&key))
            .await?
            .ok_or_else(|| NotFoundError::Batch(id.to_string()).into())
    }

    /// All batches, newest first.
    ///
    /// # Errors
    /// Storage errors only.
    pub async fn list_batches(&self) -> Result<Vec<PurchaseBatch>> {
        self.ledger.read(|tx| tx.batches()).await
    }
}

fn record_batch(
    tx: &mut dyn LedgerTx,
    mut batch: PurchaseBatch,
    lines: &[BatchLine],
) -> Result<BatchReceipt> {
    tx.insert_batch(&batch)?;

    let mut outcomes = Vec::with_capacity(lines.len());
    let mut touched: BTreeSet<OrderId> = BTreeSet::new();

    for line in lines {
        if tx.product(&line.product_id)?.is_none() {
            return Err(NotFoundError::Product(line.product_id.to_string()).into());
        }

        let item = BatchItem::record(&batch.id, line);
        tx.insert_batch_item(&item)?;
        batch.items.push(item);

        let candidates = tx.allocation_candidates(&line.product_id)?;
        let plan = allocation::plan(line, &candidates);
        match &plan {
            Some(plan) => {
                debug!(
                    product_id = %line.product_id,
                    candidates = candidates.len(),
                    requested = %plan.total_requested,
                    ratio = %plan.ratio,
                    "Allocating batch line"
                );
                for allocation in &plan.allocations {
                    tx.record_allocation(allocation)?;
                }
                touched.extend(plan.touched_orders());
            }
            None => debug!(product_id = %line.product_id, "No outstanding demand for batch line"),
        }
        outcomes.push(LineOutcome {
            product_id: line.product_id.clone(),
            plan,
        });
    }

    let status_changes = project_orders(tx, &touched)?;

    Ok(BatchReceipt {
        batch,
        lines: outcomes,
        status_changes,
    })
}

/// Re-derive the status of every touched order from its items.
fn project_orders(tx: &mut dyn LedgerTx, touched: &BTreeSet<OrderId>) -> Result<Vec<StatusChange>> {
    let mut changes = Vec::new();
    for order_id in touched {
        let Some(order) = tx.order(order_id)? else {
            continue;
        };
        if let Some(to) = projection::project(&order) {
            tx.set_order_status(order_id, to)?;
            debug!(order_id = %order_id, from = %order.status, to = %to, "Order status projected");
            changes.push(StatusChange {
                order_id: order_id.clone(),
                from: order.status,
                to,
            });
        }
    }
    Ok(changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::Order;
    use crate::error::Error;
    use crate::testkit::domain::{batch_line, date, line, place_order, seed_catalog, user};
    use crate::testkit::ledger::TempLedger;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn submission(lines: Vec<BatchLine>) -> BatchSubmission {
        BatchSubmission {
            purchaser_id: user(),
            market_location: Some("Central market".to_string()),
            purchase_date: Some(date(1)),
            lines,
        }
    }

    async fn reload<L: Ledger>(ledger: &L, order: &Order) -> Order {
        let id = order.id.clone();
        ledger
            .read(move |tx| tx.order(&id))
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn partial_purchase_splits_proportionally_and_delivers() {
        let temp = TempLedger::new();
        let ledger = temp.ledger();
        let c = seed_catalog(&ledger).await;
        let o1 = place_order(&ledger, &c.north, date(1), vec![line(&c.tomato, dec!(10))]).await;
        let o2 = place_order(&ledger, &c.south, date(1), vec![line(&c.tomato, dec!(5))]).await;

        let service = PurchasingService::new(ledger.clone());
        let receipt = service
            .submit_batch(submission(vec![batch_line(&c.tomato, dec!(12), dec!(96000))]))
            .await
            .unwrap();

        let plan = receipt.lines[0].plan.as_ref().unwrap();
        assert_eq!(plan.total_requested, dec!(15));
        assert_eq!(plan.ratio, dec!(0.8));
        assert_eq!(receipt.status_changes.len(), 2);

        let o1 = reload(&ledger, &o1).await;
        let o2 = reload(&ledger, &o2).await;
        assert_eq!(o1.status, OrderStatus::Delivered);
        assert_eq!(o2.status, OrderStatus::Delivered);
        assert_eq!(o1.items[0].fulfillment.quantity_fulfilled(), Some(dec!(8)));
        assert_eq!(o1.items[0].fulfillment.allocated_cost(), Some(dec!(64000)));
        assert_eq!(o2.items[0].fulfillment.quantity_fulfilled(), Some(dec!(4)));
        assert_eq!(o2.items[0].fulfillment.allocated_cost(), Some(dec!(32000)));

        let stored = service.get_batch(&receipt.batch.id).await.unwrap();
        assert_eq!(stored.status, BatchStatus::Finalized);
        assert_eq!(stored.items.len(), 1);
        assert_eq!(stored.items[0].unit_price, dec!(8000));
    }

    #[tokio::test]
    async fn order_with_unbought_item_moves_to_purchasing() {
        let temp = TempLedger::new();
        let ledger = temp.ledger();
        let c = seed_catalog(&ledger).await;
        let order = place_order(
            &ledger,
            &c.north,
            date(1),
            vec![line(&c.tomato, dec!(2)), line(&c.onion, dec!(3))],
        )
        .await;

        let service = PurchasingService::new(ledger.clone());
        service
            .submit_batch(submission(vec![batch_line(&c.tomato, dec!(2), dec!(10))]))
            .await
            .unwrap();
        assert_eq!(reload(&ledger, &order).await.status, OrderStatus::Purchasing);

        let receipt = service
            .submit_batch(submission(vec![batch_line(&c.onion, dec!(3), dec!(9))]))
            .await
            .unwrap();
        assert_eq!(receipt.status_changes[0].from, OrderStatus::Purchasing);
        assert_eq!(receipt.status_changes[0].to, OrderStatus::Delivered);
        assert_eq!(reload(&ledger, &order).await.status, OrderStatus::Delivered);
    }

    #[tokio::test]
    async fn batch_without_demand_is_still_recorded() {
        let temp = TempLedger::new();
        let ledger = temp.ledger();
        let c = seed_catalog(&ledger).await;

        let service = PurchasingService::new(ledger);
        let receipt = service
            .submit_batch(submission(vec![batch_line(&c.tuna, dec!(4), dec!(200))]))
            .await
            .unwrap();

        assert!(receipt.lines[0].plan.is_none());
        assert!(receipt.status_changes.is_empty());
        assert_eq!(service.list_batches().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn allocated_items_are_not_allocated_twice() {
        let temp = TempLedger::new();
        let ledger = temp.ledger();
        let c = seed_catalog(&ledger).await;
        let order = place_order(&ledger, &c.north, date(1), vec![line(&c.tomato, dec!(4))]).await;

        let service = PurchasingService::new(ledger.clone());
        service
            .submit_batch(submission(vec![batch_line(&c.tomato, dec!(1), dec!(5))]))
            .await
            .unwrap();
        let second = service
            .submit_batch(submission(vec![batch_line(&c.tomato, dec!(3), dec!(15))]))
            .await
            .unwrap();

        assert!(second.lines[0].plan.is_none());
        let order = reload(&ledger, &order).await;
        assert_eq!(order.items[0].fulfillment.quantity_fulfilled(), Some(dec!(1)));
        assert_eq!(order.items[0].fulfillment.allocated_cost(), Some(dec!(5)));
    }

    #[tokio::test]
    async fn invalid_lines_write_nothing() {
        let temp = TempLedger::new();
        let ledger = temp.ledger();
        let c = seed_catalog(&ledger).await;
        let service = PurchasingService::new(ledger);

        let zero = BatchLine {
            product_id: c.tomato.id.clone(),
            quantity: Decimal::ZERO,
            cost: dec!(10),
        };
        let err = service.submit_batch(submission(vec![zero])).await.unwrap_err();
        assert!(err.is_validation());

        let err = service.submit_batch(submission(vec![])).await.unwrap_err();
        assert!(err.is_validation());

        let twice = vec![
            batch_line(&c.tomato, dec!(1), dec!(1)),
            batch_line(&c.tomato, dec!(2), dec!(2)),
        ];
        assert!(service.submit_batch(submission(twice)).await.unwrap_err().is_validation());

        assert!(service.list_batches().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_product_rolls_back_earlier_lines() {
        let temp = TempLedger::new();
        let ledger = temp.ledger();
        let c = seed_catalog(&ledger).await;
        let order = place_order(&ledger, &c.north, date(1), vec![line(&c.tomato, dec!(1))]).await;
        let service = PurchasingService::new(ledger.clone());

        let lines = vec![
            batch_line(&c.tomato, dec!(1), dec!(10)),
            BatchLine::try_new(ProductId::from("prod-missing"), dec!(1), dec!(1)).unwrap(),
        ];
        let err = service.submit_batch(submission(lines)).await.unwrap_err();

        assert!(matches!(err, Error::NotFound(NotFoundError::Product(_))));
        assert!(service.list_batches().await.unwrap().is_empty());
        let order = reload(&ledger, &order).await;
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(!order.items[0].fulfillment.is_allocated());
    }

    #[tokio::test]
    async fn missing_batch_is_not_found() {
        let temp = TempLedger::new();
        let service = PurchasingService::new(temp.ledger());
        let err = service.get_batch(&BatchId::from("nope")).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
