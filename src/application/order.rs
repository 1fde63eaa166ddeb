//! Order service: submission and explicit status transitions.
//!
//! `purchasing` and `delivered` are never set here; only the status
//! projector run by a batch submission moves orders into them.

use chrono::NaiveDate;
use tracing::info;

use crate::domain::id::{OrderId, StoreId, UserId};
use crate::domain::order::{Order, OrderLine, OrderStatus};
use crate::error::{NotFoundError, Result};
use crate::port::outbound::ledger::{CatalogLedger, Ledger, OrderFilter, OrderLedger};

pub struct OrderService<L> {
    ledger: L,
}

impl<L: Ledger> OrderService<L> {
    pub const fn new(ledger: L) -> Self {
        Self { ledger }
    }

    /// Create a pending order with one auto-approved item per line.
    ///
    /// # Errors
    /// Validation errors for empty orders, non-positive quantities and
    /// repeated products; not-found for an unknown store or product.
    pub async fn submit(
        &self,
        store_id: StoreId,
        requester_id: UserId,
        delivery_date: NaiveDate,
        lines: Vec<OrderLine>,
    ) -> Result<Order> {
        let order = Order::submit(store_id, requester_id, delivery_date, lines)?;

        let order = self
            .ledger
            .write(move |tx| {
                if tx.store(&order.store_id)?.is_none() {
                    return Err(NotFoundError::Store(order.store_id.to_string()).into());
                }
                for item in &order.items {
                    if tx.product(&item.product_id)?.is_none() {
                        return Err(NotFoundError::Product(item.product_id.to_string()).into());
                    }
                }
                tx.insert_order(&order)?;
                Ok(order)
            })
            .await?;

        info!(
            order_id = %order.id,
            store_id = %order.store_id,
            delivery_date = %order.delivery_date,
            items = order.items.len(),
            "Order submitted"
        );
        Ok(order)
    }

    /// Apply an explicit transition (approve or cancel).
    ///
    /// # Errors
    /// Not-found for an unknown order; validation error when the transition
    /// is not allowed from the current status.
    pub async fn transition(&self, id: &OrderId, to: OrderStatus) -> Result<Order> {
        let key = id.clone();
        let (order, from) = self
            .ledger
            .write(move |tx| {
                let mut order = tx
                    .order(&key)?
                    .ok_or_else(|| NotFoundError::Order(key.to_string()))?;
                let from = order.status;
                order.status = from.transition_to(to)?;
                tx.set_order_status(&order.id, order.status)?;
                Ok((order, from))
            })
            .await?;

        info!(order_id = %order.id, from = %from, to = %order.status, "Order transitioned");
        Ok(order)
    }

    /// Orders matching `filter`, oldest first.
    ///
    /// # Errors
    /// Storage errors only.
    pub async fn list(&self, filter: OrderFilter) -> Result<Vec<Order>> {
        self.ledger.read(move |tx| tx.orders(&filter)).await
    }

    /// # Errors
    /// Not-found if no order has this id.
    pub async fn get(&self, id: &OrderId) -> Result<Order> {
        let key = id.clone();
        self.ledger
            .read(move |tx| tx.order(&key))
            .await?
            .ok_or_else(|| NotFoundError::Order(id.to_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::DomainError;
    use crate::domain::id::ProductId;
    use crate::error::Error;
    use crate::testkit::domain::{date, line, seed_catalog, user};
    use crate::testkit::ledger::TempLedger;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn submit_then_approve_then_cancel() {
        let temp = TempLedger::new();
        let ledger = temp.ledger();
        let c = seed_catalog(&ledger).await;
        let service = OrderService::new(ledger);

        let order = service
            .submit(c.north.id.clone(), user(), date(3), vec![line(&c.tomato, dec!(2))])
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(service.get(&order.id).await.unwrap(), order);

        let approved = service.transition(&order.id, OrderStatus::Approved).await.unwrap();
        assert_eq!(approved.status, OrderStatus::Approved);

        let cancelled = service.transition(&order.id, OrderStatus::Cancelled).await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);

        let err = service
            .transition(&order.id, OrderStatus::Approved)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Domain(DomainError::InvalidTransition { .. })));
    }

    #[tokio::test]
    async fn projector_statuses_cannot_be_set_explicitly() {
        let temp = TempLedger::new();
        let ledger = temp.ledger();
        let c = seed_catalog(&ledger).await;
        let service = OrderService::new(ledger);
        let order = service
            .submit(c.north.id.clone(), user(), date(3), vec![line(&c.tomato, dec!(2))])
            .await
            .unwrap();

        for to in [OrderStatus::Purchasing, OrderStatus::Delivered] {
            assert!(service.transition(&order.id, to).await.unwrap_err().is_validation());
        }
        assert_eq!(service.get(&order.id).await.unwrap().status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn unknown_store_or_product_is_not_found() {
        let temp = TempLedger::new();
        let ledger = temp.ledger();
        let c = seed_catalog(&ledger).await;
        let service = OrderService::new(ledger);

        let err = service
            .submit(StoreId::from("store-x"), user(), date(3), vec![line(&c.tomato, dec!(1))])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(NotFoundError::Store(_))));

        let ghost = OrderLine::try_new(ProductId::from("prod-x"), dec!(1)).unwrap();
        let err = service
            .submit(c.north.id.clone(), user(), date(3), vec![ghost])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(NotFoundError::Product(_))));

        assert!(service.list(OrderFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_filters_by_store_and_status() {
        let temp = TempLedger::new();
        let ledger = temp.ledger();
        let c = seed_catalog(&ledger).await;
        let service = OrderService::new(ledger);
        let north = service
            .submit(c.north.id.clone(), user(), date(3), vec![line(&c.tomato, dec!(1))])
            .await
            .unwrap();
        service
            .submit(c.south.id.clone(), user(), date(3), vec![line(&c.onion, dec!(1))])
            .await
            .unwrap();
        service.transition(&north.id, OrderStatus::Approved).await.unwrap();

        let approved = service
            .list(OrderFilter {
                statuses: vec![OrderStatus::Approved],
                ..OrderFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].id, north.id);

        let south = service
            .list(OrderFilter {
                store_id: Some(c.south.id.clone()),
                ..OrderFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(south.len(), 1);
        assert_eq!(south[0].store_id, c.south.id);
    }

    #[tokio::test]
    async fn missing_order_is_not_found() {
        let temp = TempLedger::new();
        let service = OrderService::new(temp.ledger());
        assert!(service.get(&OrderId::from("nope")).await.unwrap_err().is_not_found());
        assert!(service
            .transition(&OrderId::from("nope"), OrderStatus::Cancelled)
            .await
            .unwrap_err()
            .is_not_found());
    }
}
