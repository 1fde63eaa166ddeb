//! Billing service: daily bills per store.
//!
//! `generate_bills` is an upsert keyed by (store, date) and runs in a single
//! write unit, so a half-billed day is never visible and re-running it with
//! unchanged data reproduces the same totals.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use tracing::{debug, info, warn};

use crate::domain::bill::{BillRunSummary, BillStatus, DailyBill};
use crate::domain::billing;
use crate::domain::catalog::Product;
use crate::domain::id::{BillId, ProductId, StoreId};
use crate::error::{Error, NotFoundError, Result};
use crate::port::outbound::ledger::{
    BillFilter, BillLedger, CatalogLedger, ExpenseLedger, Ledger, LedgerTx, OrderFilter, OrderLedger,
};

pub struct BillingService<L> {
    ledger: L,
    protect_confirmed: bool,
}

impl<L: Ledger> BillingService<L> {
    pub const fn new(ledger: L) -> Self {
        Self {
            ledger,
            protect_confirmed: false,
        }
    }

    /// Refuse to regenerate a date that already holds a confirmed bill.
    ///
    /// Off by default: regeneration reopens confirmed bills as drafts.
    #[must_use]
    pub const fn protect_confirmed(mut self, protect: bool) -> Self {
        self.protect_confirmed = protect;
        self
    }

    /// Compute and upsert one bill per store with delivered orders on `date`.
    ///
    /// # Errors
    /// [`NotFoundError::NoDeliveredOrders`] when nothing was delivered that
    /// day; [`Error::Conflict`] when confirmed bills are protected and one
    /// exists for the date.
    pub async fn generate_bills(&self, date: NaiveDate) -> Result<BillRunSummary> {
        let protect = self.protect_confirmed;
        let summary = self
            .ledger
            .write(move |tx| generate(tx, date, protect))
            .await?;

        info!(
            date = %summary.bill_date,
            stores = summary.total_stores,
            items = %summary.total_items_amount,
            shared = %summary.total_shared_amount,
            grand_total = %summary.grand_total,
            "Bills generated"
        );
        Ok(summary)
    }

    /// Bills newest date first, then by store name.
    ///
    /// # Errors
    /// Storage errors only.
    pub async fn list_bills(
        &self,
        date: Option<NaiveDate>,
        store_id: Option<StoreId>,
    ) -> Result<Vec<DailyBill>> {
        let filter = BillFilter {
            bill_date: date,
            store_id,
        };
        self.ledger.read(move |tx| tx.bills(&filter)).await
    }

    /// # Errors
    /// Not-found if no bill has this id.
    pub async fn get_bill(&self, id: &BillId) -> Result<DailyBill> {
        let key = id.clone();
        self.ledger
            .read(move |tx| tx.bill(&key))
            .await?
            .ok_or_else(|| NotFoundError::Bill(id.to_string()).into())
    }

    /// Mark a bill as confirmed.
    ///
    /// # Errors
    /// Not-found if no bill has this id.
    pub async fn confirm(&self, id: &BillId) -> Result<DailyBill> {
        let key = id.clone();
        let bill = self
            .ledger
            .write(move |tx| {
                let mut bill = tx
                    .bill(&key)?
                    .ok_or_else(|| NotFoundError::Bill(key.to_string()))?;
                if bill.status != BillStatus::Confirmed {
                    bill.status = BillStatus::Confirmed;
                    bill.updated_at = Some(Utc::now());
                    tx.update_bill(&bill)?;
                }
                Ok(bill)
            })
            .await?;
        info!(bill_id = %bill.id, store_id = %bill.store_id, date = %bill.bill_date, "Bill confirmed");
        Ok(bill)
    }
}

fn generate(tx: &mut dyn LedgerTx, date: NaiveDate, protect_confirmed: bool) -> Result<BillRunSummary> {
    let orders = tx.orders(&OrderFilter::delivered_on(date))?;
    if orders.is_empty() {
        return Err(NotFoundError::NoDeliveredOrders { date }.into());
    }

    if protect_confirmed {
        let existing = tx.bills(&BillFilter {
            bill_date: Some(date),
            store_id: None,
        })?;
        if let Some(confirmed) = existing.iter().find(|b| b.status == BillStatus::Confirmed) {
            return Err(Error::Conflict(format!(
                "bill {} for {date} is already confirmed",
                confirmed.id
            )));
        }
    }

    let products: HashMap<ProductId, Product> = tx
        .products()?
        .into_iter()
        .map(|p| (p.id.clone(), p))
        .collect();
    let expenses = tx.expenses(Some(date))?;
    let statements = billing::compute_statements(&orders, &products, &expenses);
    debug!(
        date = %date,
        orders = orders.len(),
        expenses = expenses.len(),
        stores = statements.len(),
        "Computed store statements"
    );

    let mut bills = Vec::with_capacity(statements.len());
    for statement in statements {
        let bill = match tx.bill_for(&statement.store_id, date)? {
            Some(mut bill) => {
                if bill.status == BillStatus::Confirmed {
                    warn!(bill_id = %bill.id, store_id = %bill.store_id, "Reopening confirmed bill");
                }
                bill.regenerate(statement);
                tx.update_bill(&bill)?;
                bill
            }
            None => {
                let mut bill = DailyBill::draft(date, statement);
                tx.insert_bill(&bill)?;
                bill.store_name = tx.store(&bill.store_id)?.map(|s| s.name);
                bill
            }
        };
        bills.push(bill);
    }

    bills.sort_by(|a, b| a.store_name.cmp(&b.store_name).then_with(|| a.store_id.cmp(&b.store_id)));
    Ok(BillRunSummary::from_bills(date, bills))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::allocation::ItemAllocation;
    use crate::domain::expense::{ExpenseKind, SharedExpense, SplitMethod};
    use crate::domain::order::{Order, OrderStatus};
    use crate::testkit::domain::{date, line, place_order, seed_catalog, user};
    use crate::testkit::ledger::TempLedger;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    /// Allocate every item of `order` at `cost` each and mark it delivered.
    async fn deliver<L: Ledger>(ledger: &L, order: &Order, cost: Decimal) {
        let order = order.clone();
        ledger
            .write(move |tx| {
                for item in &order.items {
                    tx.record_allocation(&ItemAllocation {
                        item_id: item.id.clone(),
                        order_id: order.id.clone(),
                        quantity_fulfilled: item.approved(),
                        allocated_cost: cost,
                    })?;
                }
                tx.set_order_status(&order.id, OrderStatus::Delivered)
            })
            .await
            .unwrap();
    }

    async fn expense<L: Ledger>(ledger: &L, amount: Decimal, split: SplitMethod) {
        let expense =
            SharedExpense::try_new(date(1), ExpenseKind::Transport, None, amount, split, user()).unwrap();
        ledger.write(move |tx| tx.insert_expense(&expense)).await.unwrap();
    }

    #[tokio::test]
    async fn proportional_split_follows_item_totals() {
        let temp = TempLedger::new();
        let ledger = temp.ledger();
        let c = seed_catalog(&ledger).await;
        let a = place_order(&ledger, &c.north, date(1), vec![line(&c.tomato, dec!(3))]).await;
        let b = place_order(&ledger, &c.south, date(1), vec![line(&c.tomato, dec!(1))]).await;
        deliver(&ledger, &a, dec!(300)).await;
        deliver(&ledger, &b, dec!(100)).await;
        expense(&ledger, dec!(100), SplitMethod::Proportional).await;

        let summary = BillingService::new(ledger).generate_bills(date(1)).await.unwrap();

        assert_eq!(summary.total_stores, 2);
        let north = summary.bills.iter().find(|b| b.store_id == c.north.id).unwrap();
        let south = summary.bills.iter().find(|b| b.store_id == c.south.id).unwrap();
        assert_eq!(north.shared_total, dec!(75));
        assert_eq!(south.shared_total, dec!(25));
        assert_eq!(north.grand_total, dec!(375));
        assert_eq!(summary.grand_total, dec!(500));
        assert_eq!(north.store_name.as_deref(), Some("North"));
    }

    #[tokio::test]
    async fn regeneration_is_idempotent_and_unique() {
        let temp = TempLedger::new();
        let ledger = temp.ledger();
        let c = seed_catalog(&ledger).await;
        let a = place_order(&ledger, &c.north, date(1), vec![line(&c.tomato, dec!(1))]).await;
        deliver(&ledger, &a, dec!(50)).await;
        expense(&ledger, dec!(30), SplitMethod::Equal).await;

        let service = BillingService::new(ledger);
        let first = service.generate_bills(date(1)).await.unwrap();
        let second = service.generate_bills(date(1)).await.unwrap();

        assert_eq!(first.bills[0].id, second.bills[0].id);
        assert_eq!(first.bills[0].grand_total, second.bills[0].grand_total);
        assert_eq!(first.bills[0].detail, second.bills[0].detail);
        assert_eq!(service.list_bills(Some(date(1)), None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn no_delivered_orders_is_not_found() {
        let temp = TempLedger::new();
        let ledger = temp.ledger();
        let c = seed_catalog(&ledger).await;
        place_order(&ledger, &c.north, date(1), vec![line(&c.tomato, dec!(1))]).await;

        let err = BillingService::new(ledger).generate_bills(date(1)).await.unwrap_err();
        assert!(matches!(
            err,
            Error::NotFound(NotFoundError::NoDeliveredOrders { .. })
        ));
    }

    #[tokio::test]
    async fn confirmed_bills_reopen_unless_protected() {
        let temp = TempLedger::new();
        let ledger = temp.ledger();
        let c = seed_catalog(&ledger).await;
        let a = place_order(&ledger, &c.north, date(1), vec![line(&c.tomato, dec!(1))]).await;
        deliver(&ledger, &a, dec!(50)).await;

        let service = BillingService::new(ledger.clone());
        let bill_id = service.generate_bills(date(1)).await.unwrap().bills[0].id.clone();
        let confirmed = service.confirm(&bill_id).await.unwrap();
        assert_eq!(confirmed.status, BillStatus::Confirmed);

        let protected = BillingService::new(ledger).protect_confirmed(true);
        assert!(protected.generate_bills(date(1)).await.unwrap_err().is_conflict());
        assert_eq!(service.get_bill(&bill_id).await.unwrap().status, BillStatus::Confirmed);

        let reopened = service.generate_bills(date(1)).await.unwrap();
        assert_eq!(reopened.bills[0].status, BillStatus::Draft);
    }

    #[tokio::test]
    async fn unknown_bill_is_not_found() {
        let temp = TempLedger::new();
        let service = BillingService::new(temp.ledger());
        assert!(service.get_bill(&BillId::from("nope")).await.unwrap_err().is_not_found());
        assert!(service.confirm(&BillId::from("nope")).await.unwrap_err().is_not_found());
    }
}
