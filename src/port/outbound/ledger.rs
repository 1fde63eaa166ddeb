//! Ledger store port.
//!
//! The ledger is the only shared mutable resource. Callers never hold a
//! connection: they hand a closure to [`Ledger::read`] or [`Ledger::write`],
//! which runs it against a [`LedgerTx`] inside one storage transaction. If the
//! closure returns an error nothing it wrote is kept.

use std::future::Future;

use chrono::NaiveDate;

use crate::domain::allocation::{AllocationCandidate, ItemAllocation};
use crate::domain::batch::{BatchItem, PurchaseBatch};
use crate::domain::bill::DailyBill;
use crate::domain::catalog::{Category, Product, Stall, Store};
use crate::domain::expense::SharedExpense;
use crate::domain::id::{BatchId, BillId, ExpenseId, OrderId, ProductId, StoreId};
use crate::domain::order::{Order, OrderStatus};
use crate::error::Result;

/// Order query filter. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
    /// Match any of these statuses.
    pub statuses: Vec<OrderStatus>,
    pub store_id: Option<StoreId>,
    pub delivery_date: Option<NaiveDate>,
}

impl OrderFilter {
    /// Orders whose items are still owed.
    #[must_use]
    pub fn outstanding() -> Self {
        Self {
            statuses: OrderStatus::OUTSTANDING.to_vec(),
            ..Self::default()
        }
    }

    /// Delivered orders for one delivery date.
    #[must_use]
    pub fn delivered_on(date: NaiveDate) -> Self {
        Self {
            statuses: vec![OrderStatus::Delivered],
            delivery_date: Some(date),
            ..Self::default()
        }
    }
}

/// Bill query filter. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BillFilter {
    pub bill_date: Option<NaiveDate>,
    pub store_id: Option<StoreId>,
}

/// Catalog lookups and seeding.
pub trait CatalogLedger {
    fn stores(&mut self) -> Result<Vec<Store>>;
    fn store(&mut self, id: &StoreId) -> Result<Option<Store>>;
    fn stalls(&mut self) -> Result<Vec<Stall>>;
    fn categories(&mut self) -> Result<Vec<Category>>;
    fn products(&mut self) -> Result<Vec<Product>>;
    fn product(&mut self, id: &ProductId) -> Result<Option<Product>>;

    /// Insert or update by primary key.
    fn upsert_store(&mut self, store: &Store) -> Result<()>;
    fn upsert_stall(&mut self, stall: &Stall) -> Result<()>;
    fn upsert_category(&mut self, category: &Category) -> Result<()>;
    fn upsert_product(&mut self, product: &Product) -> Result<()>;
}

/// Purchase orders and the allocation state of their items.
pub trait OrderLedger {
    /// Persist a new order with all its items.
    fn insert_order(&mut self, order: &Order) -> Result<()>;

    fn order(&mut self, id: &OrderId) -> Result<Option<Order>>;

    /// Orders matching `filter`, oldest first, with their items.
    fn orders(&mut self, filter: &OrderFilter) -> Result<Vec<Order>>;

    fn set_order_status(&mut self, id: &OrderId, status: OrderStatus) -> Result<()>;

    /// Unallocated items of outstanding orders for `product`, in a stable order.
    fn allocation_candidates(&mut self, product: &ProductId) -> Result<Vec<AllocationCandidate>>;

    /// Write fulfilled quantity and cost onto a still-unallocated item.
    ///
    /// # Errors
    /// Returns [`crate::error::Error::Conflict`] when the item was allocated
    /// in the meantime.
    fn record_allocation(&mut self, allocation: &ItemAllocation) -> Result<()>;
}

/// Purchase batches.
pub trait PurchaseLedger {
    /// Persist the batch header. Items are added with [`Self::insert_batch_item`].
    fn insert_batch(&mut self, batch: &PurchaseBatch) -> Result<()>;
    fn insert_batch_item(&mut self, item: &BatchItem) -> Result<()>;
    fn batch(&mut self, id: &BatchId) -> Result<Option<PurchaseBatch>>;

    /// All batches with their items, newest purchase date first.
    fn batches(&mut self) -> Result<Vec<PurchaseBatch>>;
}

/// Shared expenses.
pub trait ExpenseLedger {
    fn insert_expense(&mut self, expense: &SharedExpense) -> Result<()>;

    /// Expenses for one date, or all of them, newest first.
    fn expenses(&mut self, date: Option<NaiveDate>) -> Result<Vec<SharedExpense>>;

    /// Returns `false` when no such expense exists.
    fn delete_expense(&mut self, id: &ExpenseId) -> Result<bool>;
}

/// Daily bills.
pub trait BillLedger {
    fn bill_for(&mut self, store: &StoreId, date: NaiveDate) -> Result<Option<DailyBill>>;
    fn bill(&mut self, id: &BillId) -> Result<Option<DailyBill>>;

    /// Bills matching `filter`, newest date first, then by store name.
    /// Every returned bill carries its store name.
    fn bills(&mut self, filter: &BillFilter) -> Result<Vec<DailyBill>>;

    fn insert_bill(&mut self, bill: &DailyBill) -> Result<()>;

    /// Overwrite totals, detail, status and `updated_at` of an existing bill.
    fn update_bill(&mut self, bill: &DailyBill) -> Result<()>;
}

/// Everything a unit of work can do against the ledger.
pub trait LedgerTx: CatalogLedger + OrderLedger + PurchaseLedger + ExpenseLedger + BillLedger {}

impl<T> LedgerTx for T where
    T: CatalogLedger + OrderLedger + PurchaseLedger + ExpenseLedger + BillLedger
{
}

/// Transactional ledger store.
pub trait Ledger: Send + Sync {
    /// Run `work` in a read transaction.
    fn read<T, F>(&self, work: F) -> impl Future<Output = Result<T>> + Send
    where
        T: Send,
        F: FnOnce(&mut dyn LedgerTx) -> Result<T> + Send;

    /// Run `work` in a write transaction that takes the write lock up front,
    /// so concurrent writers are serialized and never see each other's
    /// half-finished state.
    fn write<T, F>(&self, work: F) -> impl Future<Output = Result<T>> + Send
    where
        T: Send,
        F: FnOnce(&mut dyn LedgerTx) -> Result<T> + Send;
}
