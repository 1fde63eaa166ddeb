//! SQLite ledger implementation.
//!
//! Every unit of work runs on one pooled connection inside one transaction.
//! Writes use `BEGIN IMMEDIATE`, which takes SQLite's reserved lock before the
//! first read, so two concurrent batch submissions for the same product are
//! serialized and the second one sees the first one's allocations.

use std::collections::HashMap;

use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use diesel::SqliteConnection;
use rust_decimal::Decimal;
use tracing::debug;

use super::database::connection::{create_pool, run_migrations, DbPool};
use super::database::model::{
    format_date, parse_decimal, BatchItemRow, BatchRow, BillRow, CategoryRow, ExpenseRow,
    OrderItemRow, OrderRow, ProductRow, StallRow, StoreRow,
};
use super::database::schema::{
    batch_items, categories, daily_bills, order_items, products, purchase_batches,
    purchase_orders, shared_expenses, stalls, stores,
};
use crate::domain::allocation::{AllocationCandidate, ItemAllocation};
use crate::domain::batch::{BatchItem, PurchaseBatch};
use crate::domain::bill::DailyBill;
use crate::domain::catalog::{Category, Product, Stall, Store};
use crate::domain::expense::SharedExpense;
use crate::domain::id::{BatchId, BillId, ExpenseId, OrderId, ProductId, StoreId};
use crate::domain::order::{Order, OrderItem, OrderStatus};
use crate::error::{Error, NotFoundError, Result};
use crate::port::outbound::ledger::{
    BillFilter, BillLedger, CatalogLedger, ExpenseLedger, Ledger, LedgerTx, OrderFilter,
    OrderLedger, PurchaseLedger,
};

type PooledSqlite = PooledConnection<ConnectionManager<SqliteConnection>>;

/// SQLite-backed ledger.
///
/// Cheap to clone: clones share the connection pool.
#[derive(Clone)]
pub struct SqliteLedger {
    /// Database connection pool.
    pool: DbPool,
}

impl SqliteLedger {
    /// Create a ledger over an existing pool. Migrations must already be applied.
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the database at `path` and apply migrations.
    ///
    /// # Errors
    /// Returns an error if the pool cannot be built or migrations fail.
    pub fn open(path: &str) -> Result<Self> {
        let pool = create_pool(path)?;
        run_migrations(&pool)?;
        Ok(Self::new(pool))
    }

    fn connection(&self) -> Result<PooledSqlite> {
        self.pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))
    }
}

impl std::fmt::Debug for SqliteLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteLedger")
            .field("connections", &self.pool.state().connections)
            .finish()
    }
}

impl Ledger for SqliteLedger {
    async fn read<T, F>(&self, work: F) -> Result<T>
    where
        T: Send,
        F: FnOnce(&mut dyn LedgerTx) -> Result<T> + Send,
    {
        let mut pooled = self.connection()?;
        let conn: &mut SqliteConnection = &mut pooled;
        conn.transaction(|conn| work(&mut SqliteTx { conn }))
    }

    async fn write<T, F>(&self, work: F) -> Result<T>
    where
        T: Send,
        F: FnOnce(&mut dyn LedgerTx) -> Result<T> + Send,
    {
        let mut pooled = self.connection()?;
        let conn: &mut SqliteConnection = &mut pooled;
        conn.immediate_transaction(|conn| work(&mut SqliteTx { conn }))
    }
}

/// One open transaction.
struct SqliteTx<'a> {
    conn: &'a mut SqliteConnection,
}

fn status_strings(statuses: &[OrderStatus]) -> Vec<&'static str> {
    statuses.iter().map(|s| s.as_str()).collect()
}

impl SqliteTx<'_> {
    fn order_items_for(&mut self, order_ids: &[String]) -> Result<HashMap<String, Vec<OrderItem>>> {
        let rows: Vec<OrderItemRow> = order_items::table
            .filter(order_items::order_id.eq_any(order_ids))
            .order((order_items::order_id.asc(), order_items::product_id.asc()))
            .select(OrderItemRow::as_select())
            .load(self.conn)?;

        let mut grouped: HashMap<String, Vec<OrderItem>> = HashMap::new();
        for row in rows {
            let key = row.order_id.clone();
            grouped.entry(key).or_default().push(row.into_domain()?);
        }
        Ok(grouped)
    }

    fn assemble_orders(&mut self, rows: Vec<OrderRow>) -> Result<Vec<Order>> {
        let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
        let mut items = self.order_items_for(&ids)?;
        rows.into_iter()
            .map(|row| {
                let order_items = items.remove(&row.id).unwrap_or_default();
                row.into_domain(order_items)
            })
            .collect()
    }

    fn batch_items_for(&mut self, batch_ids: &[String]) -> Result<HashMap<String, Vec<BatchItem>>> {
        let rows: Vec<BatchItemRow> = batch_items::table
            .filter(batch_items::batch_id.eq_any(batch_ids))
            .order((batch_items::batch_id.asc(), batch_items::product_id.asc()))
            .select(BatchItemRow::as_select())
            .load(self.conn)?;

        let mut grouped: HashMap<String, Vec<BatchItem>> = HashMap::new();
        for row in rows {
            let key = row.batch_id.clone();
            grouped.entry(key).or_default().push(row.into_domain()?);
        }
        Ok(grouped)
    }

    fn store_name(&mut self, store_id: &str) -> Result<Option<String>> {
        Ok(stores::table
            .find(store_id)
            .select(stores::name)
            .first::<String>(self.conn)
            .optional()?)
    }

    fn bill_with_name(&mut self, row: Option<BillRow>) -> Result<Option<DailyBill>> {
        match row {
            Some(row) => {
                let name = self.store_name(&row.store_id)?;
                row.into_domain(name).map(Some)
            }
            None => Ok(None),
        }
    }
}

impl CatalogLedger for SqliteTx<'_> {
    fn stores(&mut self) -> Result<Vec<Store>> {
        let rows: Vec<StoreRow> = stores::table
            .order(stores::name.asc())
            .select(StoreRow::as_select())
            .load(self.conn)?;
        Ok(rows.into_iter().map(Store::from).collect())
    }

    fn store(&mut self, id: &StoreId) -> Result<Option<Store>> {
        let row: Option<StoreRow> = stores::table
            .find(id.as_str())
            .select(StoreRow::as_select())
            .first(self.conn)
            .optional()?;
        Ok(row.map(Store::from))
    }

    fn stalls(&mut self) -> Result<Vec<Stall>> {
        let rows: Vec<StallRow> = stalls::table
            .order((stalls::sort_order.asc(), stalls::name.asc()))
            .select(StallRow::as_select())
            .load(self.conn)?;
        Ok(rows.into_iter().map(Stall::from).collect())
    }

    fn categories(&mut self) -> Result<Vec<Category>> {
        let rows: Vec<CategoryRow> = categories::table
            .order((categories::sort_order.asc(), categories::name.asc()))
            .select(CategoryRow::as_select())
            .load(self.conn)?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    fn products(&mut self) -> Result<Vec<Product>> {
        let rows: Vec<ProductRow> = products::table
            .order(products::name.asc())
            .select(ProductRow::as_select())
            .load(self.conn)?;
        rows.into_iter().map(ProductRow::into_domain).collect()
    }

    fn product(&mut self, id: &ProductId) -> Result<Option<Product>> {
        let row: Option<ProductRow> = products::table
            .find(id.as_str())
            .select(ProductRow::as_select())
            .first(self.conn)
            .optional()?;
        row.map(ProductRow::into_domain).transpose()
    }

    fn upsert_store(&mut self, store: &Store) -> Result<()> {
        let row = StoreRow::from(store);
        diesel::insert_into(stores::table)
            .values(&row)
            .on_conflict(stores::id)
            .do_update()
            .set((stores::name.eq(&row.name), stores::address.eq(&row.address)))
            .execute(self.conn)?;
        Ok(())
    }

    fn upsert_stall(&mut self, stall: &Stall) -> Result<()> {
        let row = StallRow::from(stall);
        diesel::insert_into(stalls::table)
            .values(&row)
            .on_conflict(stalls::id)
            .do_update()
            .set((
                stalls::name.eq(&row.name),
                stalls::location.eq(&row.location),
                stalls::sort_order.eq(row.sort_order),
            ))
            .execute(self.conn)?;
        Ok(())
    }

    fn upsert_category(&mut self, category: &Category) -> Result<()> {
        let row = CategoryRow::from(category);
        diesel::insert_into(categories::table)
            .values(&row)
            .on_conflict(categories::id)
            .do_update()
            .set((
                categories::name.eq(&row.name),
                categories::sort_order.eq(row.sort_order),
            ))
            .execute(self.conn)?;
        Ok(())
    }

    fn upsert_product(&mut self, product: &Product) -> Result<()> {
        let row = ProductRow::from(product);
        diesel::insert_into(products::table)
            .values(&row)
            .on_conflict(products::id)
            .do_update()
            .set((
                products::category_id.eq(&row.category_id),
                products::default_stall_id.eq(&row.default_stall_id),
                products::name.eq(&row.name),
                products::unit.eq(&row.unit),
                products::price_reference.eq(&row.price_reference),
            ))
            .execute(self.conn)?;
        Ok(())
    }
}

impl OrderLedger for SqliteTx<'_> {
    fn insert_order(&mut self, order: &Order) -> Result<()> {
        diesel::insert_into(purchase_orders::table)
            .values(&OrderRow::from(order))
            .execute(self.conn)?;
        let items: Vec<OrderItemRow> = order.items.iter().map(OrderItemRow::from).collect();
        diesel::insert_into(order_items::table)
            .values(&items)
            .execute(self.conn)?;
        Ok(())
    }

    fn order(&mut self, id: &OrderId) -> Result<Option<Order>> {
        let row: Option<OrderRow> = purchase_orders::table
            .find(id.as_str())
            .select(OrderRow::as_select())
            .first(self.conn)
            .optional()?;
        match row {
            Some(row) => Ok(self.assemble_orders(vec![row])?.pop()),
            None => Ok(None),
        }
    }

    fn orders(&mut self, filter: &OrderFilter) -> Result<Vec<Order>> {
        let mut query = purchase_orders::table
            .select(OrderRow::as_select())
            .into_boxed();
        if !filter.statuses.is_empty() {
            query = query.filter(purchase_orders::status.eq_any(status_strings(&filter.statuses)));
        }
        if let Some(store_id) = &filter.store_id {
            query = query.filter(purchase_orders::store_id.eq(store_id.to_string()));
        }
        if let Some(date) = filter.delivery_date {
            query = query.filter(purchase_orders::delivery_date.eq(format_date(date)));
        }
        let rows: Vec<OrderRow> = query
            .order((purchase_orders::created_at.asc(), purchase_orders::id.asc()))
            .load(self.conn)?;
        self.assemble_orders(rows)
    }

    fn set_order_status(&mut self, id: &OrderId, status: OrderStatus) -> Result<()> {
        let updated = diesel::update(purchase_orders::table.find(id.as_str()))
            .set(purchase_orders::status.eq(status.as_str()))
            .execute(self.conn)?;
        if updated == 0 {
            return Err(NotFoundError::Order(id.to_string()).into());
        }
        Ok(())
    }

    fn allocation_candidates(&mut self, product: &ProductId) -> Result<Vec<AllocationCandidate>> {
        let rows: Vec<(String, String, Option<String>)> = order_items::table
            .inner_join(purchase_orders::table)
            .filter(order_items::product_id.eq(product.as_str()))
            .filter(order_items::allocated_cost.is_null())
            .filter(purchase_orders::status.eq_any(status_strings(&OrderStatus::OUTSTANDING)))
            .order((purchase_orders::created_at.asc(), order_items::id.asc()))
            .select((
                order_items::id,
                order_items::order_id,
                order_items::quantity_approved,
            ))
            .load(self.conn)?;

        let mut candidates = Vec::with_capacity(rows.len());
        for (item_id, order_id, approved) in rows {
            let Some(approved) = approved.as_deref().map(parse_decimal).transpose()? else {
                continue;
            };
            if approved <= Decimal::ZERO {
                continue;
            }
            candidates.push(AllocationCandidate {
                item_id: item_id.into(),
                order_id: order_id.into(),
                quantity_approved: approved,
            });
        }
        Ok(candidates)
    }

    fn record_allocation(&mut self, allocation: &ItemAllocation) -> Result<()> {
        let updated = diesel::update(
            order_items::table
                .filter(order_items::id.eq(allocation.item_id.as_str()))
                .filter(order_items::allocated_cost.is_null()),
        )
        .set((
            order_items::quantity_fulfilled.eq(Some(allocation.quantity_fulfilled.to_string())),
            order_items::allocated_cost.eq(Some(allocation.allocated_cost.to_string())),
        ))
        .execute(self.conn)?;

        if updated == 0 {
            return Err(Error::Conflict(format!(
                "order item {} is already allocated",
                allocation.item_id
            )));
        }
        debug!(item_id = %allocation.item_id, cost = %allocation.allocated_cost, "Item allocated");
        Ok(())
    }
}

impl PurchaseLedger for SqliteTx<'_> {
    fn insert_batch(&mut self, batch: &PurchaseBatch) -> Result<()> {
        diesel::insert_into(purchase_batches::table)
            .values(&BatchRow::from(batch))
            .execute(self.conn)?;
        Ok(())
    }

    fn insert_batch_item(&mut self, item: &BatchItem) -> Result<()> {
        diesel::insert_into(batch_items::table)
            .values(&BatchItemRow::from(item))
            .execute(self.conn)?;
        Ok(())
    }

    fn batch(&mut self, id: &BatchId) -> Result<Option<PurchaseBatch>> {
        let row: Option<BatchRow> = purchase_batches::table
            .find(id.as_str())
            .select(BatchRow::as_select())
            .first(self.conn)
            .optional()?;
        let Some(row) = row else {
            return Ok(None);
        };
        let mut items = self.batch_items_for(&[row.id.clone()])?;
        let batch_items = items.remove(&row.id).unwrap_or_default();
        row.into_domain(batch_items).map(Some)
    }

    fn batches(&mut self) -> Result<Vec<PurchaseBatch>> {
        let rows: Vec<BatchRow> = purchase_batches::table
            .order((
                purchase_batches::purchase_date.desc(),
                purchase_batches::created_at.desc(),
            ))
            .select(BatchRow::as_select())
            .load(self.conn)?;
        let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
        let mut items = self.batch_items_for(&ids)?;
        rows.into_iter()
            .map(|row| {
                let batch_items = items.remove(&row.id).unwrap_or_default();
                row.into_domain(batch_items)
            })
            .collect()
    }
}

impl ExpenseLedger for SqliteTx<'_> {
    fn insert_expense(&mut self, expense: &SharedExpense) -> Result<()> {
        diesel::insert_into(shared_expenses::table)
            .values(&ExpenseRow::from(expense))
            .execute(self.conn)?;
        Ok(())
    }

    fn expenses(&mut self, date: Option<NaiveDate>) -> Result<Vec<SharedExpense>> {
        let mut query = shared_expenses::table
            .select(ExpenseRow::as_select())
            .into_boxed();
        if let Some(date) = date {
            query = query.filter(shared_expenses::expense_date.eq(format_date(date)));
        }
        let rows: Vec<ExpenseRow> = query
            .order((
                shared_expenses::expense_date.desc(),
                shared_expenses::created_at.desc(),
            ))
            .load(self.conn)?;
        rows.into_iter().map(ExpenseRow::into_domain).collect()
    }

    fn delete_expense(&mut self, id: &ExpenseId) -> Result<bool> {
        let deleted = diesel::delete(shared_expenses::table.find(id.as_str())).execute(self.conn)?;
        Ok(deleted > 0)
    }
}

impl BillLedger for SqliteTx<'_> {
    fn bill_for(&mut self, store: &StoreId, date: NaiveDate) -> Result<Option<DailyBill>> {
        let row: Option<BillRow> = daily_bills::table
            .filter(daily_bills::store_id.eq(store.as_str()))
            .filter(daily_bills::bill_date.eq(format_date(date)))
            .select(BillRow::as_select())
            .first(self.conn)
            .optional()?;
        self.bill_with_name(row)
    }

    fn bill(&mut self, id: &BillId) -> Result<Option<DailyBill>> {
        let row: Option<BillRow> = daily_bills::table
            .find(id.as_str())
            .select(BillRow::as_select())
            .first(self.conn)
            .optional()?;
        self.bill_with_name(row)
    }

    fn bills(&mut self, filter: &BillFilter) -> Result<Vec<DailyBill>> {
        let mut query = daily_bills::table
            .inner_join(stores::table)
            .select((BillRow::as_select(), stores::name))
            .into_boxed();
        if let Some(date) = filter.bill_date {
            query = query.filter(daily_bills::bill_date.eq(format_date(date)));
        }
        if let Some(store_id) = &filter.store_id {
            query = query.filter(daily_bills::store_id.eq(store_id.to_string()));
        }
        let rows: Vec<(BillRow, String)> = query
            .order((daily_bills::bill_date.desc(), stores::name.asc()))
            .load(self.conn)?;
        rows.into_iter()
            .map(|(row, name)| row.into_domain(Some(name)))
            .collect()
    }

    fn insert_bill(&mut self, bill: &DailyBill) -> Result<()> {
        diesel::insert_into(daily_bills::table)
            .values(&BillRow::from_domain(bill)?)
            .execute(self.conn)?;
        Ok(())
    }

    fn update_bill(&mut self, bill: &DailyBill) -> Result<()> {
        let row = BillRow::from_domain(bill)?;
        let updated = diesel::update(daily_bills::table.find(&row.id))
            .set((
                daily_bills::items_total.eq(&row.items_total),
                daily_bills::shared_total.eq(&row.shared_total),
                daily_bills::grand_total.eq(&row.grand_total),
                daily_bills::status.eq(&row.status),
                daily_bills::detail.eq(&row.detail),
                daily_bills::updated_at.eq(&row.updated_at),
            ))
            .execute(self.conn)?;
        if updated == 0 {
            return Err(NotFoundError::Bill(row.id).into());
        }
        Ok(())
    }
}
