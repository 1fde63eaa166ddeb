//! Database model types for Diesel ORM.
//!
//! Decimals are stored as canonical decimal text, dates as `YYYY-MM-DD` and
//! timestamps as RFC 3339. Conversions back into domain types fail with
//! [`Error::Parse`] on corrupt rows instead of guessing.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;

use super::schema::{
    batch_items, categories, daily_bills, order_items, products, purchase_batches,
    purchase_orders, shared_expenses, stalls, stores,
};
use crate::domain::batch::{BatchItem, PurchaseBatch};
use crate::domain::bill::DailyBill;
use crate::domain::catalog::{Category, Product, Stall, Store};
use crate::domain::expense::SharedExpense;
use crate::domain::order::{Fulfillment, Order, OrderItem};
use crate::error::{Error, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub(crate) fn parse_decimal(value: &str) -> Result<Decimal> {
    Decimal::from_str(value).map_err(|e| Error::Parse(format!("decimal '{value}': {e}")))
}

fn parse_optional_decimal(value: Option<&str>) -> Result<Option<Decimal>> {
    value.map(parse_decimal).transpose()
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub(crate) fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|e| Error::Parse(format!("date '{value}': {e}")))
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::Parse(format!("timestamp '{value}': {e}")))
}

/// Parse a textual enum column through the domain's `FromStr`.
fn parse_enum<T>(value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| Error::Parse(e.to_string()))
}

/// Database row for a store.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = stores)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct StoreRow {
    pub id: String,
    pub name: String,
    pub address: Option<String>,
}

impl From<&Store> for StoreRow {
    fn from(store: &Store) -> Self {
        Self {
            id: store.id.to_string(),
            name: store.name.clone(),
            address: store.address.clone(),
        }
    }
}

impl From<StoreRow> for Store {
    fn from(row: StoreRow) -> Self {
        Self {
            id: row.id.into(),
            name: row.name,
            address: row.address,
        }
    }
}

/// Database row for a stall.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = stalls)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct StallRow {
    pub id: String,
    pub name: String,
    pub location: Option<String>,
    pub sort_order: i32,
}

impl From<&Stall> for StallRow {
    fn from(stall: &Stall) -> Self {
        Self {
            id: stall.id.to_string(),
            name: stall.name.clone(),
            location: stall.location.clone(),
            sort_order: stall.sort_order,
        }
    }
}

impl From<StallRow> for Stall {
    fn from(row: StallRow) -> Self {
        Self {
            id: row.id.into(),
            name: row.name,
            location: row.location,
            sort_order: row.sort_order,
        }
    }
}

/// Database row for a category.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = categories)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CategoryRow {
    pub id: String,
    pub name: String,
    pub sort_order: i32,
}

impl From<&Category> for CategoryRow {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id.to_string(),
            name: category.name.clone(),
            sort_order: category.sort_order,
        }
    }
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id.into(),
            name: row.name,
            sort_order: row.sort_order,
        }
    }
}

/// Database row for a product.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ProductRow {
    pub id: String,
    pub category_id: String,
    pub default_stall_id: Option<String>,
    pub name: String,
    pub unit: String,
    pub price_reference: Option<String>,
}

impl From<&Product> for ProductRow {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            category_id: product.category_id.to_string(),
            default_stall_id: product.default_stall_id.as_ref().map(ToString::to_string),
            name: product.name.clone(),
            unit: product.unit.clone(),
            price_reference: product.price_reference.map(|p| p.to_string()),
        }
    }
}

impl ProductRow {
    pub fn into_domain(self) -> Result<Product> {
        Ok(Product {
            id: self.id.into(),
            category_id: self.category_id.into(),
            default_stall_id: self.default_stall_id.map(Into::into),
            name: self.name,
            unit: self.unit,
            price_reference: parse_optional_decimal(self.price_reference.as_deref())?,
        })
    }
}

/// Database row for a purchase order header.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = purchase_orders)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct OrderRow {
    pub id: String,
    pub store_id: String,
    pub requester_id: String,
    pub delivery_date: String,
    pub status: String,
    pub created_at: String,
}

impl From<&Order> for OrderRow {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            store_id: order.store_id.to_string(),
            requester_id: order.requester_id.to_string(),
            delivery_date: format_date(order.delivery_date),
            status: order.status.as_str().to_string(),
            created_at: order.created_at.to_rfc3339(),
        }
    }
}

impl OrderRow {
    /// Rebuild the order with its already-converted items.
    pub fn into_domain(self, items: Vec<OrderItem>) -> Result<Order> {
        Ok(Order {
            id: self.id.into(),
            store_id: self.store_id.into(),
            requester_id: self.requester_id.into(),
            delivery_date: parse_date(&self.delivery_date)?,
            status: parse_enum(&self.status)?,
            created_at: parse_timestamp(&self.created_at)?,
            items,
        })
    }
}

/// Database row for an order item.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = order_items)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct OrderItemRow {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub quantity_requested: String,
    pub quantity_approved: Option<String>,
    pub quantity_fulfilled: Option<String>,
    pub allocated_cost: Option<String>,
    pub notes: Option<String>,
}

impl From<&OrderItem> for OrderItemRow {
    fn from(item: &OrderItem) -> Self {
        Self {
            id: item.id.to_string(),
            order_id: item.order_id.to_string(),
            product_id: item.product_id.to_string(),
            quantity_requested: item.quantity_requested.to_string(),
            quantity_approved: item.quantity_approved.map(|q| q.to_string()),
            quantity_fulfilled: item.fulfillment.quantity_fulfilled().map(|q| q.to_string()),
            allocated_cost: item.fulfillment.allocated_cost().map(|c| c.to_string()),
            notes: item.notes.clone(),
        }
    }
}

impl OrderItemRow {
    pub fn into_domain(self) -> Result<OrderItem> {
        Ok(OrderItem {
            id: self.id.into(),
            order_id: self.order_id.into(),
            product_id: self.product_id.into(),
            quantity_requested: parse_decimal(&self.quantity_requested)?,
            quantity_approved: parse_optional_decimal(self.quantity_approved.as_deref())?,
            fulfillment: Fulfillment::from_columns(
                parse_optional_decimal(self.quantity_fulfilled.as_deref())?,
                parse_optional_decimal(self.allocated_cost.as_deref())?,
            ),
            notes: self.notes,
        })
    }
}

/// Database row for a purchase batch header.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = purchase_batches)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BatchRow {
    pub id: String,
    pub purchaser_id: String,
    pub purchase_date: String,
    pub market_location: Option<String>,
    pub status: String,
    pub created_at: String,
}

impl From<&PurchaseBatch> for BatchRow {
    fn from(batch: &PurchaseBatch) -> Self {
        Self {
            id: batch.id.to_string(),
            purchaser_id: batch.purchaser_id.to_string(),
            purchase_date: format_date(batch.purchase_date),
            market_location: batch.market_location.clone(),
            status: batch.status.as_str().to_string(),
            created_at: batch.created_at.to_rfc3339(),
        }
    }
}

impl BatchRow {
    pub fn into_domain(self, items: Vec<BatchItem>) -> Result<PurchaseBatch> {
        Ok(PurchaseBatch {
            id: self.id.into(),
            purchaser_id: self.purchaser_id.into(),
            purchase_date: parse_date(&self.purchase_date)?,
            market_location: self.market_location,
            status: parse_enum(&self.status)?,
            created_at: parse_timestamp(&self.created_at)?,
            items,
        })
    }
}

/// Database row for a batch item.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = batch_items)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BatchItemRow {
    pub id: String,
    pub batch_id: String,
    pub product_id: String,
    pub total_quantity_bought: String,
    pub total_cost: String,
    pub unit_price: String,
}

impl From<&BatchItem> for BatchItemRow {
    fn from(item: &BatchItem) -> Self {
        Self {
            id: item.id.to_string(),
            batch_id: item.batch_id.to_string(),
            product_id: item.product_id.to_string(),
            total_quantity_bought: item.total_quantity_bought.to_string(),
            total_cost: item.total_cost.to_string(),
            unit_price: item.unit_price.to_string(),
        }
    }
}

impl BatchItemRow {
    pub fn into_domain(self) -> Result<BatchItem> {
        Ok(BatchItem {
            id: self.id.into(),
            batch_id: self.batch_id.into(),
            product_id: self.product_id.into(),
            total_quantity_bought: parse_decimal(&self.total_quantity_bought)?,
            total_cost: parse_decimal(&self.total_cost)?,
            unit_price: parse_decimal(&self.unit_price)?,
        })
    }
}

/// Database row for a shared expense.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = shared_expenses)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ExpenseRow {
    pub id: String,
    pub expense_date: String,
    pub kind: String,
    pub description: Option<String>,
    pub amount: String,
    pub split_method: String,
    pub created_by: String,
    pub created_at: String,
}

impl From<&SharedExpense> for ExpenseRow {
    fn from(expense: &SharedExpense) -> Self {
        Self {
            id: expense.id.to_string(),
            expense_date: format_date(expense.expense_date),
            kind: expense.kind.as_str().to_string(),
            description: expense.description.clone(),
            amount: expense.amount.to_string(),
            split_method: expense.split_method.as_str().to_string(),
            created_by: expense.created_by.to_string(),
            created_at: expense.created_at.to_rfc3339(),
        }
    }
}

impl ExpenseRow {
    pub fn into_domain(self) -> Result<SharedExpense> {
        Ok(SharedExpense {
            id: self.id.into(),
            expense_date: parse_date(&self.expense_date)?,
            kind: parse_enum(&self.kind)?,
            description: self.description,
            amount: parse_decimal(&self.amount)?,
            split_method: parse_enum(&self.split_method)?,
            created_by: self.created_by.into(),
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

/// Database row for a daily bill. `detail` holds the JSON snapshot.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = daily_bills)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BillRow {
    pub id: String,
    pub store_id: String,
    pub bill_date: String,
    pub items_total: String,
    pub shared_total: String,
    pub grand_total: String,
    pub status: String,
    pub detail: String,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl BillRow {
    pub fn from_domain(bill: &DailyBill) -> Result<Self> {
        Ok(Self {
            id: bill.id.to_string(),
            store_id: bill.store_id.to_string(),
            bill_date: format_date(bill.bill_date),
            items_total: bill.items_total.to_string(),
            shared_total: bill.shared_total.to_string(),
            grand_total: bill.grand_total.to_string(),
            status: bill.status.as_str().to_string(),
            detail: serde_json::to_string(&bill.detail)?,
            created_at: bill.created_at.to_rfc3339(),
            updated_at: bill.updated_at.map(|t| t.to_rfc3339()),
        })
    }

    /// Convert to the domain bill. The store name is resolved by the caller.
    pub fn into_domain(self, store_name: Option<String>) -> Result<DailyBill> {
        Ok(DailyBill {
            id: self.id.into(),
            store_id: self.store_id.into(),
            store_name,
            bill_date: parse_date(&self.bill_date)?,
            items_total: parse_decimal(&self.items_total)?,
            shared_total: parse_decimal(&self.shared_total)?,
            grand_total: parse_decimal(&self.grand_total)?,
            status: parse_enum(&self.status)?,
            detail: serde_json::from_str(&self.detail)?,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: self.updated_at.as_deref().map(parse_timestamp).transpose()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bill::{BillDetail, StoreStatement};
    use crate::domain::id::StoreId;
    use rust_decimal_macros::dec;

    #[test]
    fn decimals_keep_their_scale_through_text() {
        assert_eq!(parse_decimal("64000.00").unwrap(), dec!(64000));
        assert_eq!(parse_decimal("0.667").unwrap().to_string(), "0.667");
        assert!(matches!(parse_decimal("1e5x"), Err(Error::Parse(_))));
    }

    #[test]
    fn dates_use_iso_format() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert_eq!(format_date(date), "2026-03-01");
        assert_eq!(parse_date("2026-03-01").unwrap(), date);
        assert!(parse_date("03/01/2026").is_err());
    }

    #[test]
    fn bill_row_roundtrips_detail() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let bill = DailyBill::draft(
            date,
            StoreStatement {
                store_id: StoreId::from("s"),
                items_total: dec!(10),
                shared_total: dec!(2.5),
                detail: BillDetail::default(),
            },
        );
        let row = BillRow::from_domain(&bill).unwrap();
        let back = row.into_domain(Some("Store".into())).unwrap();

        assert_eq!(back.grand_total, dec!(12.5));
        assert_eq!(back.detail, bill.detail);
        assert_eq!(back.store_name.as_deref(), Some("Store"));
    }

    #[test]
    fn unknown_status_is_a_parse_error() {
        let row = OrderRow {
            id: "o".into(),
            store_id: "s".into(),
            requester_id: "u".into(),
            delivery_date: "2026-03-01".into(),
            status: "shipped".into(),
            created_at: Utc::now().to_rfc3339(),
        };
        assert!(matches!(row.into_domain(vec![]), Err(Error::Parse(_))));
    }
}
