//! Builders for domain primitives and a small seeded catalog.
//!
//! The catalog has three stores, two stalls, two categories and three
//! products, which is enough to exercise every grouping and split rule.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::domain::batch::BatchLine;
use crate::domain::catalog::{Category, Product, Stall, Store};
use crate::domain::id::{CategoryId, ProductId, StallId, StoreId, UserId};
use crate::domain::order::{Order, OrderLine};
use crate::port::outbound::ledger::{CatalogLedger, Ledger, OrderLedger};

/// A date in March 2026.
pub fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, day).expect("valid March date")
}

/// The user recorded as requester or purchaser in tests.
pub fn user() -> UserId {
    UserId::from("user-1")
}

/// An order line for `product`.
pub fn line(product: &Product, quantity: Decimal) -> OrderLine {
    OrderLine::try_new(product.id.clone(), quantity).expect("positive quantity")
}

/// A batch line for `product`.
pub fn batch_line(product: &Product, quantity: Decimal, cost: Decimal) -> BatchLine {
    BatchLine::try_new(product.id.clone(), quantity, cost).expect("positive quantity and cost")
}

/// Fixed catalog entities with stable identifiers.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub north: Store,
    pub south: Store,
    pub east: Store,
    pub greens: Stall,
    pub fish: Stall,
    pub vegetables: Category,
    pub seafood: Category,
    pub tomato: Product,
    pub onion: Product,
    pub tuna: Product,
}

fn store(id: &str, name: &str) -> Store {
    Store {
        id: StoreId::from(id),
        name: name.to_string(),
        address: None,
    }
}

fn product(id: &str, name: &str, category: &Category, stall: Option<&Stall>) -> Product {
    Product {
        id: ProductId::from(id),
        category_id: category.id.clone(),
        default_stall_id: stall.map(|s| s.id.clone()),
        name: name.to_string(),
        unit: "kg".to_string(),
        price_reference: None,
    }
}

impl Catalog {
    #[must_use]
    pub fn new() -> Self {
        let greens = Stall {
            id: StallId::from("stall-greens"),
            name: "Greens".to_string(),
            location: Some("Row A".to_string()),
            sort_order: 1,
        };
        let fish = Stall {
            id: StallId::from("stall-fish"),
            name: "Fish".to_string(),
            location: Some("Row C".to_string()),
            sort_order: 2,
        };
        let vegetables = Category {
            id: CategoryId::from("cat-veg"),
            name: "Vegetables".to_string(),
            sort_order: 1,
        };
        let seafood = Category {
            id: CategoryId::from("cat-sea"),
            name: "Seafood".to_string(),
            sort_order: 2,
        };
        Self {
            north: store("store-north", "North"),
            south: store("store-south", "South"),
            east: store("store-east", "East"),
            tomato: product("prod-tomato", "Tomato", &vegetables, Some(&greens)),
            onion: product("prod-onion", "Onion", &vegetables, None),
            tuna: product("prod-tuna", "Tuna", &seafood, Some(&fish)),
            greens,
            fish,
            vegetables,
            seafood,
        }
    }

    /// Write every entity into `ledger`.
    ///
    /// # Panics
    /// Panics if the ledger rejects the write.
    pub async fn seed<L: Ledger>(&self, ledger: &L) {
        let catalog = self.clone();
        ledger
            .write(move |tx| {
                for store in [&catalog.north, &catalog.south, &catalog.east] {
                    tx.upsert_store(store)?;
                }
                for stall in [&catalog.greens, &catalog.fish] {
                    tx.upsert_stall(stall)?;
                }
                for category in [&catalog.vegetables, &catalog.seafood] {
                    tx.upsert_category(category)?;
                }
                for product in [&catalog.tomato, &catalog.onion, &catalog.tuna] {
                    tx.upsert_product(product)?;
                }
                Ok(())
            })
            .await
            .expect("seed catalog");
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

/// Seed the fixed catalog and return it.
pub async fn seed_catalog<L: Ledger>(ledger: &L) -> Catalog {
    let catalog = Catalog::new();
    catalog.seed(ledger).await;
    catalog
}

/// Insert a pending order directly, bypassing the order service.
///
/// # Panics
/// Panics if the order is invalid or the ledger rejects it.
pub async fn place_order<L: Ledger>(
    ledger: &L,
    store: &Store,
    delivery_date: NaiveDate,
    lines: Vec<OrderLine>,
) -> Order {
    let order = Order::submit(store.id.clone(), user(), delivery_date, lines).expect("valid order");
    let stored = order.clone();
    ledger
        .write(move |tx| tx.insert_order(&stored))
        .await
        .expect("insert order");
    order
}
