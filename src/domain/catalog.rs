//! Catalog entities referenced by orders, batches and bills.
//!
//! The catalog is maintained elsewhere; the engines only read it to resolve
//! names, units, categories and stall assignments.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{CategoryId, ProductId, StallId, StoreId};

/// A store that places orders and receives bills.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
    pub id: StoreId,
    pub name: String,
    pub address: Option<String>,
}

/// A market stall. Stalls are visited in ascending `sort_order`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stall {
    pub id: StallId,
    pub name: String,
    pub location: Option<String>,
    pub sort_order: i32,
}

/// A product category, displayed in ascending `sort_order`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub sort_order: i32,
}

/// A purchasable product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub category_id: CategoryId,
    pub default_stall_id: Option<StallId>,
    pub name: String,
    pub unit: String,
    pub price_reference: Option<Decimal>,
}
