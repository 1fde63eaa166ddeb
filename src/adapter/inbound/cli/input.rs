//! TOML input files for `order submit`, `batch submit` and `catalog import`.
//!
//! Stores and products may be referenced by id or by name; names are
//! resolved against the catalog before the request reaches a service.
//!
//! ```toml
//! # batch.toml
//! purchaser = "ana"
//! market = "Central market"
//! date = "2026-03-01"
//!
//! [[items]]
//! product = "Tomato"
//! quantity = 12
//! cost = 96000
//! ```

use std::path::Path;

use chrono::NaiveDate;
use miette::Report;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::diagnostic::SourceError;
use crate::application::catalog::CatalogSnapshot;
use crate::domain::id::{ProductId, StoreId};
use crate::error::{Error, NotFoundError};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderFile {
    /// Store name or id.
    pub store: String,
    pub requester: String,
    pub delivery_date: NaiveDate,
    pub items: Vec<OrderItemInput>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderItemInput {
    /// Product name or id.
    pub product: String,
    pub quantity: Decimal,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchFile {
    pub purchaser: String,
    #[serde(default)]
    pub market: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    pub items: Vec<BatchItemInput>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchItemInput {
    /// Product name or id.
    pub product: String,
    pub quantity: Decimal,
    pub cost: Decimal,
}

/// Read and parse a TOML file, keeping the source for span diagnostics.
///
/// # Errors
/// Returns a rendered diagnostic if the file is unreadable or malformed.
pub fn read_toml<T: DeserializeOwned>(path: &Path) -> Result<T, Report> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| super::diagnostic::report(Error::Io(e)))?;
    toml::from_str(&content).map_err(|e| {
        Report::new(
            SourceError::new(path, content.clone(), &e)
                .with_help("dates are quoted strings like \"2026-03-01\""),
        )
    })
}

/// Resolve a product reference by exact id, then by name.
///
/// # Errors
/// Not-found if neither matches.
pub fn resolve_product(catalog: &CatalogSnapshot, reference: &str) -> crate::error::Result<ProductId> {
    catalog
        .products
        .iter()
        .find(|p| p.id.as_str() == reference)
        .or_else(|| catalog.products.iter().find(|p| p.name.eq_ignore_ascii_case(reference)))
        .map(|p| p.id.clone())
        .ok_or_else(|| NotFoundError::Product(reference.to_string()).into())
}

/// Resolve a store reference by exact id, then by name.
///
/// # Errors
/// Not-found if neither matches.
pub fn resolve_store(catalog: &CatalogSnapshot, reference: &str) -> crate::error::Result<StoreId> {
    catalog
        .stores
        .iter()
        .find(|s| s.id.as_str() == reference)
        .or_else(|| catalog.stores.iter().find(|s| s.name.eq_ignore_ascii_case(reference)))
        .map(|s| s.id.clone())
        .ok_or_else(|| NotFoundError::Store(reference.to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::{Product, Store};
    use crate::domain::id::CategoryId;
    use rust_decimal_macros::dec;

    fn catalog() -> CatalogSnapshot {
        CatalogSnapshot {
            stores: vec![Store {
                id: StoreId::from("s-1"),
                name: "North".to_string(),
                address: None,
            }],
            products: vec![Product {
                id: ProductId::from("p-1"),
                category_id: CategoryId::from("c-1"),
                default_stall_id: None,
                name: "Tomato".to_string(),
                unit: "kg".to_string(),
                price_reference: None,
            }],
            ..CatalogSnapshot::default()
        }
    }

    #[test]
    fn references_resolve_by_id_or_name() {
        let catalog = catalog();
        assert_eq!(resolve_product(&catalog, "p-1").unwrap().as_str(), "p-1");
        assert_eq!(resolve_product(&catalog, "tomato").unwrap().as_str(), "p-1");
        assert_eq!(resolve_store(&catalog, "North").unwrap().as_str(), "s-1");
        assert!(resolve_store(&catalog, "West").unwrap_err().is_not_found());
        assert!(resolve_product(&catalog, "Leek").unwrap_err().is_not_found());
    }

    #[test]
    fn batch_file_parses_numbers_and_dates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.toml");
        std::fs::write(
            &path,
            "purchaser = \"ana\"\ndate = \"2026-03-01\"\n\n[[items]]\nproduct = \"Tomato\"\nquantity = 12\ncost = \"96000\"\n",
        )
        .unwrap();

        let batch: BatchFile = read_toml(&path).unwrap();
        assert_eq!(batch.date, NaiveDate::from_ymd_opt(2026, 3, 1));
        assert_eq!(batch.items[0].quantity, dec!(12));
        assert_eq!(batch.items[0].cost, dec!(96000));
        assert!(batch.market.is_none());
    }

    #[test]
    fn malformed_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("order.toml");
        std::fs::write(&path, "store = \"North\"\nrequester = \n").unwrap();
        assert!(read_toml::<OrderFile>(&path).is_err());
    }
}
