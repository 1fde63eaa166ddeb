//! Catalog seeding and inspection.
//!
//! Catalog entries are matched by name: importing the same seed twice keeps
//! every identifier and only refreshes the attributes.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::catalog::{Category, Product, Stall, Store};
use crate::domain::error::DomainError;
use crate::domain::id::{CategoryId, ProductId, StallId, StoreId};
use crate::error::Result;
use crate::port::outbound::ledger::{CatalogLedger, Ledger, LedgerTx};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogSeed {
    #[serde(default)]
    pub stores: Vec<StoreSeed>,
    #[serde(default)]
    pub stalls: Vec<StallSeed>,
    #[serde(default)]
    pub categories: Vec<CategorySeed>,
    #[serde(default)]
    pub products: Vec<ProductSeed>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreSeed {
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StallSeed {
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategorySeed {
    pub name: String,
    #[serde(default)]
    pub sort_order: i32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductSeed {
    pub name: String,
    pub unit: String,
    /// Category name.
    pub category: String,
    /// Stall name.
    #[serde(default)]
    pub stall: Option<String>,
    #[serde(default)]
    pub price_reference: Option<Decimal>,
}

/// Counts of entries written by an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub stores: usize,
    pub stalls: usize,
    pub categories: usize,
    pub products: usize,
}

/// The whole catalog as currently stored.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CatalogSnapshot {
    pub stores: Vec<Store>,
    pub stalls: Vec<Stall>,
    pub categories: Vec<Category>,
    pub products: Vec<Product>,
}

pub struct CatalogService<L> {
    ledger: L,
}

impl<L: Ledger> CatalogService<L> {
    pub const fn new(ledger: L) -> Self {
        Self { ledger }
    }

    /// Upsert every entry of `seed` in one unit of work.
    ///
    /// # Errors
    /// Validation error for blank names or a product naming an unknown
    /// category or stall; nothing is written in that case.
    pub async fn import(&self, seed: CatalogSeed) -> Result<ImportSummary> {
        validate(&seed)?;
        let summary = self.ledger.write(move |tx| import(tx, &seed)).await?;
        info!(
            stores = summary.stores,
            stalls = summary.stalls,
            categories = summary.categories,
            products = summary.products,
            "Catalog imported"
        );
        Ok(summary)
    }

    /// # Errors
    /// Storage errors only.
    pub async fn show(&self) -> Result<CatalogSnapshot> {
        self.ledger
            .read(|tx| {
                Ok(CatalogSnapshot {
                    stores: tx.stores()?,
                    stalls: tx.stalls()?,
                    categories: tx.categories()?,
                    products: tx.products()?,
                })
            })
            .await
    }
}

fn blank(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DomainError::InvalidValue {
            field,
            value: value.to_string(),
        }
        .into());
    }
    Ok(())
}

fn validate(seed: &CatalogSeed) -> Result<()> {
    for store in &seed.stores {
        blank("store name", &store.name)?;
    }
    for stall in &seed.stalls {
        blank("stall name", &stall.name)?;
    }
    for category in &seed.categories {
        blank("category name", &category.name)?;
    }
    for product in &seed.products {
        blank("product name", &product.name)?;
        blank("product unit", &product.unit)?;
    }
    Ok(())
}

fn by_name<T, K>(entries: Vec<T>, name: impl Fn(&T) -> &str, id: impl Fn(&T) -> K) -> HashMap<String, K> {
    entries
        .iter()
        .map(|e| (name(e).to_string(), id(e)))
        .collect()
}

fn import(tx: &mut dyn LedgerTx, seed: &CatalogSeed) -> Result<ImportSummary> {
    let mut stores = by_name(tx.stores()?, |s| &s.name, |s| s.id.clone());
    let mut stalls = by_name(tx.stalls()?, |s| &s.name, |s| s.id.clone());
    let mut categories = by_name(tx.categories()?, |c| &c.name, |c| c.id.clone());
    let mut products = by_name(tx.products()?, |p| &p.name, |p| p.id.clone());

    for entry in &seed.stores {
        let id = stores.entry(entry.name.clone()).or_insert_with(StoreId::new);
        tx.upsert_store(&Store {
            id: id.clone(),
            name: entry.name.clone(),
            address: entry.address.clone(),
        })?;
    }

    for entry in &seed.stalls {
        let id = stalls.entry(entry.name.clone()).or_insert_with(StallId::new);
        tx.upsert_stall(&Stall {
            id: id.clone(),
            name: entry.name.clone(),
            location: entry.location.clone(),
            sort_order: entry.sort_order,
        })?;
    }

    for entry in &seed.categories {
        let id = categories
            .entry(entry.name.clone())
            .or_insert_with(CategoryId::new);
        tx.upsert_category(&Category {
            id: id.clone(),
            name: entry.name.clone(),
            sort_order: entry.sort_order,
        })?;
    }

    for entry in &seed.products {
        let category_id = categories
            .get(&entry.category)
            .cloned()
            .ok_or_else(|| DomainError::InvalidValue {
                field: "product category",
                value: entry.category.clone(),
            })?;
        let default_stall_id = match &entry.stall {
            Some(name) => Some(stalls.get(name).cloned().ok_or_else(|| {
                DomainError::InvalidValue {
                    field: "product stall",
                    value: name.clone(),
                }
            })?),
            None => None,
        };
        let id = products.entry(entry.name.clone()).or_insert_with(ProductId::new);
        tx.upsert_product(&Product {
            id: id.clone(),
            category_id,
            default_stall_id,
            name: entry.name.clone(),
            unit: entry.unit.clone(),
            price_reference: entry.price_reference,
        })?;
    }

    Ok(ImportSummary {
        stores: seed.stores.len(),
        stalls: seed.stalls.len(),
        categories: seed.categories.len(),
        products: seed.products.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::ledger::TempLedger;
    use rust_decimal_macros::dec;

    const SEED: &str = r#"
[[stores]]
name = "North"
address = "1 Harbour Rd"

[[stores]]
name = "South"

[[stalls]]
name = "Greens"
location = "Row A"
sort_order = 1

[[categories]]
name = "Vegetables"
sort_order = 1

[[products]]
name = "Tomato"
unit = "kg"
category = "Vegetables"
stall = "Greens"
price_reference = "8000"

[[products]]
name = "Onion"
unit = "kg"
category = "Vegetables"
"#;

    fn seed() -> CatalogSeed {
        toml::from_str(SEED).unwrap()
    }

    #[tokio::test]
    async fn import_resolves_names_to_ids() {
        let temp = TempLedger::new();
        let service = CatalogService::new(temp.ledger());

        let summary = service.import(seed()).await.unwrap();
        assert_eq!(
            summary,
            ImportSummary {
                stores: 2,
                stalls: 1,
                categories: 1,
                products: 2
            }
        );

        let snapshot = service.show().await.unwrap();
        assert_eq!(snapshot.stores.len(), 2);
        let tomato = snapshot.products.iter().find(|p| p.name == "Tomato").unwrap();
        assert_eq!(tomato.category_id, snapshot.categories[0].id);
        assert_eq!(tomato.default_stall_id.as_ref(), Some(&snapshot.stalls[0].id));
        assert_eq!(tomato.price_reference, Some(dec!(8000)));
        let onion = snapshot.products.iter().find(|p| p.name == "Onion").unwrap();
        assert!(onion.default_stall_id.is_none());
    }

    #[tokio::test]
    async fn reimport_keeps_identifiers() {
        let temp = TempLedger::new();
        let service = CatalogService::new(temp.ledger());
        service.import(seed()).await.unwrap();
        let before = service.show().await.unwrap();

        let mut changed = seed();
        changed.stalls[0].location = Some("Row B".to_string());
        service.import(changed).await.unwrap();
        let after = service.show().await.unwrap();

        assert_eq!(after.products.len(), 2);
        assert_eq!(after.stores.len(), 2);
        for product in &before.products {
            assert!(after.products.iter().any(|p| p.id == product.id));
        }
        assert_eq!(after.stalls[0].id, before.stalls[0].id);
        assert_eq!(after.stalls[0].location.as_deref(), Some("Row B"));
    }

    #[tokio::test]
    async fn unknown_category_writes_nothing() {
        let temp = TempLedger::new();
        let service = CatalogService::new(temp.ledger());
        let mut bad = seed();
        bad.products[1].category = "Dairy".to_string();

        let err = service.import(bad).await.unwrap_err();
        assert!(err.is_validation());
        assert!(service.show().await.unwrap().stores.is_empty());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result: std::result::Result<CatalogSeed, _> = toml::from_str("[[stores]]\nname = \"A\"\ncolour = \"red\"\n");
        assert!(result.is_err());
    }
}
