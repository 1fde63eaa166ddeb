//! Purchase batches: what a purchaser actually bought on one market trip.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::{BatchId, BatchItemId, ProductId, UserId};
use super::money;

/// Status of a purchase batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Draft,
    Finalized,
}

impl BatchStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Finalized => "finalized",
        }
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BatchStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "finalized" => Ok(Self::Finalized),
            other => Err(DomainError::InvalidValue {
                field: "batch status",
                value: other.to_string(),
            }),
        }
    }
}

/// One purchased product as submitted by the purchaser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchLine {
    pub product_id: ProductId,
    pub quantity: Decimal,
    pub cost: Decimal,
}

impl BatchLine {
    /// Create a validated batch line.
    ///
    /// # Errors
    /// Returns an error if quantity or cost is zero or negative.
    pub fn try_new(product_id: ProductId, quantity: Decimal, cost: Decimal) -> Result<Self, DomainError> {
        let line = Self {
            product_id,
            quantity,
            cost,
        };
        line.validate()?;
        Ok(line)
    }

    /// Check that both quantity and cost stay strictly positive once rounded
    /// to storage precision.
    ///
    /// # Errors
    /// Returns [`DomainError::NonPositiveQuantity`] or
    /// [`DomainError::NonPositiveCost`].
    pub fn validate(&self) -> Result<(), DomainError> {
        if money::quantity(self.quantity) <= Decimal::ZERO {
            return Err(DomainError::NonPositiveQuantity {
                product: self.product_id.clone(),
                quantity: self.quantity,
            });
        }
        if money::money(self.cost) <= Decimal::ZERO {
            return Err(DomainError::NonPositiveCost {
                product: self.product_id.clone(),
                cost: self.cost,
            });
        }
        Ok(())
    }

    /// Exact price per unit. Only meaningful on a validated line.
    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        self.cost / self.quantity
    }
}

/// Validate a full batch submission before anything is written.
///
/// # Errors
/// Rejects empty submissions, invalid lines and repeated products.
pub fn validate_lines(lines: &[BatchLine]) -> Result<(), DomainError> {
    if lines.is_empty() {
        return Err(DomainError::EmptyBatch);
    }
    let mut seen = HashSet::with_capacity(lines.len());
    for line in lines {
        line.validate()?;
        if !seen.insert(&line.product_id) {
            return Err(DomainError::DuplicateProduct {
                product: line.product_id.clone(),
            });
        }
    }
    Ok(())
}

/// A recorded purchase of one product within a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItem {
    pub id: BatchItemId,
    pub batch_id: BatchId,
    pub product_id: ProductId,
    pub total_quantity_bought: Decimal,
    pub total_cost: Decimal,
    /// Price per unit, fixed when the item is recorded.
    pub unit_price: Decimal,
}

impl BatchItem {
    /// Record a validated line against a batch.
    #[must_use]
    pub fn record(batch_id: &BatchId, line: &BatchLine) -> Self {
        Self {
            id: BatchItemId::new(),
            batch_id: batch_id.clone(),
            product_id: line.product_id.clone(),
            total_quantity_bought: money::quantity(line.quantity),
            total_cost: money::money(line.cost),
            unit_price: money::money(line.unit_price()),
        }
    }
}

/// One purchasing trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseBatch {
    pub id: BatchId,
    pub purchaser_id: UserId,
    pub purchase_date: NaiveDate,
    pub market_location: Option<String>,
    pub status: BatchStatus,
    pub created_at: DateTime<Utc>,
    pub items: Vec<BatchItem>,
}
