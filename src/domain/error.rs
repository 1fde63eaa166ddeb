//! Domain validation errors.
//!
//! These errors are raised before any write happens: the caller asked for
//! something the ledger must never record (a zero-quantity purchase, a
//! transition out of a terminal status, ...). They are the "validation"
//! branch of the error taxonomy and are never retried blindly.
//!
//! # Examples
//!
//! ```
//! use marketrun::domain::batch::BatchLine;
//! use marketrun::domain::error::DomainError;
//! use marketrun::domain::id::ProductId;
//! use rust_decimal_macros::dec;
//!
//! let result = BatchLine::try_new(ProductId::from("p"), dec!(0), dec!(100));
//! assert!(matches!(result, Err(DomainError::NonPositiveQuantity { .. })));
//! ```

use rust_decimal::Decimal;
use thiserror::Error;

use super::id::ProductId;
use super::order::OrderStatus;

/// Errors that occur when domain invariants would be violated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Purchased or requested quantity must be strictly positive.
    #[error("quantity for product {product} must be positive, got {quantity}")]
    NonPositiveQuantity {
        /// Product the line refers to.
        product: ProductId,
        /// The rejected quantity.
        quantity: Decimal,
    },

    /// Purchase cost must be strictly positive.
    #[error("cost for product {product} must be positive, got {cost}")]
    NonPositiveCost {
        /// Product the line refers to.
        product: ProductId,
        /// The rejected cost.
        cost: Decimal,
    },

    /// Shared expense amount must be strictly positive.
    #[error("expense amount must be positive, got {amount}")]
    NonPositiveAmount {
        /// The rejected amount.
        amount: Decimal,
    },

    /// A batch must contain at least one purchase line.
    #[error("batch has no items")]
    EmptyBatch,

    /// An order must contain at least one line.
    #[error("order has no items")]
    EmptyOrder,

    /// The same product appears twice in one batch or order.
    #[error("product {product} listed more than once")]
    DuplicateProduct {
        /// The repeated product.
        product: ProductId,
    },

    /// Requested status change is not in the transition table.
    #[error("cannot transition order from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: OrderStatus,
        /// Requested status.
        to: OrderStatus,
    },

    /// A textual enum value could not be parsed.
    #[error("invalid {field}: '{value}'")]
    InvalidValue {
        /// Name of the field being parsed.
        field: &'static str,
        /// The offending input.
        value: String,
    },
}
