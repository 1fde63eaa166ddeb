//! Domain identifier types with proper encapsulation.
//!
//! Every entity is keyed by a UUID v4 rendered as a string. Each kind of
//! entity gets its own newtype so a `StoreId` can never be passed where an
//! `OrderId` is expected.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new identifier with a generated UUID.
            #[must_use]
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            /// Get the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

entity_id!(
    /// Identifier of a store (the ordering and billed party).
    StoreId
);
entity_id!(
    /// Identifier of a market stall products are usually bought at.
    StallId
);
entity_id!(
    /// Identifier of a product category.
    CategoryId
);
entity_id!(
    /// Identifier of a catalog product.
    ProductId
);
entity_id!(
    /// Identifier of a user (requester, purchaser or expense author).
    UserId
);
entity_id!(
    /// Identifier of a purchase order.
    OrderId
);
entity_id!(
    /// Identifier of a single line of a purchase order.
    OrderItemId
);
entity_id!(
    /// Identifier of a purchase batch (one buying trip).
    BatchId
);
entity_id!(
    /// Identifier of one product line inside a purchase batch.
    BatchItemId
);
entity_id!(
    /// Identifier of a shared overhead expense.
    ExpenseId
);
entity_id!(
    /// Identifier of a daily bill.
    BillId
);
