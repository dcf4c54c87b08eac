//! Boundary entities owned by the identity and catalog components.
//!
//! Checkout only reads these.

use core::fmt;

use serde::{Deserialize, Serialize};

use cartwright_core::{Price, ProductId, UserId};

/// A purchasable catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Catalog ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// URL slug.
    pub slug: String,
    /// Current price. Copied onto cart rows when they are created.
    pub price: Price,
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// An authenticated customer who can own orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Account ID.
    pub id: UserId,
    /// Full name.
    pub name: String,
    /// Email address.
    pub email: String,
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            f.write_str(&self.email)
        } else {
            f.write_str(&self.name)
        }
    }
}
