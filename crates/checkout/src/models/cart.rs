//! Cart rows and the quantity cleanup rule.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cartwright_core::{CartItemId, CartKey, Price, ProductId, Quantity};

use super::Product;

/// One product line in a cart.
///
/// At most one row exists per `(cart_key, product_id)`. `price` is the
/// product's price when the row was created and is never refreshed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Row ID.
    pub id: CartItemId,
    /// Cart this row belongs to.
    pub cart_key: CartKey,
    /// Product in the cart.
    pub product_id: ProductId,
    /// Units of the product.
    pub quantity: Quantity,
    /// Unit price snapshot.
    pub price: Price,
}

impl CartItem {
    /// Price times quantity for this row.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.price.line_total(self.quantity)
    }

    /// `"{product} [{quantity}]"` with the product's name.
    ///
    /// `Display` falls back to the product ID when the product isn't loaded.
    #[must_use]
    pub fn label(&self, product: &Product) -> String {
        format!("{product} [{}]", self.quantity)
    }
}

impl fmt::Display for CartItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "product {} [{}]", self.product_id, self.quantity)
    }
}

/// Result of adding a product to a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddItemOutcome {
    /// The row after the add.
    pub item: CartItem,
    /// `true` if the row was inserted, `false` if an existing row was incremented.
    pub created: bool,
}

/// Whether a row holding `quantity` units must be deleted after a write.
///
/// Every path that writes a cart quantity runs this check afterwards and
/// deletes the row when it holds.
#[must_use]
pub const fn should_purge(quantity: i32) -> bool {
    quantity < 1
}

/// Sum of [`CartItem::total`] over a cart. Zero for an empty cart.
#[must_use]
pub fn cart_total(items: &[CartItem]) -> Decimal {
    items.iter().map(CartItem::total).sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(product: i32, quantity: i32, cents: i64) -> CartItem {
        CartItem {
            id: CartItemId::new(product),
            cart_key: CartKey::parse("cart").unwrap(),
            product_id: ProductId::new(product),
            quantity: Quantity::new(quantity).unwrap(),
            price: Price::from_cents(cents).unwrap(),
        }
    }

    #[test]
    fn test_total_is_price_times_quantity() {
        assert_eq!(item(1, 3, 999).total(), Decimal::new(2997, 2));
    }

    #[test]
    fn test_should_purge_below_one() {
        assert!(should_purge(0));
        assert!(should_purge(-1));
        assert!(!should_purge(1));
    }

    #[test]
    fn test_cart_total() {
        let items = [item(1, 2, 500), item(2, 1, 1250)];
        assert_eq!(cart_total(&items), Decimal::new(2250, 2));
        assert_eq!(cart_total(&[]), Decimal::ZERO);
    }

    #[test]
    fn test_display() {
        assert_eq!(item(7, 2, 100).to_string(), "product 7 [2]");
    }

    #[test]
    fn test_label_uses_product_name() {
        let product = Product {
            id: ProductId::new(7),
            name: "Mug".to_string(),
            slug: "mug".to_string(),
            price: Price::from_cents(100).unwrap(),
        };
        assert_eq!(item(7, 2, 100).label(&product), "Mug [2]");
    }
}
