//! Orders and their line items.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use core::fmt;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cartwright_core::{
    OrderId, OrderItemId, OrderStatus, PaymentOption, Price, ProductId, Quantity, UserId,
};

use super::Product;

/// An order materialized from a cart at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Order ID.
    pub id: OrderId,
    /// Customer who placed the order.
    pub user_id: UserId,
    /// Payment lifecycle status.
    pub status: OrderStatus,
    /// Chosen payment method.
    pub payment_option: PaymentOption,
    /// Set once at checkout.
    pub created_at: DateTime<Utc>,
    /// Bumped on every update.
    pub modified_at: DateTime<Utc>,
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Order #{}", self.id)
    }
}

/// One line of an order. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Line ID.
    pub id: OrderItemId,
    /// Owning order.
    pub order_id: OrderId,
    /// Product ordered.
    pub product_id: ProductId,
    /// Units copied from the cart row.
    pub quantity: Quantity,
    /// Unit price copied from the cart row.
    pub price: Price,
}

impl OrderItem {
    /// Price times quantity for this line.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.price.line_total(self.quantity)
    }

    /// `"[Order #{order}] {product}"` with the product's name.
    #[must_use]
    pub fn label(&self, product: &Product) -> String {
        format!("[Order #{}] {product}", self.order_id)
    }
}

impl fmt::Display for OrderItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Order #{}] product {}", self.order_id, self.product_id)
    }
}

/// An order together with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetails {
    /// The order row.
    pub order: Order,
    /// Its lines, ordered by ID.
    pub items: Vec<OrderItem>,
}

impl OrderDetails {
    /// See [`order_total`].
    #[must_use]
    pub fn total(&self) -> Option<Decimal> {
        order_total(&self.items)
    }

    /// See [`distinct_products`].
    #[must_use]
    pub fn product_ids(&self) -> BTreeSet<ProductId> {
        distinct_products(&self.items)
    }
}

/// Sum of price × quantity over the lines.
///
/// `None` for an order without lines, matching SQL `SUM` over no rows. An
/// empty order has no total rather than a zero total.
#[must_use]
pub fn order_total(items: &[OrderItem]) -> Option<Decimal> {
    if items.is_empty() {
        return None;
    }
    Some(items.iter().map(OrderItem::total).sum())
}

/// Distinct products referenced by the lines.
#[must_use]
pub fn distinct_products(items: &[OrderItem]) -> BTreeSet<ProductId> {
    items.iter().map(|item| item.product_id).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(id: i32, product: i32, quantity: i32, cents: i64) -> OrderItem {
        OrderItem {
            id: OrderItemId::new(id),
            order_id: OrderId::new(1),
            product_id: ProductId::new(product),
            quantity: Quantity::new(quantity).unwrap(),
            price: Price::from_cents(cents).unwrap(),
        }
    }

    #[test]
    fn test_total_of_empty_order_is_none() {
        assert_eq!(order_total(&[]), None);
    }

    #[test]
    fn test_total_sums_lines() {
        let items = [line(1, 1, 3, 999), line(2, 2, 1, 1)];
        assert_eq!(order_total(&items), Some(Decimal::new(2998, 2)));
    }

    #[test]
    fn test_total_is_idempotent() {
        let items = [line(1, 1, 2, 250)];
        assert_eq!(order_total(&items), order_total(&items));
    }

    #[test]
    fn test_distinct_products_drops_repeats() {
        let items = [line(1, 1, 1, 100), line(2, 2, 1, 100), line(3, 1, 4, 100)];
        let products = distinct_products(&items);
        assert_eq!(
            products.into_iter().collect::<Vec<_>>(),
            vec![ProductId::new(1), ProductId::new(2)]
        );
    }

    #[test]
    fn test_display() {
        let order = Order {
            id: OrderId::new(12),
            user_id: UserId::new(1),
            status: OrderStatus::default(),
            payment_option: PaymentOption::default(),
            created_at: Utc::now(),
            modified_at: Utc::now(),
        };
        assert_eq!(order.to_string(), "Order #12");
        assert_eq!(line(1, 5, 1, 100).to_string(), "[Order #1] product 5");
    }

    #[test]
    fn test_label_uses_product_name() {
        let product = Product {
            id: ProductId::new(5),
            name: "Plate".to_string(),
            slug: "plate".to_string(),
            price: Price::from_cents(100).unwrap(),
        };
        assert_eq!(line(1, 5, 1, 100).label(&product), "[Order #1] Plate");
    }

    #[test]
    fn test_order_serializes_enums_as_snake_case() {
        let order = Order {
            id: OrderId::new(3),
            user_id: UserId::new(9),
            status: OrderStatus::AwaitingPayment,
            payment_option: PaymentOption::GatewayA,
            created_at: Utc::now(),
            modified_at: Utc::now(),
        };
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["status"], "awaiting_payment");
        assert_eq!(json["payment_option"], "gateway_a");
        assert_eq!(json["id"], 3);
    }
}
