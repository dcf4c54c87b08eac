//! Storage seam for the checkout layer.
//!
//! [`CheckoutStore`] lists every persisted operation the service needs.
//! [`PgStore`] is the production implementation; `MemoryStore` (feature
//! `test-helpers`) keeps the same semantics in process for tests.
//!
//! Both implementations report failures as [`RepositoryError`]:
//! `NotFound` when a write references a missing row, `Conflict` when a
//! uniqueness or check constraint rejects it.

mod postgres;

#[cfg(any(test, feature = "test-helpers"))]
mod memory;

use std::future::Future;

use rust_decimal::Decimal;

use cartwright_core::{
    CartItemId, CartKey, OrderId, OrderStatus, PaymentOption, ProductId, Quantity, UserId,
};

use crate::db::RepositoryError;
use crate::models::{AddItemOutcome, CartItem, Order, OrderDetails, OrderItem, Product, User};

#[cfg(any(test, feature = "test-helpers"))]
pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Persisted operations behind the checkout service.
pub trait CheckoutStore: Send + Sync {
    // =========================================================================
    // Boundary lookups
    // =========================================================================

    /// Look up a catalog product.
    fn product(
        &self,
        id: ProductId,
    ) -> impl Future<Output = Result<Option<Product>, RepositoryError>> + Send;

    /// Look up a user.
    fn user(&self, id: UserId)
    -> impl Future<Output = Result<Option<User>, RepositoryError>> + Send;

    // =========================================================================
    // Cart
    // =========================================================================

    /// Add one unit of `product` to the cart, creating the row at quantity 1
    /// with the product's current price if it doesn't exist yet.
    ///
    /// Atomic per `(cart_key, product)`: concurrent adds never create two rows.
    fn add_item(
        &self,
        cart_key: &CartKey,
        product: &Product,
    ) -> impl Future<Output = Result<AddItemOutcome, RepositoryError>> + Send;

    /// Insert a row directly. A second row for the same pair is a `Conflict`.
    fn insert_cart_item(
        &self,
        cart_key: &CartKey,
        product: &Product,
        quantity: Quantity,
    ) -> impl Future<Output = Result<CartItem, RepositoryError>> + Send;

    /// Get a cart row.
    fn cart_item(
        &self,
        id: CartItemId,
    ) -> impl Future<Output = Result<Option<CartItem>, RepositoryError>> + Send;

    /// List a cart's rows ordered by ID.
    fn cart_items(
        &self,
        cart_key: &CartKey,
    ) -> impl Future<Output = Result<Vec<CartItem>, RepositoryError>> + Send;

    /// Overwrite a row's quantity and delete the row if it fell below 1.
    ///
    /// `None` means the row was deleted.
    fn set_cart_item_quantity(
        &self,
        id: CartItemId,
        quantity: i32,
    ) -> impl Future<Output = Result<Option<CartItem>, RepositoryError>> + Send;

    /// Delete a cart row. `false` if it didn't exist.
    fn remove_cart_item(
        &self,
        id: CartItemId,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    /// Delete every row of a cart, returning how many were removed.
    fn clear_cart(
        &self,
        cart_key: &CartKey,
    ) -> impl Future<Output = Result<u64, RepositoryError>> + Send;

    // =========================================================================
    // Orders
    // =========================================================================

    /// Create an order and one line per cart row, all or nothing.
    ///
    /// The cart rows are not modified.
    fn checkout(
        &self,
        user_id: UserId,
        items: &[CartItem],
    ) -> impl Future<Output = Result<OrderDetails, RepositoryError>> + Send;

    /// Create an order from a cart's current rows and clear the cart, all or
    /// nothing. `None` if the cart is empty.
    fn checkout_cart(
        &self,
        user_id: UserId,
        cart_key: &CartKey,
    ) -> impl Future<Output = Result<Option<OrderDetails>, RepositoryError>> + Send;

    /// Get an order.
    fn order(
        &self,
        id: OrderId,
    ) -> impl Future<Output = Result<Option<Order>, RepositoryError>> + Send;

    /// A user's orders, newest first.
    fn orders_for_user(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Vec<Order>, RepositoryError>> + Send;

    /// An order's lines ordered by ID.
    fn order_items(
        &self,
        order_id: OrderId,
    ) -> impl Future<Output = Result<Vec<OrderItem>, RepositoryError>> + Send;

    /// Sum of price × quantity over an order's lines; `None` without lines.
    fn order_total(
        &self,
        order_id: OrderId,
    ) -> impl Future<Output = Result<Option<Decimal>, RepositoryError>> + Send;

    /// Distinct products referenced by an order, ordered by ID.
    fn order_products(
        &self,
        order_id: OrderId,
    ) -> impl Future<Output = Result<Vec<Product>, RepositoryError>> + Send;

    /// Set an order's status and bump `modified_at`.
    fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> impl Future<Output = Result<Order, RepositoryError>> + Send;

    /// Set an order's payment option and bump `modified_at`.
    fn update_payment_option(
        &self,
        id: OrderId,
        payment_option: PaymentOption,
    ) -> impl Future<Output = Result<Order, RepositoryError>> + Send;
}
