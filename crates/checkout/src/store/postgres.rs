//! `PostgreSQL` store.

use rust_decimal::Decimal;
use sqlx::PgPool;

use cartwright_core::{
    CartItemId, CartKey, OrderId, OrderStatus, PaymentOption, ProductId, Quantity, UserId,
};

use super::CheckoutStore;
use crate::db::{CartItemRepository, CatalogRepository, OrderRepository, RepositoryError};
use crate::models::{AddItemOutcome, CartItem, Order, OrderDetails, OrderItem, Product, User};

/// [`CheckoutStore`] backed by a connection pool.
///
/// Cloning is cheap; clones share the pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    const fn catalog(&self) -> CatalogRepository<'_> {
        CatalogRepository::new(&self.pool)
    }

    const fn cart(&self) -> CartItemRepository<'_> {
        CartItemRepository::new(&self.pool)
    }

    const fn orders(&self) -> OrderRepository<'_> {
        OrderRepository::new(&self.pool)
    }
}

impl CheckoutStore for PgStore {
    async fn product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        self.catalog().get_product(id).await
    }

    async fn user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        self.catalog().get_user(id).await
    }

    async fn add_item(
        &self,
        cart_key: &CartKey,
        product: &Product,
    ) -> Result<AddItemOutcome, RepositoryError> {
        self.cart().add_item(cart_key, product).await
    }

    async fn insert_cart_item(
        &self,
        cart_key: &CartKey,
        product: &Product,
        quantity: Quantity,
    ) -> Result<CartItem, RepositoryError> {
        self.cart().insert(cart_key, product, quantity).await
    }

    async fn cart_item(&self, id: CartItemId) -> Result<Option<CartItem>, RepositoryError> {
        self.cart().get(id).await
    }

    async fn cart_items(&self, cart_key: &CartKey) -> Result<Vec<CartItem>, RepositoryError> {
        self.cart().list(cart_key).await
    }

    async fn set_cart_item_quantity(
        &self,
        id: CartItemId,
        quantity: i32,
    ) -> Result<Option<CartItem>, RepositoryError> {
        self.cart().set_quantity(id, quantity).await
    }

    async fn remove_cart_item(&self, id: CartItemId) -> Result<bool, RepositoryError> {
        self.cart().delete(id).await
    }

    async fn clear_cart(&self, cart_key: &CartKey) -> Result<u64, RepositoryError> {
        self.cart().clear(cart_key).await
    }

    async fn checkout(
        &self,
        user_id: UserId,
        items: &[CartItem],
    ) -> Result<OrderDetails, RepositoryError> {
        self.orders().create(user_id, items).await
    }

    async fn checkout_cart(
        &self,
        user_id: UserId,
        cart_key: &CartKey,
    ) -> Result<Option<OrderDetails>, RepositoryError> {
        self.orders().create_from_cart(user_id, cart_key).await
    }

    async fn order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        self.orders().get(id).await
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        self.orders().list_for_user(user_id).await
    }

    async fn order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        self.orders().items(order_id).await
    }

    async fn order_total(&self, order_id: OrderId) -> Result<Option<Decimal>, RepositoryError> {
        self.orders().total(order_id).await
    }

    async fn order_products(&self, order_id: OrderId) -> Result<Vec<Product>, RepositoryError> {
        self.orders().products(order_id).await
    }

    async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        self.orders().update_status(id, status).await
    }

    async fn update_payment_option(
        &self,
        id: OrderId,
        payment_option: PaymentOption,
    ) -> Result<Order, RepositoryError> {
        self.orders().update_payment_option(id, payment_option).await
    }
}
