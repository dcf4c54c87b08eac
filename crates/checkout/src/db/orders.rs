//! Order repository.
//!
//! Orders are only ever created together with their lines inside one
//! transaction. Lines are immutable after that; the order row itself only
//! changes status and payment option.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use cartwright_core::{
    CartItemId, CartKey, OrderId, OrderItemId, OrderStatus, PaymentOption, Price, ProductId,
    Quantity, UserId,
};

use super::RepositoryError;
use super::cart::{delete_cart_items, fetch_cart_items};
use super::catalog::{PRODUCT_COLUMNS, ProductRow};
use crate::models::{CartItem, Order, OrderDetails, OrderItem, Product};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    status: i32,
    payment_option: String,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let corrupt = |e: &dyn std::fmt::Display| {
            RepositoryError::DataCorruption(format!("order {id}: {e}"))
        };
        let status = OrderStatus::try_from(row.status).map_err(|e| corrupt(&e))?;
        let payment_option = row
            .payment_option
            .parse::<PaymentOption>()
            .map_err(|e| corrupt(&e))?;

        Ok(Self {
            id: OrderId::new(row.id),
            user_id: UserId::new(row.user_id),
            status,
            payment_option,
            created_at: row.created_at,
            modified_at: row.modified_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: i32,
    order_id: i32,
    product_id: i32,
    quantity: i32,
    price: Decimal,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = RepositoryError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let corrupt = |what: &str, e: &dyn std::fmt::Display| {
            RepositoryError::DataCorruption(format!("invalid {what} on order item {id}: {e}"))
        };

        Ok(Self {
            id: OrderItemId::new(row.id),
            order_id: OrderId::new(row.order_id),
            product_id: ProductId::new(row.product_id),
            quantity: Quantity::new(row.quantity).map_err(|e| corrupt("quantity", &e))?,
            price: Price::new(row.price).map_err(|e| corrupt("price", &e))?,
        })
    }
}

// The enum lives outside `public`, so it crosses the wire as text.
const ORDER_COLUMNS: &str =
    "id, user_id, status, payment_option::text AS payment_option, created_at, modified_at";
const ORDER_ITEM_COLUMNS: &str = "id, order_id, product_id, quantity, price";

// =============================================================================
// Connection-level helpers
// =============================================================================

/// Write one order and a line per cart row on `conn`.
///
/// The caller owns the transaction; nothing here commits.
async fn insert_order(
    conn: &mut PgConnection,
    user_id: UserId,
    items: &[CartItem],
) -> Result<OrderDetails, RepositoryError> {
    let order = sqlx::query_as::<_, OrderRow>(&format!(
        "INSERT INTO checkout.\"order\" (user_id) VALUES ($1) RETURNING {ORDER_COLUMNS}"
    ))
    .bind(user_id)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| RepositoryError::from_write(e, "order already exists"))?;
    let order = Order::try_from(order)?;

    let mut lines = Vec::with_capacity(items.len());
    for item in items {
        let row = sqlx::query_as::<_, OrderItemRow>(&format!(
            "INSERT INTO checkout.order_item (order_id, product_id, quantity, price) \
             VALUES ($1, $2, $3, $4) RETURNING {ORDER_ITEM_COLUMNS}"
        ))
        .bind(order.id)
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(item.price)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| RepositoryError::from_write(e, "order item already exists"))?;
        lines.push(OrderItem::try_from(row)?);
    }

    Ok(OrderDetails {
        order,
        items: lines,
    })
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Materialize an order for `user_id` from cart rows.
    ///
    /// One transaction covers the order and every line. Any failed insert
    /// rolls the whole order back. The cart rows are left untouched, and an
    /// empty slice produces an order without lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user or a product doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        user_id: UserId,
        items: &[CartItem],
    ) -> Result<OrderDetails, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let details = insert_order(&mut tx, user_id, items).await?;
        tx.commit().await?;

        Ok(details)
    }

    /// Materialize an order from the current contents of a cart and empty it.
    ///
    /// The cart rows read are locked for the duration of the transaction and
    /// only those rows are cleared. A row added concurrently for another
    /// product stays in the cart. Returns `None` without writing anything if the cart is empty.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user or a product doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_from_cart(
        &self,
        user_id: UserId,
        cart_key: &CartKey,
    ) -> Result<Option<OrderDetails>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let items = fetch_cart_items(&mut tx, cart_key, true).await?;
        if items.is_empty() {
            tx.rollback().await?;
            return Ok(None);
        }

        let details = insert_order(&mut tx, user_id, &items).await?;
        let ids: Vec<CartItemId> = items.iter().map(|item| item.id).collect();
        delete_cart_items(&mut tx, &ids).await?;
        tx.commit().await?;

        Ok(Some(details))
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored status is invalid.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM checkout.\"order\" WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Order::try_from).transpose()
    }

    /// List a user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM checkout.\"order\" WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    /// List an order's lines ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderItemRow>(&format!(
            "SELECT {ORDER_ITEM_COLUMNS} FROM checkout.order_item WHERE order_id = $1 ORDER BY id"
        ))
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(OrderItem::try_from).collect()
    }

    /// Sum of price × quantity over an order's lines.
    ///
    /// `SUM` over no rows is NULL, so an order without lines has no total.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn total(&self, order_id: OrderId) -> Result<Option<Decimal>, RepositoryError> {
        let total: Option<Decimal> = sqlx::query_scalar(
            r"
            SELECT SUM(price * quantity)
            FROM checkout.order_item
            WHERE order_id = $1
            ",
        )
        .bind(order_id)
        .fetch_one(self.pool)
        .await?;

        Ok(total)
    }

    /// Distinct products referenced by an order's lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn products(&self, order_id: OrderId) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM catalog.product \
             WHERE id IN (SELECT product_id FROM checkout.order_item WHERE order_id = $1) \
             ORDER BY id"
        ))
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// Set an order's status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "UPDATE checkout.\"order\" SET status = $2, modified_at = NOW() WHERE id = $1 \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .bind(status.code())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Order::try_from(row)
    }

    /// Set an order's payment option.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update_payment_option(
        &self,
        id: OrderId,
        payment_option: PaymentOption,
    ) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "UPDATE checkout.\"order\" SET payment_option = $2::checkout.payment_option, \
             modified_at = NOW() WHERE id = $1 \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .bind(payment_option.as_str())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Order::try_from(row)
    }
}
