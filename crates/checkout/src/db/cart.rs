//! Cart item repository.
//!
//! Every statement that overwrites `quantity` is followed by
//! `purge_if_emptied` inside the same transaction, so a row whose quantity
//! drops below 1 never survives a commit.

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use cartwright_core::{CartItemId, CartKey, Price, ProductId, Quantity};

use super::RepositoryError;
use crate::models::cart::should_purge;
use crate::models::{AddItemOutcome, CartItem, Product};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct CartItemRow {
    id: i32,
    cart_key: String,
    product_id: i32,
    quantity: i32,
    price: Decimal,
}

impl TryFrom<CartItemRow> for CartItem {
    type Error = RepositoryError;

    fn try_from(row: CartItemRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let corrupt = |what: &str, e: &dyn std::fmt::Display| {
            RepositoryError::DataCorruption(format!("invalid {what} on cart item {id}: {e}"))
        };

        Ok(Self {
            id: CartItemId::new(row.id),
            cart_key: CartKey::parse(&row.cart_key).map_err(|e| corrupt("cart key", &e))?,
            product_id: ProductId::new(row.product_id),
            quantity: Quantity::new(row.quantity).map_err(|e| corrupt("quantity", &e))?,
            price: Price::new(row.price).map_err(|e| corrupt("price", &e))?,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UpsertRow {
    #[sqlx(flatten)]
    item: CartItemRow,
    created: bool,
}

const CART_ITEM_COLUMNS: &str = "id, cart_key, product_id, quantity, price";

// =============================================================================
// Connection-level helpers (shared with the order repository)
// =============================================================================

/// Delete the row if `quantity` (its value after a write) is below 1.
///
/// Returns `true` if the row was deleted.
pub(crate) async fn purge_if_emptied(
    conn: &mut PgConnection,
    id: CartItemId,
    quantity: i32,
) -> Result<bool, sqlx::Error> {
    if !should_purge(quantity) {
        return Ok(false);
    }

    let result = sqlx::query("DELETE FROM checkout.cart_item WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Load a cart's rows, optionally locking them for the rest of the transaction.
pub(crate) async fn fetch_cart_items(
    conn: &mut PgConnection,
    cart_key: &CartKey,
    for_update: bool,
) -> Result<Vec<CartItem>, RepositoryError> {
    let lock = if for_update { " FOR UPDATE" } else { "" };
    let rows = sqlx::query_as::<_, CartItemRow>(&format!(
        "SELECT {CART_ITEM_COLUMNS} FROM checkout.cart_item WHERE cart_key = $1 ORDER BY id{lock}"
    ))
    .bind(cart_key)
    .fetch_all(conn)
    .await?;

    rows.into_iter().map(CartItem::try_from).collect()
}

/// Delete every row of a cart. Returns the number of rows removed.
pub(crate) async fn delete_cart(
    conn: &mut PgConnection,
    cart_key: &CartKey,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM checkout.cart_item WHERE cart_key = $1")
        .bind(cart_key)
        .execute(conn)
        .await?;

    Ok(result.rows_affected())
}

/// Delete specific cart rows by ID. Returns the number of rows removed.
pub(crate) async fn delete_cart_items(
    conn: &mut PgConnection,
    ids: &[CartItemId],
) -> Result<u64, sqlx::Error> {
    let ids: Vec<i32> = ids.iter().map(CartItemId::as_i32).collect();
    let result = sqlx::query("DELETE FROM checkout.cart_item WHERE id = ANY($1)")
        .bind(ids)
        .execute(conn)
        .await?;

    Ok(result.rows_affected())
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for cart item database operations.
pub struct CartItemRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartItemRepository<'a> {
    /// Create a new cart item repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Add one unit of `product` to the cart.
    ///
    /// A single upsert on the `(cart_key, product_id)` constraint, so two
    /// concurrent adds for the same pair always yield one row with both
    /// increments applied. New rows snapshot `product.price`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn add_item(
        &self,
        cart_key: &CartKey,
        product: &Product,
    ) -> Result<AddItemOutcome, RepositoryError> {
        let row = sqlx::query_as::<_, UpsertRow>(
            r"
            INSERT INTO checkout.cart_item AS ci (cart_key, product_id, quantity, price)
            VALUES ($1, $2, 1, $3)
            ON CONFLICT (cart_key, product_id)
            DO UPDATE SET quantity = ci.quantity + 1
            RETURNING ci.id, ci.cart_key, ci.product_id, ci.quantity, ci.price,
                      (ci.xmax = 0) AS created
            ",
        )
        .bind(cart_key)
        .bind(product.id)
        .bind(product.price)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "cart item already exists"))?;

        Ok(AddItemOutcome {
            item: CartItem::try_from(row.item)?,
            created: row.created,
        })
    }

    /// Insert a cart row directly, outside the add-item path.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the cart already holds this product.
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn insert(
        &self,
        cart_key: &CartKey,
        product: &Product,
        quantity: Quantity,
    ) -> Result<CartItem, RepositoryError> {
        let row = sqlx::query_as::<_, CartItemRow>(&format!(
            "INSERT INTO checkout.cart_item (cart_key, product_id, quantity, price) \
             VALUES ($1, $2, $3, $4) RETURNING {CART_ITEM_COLUMNS}"
        ))
        .bind(cart_key)
        .bind(product.id)
        .bind(quantity)
        .bind(product.price)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "cart already contains this product"))?;

        CartItem::try_from(row)
    }

    /// Get a cart row by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the row is invalid.
    pub async fn get(&self, id: CartItemId) -> Result<Option<CartItem>, RepositoryError> {
        let row = sqlx::query_as::<_, CartItemRow>(&format!(
            "SELECT {CART_ITEM_COLUMNS} FROM checkout.cart_item WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(CartItem::try_from).transpose()
    }

    /// List a cart's rows in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, cart_key: &CartKey) -> Result<Vec<CartItem>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        fetch_cart_items(&mut conn, cart_key, false).await
    }

    /// Overwrite a row's quantity, then apply the cleanup rule.
    ///
    /// Returns the updated row, or `None` if the new quantity emptied it and
    /// it was deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the row doesn't exist.
    /// Returns `RepositoryError::Conflict` if `quantity` is negative.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_quantity(
        &self,
        id: CartItemId,
        quantity: i32,
    ) -> Result<Option<CartItem>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, CartItemRow>(&format!(
            "UPDATE checkout.cart_item SET quantity = $2 WHERE id = $1 \
             RETURNING {CART_ITEM_COLUMNS}"
        ))
        .bind(id)
        .bind(quantity)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_write(e, "cart item conflict"))?
        .ok_or(RepositoryError::NotFound)?;

        let purged = purge_if_emptied(&mut tx, id, row.quantity).await?;
        tx.commit().await?;

        if purged {
            return Ok(None);
        }

        CartItem::try_from(row).map(Some)
    }

    /// Delete a cart row.
    ///
    /// Returns `true` if the row existed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: CartItemId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM checkout.cart_item WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete every row of a cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, cart_key: &CartKey) -> Result<u64, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        Ok(delete_cart(&mut conn, cart_key).await?)
    }
}
