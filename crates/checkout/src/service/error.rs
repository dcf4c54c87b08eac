//! Checkout error types.

use thiserror::Error;

use cartwright_core::{CartItemId, CartKey, OrderId, ProductId, UserId};

use crate::db::RepositoryError;

/// Errors that can occur during cart and checkout operations.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Product does not exist in the catalog.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// User does not exist.
    #[error("user {0} not found")]
    UserNotFound(UserId),

    /// Cart row does not exist (or was already removed).
    #[error("cart item {0} not found")]
    CartItemNotFound(CartItemId),

    /// Order does not exist.
    #[error("order {0} not found")]
    OrderNotFound(OrderId),

    /// The cart already holds a row for this product.
    #[error("cart {cart_key} already contains product {product_id}")]
    DuplicateCartItem {
        /// Cart that was written to.
        cart_key: CartKey,
        /// Product that was already present.
        product_id: ProductId,
    },

    /// Nothing to check out.
    #[error("cart {0} is empty")]
    EmptyCart(CartKey),

    /// Quantity outside the accepted range.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(i32),

    /// Repository/database error.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_message_is_not_prefixed_twice() {
        let err = CheckoutError::from(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        let message = err.to_string();
        assert!(message.starts_with("database error: "));
        assert_eq!(message.matches("database error").count(), 1);
    }

    #[test]
    fn test_repository_conflict_passes_through() {
        let err = CheckoutError::from(RepositoryError::Conflict("duplicate".to_string()));
        assert_eq!(err.to_string(), "constraint violation: duplicate");
    }
}
