//! Checkout service.
//!
//! Resolves products and users through the store's boundary lookups,
//! validates input, and translates repository failures into
//! [`CheckoutError`]s the presentation layer can act on.

mod error;

pub use error::CheckoutError;

use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};

use cartwright_core::{
    CartItemId, CartKey, OrderId, OrderStatus, PaymentOption, ProductId, Quantity, UserId,
};

use crate::db::RepositoryError;
use crate::models::cart::cart_total;
use crate::models::{AddItemOutcome, CartItem, Order, OrderDetails, OrderItem, Product, User};
use crate::store::CheckoutStore;

/// Cart and checkout service over any [`CheckoutStore`].
#[derive(Debug, Clone)]
pub struct CheckoutService<S> {
    store: S,
}

impl<S: CheckoutStore> CheckoutService<S> {
    /// Create a new checkout service.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    // =========================================================================
    // Boundary lookups
    // =========================================================================

    /// Get a product.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::ProductNotFound` if it doesn't exist.
    pub async fn product(&self, id: ProductId) -> Result<Product, CheckoutError> {
        self.store
            .product(id)
            .await?
            .ok_or(CheckoutError::ProductNotFound(id))
    }

    /// Get a user.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::UserNotFound` if it doesn't exist.
    pub async fn user(&self, id: UserId) -> Result<User, CheckoutError> {
        self.store
            .user(id)
            .await?
            .ok_or(CheckoutError::UserNotFound(id))
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Add one unit of a product to a cart.
    ///
    /// Returns the row after the add and whether it was newly created. The
    /// first add for a pair creates the row at quantity 1 with the product's
    /// current price; later adds only increment the quantity.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::ProductNotFound` if the product doesn't exist.
    #[instrument(skip(self, cart_key), fields(cart_key = %cart_key))]
    pub async fn add_item(
        &self,
        cart_key: &CartKey,
        product_id: ProductId,
    ) -> Result<AddItemOutcome, CheckoutError> {
        let product = self.product(product_id).await?;

        let outcome = self
            .store
            .add_item(cart_key, &product)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CheckoutError::ProductNotFound(product_id),
                other => CheckoutError::Repository(other),
            })?;

        info!(
            item_id = %outcome.item.id,
            quantity = %outcome.item.quantity,
            created = outcome.created,
            "Added item to cart"
        );

        Ok(outcome)
    }

    /// Insert a cart row with an explicit quantity.
    ///
    /// Unlike [`add_item`](Self::add_item) this never merges into an existing
    /// row.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::DuplicateCartItem` if the cart already holds the product.
    /// Returns `CheckoutError::ProductNotFound` if the product doesn't exist.
    #[instrument(skip(self, cart_key), fields(cart_key = %cart_key))]
    pub async fn insert_cart_item(
        &self,
        cart_key: &CartKey,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<CartItem, CheckoutError> {
        let product = self.product(product_id).await?;

        self.store
            .insert_cart_item(cart_key, &product, quantity)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => {
                    warn!("Cart already contains product");
                    CheckoutError::DuplicateCartItem {
                        cart_key: cart_key.clone(),
                        product_id,
                    }
                }
                RepositoryError::NotFound => CheckoutError::ProductNotFound(product_id),
                other => CheckoutError::Repository(other),
            })
    }

    /// List a cart's rows.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Repository` if the store fails.
    pub async fn cart_items(&self, cart_key: &CartKey) -> Result<Vec<CartItem>, CheckoutError> {
        Ok(self.store.cart_items(cart_key).await?)
    }

    /// Sum of the cart's row totals. Zero for an empty cart.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Repository` if the store fails.
    pub async fn cart_total(&self, cart_key: &CartKey) -> Result<Decimal, CheckoutError> {
        let items = self.store.cart_items(cart_key).await?;
        Ok(cart_total(&items))
    }

    /// Set a row's quantity. Zero removes the row, and `None` is returned.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::InvalidQuantity` if `quantity` is negative.
    /// Returns `CheckoutError::CartItemNotFound` if the row doesn't exist.
    #[instrument(skip(self))]
    pub async fn set_cart_item_quantity(
        &self,
        id: CartItemId,
        quantity: i32,
    ) -> Result<Option<CartItem>, CheckoutError> {
        if quantity < 0 {
            return Err(CheckoutError::InvalidQuantity(quantity));
        }

        let item = self
            .store
            .set_cart_item_quantity(id, quantity)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CheckoutError::CartItemNotFound(id),
                RepositoryError::Conflict(_) => CheckoutError::InvalidQuantity(quantity),
                other => CheckoutError::Repository(other),
            })?;

        if item.is_none() {
            info!("Cart item emptied and removed");
        }

        Ok(item)
    }

    /// Remove a row from its cart.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::CartItemNotFound` if the row doesn't exist.
    #[instrument(skip(self))]
    pub async fn remove_cart_item(&self, id: CartItemId) -> Result<(), CheckoutError> {
        if self.store.remove_cart_item(id).await? {
            Ok(())
        } else {
            Err(CheckoutError::CartItemNotFound(id))
        }
    }

    /// Empty a cart. Returns how many rows were removed.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Repository` if the store fails.
    #[instrument(skip(self, cart_key), fields(cart_key = %cart_key))]
    pub async fn clear_cart(&self, cart_key: &CartKey) -> Result<u64, CheckoutError> {
        let removed = self.store.clear_cart(cart_key).await?;
        debug!(removed, "Cleared cart");
        Ok(removed)
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Create an order for `user_id` with one line per cart row.
    ///
    /// The rows themselves are left in place. An empty slice creates an order
    /// without lines, whose total is `None`.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::UserNotFound` if the user doesn't exist.
    /// Returns `CheckoutError::ProductNotFound` if a row references a missing product.
    #[instrument(skip(self, items), fields(lines = items.len()))]
    pub async fn checkout(
        &self,
        user_id: UserId,
        items: &[CartItem],
    ) -> Result<Order, CheckoutError> {
        self.user(user_id).await?;
        for item in items {
            self.product(item.product_id).await?;
        }

        let product_ids: Vec<ProductId> = items.iter().map(|item| item.product_id).collect();
        let details = match self.store.checkout(user_id, items).await {
            Ok(details) => details,
            Err(RepositoryError::NotFound) => {
                return Err(self.missing_reference(user_id, &product_ids).await);
            }
            Err(e) => return Err(e.into()),
        };

        info!(order_id = %details.order.id, "Order created");

        Ok(details.order)
    }

    /// Create an order from everything in a cart, then empty the cart.
    ///
    /// Both happen together or not at all.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::UserNotFound` if the user doesn't exist.
    /// Returns `CheckoutError::EmptyCart` if the cart has no rows.
    #[instrument(skip(self, cart_key), fields(cart_key = %cart_key))]
    pub async fn checkout_cart(
        &self,
        user_id: UserId,
        cart_key: &CartKey,
    ) -> Result<OrderDetails, CheckoutError> {
        self.user(user_id).await?;

        let outcome = match self.store.checkout_cart(user_id, cart_key).await {
            Ok(outcome) => outcome,
            Err(RepositoryError::NotFound) => {
                let product_ids: Vec<ProductId> = self
                    .store
                    .cart_items(cart_key)
                    .await?
                    .iter()
                    .map(|item| item.product_id)
                    .collect();
                return Err(self.missing_reference(user_id, &product_ids).await);
            }
            Err(e) => return Err(e.into()),
        };
        let Some(details) = outcome else {
            warn!("Checkout attempted on empty cart");
            return Err(CheckoutError::EmptyCart(cart_key.clone()));
        };

        info!(
            order_id = %details.order.id,
            lines = details.items.len(),
            "Cart checked out"
        );

        Ok(details)
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Get an order.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::OrderNotFound` if it doesn't exist.
    pub async fn order(&self, id: OrderId) -> Result<Order, CheckoutError> {
        self.store
            .order(id)
            .await?
            .ok_or(CheckoutError::OrderNotFound(id))
    }

    /// Get an order together with its lines.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::OrderNotFound` if it doesn't exist.
    pub async fn order_details(&self, id: OrderId) -> Result<OrderDetails, CheckoutError> {
        let order = self.order(id).await?;
        let items = self.store.order_items(id).await?;
        Ok(OrderDetails { order, items })
    }

    /// A user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::UserNotFound` if the user doesn't exist.
    pub async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, CheckoutError> {
        self.user(user_id).await?;
        Ok(self.store.orders_for_user(user_id).await?)
    }

    /// An order's lines.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::OrderNotFound` if the order doesn't exist.
    pub async fn order_items(&self, id: OrderId) -> Result<Vec<OrderItem>, CheckoutError> {
        self.order(id).await?;
        Ok(self.store.order_items(id).await?)
    }

    /// Sum of price × quantity over an order's lines.
    ///
    /// `None` for an order without lines.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::OrderNotFound` if the order doesn't exist.
    pub async fn order_total(&self, id: OrderId) -> Result<Option<Decimal>, CheckoutError> {
        self.order(id).await?;
        Ok(self.store.order_total(id).await?)
    }

    /// Distinct products referenced by an order.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::OrderNotFound` if the order doesn't exist.
    pub async fn order_products(&self, id: OrderId) -> Result<Vec<Product>, CheckoutError> {
        self.order(id).await?;
        Ok(self.store.order_products(id).await?)
    }

    /// Move an order to another status.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::OrderNotFound` if the order doesn't exist.
    #[instrument(skip(self))]
    pub async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, CheckoutError> {
        let order = self
            .store
            .update_order_status(id, status)
            .await
            .map_err(|e| order_error(id, e))?;

        info!(status = status.as_str(), "Order status updated");

        Ok(order)
    }

    /// Change an order's payment option.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::OrderNotFound` if the order doesn't exist.
    #[instrument(skip(self))]
    pub async fn update_payment_option(
        &self,
        id: OrderId,
        payment_option: PaymentOption,
    ) -> Result<Order, CheckoutError> {
        let order = self
            .store
            .update_payment_option(id, payment_option)
            .await
            .map_err(|e| order_error(id, e))?;

        info!(
            payment_option = payment_option.as_str(),
            "Order payment option updated"
        );

        Ok(order)
    }

    /// Name the reference that vanished after a checkout hit a foreign key.
    ///
    /// The user and products are validated up front, so this only runs when
    /// one was deleted between that lookup and the insert.
    async fn missing_reference(
        &self,
        user_id: UserId,
        product_ids: &[ProductId],
    ) -> CheckoutError {
        match self.store.user(user_id).await {
            Ok(None) => return CheckoutError::UserNotFound(user_id),
            Ok(Some(_)) => {}
            Err(e) => return e.into(),
        }
        for &product_id in product_ids {
            match self.store.product(product_id).await {
                Ok(None) => return CheckoutError::ProductNotFound(product_id),
                Ok(Some(_)) => {}
                Err(e) => return e.into(),
            }
        }

        warn!("Checkout reference vanished but could not be identified");
        CheckoutError::Repository(RepositoryError::NotFound)
    }
}

fn order_error(id: OrderId, err: RepositoryError) -> CheckoutError {
    match err {
        RepositoryError::NotFound => CheckoutError::OrderNotFound(id),
        other => CheckoutError::Repository(other),
    }
}
