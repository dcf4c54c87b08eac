//! In-process store for tests.
//!
//! Mirrors the `PostgreSQL` schema's constraints: cart rows are unique per
//! `(cart_key, product_id)`, writes that reference a missing user, product
//! or order fail with `NotFound`, and a checkout either writes the order and
//! every line or nothing.

use std::collections::BTreeMap;

use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use cartwright_core::{
    CartItemId, CartKey, OrderId, OrderItemId, OrderStatus, PaymentOption, Price, ProductId,
    Quantity, UserId,
};

use super::CheckoutStore;
use crate::db::RepositoryError;
use crate::models::cart::should_purge;
use crate::models::order::{distinct_products, order_total};
use crate::models::{AddItemOutcome, CartItem, Order, OrderDetails, OrderItem, Product, User};

#[derive(Debug, Default)]
struct Sequences {
    product: i32,
    user: i32,
    cart_item: i32,
    order: i32,
    order_item: i32,
}

fn next(seq: &mut i32) -> i32 {
    *seq += 1;
    *seq
}

#[derive(Debug, Default)]
struct State {
    seq: Sequences,
    products: BTreeMap<ProductId, Product>,
    users: BTreeMap<UserId, User>,
    cart_items: BTreeMap<CartItemId, CartItem>,
    orders: BTreeMap<OrderId, Order>,
    order_items: BTreeMap<OrderItemId, OrderItem>,
}

impl State {
    fn find_cart_item(&self, cart_key: &CartKey, product_id: ProductId) -> Option<CartItemId> {
        self.cart_items
            .values()
            .find(|item| &item.cart_key == cart_key && item.product_id == product_id)
            .map(|item| item.id)
    }

    fn require_product(&self, id: ProductId) -> Result<(), RepositoryError> {
        if self.products.contains_key(&id) {
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn lines_of(&self, order_id: OrderId) -> Vec<OrderItem> {
        self.order_items
            .values()
            .filter(|line| line.order_id == order_id)
            .cloned()
            .collect()
    }

    fn cart_of(&self, cart_key: &CartKey) -> Vec<CartItem> {
        self.cart_items
            .values()
            .filter(|item| &item.cart_key == cart_key)
            .cloned()
            .collect()
    }

    /// Validate every reference first, then write. Nothing is written if any
    /// check fails.
    fn materialize(
        &mut self,
        user_id: UserId,
        items: &[CartItem],
    ) -> Result<OrderDetails, RepositoryError> {
        if !self.users.contains_key(&user_id) {
            return Err(RepositoryError::NotFound);
        }
        for item in items {
            self.require_product(item.product_id)?;
        }

        let now = Utc::now();
        let order = Order {
            id: OrderId::new(next(&mut self.seq.order)),
            user_id,
            status: OrderStatus::default(),
            payment_option: PaymentOption::default(),
            created_at: now,
            modified_at: now,
        };
        self.orders.insert(order.id, order.clone());

        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            let line = OrderItem {
                id: OrderItemId::new(next(&mut self.seq.order_item)),
                order_id: order.id,
                product_id: item.product_id,
                quantity: item.quantity,
                price: item.price,
            };
            self.order_items.insert(line.id, line.clone());
            lines.push(line);
        }

        Ok(OrderDetails {
            order,
            items: lines,
        })
    }

    fn touch_order(
        &mut self,
        id: OrderId,
        apply: impl FnOnce(&mut Order),
    ) -> Result<Order, RepositoryError> {
        let order = self.orders.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        apply(order);
        order.modified_at = Utc::now();
        Ok(order.clone())
    }
}

/// [`CheckoutStore`] held entirely in memory behind one async mutex.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a catalog product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn insert_product(
        &self,
        name: &str,
        slug: &str,
        price: Price,
    ) -> Result<Product, RepositoryError> {
        let mut state = self.state.lock().await;
        if state.products.values().any(|p| p.slug == slug) {
            return Err(RepositoryError::Conflict(
                "product slug already exists".to_owned(),
            ));
        }

        let product = Product {
            id: ProductId::new(next(&mut state.seq.product)),
            name: name.to_owned(),
            slug: slug.to_owned(),
            price,
        };
        state.products.insert(product.id, product.clone());
        Ok(product)
    }

    /// Change a product's current price.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn set_product_price(
        &self,
        id: ProductId,
        price: Price,
    ) -> Result<Product, RepositoryError> {
        let mut state = self.state.lock().await;
        let product = state
            .products
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        product.price = price;
        Ok(product.clone())
    }

    /// Seed a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is taken.
    pub async fn insert_user(&self, name: &str, email: &str) -> Result<User, RepositoryError> {
        let mut state = self.state.lock().await;
        if state.users.values().any(|u| u.email == email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let user = User {
            id: UserId::new(next(&mut state.seq.user)),
            name: name.to_owned(),
            email: email.to_owned(),
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    /// Number of orders ever written.
    pub async fn order_count(&self) -> usize {
        self.state.lock().await.orders.len()
    }
}

impl CheckoutStore for MemoryStore {
    async fn product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.state.lock().await.products.get(&id).cloned())
    }

    async fn user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.state.lock().await.users.get(&id).cloned())
    }

    async fn add_item(
        &self,
        cart_key: &CartKey,
        product: &Product,
    ) -> Result<AddItemOutcome, RepositoryError> {
        let mut state = self.state.lock().await;
        state.require_product(product.id)?;

        if let Some(id) = state.find_cart_item(cart_key, product.id) {
            let item = state
                .cart_items
                .get_mut(&id)
                .ok_or(RepositoryError::NotFound)?;
            item.quantity = item
                .quantity
                .increment()
                .map_err(|e| RepositoryError::Conflict(e.to_string()))?;
            return Ok(AddItemOutcome {
                item: item.clone(),
                created: false,
            });
        }

        let item = CartItem {
            id: CartItemId::new(next(&mut state.seq.cart_item)),
            cart_key: cart_key.clone(),
            product_id: product.id,
            quantity: Quantity::ONE,
            price: product.price,
        };
        state.cart_items.insert(item.id, item.clone());
        Ok(AddItemOutcome {
            item,
            created: true,
        })
    }

    async fn insert_cart_item(
        &self,
        cart_key: &CartKey,
        product: &Product,
        quantity: Quantity,
    ) -> Result<CartItem, RepositoryError> {
        let mut state = self.state.lock().await;
        state.require_product(product.id)?;
        if state.find_cart_item(cart_key, product.id).is_some() {
            return Err(RepositoryError::Conflict(
                "cart already contains this product".to_owned(),
            ));
        }

        let item = CartItem {
            id: CartItemId::new(next(&mut state.seq.cart_item)),
            cart_key: cart_key.clone(),
            product_id: product.id,
            quantity,
            price: product.price,
        };
        state.cart_items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn cart_item(&self, id: CartItemId) -> Result<Option<CartItem>, RepositoryError> {
        Ok(self.state.lock().await.cart_items.get(&id).cloned())
    }

    async fn cart_items(&self, cart_key: &CartKey) -> Result<Vec<CartItem>, RepositoryError> {
        Ok(self.state.lock().await.cart_of(cart_key))
    }

    async fn set_cart_item_quantity(
        &self,
        id: CartItemId,
        quantity: i32,
    ) -> Result<Option<CartItem>, RepositoryError> {
        let mut state = self.state.lock().await;
        if !state.cart_items.contains_key(&id) {
            return Err(RepositoryError::NotFound);
        }
        if quantity < 0 {
            return Err(RepositoryError::Conflict(format!(
                "quantity {quantity} violates check constraint"
            )));
        }

        if should_purge(quantity) {
            state.cart_items.remove(&id);
            return Ok(None);
        }

        let quantity =
            Quantity::new(quantity).map_err(|e| RepositoryError::Conflict(e.to_string()))?;
        let item = state
            .cart_items
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        item.quantity = quantity;
        Ok(Some(item.clone()))
    }

    async fn remove_cart_item(&self, id: CartItemId) -> Result<bool, RepositoryError> {
        Ok(self.state.lock().await.cart_items.remove(&id).is_some())
    }

    async fn clear_cart(&self, cart_key: &CartKey) -> Result<u64, RepositoryError> {
        let mut state = self.state.lock().await;
        let before = state.cart_items.len();
        state.cart_items.retain(|_, item| &item.cart_key != cart_key);
        Ok((before - state.cart_items.len()) as u64)
    }

    async fn checkout(
        &self,
        user_id: UserId,
        items: &[CartItem],
    ) -> Result<OrderDetails, RepositoryError> {
        self.state.lock().await.materialize(user_id, items)
    }

    async fn checkout_cart(
        &self,
        user_id: UserId,
        cart_key: &CartKey,
    ) -> Result<Option<OrderDetails>, RepositoryError> {
        let mut state = self.state.lock().await;
        let items = state.cart_of(cart_key);
        if items.is_empty() {
            return Ok(None);
        }

        let details = state.materialize(user_id, &items)?;
        state.cart_items.retain(|_, item| &item.cart_key != cart_key);
        Ok(Some(details))
    }

    async fn order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(self.state.lock().await.orders.get(&id).cloned())
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let state = self.state.lock().await;
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|order| order.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(orders)
    }

    async fn order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        Ok(self.state.lock().await.lines_of(order_id))
    }

    async fn order_total(&self, order_id: OrderId) -> Result<Option<Decimal>, RepositoryError> {
        Ok(order_total(&self.state.lock().await.lines_of(order_id)))
    }

    async fn order_products(&self, order_id: OrderId) -> Result<Vec<Product>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(distinct_products(&state.lines_of(order_id))
            .into_iter()
            .filter_map(|id| state.products.get(&id).cloned())
            .collect())
    }

    async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        self.state
            .lock()
            .await
            .touch_order(id, |order| order.status = status)
    }

    async fn update_payment_option(
        &self,
        id: OrderId,
        payment_option: PaymentOption,
    ) -> Result<Order, RepositoryError> {
        self.state
            .lock()
            .await
            .touch_order(id, |order| order.payment_option = payment_option)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn seeded() -> (MemoryStore, User, Product) {
        let store = MemoryStore::new();
        let user = store.insert_user("Ada", "ada@example.com").await.unwrap();
        let product = store
            .insert_product("Mug", "mug", Price::from_cents(999).unwrap())
            .await
            .unwrap();
        (store, user, product)
    }

    fn key(raw: &str) -> CartKey {
        CartKey::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn test_repeated_adds_accumulate_on_one_row() {
        let (store, _, product) = seeded().await;
        let cart = key("cart-a");

        for _ in 0..5 {
            store.add_item(&cart, &product).await.unwrap();
        }

        let items = store.cart_items(&cart).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity.get(), 5);
    }

    #[tokio::test]
    async fn test_add_reports_created_only_for_first_add() {
        let (store, _, product) = seeded().await;
        let cart = key("cart-a");

        let first = store.add_item(&cart, &product).await.unwrap();
        let second = store.add_item(&cart, &product).await.unwrap();

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.item.id, second.item.id);
        assert_eq!(second.item.quantity.get(), 2);
    }

    #[tokio::test]
    async fn test_same_product_in_two_carts_gets_two_rows() {
        let (store, _, product) = seeded().await;

        let a = store.add_item(&key("cart-a"), &product).await.unwrap();
        let b = store.add_item(&key("cart-b"), &product).await.unwrap();

        assert!(a.created && b.created);
        assert_ne!(a.item.id, b.item.id);
    }

    #[tokio::test]
    async fn test_add_unknown_product_is_not_found() {
        let (store, _, mut product) = seeded().await;
        product.id = ProductId::new(404);

        let err = store.add_item(&key("cart-a"), &product).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
        assert!(store.cart_items(&key("cart-a")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_insert_is_conflict() {
        let (store, _, product) = seeded().await;
        let cart = key("cart-a");

        store
            .insert_cart_item(&cart, &product, Quantity::ONE)
            .await
            .unwrap();
        let err = store
            .insert_cart_item(&cart, &product, Quantity::ONE)
            .await
            .unwrap_err();

        assert!(matches!(err, RepositoryError::Conflict(_)));
        assert_eq!(store.cart_items(&cart).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_zero_quantity_removes_row() {
        let (store, _, product) = seeded().await;
        let cart = key("cart-a");
        let added = store.add_item(&cart, &product).await.unwrap();

        let result = store
            .set_cart_item_quantity(added.item.id, 0)
            .await
            .unwrap();

        assert!(result.is_none());
        assert!(store.cart_item(added.item.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_negative_quantity_is_rejected_and_row_kept() {
        let (store, _, product) = seeded().await;
        let added = store.add_item(&key("cart-a"), &product).await.unwrap();

        let err = store
            .set_cart_item_quantity(added.item.id, -1)
            .await
            .unwrap_err();

        assert!(matches!(err, RepositoryError::Conflict(_)));
        assert!(store.cart_item(added.item.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_checkout_copies_lines_and_keeps_cart() {
        let (store, user, product) = seeded().await;
        let cart = key("cart-a");
        for _ in 0..3 {
            store.add_item(&cart, &product).await.unwrap();
        }
        let items = store.cart_items(&cart).await.unwrap();

        let details = store.checkout(user.id, &items).await.unwrap();

        assert_eq!(details.order.user_id, user.id);
        assert_eq!(details.items.len(), 1);
        assert_eq!(details.items[0].product_id, product.id);
        assert_eq!(details.items[0].quantity.get(), 3);
        assert_eq!(details.items[0].price, product.price);
        assert_eq!(
            store.order_total(details.order.id).await.unwrap(),
            Some(Decimal::new(2997, 2))
        );
        assert_eq!(store.cart_items(&cart).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_checkout_with_no_items_has_no_total() {
        let (store, user, _) = seeded().await;

        let details = store.checkout(user.id, &[]).await.unwrap();

        assert!(details.items.is_empty());
        assert_eq!(store.order_total(details.order.id).await.unwrap(), None);
        assert!(store.order_products(details.order.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_checkout_with_unknown_product_writes_nothing() {
        let (store, user, product) = seeded().await;
        let cart = key("cart-a");
        let good = store.add_item(&cart, &product).await.unwrap().item;
        let mut bad = good.clone();
        bad.product_id = ProductId::new(404);

        let err = store.checkout(user.id, &[good, bad]).await.unwrap_err();

        assert!(matches!(err, RepositoryError::NotFound));
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn test_checkout_cart_clears_only_on_success() {
        let (store, user, product) = seeded().await;
        let cart = key("cart-a");
        store.add_item(&cart, &product).await.unwrap();

        let err = store
            .checkout_cart(UserId::new(404), &cart)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
        assert_eq!(store.cart_items(&cart).await.unwrap().len(), 1);

        let details = store.checkout_cart(user.id, &cart).await.unwrap().unwrap();
        assert_eq!(details.items.len(), 1);
        assert!(store.cart_items(&cart).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_checkout_cart_of_empty_cart_is_none() {
        let (store, user, _) = seeded().await;

        let result = store.checkout_cart(user.id, &key("empty")).await.unwrap();

        assert!(result.is_none());
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn test_order_products_are_distinct() {
        let (store, user, p1) = seeded().await;
        let p2 = store
            .insert_product("Plate", "plate", Price::from_cents(450).unwrap())
            .await
            .unwrap();
        let a = store.add_item(&key("a"), &p1).await.unwrap().item;
        let b = store.add_item(&key("b"), &p2).await.unwrap().item;
        let c = store.add_item(&key("c"), &p1).await.unwrap().item;

        let details = store.checkout(user.id, &[a, b, c]).await.unwrap();
        let products = store.order_products(details.order.id).await.unwrap();

        assert_eq!(
            products.iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![p1.id, p2.id]
        );
    }

    #[tokio::test]
    async fn test_status_update_bumps_modified_at() {
        let (store, user, _) = seeded().await;
        let details = store.checkout(user.id, &[]).await.unwrap();

        let updated = store
            .update_order_status(details.order.id, OrderStatus::Completed)
            .await
            .unwrap();

        assert_eq!(updated.status, OrderStatus::Completed);
        assert_eq!(updated.created_at, details.order.created_at);
        assert!(updated.modified_at >= details.order.modified_at);
    }

    #[tokio::test]
    async fn test_update_missing_order_is_not_found() {
        let store = MemoryStore::new();

        let err = store
            .update_payment_option(OrderId::new(1), PaymentOption::GatewayB)
            .await
            .unwrap_err();

        assert!(matches!(err, RepositoryError::NotFound));
    }
}
