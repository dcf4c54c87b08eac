//! Cart-to-order workflows over the in-memory store.
//!
//! These exercise the public API the way a storefront would: a session cart
//! filled through `add_item`, then checked out for a signed-in user.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use rust_decimal::Decimal;

use cartwright_checkout::CheckoutError;
use cartwright_core::{OrderStatus, PaymentOption, ProductId};
use cartwright_integration_tests::{MemoryFixture, fresh_cart, price};

#[tokio::test]
async fn test_concurrent_adds_collapse_into_one_row() {
    let f = MemoryFixture::new().await;
    let service = Arc::new(f.service);
    let cart = fresh_cart();

    let handles: Vec<_> = (0..25)
        .map(|_| {
            let service = Arc::clone(&service);
            let cart = cart.clone();
            let product = f.mug.id;
            tokio::spawn(async move { service.add_item(&cart, product).await.unwrap() })
        })
        .collect();

    let mut created = 0;
    for handle in handles {
        if handle.await.unwrap().created {
            created += 1;
        }
    }

    let items = service.cart_items(&cart).await.unwrap();
    assert_eq!(created, 1);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity.get(), 25);
}

#[tokio::test]
async fn test_full_session_flow() {
    let f = MemoryFixture::new().await;
    let cart = fresh_cart();

    f.service.add_item(&cart, f.mug.id).await.unwrap();
    f.service.add_item(&cart, f.mug.id).await.unwrap();
    let plate = f.service.add_item(&cart, f.plate.id).await.unwrap().item;
    f.service
        .set_cart_item_quantity(plate.id, 3)
        .await
        .unwrap()
        .unwrap();

    // 2 x 9.99 + 3 x 4.50
    assert_eq!(
        f.service.cart_total(&cart).await.unwrap(),
        Decimal::new(3348, 2)
    );

    let details = f.service.checkout_cart(f.user.id, &cart).await.unwrap();
    assert_eq!(details.total(), Some(Decimal::new(3348, 2)));
    assert!(f.service.cart_items(&cart).await.unwrap().is_empty());

    let order = f
        .service
        .update_payment_option(details.order.id, PaymentOption::GatewayB)
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::AwaitingPayment);
    assert_eq!(order.to_string(), format!("Order #{}", order.id));

    let shown = f.service.order_details(order.id).await.unwrap();
    assert_eq!(shown.items, details.items);
    assert_eq!(
        shown.items[0].to_string(),
        format!("[Order #{}] product {}", order.id, f.mug.id)
    );
}

#[tokio::test]
async fn test_order_lines_survive_price_changes() {
    let f = MemoryFixture::new().await;
    let cart = fresh_cart();
    f.service.add_item(&cart, f.mug.id).await.unwrap();

    let details = f.service.checkout_cart(f.user.id, &cart).await.unwrap();
    f.service
        .store()
        .set_product_price(f.mug.id, price("20.00"))
        .await
        .unwrap();

    assert_eq!(
        f.service.order_total(details.order.id).await.unwrap(),
        Some(Decimal::new(999, 2))
    );
}

#[tokio::test]
async fn test_carts_are_isolated() {
    let f = MemoryFixture::new().await;
    let first = fresh_cart();
    let second = fresh_cart();

    f.service.add_item(&first, f.mug.id).await.unwrap();
    f.service.add_item(&second, f.plate.id).await.unwrap();
    f.service.checkout_cart(f.user.id, &first).await.unwrap();

    let remaining = f.service.cart_items(&second).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].product_id, f.plate.id);
}

#[tokio::test]
async fn test_failed_checkout_leaves_everything_in_place() {
    let f = MemoryFixture::new().await;
    let cart = fresh_cart();
    let mut item = f.service.add_item(&cart, f.mug.id).await.unwrap().item;
    item.product_id = ProductId::new(i32::MAX);

    let err = f
        .service
        .checkout(f.user.id, &[item])
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::ProductNotFound(_)));
    assert_eq!(f.service.store().order_count().await, 0);
    assert_eq!(f.service.cart_items(&cart).await.unwrap().len(), 1);
}
