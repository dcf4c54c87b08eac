//! Cart behavior against a real `PostgreSQL` database.
//!
//! These tests require:
//! - A running `PostgreSQL` database
//! - `CHECKOUT_TEST_DATABASE_URL` pointing at it (migrations are applied automatically)
//!
//! Run with: cargo test -p cartwright-integration-tests -- --ignored

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use cartwright_checkout::db::{CartItemRepository, CatalogRepository, RepositoryError};
use cartwright_checkout::{CheckoutError, CheckoutService};
use cartwright_core::Quantity;
use cartwright_integration_tests::{fresh_cart, pg_store, price, seed_product};

#[tokio::test]
#[ignore = "Requires PostgreSQL (CHECKOUT_TEST_DATABASE_URL)"]
async fn test_upsert_reports_created_then_increments() {
    let store = pg_store().await;
    let product = seed_product(&store, "9.99").await;
    let repo = CartItemRepository::new(store.pool());
    let cart = fresh_cart();

    let first = repo.add_item(&cart, &product).await.unwrap();
    let second = repo.add_item(&cart, &product).await.unwrap();

    assert!(first.created);
    assert!(!second.created);
    assert_eq!(first.item.id, second.item.id);
    assert_eq!(second.item.quantity.get(), 2);
    assert_eq!(second.item.price, price("9.99"));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (CHECKOUT_TEST_DATABASE_URL)"]
async fn test_concurrent_adds_produce_one_row() {
    let store = pg_store().await;
    let product = seed_product(&store, "1.00").await;
    let service = Arc::new(CheckoutService::new(store));
    let cart = fresh_cart();

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let service = Arc::clone(&service);
            let cart = cart.clone();
            let product_id = product.id;
            tokio::spawn(async move { service.add_item(&cart, product_id).await.unwrap() })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    let items = service.cart_items(&cart).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity.get(), 16);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (CHECKOUT_TEST_DATABASE_URL)"]
async fn test_price_snapshot_is_kept() {
    let store = pg_store().await;
    let product = seed_product(&store, "5.00").await;
    let repo = CartItemRepository::new(store.pool());
    let cart = fresh_cart();

    repo.add_item(&cart, &product).await.unwrap();
    let repriced = CatalogRepository::new(store.pool())
        .update_product_price(product.id, price("7.50"))
        .await
        .unwrap();
    let bumped = repo.add_item(&cart, &repriced).await.unwrap();
    let other = repo.add_item(&fresh_cart(), &repriced).await.unwrap();

    assert_eq!(bumped.item.price, price("5.00"));
    assert_eq!(other.item.price, price("7.50"));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (CHECKOUT_TEST_DATABASE_URL)"]
async fn test_duplicate_insert_is_a_conflict() {
    let store = pg_store().await;
    let product = seed_product(&store, "2.00").await;
    let repo = CartItemRepository::new(store.pool());
    let cart = fresh_cart();

    repo.insert(&cart, &product, Quantity::ONE).await.unwrap();
    let err = repo
        .insert(&cart, &product, Quantity::ONE)
        .await
        .unwrap_err();

    assert!(matches!(err, RepositoryError::Conflict(_)));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (CHECKOUT_TEST_DATABASE_URL)"]
async fn test_zero_quantity_deletes_row() {
    let store = pg_store().await;
    let product = seed_product(&store, "3.00").await;
    let repo = CartItemRepository::new(store.pool());
    let cart = fresh_cart();
    let item = repo.add_item(&cart, &product).await.unwrap().item;

    assert!(repo.set_quantity(item.id, 4).await.unwrap().is_some());
    assert!(repo.set_quantity(item.id, 0).await.unwrap().is_none());
    assert!(repo.get(item.id).await.unwrap().is_none());
    assert!(matches!(
        repo.set_quantity(item.id, 1).await.unwrap_err(),
        RepositoryError::NotFound
    ));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (CHECKOUT_TEST_DATABASE_URL)"]
async fn test_negative_quantity_is_rejected() {
    let store = pg_store().await;
    let product = seed_product(&store, "3.00").await;
    let cart = fresh_cart();
    let service = CheckoutService::new(store);
    let item = service.add_item(&cart, product.id).await.unwrap().item;

    let err = CartItemRepository::new(service.store().pool())
        .set_quantity(item.id, -1)
        .await
        .unwrap_err();

    assert!(matches!(err, RepositoryError::Conflict(_)));
    assert!(matches!(
        service.set_cart_item_quantity(item.id, -1).await.unwrap_err(),
        CheckoutError::InvalidQuantity(-1)
    ));
    assert_eq!(service.cart_items(&cart).await.unwrap().len(), 1);
}
