//! Checkout and order commands.
//!
//! # Usage
//!
//! ```bash
//! # Materialize cart 3f2a9c for user 12 and empty the cart
//! cw-cli checkout -u 12 -c 3f2a9c
//!
//! # Same, but leave the cart rows in place
//! cw-cli checkout -u 12 -c 3f2a9c --keep-cart
//!
//! cw-cli order show -o 41 --json
//! cw-cli order set-status -o 41 -s completed
//! ```

use std::error::Error;

use serde_json::json;

use cartwright_checkout::CheckoutError;
use cartwright_checkout::models::{OrderDetails, Product};
use cartwright_core::{CartKey, OrderId, OrderStatus, PaymentOption, UserId};

use super::Service;

/// Turn a cart into an order.
///
/// With `keep_cart` the order is created from a snapshot of the cart and the
/// rows stay; otherwise the order and the clear commit together.
///
/// # Errors
///
/// Returns `CheckoutError::EmptyCart` if the cart has no rows.
/// Returns `CheckoutError::UserNotFound` if the user doesn't exist.
pub async fn checkout(
    service: &Service,
    user_id: UserId,
    cart_key: &CartKey,
    keep_cart: bool,
    json: bool,
) -> Result<(), Box<dyn Error>> {
    let details = if keep_cart {
        let items = service.cart_items(cart_key).await?;
        if items.is_empty() {
            return Err(CheckoutError::EmptyCart(cart_key.clone()).into());
        }
        let order = service.checkout(user_id, &items).await?;
        service.order_details(order.id).await?
    } else {
        service.checkout_cart(user_id, cart_key).await?
    };

    let products = service.order_products(details.order.id).await?;
    print_details(&details, &products, json)
}

/// Print an order with its lines, products and total.
///
/// # Errors
///
/// Returns `CheckoutError::OrderNotFound` if the order doesn't exist.
pub async fn show(service: &Service, id: OrderId, json: bool) -> Result<(), Box<dyn Error>> {
    let details = service.order_details(id).await?;
    let products = service.order_products(id).await?;
    print_details(&details, &products, json)
}

/// Print a user's orders, newest first.
///
/// # Errors
///
/// Returns `CheckoutError::UserNotFound` if the user doesn't exist.
pub async fn list(service: &Service, user_id: UserId) -> Result<(), Box<dyn Error>> {
    let user = service.user(user_id).await?;
    let orders = service.orders_for_user(user_id).await?;

    #[allow(clippy::print_stdout)]
    {
        println!("{} order(s) for {user}", orders.len());
        for order in &orders {
            println!(
                "  {order}  {}  {}  {}",
                order.status,
                order.payment_option,
                order.created_at.format("%Y-%m-%d %H:%M")
            );
        }
    }

    Ok(())
}

/// Move an order to another status.
///
/// # Errors
///
/// Returns `CheckoutError::OrderNotFound` if the order doesn't exist.
pub async fn set_status(
    service: &Service,
    id: OrderId,
    status: OrderStatus,
) -> Result<(), Box<dyn Error>> {
    let order = service.update_order_status(id, status).await?;

    #[allow(clippy::print_stdout)]
    {
        println!("{order}: {}", order.status);
    }

    Ok(())
}

/// Change an order's payment option.
///
/// # Errors
///
/// Returns `CheckoutError::OrderNotFound` if the order doesn't exist.
pub async fn set_payment(
    service: &Service,
    id: OrderId,
    option: PaymentOption,
) -> Result<(), Box<dyn Error>> {
    let order = service.update_payment_option(id, option).await?;

    #[allow(clippy::print_stdout)]
    {
        println!("{order}: {}", order.payment_option);
    }

    Ok(())
}

fn print_details(
    details: &OrderDetails,
    products: &[Product],
    json: bool,
) -> Result<(), Box<dyn Error>> {
    let total = details.total();

    #[allow(clippy::print_stdout)]
    {
        if json {
            let value = json!({
                "order": details.order,
                "items": details.items,
                "products": products,
                "total": total,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
            return Ok(());
        }

        let order = &details.order;
        println!("{order} ({}, {})", order.status, order.payment_option);
        for item in &details.items {
            let label = products
                .iter()
                .find(|product| product.id == item.product_id)
                .map_or_else(|| item.to_string(), |product| item.label(product));
            println!(
                "  {label} x {} @ {} = {}",
                item.quantity,
                item.price,
                item.total()
            );
        }
        let names: Vec<&str> = products.iter().map(|p| p.name.as_str()).collect();
        println!("products: {}", names.join(", "));
        match total {
            Some(total) => println!("total: {total}"),
            None => println!("total: - (no items)"),
        }
    }

    Ok(())
}
