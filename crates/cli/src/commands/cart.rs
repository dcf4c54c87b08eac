//! Cart commands.
//!
//! # Usage
//!
//! ```bash
//! cw-cli cart add -c 3f2a9c -p 7
//! cw-cli cart show -c 3f2a9c
//! cw-cli cart set-quantity -i 15 -q 0
//! ```

use cartwright_checkout::CheckoutError;
use cartwright_core::{CartItemId, CartKey, ProductId};

use super::Service;

/// Add one unit of a product to a cart.
///
/// # Errors
///
/// Returns `CheckoutError::ProductNotFound` if the product doesn't exist.
pub async fn add(
    service: &Service,
    cart_key: &CartKey,
    product_id: ProductId,
) -> Result<(), CheckoutError> {
    let outcome = service.add_item(cart_key, product_id).await?;
    let product = service.product(product_id).await?;

    #[allow(clippy::print_stdout)]
    {
        let verb = if outcome.created { "created" } else { "updated" };
        println!(
            "{verb} cart item {}: {} @ {}",
            outcome.item.id,
            outcome.item.label(&product),
            outcome.item.price
        );
    }

    Ok(())
}

/// Print a cart's rows and total.
///
/// # Errors
///
/// Returns `CheckoutError::Repository` if the store fails.
pub async fn show(service: &Service, cart_key: &CartKey) -> Result<(), CheckoutError> {
    let items = service.cart_items(cart_key).await?;
    let total = service.cart_total(cart_key).await?;
    let mut labels = Vec::with_capacity(items.len());
    for item in &items {
        labels.push(item.label(&service.product(item.product_id).await?));
    }

    #[allow(clippy::print_stdout)]
    {
        if items.is_empty() {
            println!("cart {cart_key} is empty");
            return Ok(());
        }
        println!("cart {cart_key}");
        for (item, label) in items.iter().zip(&labels) {
            println!("  #{} {label} @ {} = {}", item.id, item.price, item.total());
        }
        println!("total: {total}");
    }

    Ok(())
}

/// Overwrite a row's quantity. Zero removes the row.
///
/// # Errors
///
/// Returns `CheckoutError::CartItemNotFound` if the row doesn't exist.
/// Returns `CheckoutError::InvalidQuantity` if `quantity` is negative.
pub async fn set_quantity(
    service: &Service,
    id: CartItemId,
    quantity: i32,
) -> Result<(), CheckoutError> {
    let Some(item) = service.set_cart_item_quantity(id, quantity).await? else {
        #[allow(clippy::print_stdout)]
        {
            println!("cart item {id} removed");
        }
        return Ok(());
    };
    let product = service.product(item.product_id).await?;

    #[allow(clippy::print_stdout)]
    {
        println!("cart item {id}: {}", item.label(&product));
    }

    Ok(())
}

/// Remove a row.
///
/// # Errors
///
/// Returns `CheckoutError::CartItemNotFound` if the row doesn't exist.
pub async fn remove(service: &Service, id: CartItemId) -> Result<(), CheckoutError> {
    service.remove_cart_item(id).await?;

    #[allow(clippy::print_stdout)]
    {
        println!("cart item {id} removed");
    }

    Ok(())
}

/// Remove every row of a cart.
///
/// # Errors
///
/// Returns `CheckoutError::Repository` if the store fails.
pub async fn clear(service: &Service, cart_key: &CartKey) -> Result<(), CheckoutError> {
    let removed = service.clear_cart(cart_key).await?;

    #[allow(clippy::print_stdout)]
    {
        println!("removed {removed} item(s) from cart {cart_key}");
    }

    Ok(())
}
