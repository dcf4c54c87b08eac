//! Core types for Cartwright.
//!
//! This module provides type-safe wrappers for the cart and checkout domain.

pub mod cart_key;
pub mod id;
pub mod price;
pub mod quantity;
pub mod status;

pub use cart_key::{CartKey, CartKeyError};
pub use id::*;
pub use price::{Price, PriceError};
pub use quantity::{Quantity, QuantityError};
pub use status::*;
