//! Domain models for the checkout layer.
//!
//! These are validated domain types, separate from the database row types in
//! [`crate::db`].

pub mod cart;
pub mod catalog;
pub mod order;

pub use cart::{AddItemOutcome, CartItem};
pub use catalog::{Product, User};
pub use order::{Order, OrderDetails, OrderItem};
