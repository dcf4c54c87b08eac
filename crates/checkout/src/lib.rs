//! Cartwright checkout library.
//!
//! Turns a shopper's cart into an order:
//! - add-item aggregation keyed on `(cart_key, product)`, one row per pair
//! - transactional order materialization from cart rows
//! - derived totals and product sets for carts and orders
//!
//! [`service::CheckoutService`] is the entry point. It runs over any
//! [`store::CheckoutStore`]; [`store::PgStore`] is the `PostgreSQL` backend.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod models;
pub mod service;
pub mod store;

pub use service::{CheckoutError, CheckoutService};
