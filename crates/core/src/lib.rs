//! Cartwright Core - Shared types library.
//!
//! This crate provides the value types used across the Cartwright workspace:
//! - `checkout` - Cart aggregation and order materialization over `PostgreSQL`
//! - `cli` - Command-line tools for migrations and cart/order operations
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access. Enabling
//! the `postgres` feature adds sqlx encode/decode impls so the same types can
//! be bound and fetched directly.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, cart keys, prices, quantities, and order enums

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
