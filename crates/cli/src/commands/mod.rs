//! Subcommand implementations.

use cartwright_checkout::CheckoutService;
use cartwright_checkout::store::PgStore;

pub mod cart;
pub mod migrate;
pub mod order;

/// The service every non-migration command runs against.
pub type Service = CheckoutService<PgStore>;
