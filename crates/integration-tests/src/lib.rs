//! Integration tests for Cartwright.
//!
//! # Running Tests
//!
//! ```bash
//! # In-memory suites run with the rest of the workspace
//! cargo test -p cartwright-integration-tests
//!
//! # PostgreSQL suites need a disposable database
//! export CHECKOUT_TEST_DATABASE_URL=postgres://localhost/cartwright_test
//! cargo test -p cartwright-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `memory_checkout` - Service workflows over the in-memory store
//! - `postgres_cart` - Add-item upsert and cleanup against `PostgreSQL`
//! - `postgres_checkout` - Transactional order materialization against `PostgreSQL`
//!
//! `PostgreSQL` tests share one database, so every fixture gets a unique slug,
//! email and cart key instead of truncating tables.

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use secrecy::SecretString;
use uuid::Uuid;

use cartwright_checkout::CheckoutService;
use cartwright_checkout::config::PoolConfig;
use cartwright_checkout::db::{self, CatalogRepository};
use cartwright_checkout::models::{Product, User};
use cartwright_checkout::store::{MemoryStore, PgStore};
use cartwright_core::{CartKey, Price};

/// Environment variable holding the test database URL.
pub const TEST_DATABASE_URL_VAR: &str = "CHECKOUT_TEST_DATABASE_URL";

/// A random suffix for fixture names.
#[must_use]
pub fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

/// A fresh cart key nobody else uses.
#[must_use]
pub fn fresh_cart() -> CartKey {
    CartKey::generate()
}

/// Parse a decimal price literal.
#[must_use]
pub fn price(raw: &str) -> Price {
    Price::parse(raw).unwrap()
}

// =============================================================================
// In-memory fixtures
// =============================================================================

/// Service over an empty [`MemoryStore`] with one user and two products.
pub struct MemoryFixture {
    pub service: CheckoutService<MemoryStore>,
    pub user: User,
    pub mug: Product,
    pub plate: Product,
}

impl MemoryFixture {
    /// Seed a user and two products (9.99 and 4.50).
    pub async fn new() -> Self {
        let store = MemoryStore::new();
        let user = store.insert_user("Ada", "ada@example.com").await.unwrap();
        let mug = store
            .insert_product("Mug", "mug", price("9.99"))
            .await
            .unwrap();
        let plate = store
            .insert_product("Plate", "plate", price("4.50"))
            .await
            .unwrap();

        Self {
            service: CheckoutService::new(store),
            user,
            mug,
            plate,
        }
    }
}

// =============================================================================
// PostgreSQL fixtures
// =============================================================================

/// Connect to the test database and apply migrations.
pub async fn pg_store() -> PgStore {
    let url = std::env::var(TEST_DATABASE_URL_VAR)
        .unwrap_or_else(|_| panic!("{TEST_DATABASE_URL_VAR} must be set"));
    let pool = db::create_pool(&SecretString::from(url), &PoolConfig::default())
        .await
        .expect("Failed to connect to test database");
    db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    PgStore::new(pool)
}

/// Insert a product with a unique slug.
pub async fn seed_product(store: &PgStore, amount: &str) -> Product {
    let slug = unique("product");
    CatalogRepository::new(store.pool())
        .create_product(&slug, &slug, price(amount))
        .await
        .expect("Failed to seed product")
}

/// Insert a user with a unique email.
pub async fn seed_user(store: &PgStore) -> User {
    let email = format!("{}@example.com", unique("user"));
    CatalogRepository::new(store.pool())
        .create_user("Test User", &email)
        .await
        .expect("Failed to seed user")
}
