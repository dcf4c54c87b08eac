//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! cw-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `CHECKOUT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! # Migration Files
//!
//! `crates/checkout/migrations/`, embedded into the binary at build time:
//! ```text
//! migrations/
//! ├── 20260301000001_create_boundary_tables.sql
//! ├── 20260301000002_create_cart_item.sql
//! └── 20260301000003_create_orders.sql
//! ```

use sqlx::PgPool;

use cartwright_checkout::db;

/// Apply every pending checkout migration.
///
/// # Errors
///
/// Returns `MigrateError` if a migration fails or the applied history
/// diverges from the embedded files.
pub async fn run(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    tracing::info!("Running checkout migrations...");
    db::run_migrations(pool).await?;
    tracing::info!("Checkout migrations complete!");
    Ok(())
}
