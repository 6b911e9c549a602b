//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! shop-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `SHOPFRONT_DATABASE_URL` - `PostgreSQL` connection string
//!
//! # Migration Files
//!
//! ```text
//! crates/storefront/migrations/
//! ├── 20261017000001_create_catalog.sql
//! ├── 20261017000002_create_users.sql
//! └── 20261017000003_create_cart_items.sql
//! ```

use shopfront_storefront::{StorefrontConfig, db};

/// Run storefront database migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run(config: &StorefrontConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&config.database_url, config.db_max_connections).await?;

    tracing::info!("Running storefront migrations...");
    db::run_migrations(&pool).await?;

    tracing::info!("Storefront migrations complete");
    pool.close().await;
    Ok(())
}
