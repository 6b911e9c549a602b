//! CLI command implementations.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod migrate;
pub mod seed;

use std::sync::Arc;

use shopfront_core::SessionId;
use shopfront_storefront::{
    AppError, CartEngine, Catalog, FileSessionStore, GatewayError, PasswordIdentity, PgGateway,
    SessionIdentity, ShopperIdentity, StorefrontConfig, db,
};

/// Password identity over the database and the local state file.
pub type Identity = PasswordIdentity<PgGateway, FileSessionStore>;

/// Cart scoped to whoever is signed in, or the anonymous session.
pub type Cart = CartEngine<PgGateway, ShopperIdentity<Identity>>;

/// Everything a shopper-facing command needs.
pub struct Context {
    pub config: StorefrontConfig,
    pub gateway: Arc<PgGateway>,
    pub session_id: SessionId,
    pub identity: Arc<Identity>,
}

impl Context {
    /// Connect to the database and restore local session state.
    ///
    /// # Errors
    ///
    /// Returns an error if the database is unreachable or the state file
    /// cannot be read.
    pub async fn connect(config: StorefrontConfig) -> Result<Self, AppError> {
        let pool = db::create_pool(&config.database_url, config.db_max_connections)
            .await
            .map_err(GatewayError::from)?;
        let gateway = Arc::new(PgGateway::new(pool));

        let store = Arc::new(FileSessionStore::new(&config.state_path));
        let session_id = SessionIdentity::load_or_create(store.as_ref()).await?;
        let identity = Arc::new(PasswordIdentity::restore(Arc::clone(&gateway), store).await?);

        Ok(Self {
            config,
            gateway,
            session_id,
            identity,
        })
    }

    /// Cart engine for the current shopper.
    #[must_use]
    pub fn cart(&self) -> Cart {
        CartEngine::new(
            Arc::clone(&self.gateway),
            ShopperIdentity::new(self.session_id, Arc::clone(&self.identity)),
        )
    }

    /// Catalog reader with the configured cache TTL.
    #[must_use]
    pub fn catalog(&self) -> Catalog<PgGateway> {
        Catalog::with_ttl(Arc::clone(&self.gateway), self.config.catalog_cache_ttl)
    }
}
