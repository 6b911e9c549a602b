//! Shopfront storefront library.
//!
//! The cart engine and the collaborators it needs: a backend gateway for
//! row access, an identity provider for sign-in state, and the durable
//! session that identifies anonymous shoppers.
//!
//! # Example
//!
//! ```rust,ignore
//! let gateway = Arc::new(PgGateway::new(pool));
//! let store = Arc::new(FileSessionStore::new(&config.state_path));
//! let session_id = SessionIdentity::load_or_create(store.as_ref()).await?;
//! let identity = Arc::new(PasswordIdentity::restore(Arc::clone(&gateway), store).await?);
//!
//! let cart = CartEngine::new(gateway, ShopperIdentity::new(session_id, identity));
//! cart.refresh().await?;
//! cart.add_item(product_id, 2).await?;
//! let totals = cart.totals().await;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod gateway;
pub mod identity;
pub mod models;
pub mod owner;
pub mod session;
pub mod telemetry;

pub use cart::{AdoptionSummary, CartEngine, CartError, CartNotice, CartTotals, CartView};
pub use catalog::Catalog;
pub use config::StorefrontConfig;
pub use error::AppError;
pub use gateway::{Gateway, GatewayError, InMemoryGateway, PgGateway};
pub use identity::{AuthError, IdentityProvider, PasswordIdentity};
pub use owner::{FixedOwner, OwnerKeyProvider, ShopperIdentity};
pub use session::{FileSessionStore, MemorySessionStore, SessionIdentity, SessionStore};
