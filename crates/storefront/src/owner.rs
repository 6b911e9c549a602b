//! Owner key resolution.
//!
//! The cart engine never reads ambient auth state. It asks an injected
//! [`OwnerKeyProvider`] who owns the cart at the start of each operation.

use std::sync::Arc;

use shopfront_core::{OwnerKey, SessionId};

use crate::identity::IdentityProvider;

/// Resolves the owner key for the current shopper.
pub trait OwnerKeyProvider: Send + Sync {
    /// The owner that cart operations should be scoped to right now.
    fn owner_key(&self) -> OwnerKey;
}

/// Signed-in user if there is one, otherwise the anonymous session.
pub struct ShopperIdentity<I> {
    session_id: SessionId,
    identity: Arc<I>,
}

impl<I: IdentityProvider> ShopperIdentity<I> {
    /// Combine the persisted session token with an identity provider.
    #[must_use]
    pub const fn new(session_id: SessionId, identity: Arc<I>) -> Self {
        Self {
            session_id,
            identity,
        }
    }

    /// The anonymous session token, regardless of sign-in state.
    #[must_use]
    pub const fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// The identity provider behind this resolver.
    #[must_use]
    pub fn identity(&self) -> &I {
        &self.identity
    }
}

impl<I: IdentityProvider> OwnerKeyProvider for ShopperIdentity<I> {
    fn owner_key(&self) -> OwnerKey {
        self.identity
            .current_user_id()
            .map_or(OwnerKey::Session(self.session_id), OwnerKey::User)
    }
}

/// A fixed owner, for tools and tests that act on one known cart.
#[derive(Debug, Clone, Copy)]
pub struct FixedOwner(pub OwnerKey);

impl OwnerKeyProvider for FixedOwner {
    fn owner_key(&self) -> OwnerKey {
        self.0
    }
}
