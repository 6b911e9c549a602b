//! Identity provider.
//!
//! The cart only needs to know who the shopper is: a signed-in user or
//! nobody. [`IdentityProvider`] exposes that plus sign-up, sign-in and
//! sign-out, and a `watch` channel that fires on every change.

mod error;
mod password;

pub use error::AuthError;
pub use password::PasswordIdentity;

use std::future::Future;

use tokio::sync::watch;

use shopfront_core::UserId;

use crate::models::User;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Source of the current shopper's authenticated identity.
pub trait IdentityProvider: Send + Sync {
    /// The signed-in user, or `None` for an anonymous shopper.
    fn current_user_id(&self) -> Option<UserId>;

    /// Receiver notified whenever the signed-in user changes.
    fn subscribe(&self) -> watch::Receiver<Option<UserId>>;

    /// Create an account and sign it in.
    fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<User, AuthError>> + Send;

    /// Sign in with email and password.
    fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<User, AuthError>> + Send;

    /// Sign out. Signing out while anonymous is a no-op.
    fn sign_out(&self) -> impl Future<Output = Result<(), AuthError>> + Send;
}
