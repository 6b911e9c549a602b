//! Email + password identity backed by the gateway's `users` tables.

use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tokio::sync::watch;
use tracing::instrument;

use shopfront_core::{Email, UserId};

use super::{AuthError, IdentityProvider, MIN_PASSWORD_LENGTH};
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::gateway::{Filter, Gateway, GatewayError, Table};
use crate::models::{NewUser, NewUserPassword, User, UserPassword};
use crate::session::{SessionStore, keys};

/// Password authentication over the hosted `users` / `user_passwords`
/// tables.
///
/// The signed-in user ID is persisted in the session store so it survives
/// restarts, and broadcast on a `watch` channel.
pub struct PasswordIdentity<G, S> {
    gateway: Arc<G>,
    store: Arc<S>,
    current: watch::Sender<Option<UserId>>,
}

impl<G: Gateway, S: SessionStore> PasswordIdentity<G, S> {
    /// Restore the signed-in user from the session store.
    ///
    /// A persisted user that no longer exists in the backend is dropped and
    /// the shopper starts anonymous.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Session` if the store cannot be read, or
    /// `AuthError::Gateway` if the user lookup fails for another reason.
    pub async fn restore(gateway: Arc<G>, store: Arc<S>) -> Result<Self, AuthError> {
        let mut current = store.get::<UserId>(keys::CURRENT_USER).await?;

        if let Some(user_id) = current {
            match gateway.select_one::<User>(&Filter::by_id(user_id)).await {
                Ok(user) => set_sentry_user(&user.id, Some(user.email.as_str())),
                Err(GatewayError::NotFound) => {
                    tracing::warn!(%user_id, "Persisted user no longer exists, signing out");
                    store.remove(keys::CURRENT_USER).await?;
                    current = None;
                }
                Err(e) => return Err(e.into()),
            }
        }

        let (current, _) = watch::channel(current);
        Ok(Self {
            gateway,
            store,
            current,
        })
    }

    async fn set_current(&self, user: &User) -> Result<(), AuthError> {
        self.store.insert(keys::CURRENT_USER, &user.id).await?;
        self.current.send_replace(Some(user.id));
        set_sentry_user(&user.id, Some(user.email.as_str()));
        Ok(())
    }
}

impl<G: Gateway, S: SessionStore> IdentityProvider for PasswordIdentity<G, S> {
    fn current_user_id(&self) -> Option<UserId> {
        *self.current.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<Option<UserId>> {
        self.current.subscribe()
    }

    #[instrument(skip(self, password))]
    async fn sign_up(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        let user: User = self
            .gateway
            .insert(&NewUser { email })
            .await
            .map_err(|e| match e {
                GatewayError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Gateway(other),
            })?;

        let credential = NewUserPassword {
            user_id: user.id,
            password_hash,
        };
        if let Err(e) = self.gateway.insert::<UserPassword>(&credential).await {
            // No transactions across gateway calls: undo the half-created account.
            if let Err(cleanup) = self
                .gateway
                .delete(Table::Users, &Filter::by_id(user.id))
                .await
            {
                tracing::error!(user_id = %user.id, error = %cleanup, "Failed to remove orphaned user");
            }
            return Err(e.into());
        }

        tracing::info!(user_id = %user.id, "User signed up");
        self.set_current(&user).await?;
        Ok(user)
    }

    #[instrument(skip(self, password))]
    async fn sign_in(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email)?;

        let user = self
            .gateway
            .select_one::<User>(&Filter::new().eq("email", &email))
            .await
            .map_err(not_found_as_invalid)?;
        let credential = self
            .gateway
            .select_one::<UserPassword>(&Filter::new().eq("user_id", user.id))
            .await
            .map_err(not_found_as_invalid)?;

        verify_password(password, &credential.password_hash)?;

        tracing::info!(user_id = %user.id, "User signed in");
        self.set_current(&user).await?;
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn sign_out(&self) -> Result<(), AuthError> {
        if self.current_user_id().is_none() {
            return Ok(());
        }
        self.store.remove(keys::CURRENT_USER).await?;
        self.current.send_replace(None);
        clear_sentry_user();
        tracing::info!("User signed out");
        Ok(())
    }
}

fn not_found_as_invalid(e: GatewayError) -> AuthError {
    match e {
        GatewayError::NotFound => AuthError::InvalidCredentials,
        other => AuthError::Gateway(other),
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::gateway::InMemoryGateway;
    use crate::session::MemorySessionStore;

    async fn identity() -> PasswordIdentity<InMemoryGateway, MemorySessionStore> {
        PasswordIdentity::restore(
            Arc::new(InMemoryGateway::new()),
            Arc::new(MemorySessionStore::new()),
        )
        .await
        .unwrap()
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_validate_password_length() {
        assert!(matches!(
            validate_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password("long enough").is_ok());
    }

    #[tokio::test]
    async fn test_sign_up_signs_in_and_notifies() {
        let identity = identity().await;
        let mut changes = identity.subscribe();
        assert_eq!(identity.current_user_id(), None);

        let user = identity
            .sign_up("Shopper@Example.com", "hunter2hunter2")
            .await
            .unwrap();
        assert_eq!(user.email.as_str(), "shopper@example.com");
        assert!(changes.has_changed().unwrap());
        assert_eq!(*changes.borrow_and_update(), Some(user.id));
        assert_eq!(identity.current_user_id(), Some(user.id));
    }

    #[tokio::test]
    async fn test_duplicate_sign_up_rejected() {
        let identity = identity().await;
        identity
            .sign_up("a@example.com", "password-one")
            .await
            .unwrap();
        let err = identity
            .sign_up("A@example.com", "password-two")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UserAlreadyExists));
    }

    #[tokio::test]
    async fn test_sign_in_and_out() {
        let identity = identity().await;
        let user = identity
            .sign_up("a@example.com", "password-one")
            .await
            .unwrap();
        identity.sign_out().await.unwrap();
        assert_eq!(identity.current_user_id(), None);

        let err = identity
            .sign_in("a@example.com", "password-two")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));

        let err = identity
            .sign_in("nobody@example.com", "password-one")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));

        let signed_in = identity
            .sign_in("a@example.com", "password-one")
            .await
            .unwrap();
        assert_eq!(signed_in.id, user.id);
        assert_eq!(identity.current_user_id(), Some(user.id));
    }

    #[tokio::test]
    async fn test_restore_keeps_signed_in_user() {
        let gateway = Arc::new(InMemoryGateway::new());
        let store = Arc::new(MemorySessionStore::new());
        let first = PasswordIdentity::restore(Arc::clone(&gateway), Arc::clone(&store))
            .await
            .unwrap();
        let user = first.sign_up("a@example.com", "password-one").await.unwrap();

        let second = PasswordIdentity::restore(gateway, store).await.unwrap();
        assert_eq!(second.current_user_id(), Some(user.id));
    }
}
