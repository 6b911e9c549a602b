//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type for surfaces built on the storefront
//! (the CLI today). Server-side failures are captured to Sentry before the
//! caller shows [`AppError::user_message`] to the shopper.

use thiserror::Error;

use crate::cart::CartError;
use crate::config::ConfigError;
use crate::gateway::GatewayError;
use crate::identity::AuthError;
use crate::session::SessionError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Backend operation failed outside the cart.
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Local session state could not be read or written.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Configuration is missing or invalid.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl AppError {
    /// Whether this failure is ours rather than the caller's.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        match self {
            Self::Cart(err) => err.is_server_error(),
            Self::Auth(err) => matches!(
                err,
                AuthError::Gateway(_) | AuthError::Session(_) | AuthError::PasswordHash
            ),
            Self::Gateway(err) => !matches!(err, GatewayError::NotFound),
            Self::Session(_) | Self::Config(_) => true,
            Self::NotFound(_) => false,
        }
    }

    /// Message safe to show to a shopper. Internal details are not exposed.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Cart(err) => err.user_message(),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => "Invalid credentials".to_string(),
                AuthError::UserAlreadyExists => {
                    "An account with this email already exists".to_string()
                }
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::InvalidEmail(_) => "Invalid email address".to_string(),
                _ => "Authentication error".to_string(),
            },
            Self::Gateway(GatewayError::NotFound) => "Not found".to_string(),
            Self::Gateway(_) | Self::Session(_) => "Internal error".to_string(),
            Self::Config(err) => err.to_string(),
            Self::NotFound(_) => self.to_string(),
        }
    }

    /// Capture server-side failures to Sentry and log them.
    pub fn report(&self) {
        if self.is_server_error() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Command error"
            );
        } else {
            tracing::debug!(error = %self, "Command rejected");
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for a shopper action.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added item", Some(&[("product_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
