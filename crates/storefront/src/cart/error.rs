//! Cart error types.

use thiserror::Error;

use crate::gateway::GatewayError;

/// Errors returned by [`CartEngine`](super::CartEngine) operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Referenced product or cart line does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Backend failure (connection, constraint, corrupt row).
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Request rejected before reaching the backend.
    #[error("validation failed: {0}")]
    Validation(String),
}

impl CartError {
    /// Whether this failure should be reported to Sentry.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(self, Self::Gateway(_))
    }

    /// Message safe to show to a shopper.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound(what) => format!("{what} is no longer available"),
            Self::Gateway(_) => "Something went wrong updating your cart. Please try again.".to_string(),
            Self::Validation(msg) => msg.clone(),
        }
    }

    /// Lift a gateway `NotFound` into a cart `NotFound` naming `what`.
    pub(crate) fn not_found_as(what: &str) -> impl FnOnce(GatewayError) -> Self + '_ {
        move |e| match e {
            GatewayError::NotFound => Self::NotFound(what.to_owned()),
            other => Self::Gateway(other),
        }
    }
}
