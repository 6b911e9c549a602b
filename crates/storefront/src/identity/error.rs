//! Authentication error types.

use thiserror::Error;

use crate::gateway::GatewayError;
use crate::session::SessionError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] shopfront_core::EmailError),

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,

    /// Backend error.
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Signed-in state could not be persisted.
    #[error("session error: {0}")]
    Session(#[from] SessionError),
}
