//! User domain types.
//!
//! Accounts are split across two tables so that reading a user never
//! touches password material.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopfront_core::{Email, UserId, UserPasswordId};

use crate::gateway::{Record, Table};

/// A shopper account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// User's email address, normalized.
    pub email: Email,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}

impl Record for User {
    const TABLE: Table = Table::Users;
    type Id = UserId;
    type Draft = NewUser;
}

/// Insert payload for a [`User`].
#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub email: Email,
}

/// Password credential for a user (argon2 PHC string).
#[derive(Clone, Deserialize)]
pub struct UserPassword {
    pub id: UserPasswordId,
    pub user_id: UserId,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for UserPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserPassword")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("password_hash", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .finish()
    }
}

impl Record for UserPassword {
    const TABLE: Table = Table::UserPasswords;
    type Id = UserPasswordId;
    type Draft = NewUserPassword;
}

/// Insert payload for a [`UserPassword`].
#[derive(Clone, Serialize)]
pub struct NewUserPassword {
    pub user_id: UserId,
    pub password_hash: String,
}
