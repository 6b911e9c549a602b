//! Cart ownership.
//!
//! A cart row belongs to exactly one shopper: either an authenticated user or
//! an anonymous browser session. In storage this is two nullable columns
//! (`user_id`, `session_id`); [`OwnerKey`] makes the "exactly one" rule a
//! property of the type.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::id::{SessionId, UserId};

/// Errors that can occur when decoding an [`OwnerKey`] from storage columns.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OwnerKeyError {
    /// Neither `user_id` nor `session_id` is set.
    #[error("row has no owner")]
    Missing,
    /// Both `user_id` and `session_id` are set.
    #[error("row has both a user owner and a session owner")]
    Ambiguous,
}

/// The identifier that scopes a set of cart rows to one shopper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "OwnerColumns", into = "OwnerColumns")]
pub enum OwnerKey {
    /// Authenticated shopper.
    User(UserId),
    /// Anonymous shopper, keyed by the locally persisted session token.
    Session(SessionId),
}

impl OwnerKey {
    /// Storage column holding this owner's ID.
    #[must_use]
    pub const fn column(&self) -> &'static str {
        match self {
            Self::User(_) => "user_id",
            Self::Session(_) => "session_id",
        }
    }

    /// The authenticated user, if any.
    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        match self {
            Self::User(id) => Some(*id),
            Self::Session(_) => None,
        }
    }

    /// The anonymous session, if any.
    #[must_use]
    pub const fn session_id(&self) -> Option<SessionId> {
        match self {
            Self::User(_) => None,
            Self::Session(id) => Some(*id),
        }
    }

    /// Whether this owner is an anonymous session.
    #[must_use]
    pub const fn is_anonymous(&self) -> bool {
        matches!(self, Self::Session(_))
    }

    /// The owner's ID as a plain string, for filters and logs.
    #[must_use]
    pub fn id_string(&self) -> String {
        match self {
            Self::User(id) => id.to_string(),
            Self::Session(id) => id.to_string(),
        }
    }
}

impl fmt::Display for OwnerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(id) => write!(f, "user:{id}"),
            Self::Session(id) => write!(f, "session:{id}"),
        }
    }
}

/// Storage form of an [`OwnerKey`]: both columns, exactly one non-null.
///
/// Serializes both keys (one as `null`), so writing it over an existing row
/// also clears the previous owner column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerColumns {
    /// Authenticated owner column.
    #[serde(default)]
    pub user_id: Option<UserId>,
    /// Anonymous owner column.
    #[serde(default)]
    pub session_id: Option<SessionId>,
}

impl From<OwnerKey> for OwnerColumns {
    fn from(owner: OwnerKey) -> Self {
        Self {
            user_id: owner.user_id(),
            session_id: owner.session_id(),
        }
    }
}

impl TryFrom<OwnerColumns> for OwnerKey {
    type Error = OwnerKeyError;

    fn try_from(columns: OwnerColumns) -> Result<Self, Self::Error> {
        match (columns.user_id, columns.session_id) {
            (Some(user), None) => Ok(Self::User(user)),
            (None, Some(session)) => Ok(Self::Session(session)),
            (None, None) => Err(OwnerKeyError::Missing),
            (Some(_), Some(_)) => Err(OwnerKeyError::Ambiguous),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn session() -> SessionId {
        "6a2f41a3-c54c-fce8-32d2-0324e1c32e22".parse().unwrap()
    }

    fn user() -> UserId {
        "1c3c6a5e-8f8e-4b9a-9a0e-4b3f1f0a7d21".parse().unwrap()
    }

    #[test]
    fn test_serializes_both_columns() {
        let value = serde_json::to_value(OwnerKey::Session(session())).unwrap();
        assert_eq!(
            value,
            json!({
                "user_id": null,
                "session_id": "6a2f41a3-c54c-fce8-32d2-0324e1c32e22",
            })
        );
    }

    #[test]
    fn test_decodes_user_owner() {
        let owner: OwnerKey = serde_json::from_value(json!({
            "user_id": "1c3c6a5e-8f8e-4b9a-9a0e-4b3f1f0a7d21",
            "session_id": null,
        }))
        .unwrap();
        assert_eq!(owner, OwnerKey::User(user()));
        assert_eq!(owner.column(), "user_id");
        assert!(!owner.is_anonymous());
    }

    #[test]
    fn test_rejects_missing_owner() {
        let result: Result<OwnerKey, _> = serde_json::from_value(json!({}));
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_ambiguous_owner() {
        let columns = OwnerColumns {
            user_id: Some(user()),
            session_id: Some(session()),
        };
        assert_eq!(OwnerKey::try_from(columns), Err(OwnerKeyError::Ambiguous));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            OwnerKey::Session(session()).to_string(),
            "session:6a2f41a3-c54c-fce8-32d2-0324e1c32e22"
        );
    }
}
