//! Durable client-side session state.
//!
//! The anonymous shopper is identified by a random [`SessionId`] created on
//! first use and kept for the lifetime of the local profile. It lives in a
//! small key-value [`SessionStore`]; the file-backed store survives restarts.

use std::collections::BTreeMap;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::sync::Mutex;

use shopfront_core::SessionId;

/// Session keys for persisted shopper state.
pub mod keys {
    /// Key for the anonymous session token.
    pub const SESSION_ID: &str = "session_id";

    /// Key for the signed-in user.
    pub const CURRENT_USER: &str = "current_user";
}

/// Errors that can occur reading or writing session state.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Backing file could not be read or written.
    #[error("session store I/O error: {0}")]
    Io(#[from] io::Error),

    /// Stored value could not be encoded or decoded.
    #[error("session store encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Durable key-value storage for session state.
pub trait SessionStore: Send + Sync {
    /// Read the raw value stored under `key`.
    fn get_raw(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<serde_json::Value>, SessionError>> + Send;

    /// Store `value` under `key`, replacing any previous value.
    fn set_raw(
        &self,
        key: &str,
        value: serde_json::Value,
    ) -> impl Future<Output = Result<(), SessionError>> + Send;

    /// Remove `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> impl Future<Output = Result<(), SessionError>> + Send;

    /// Read and decode the value stored under `key`.
    fn get<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<T>, SessionError>> + Send {
        async move {
            match self.get_raw(key).await? {
                Some(value) => Ok(Some(serde_json::from_value(value)?)),
                None => Ok(None),
            }
        }
    }

    /// Encode and store `value` under `key`.
    fn insert<T: Serialize + Sync>(
        &self,
        key: &str,
        value: &T,
    ) -> impl Future<Output = Result<(), SessionError>> + Send {
        async move { self.set_raw(key, serde_json::to_value(value)?).await }
    }
}

type Entries = BTreeMap<String, serde_json::Value>;

/// Session store kept in memory only.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: Mutex<Entries>,
}

impl MemorySessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    async fn get_raw(&self, key: &str) -> Result<Option<serde_json::Value>, SessionError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set_raw(&self, key: &str, value: serde_json::Value) -> Result<(), SessionError> {
        self.entries.lock().await.insert(key.to_owned(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), SessionError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

/// Session store persisted as a JSON object in a file.
///
/// Writes go to a sibling temp file that is then renamed over the target,
/// so a crash mid-write never leaves a truncated store behind.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSessionStore {
    /// Create a store backed by `path`. The file is created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Entries, SessionError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(Entries::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Entries::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, entries: &Entries) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(entries)?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    async fn get_raw(&self, key: &str) -> Result<Option<serde_json::Value>, SessionError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(key))
    }

    async fn set_raw(&self, key: &str, value: serde_json::Value) -> Result<(), SessionError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        entries.insert(key.to_owned(), value);
        self.save(&entries).await
    }

    async fn remove(&self, key: &str) -> Result<(), SessionError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        if entries.remove(key).is_some() {
            self.save(&entries).await?;
        }
        Ok(())
    }
}

/// The anonymous shopper's identity.
pub struct SessionIdentity;

impl SessionIdentity {
    /// Read the persisted session token, creating and persisting one if
    /// absent. Never rotates an existing token.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the store cannot be read or written.
    pub async fn load_or_create(store: &impl SessionStore) -> Result<SessionId, SessionError> {
        if let Some(existing) = store.get::<SessionId>(keys::SESSION_ID).await? {
            return Ok(existing);
        }

        let session_id = SessionId::generate();
        store.insert(keys::SESSION_ID, &session_id).await?;
        tracing::info!(%session_id, "Created anonymous session");
        Ok(session_id)
    }
}
