//! Persisted session slots.
//!
//! Two named slots survive restarts: the opaque bearer token and a cached
//! copy of the user record. They are always cleared together.

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use portal_shared::models::AgentUser;
use tracing::warn;

use crate::error::ClientError;

/// Slot holding the bearer token.
pub const TOKEN_SLOT: &str = "auth_token";
/// Slot holding the cached user JSON.
pub const USER_SLOT: &str = "user";

/// Storage for the persisted session slots.
pub trait SessionStore: Send + Sync {
    /// Read the persisted token, if any.
    ///
    /// # Errors
    /// Returns an error when the slot exists but cannot be read.
    fn load_token(&self) -> Result<Option<String>, ClientError>;

    /// Read the cached user, if any.
    ///
    /// # Errors
    /// Returns an error when the slot exists but cannot be read.
    fn load_user(&self) -> Result<Option<AgentUser>, ClientError>;

    /// Persist the token.
    ///
    /// # Errors
    /// Returns an error when the slot cannot be written.
    fn save_token(&self, token: &str) -> Result<(), ClientError>;

    /// Persist the cached user.
    ///
    /// # Errors
    /// Returns an error when the slot cannot be written.
    fn save_user(&self, user: &AgentUser) -> Result<(), ClientError>;

    /// Remove both slots.
    ///
    /// # Errors
    /// Returns an error when a slot exists but cannot be removed.
    fn clear(&self) -> Result<(), ClientError>;
}

/// Session slots kept as files in a directory, readable only by the owner.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    /// Store slots under `dir`, which is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the slot files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot_path(&self, slot: &str) -> PathBuf {
        self.dir.join(slot)
    }

    fn read_slot(&self, slot: &str) -> Result<Option<String>, ClientError> {
        match fs::read_to_string(self.slot_path(slot)) {
            Ok(contents) => {
                let trimmed = contents.trim();
                Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write_slot(&self, slot: &str, contents: &str) -> Result<(), ClientError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.slot_path(slot);
        fs::write(&path, contents.as_bytes())?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    fn remove_slot(&self, slot: &str) -> Result<(), ClientError> {
        match fs::remove_file(self.slot_path(slot)) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}

impl SessionStore for FileSessionStore {
    fn load_token(&self) -> Result<Option<String>, ClientError> {
        self.read_slot(TOKEN_SLOT)
    }

    fn load_user(&self) -> Result<Option<AgentUser>, ClientError> {
        let Some(raw) = self.read_slot(USER_SLOT)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(user) => Ok(Some(user)),
            Err(err) => {
                warn!(error = %err, path = %self.slot_path(USER_SLOT).display(), "ignoring unreadable cached user");
                Ok(None)
            }
        }
    }

    fn save_token(&self, token: &str) -> Result<(), ClientError> {
        self.write_slot(TOKEN_SLOT, token)
    }

    fn save_user(&self, user: &AgentUser) -> Result<(), ClientError> {
        self.write_slot(USER_SLOT, &serde_json::to_string(user)?)
    }

    fn clear(&self) -> Result<(), ClientError> {
        let token = self.remove_slot(TOKEN_SLOT);
        let user = self.remove_slot(USER_SLOT);
        token.and(user)
    }
}

#[derive(Debug, Default)]
struct Slots {
    token: Option<String>,
    user: Option<AgentUser>,
}

/// In-process session slots, lost when the process exits.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slots: Mutex<Slots>,
}

impl MemorySessionStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-seeded with a token, as if a previous run had logged in.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        let store = Self::default();
        store.lock().token = Some(token.into());
        store
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionStore for MemorySessionStore {
    fn load_token(&self) -> Result<Option<String>, ClientError> {
        Ok(self.lock().token.clone())
    }

    fn load_user(&self) -> Result<Option<AgentUser>, ClientError> {
        Ok(self.lock().user.clone())
    }

    fn save_token(&self, token: &str) -> Result<(), ClientError> {
        self.lock().token = Some(token.to_string());
        Ok(())
    }

    fn save_user(&self, user: &AgentUser) -> Result<(), ClientError> {
        self.lock().user = Some(user.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), ClientError> {
        *self.lock() = Slots::default();
        Ok(())
    }
}
