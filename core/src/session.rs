//! The single authentication credential shared by every request.
//!
//! # Design
//! `Session` is an explicitly owned context object: the binary creates one,
//! wraps it in an `Arc`, and hands it to `ApiClient::new`. The client reads
//! the token on every `build_request`, so there is exactly one source of
//! truth for the `Authorization` header.
//!
//! Durability is delegated to a `TokenStorage`. The in-memory token is updated
//! even when persistence fails, so the header sent next always matches the
//! most recent `set`/`clear` call.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use tracing::{debug, warn};

use crate::error::ApiError;

/// Fixed key under which the raw token is persisted.
pub const TOKEN_KEY: &str = "jwt_token";

/// Durable home for the raw token string.
pub trait TokenStorage: Send + Sync {
    /// Returns `None` when no token has been persisted.
    fn load(&self) -> Result<Option<String>, ApiError>;
    fn save(&self, token: &str) -> Result<(), ApiError>;
    /// Removing an absent token is not an error.
    fn remove(&self) -> Result<(), ApiError>;
}

/// Stores the token in a file named [`TOKEN_KEY`] inside a directory.
#[derive(Debug, Clone)]
pub struct FileTokenStorage {
    path: PathBuf,
}

impl FileTokenStorage {
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(TOKEN_KEY),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStorage for FileTokenStorage {
    fn load(&self) -> Result<Option<String>, ApiError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                let token = content.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_error(&self.path, e)),
        }
    }

    fn save(&self, token: &str) -> Result<(), ApiError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| storage_error(parent, e))?;
        }
        fs::write(&self.path, token).map_err(|e| storage_error(&self.path, e))
    }

    fn remove(&self) -> Result<(), ApiError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error(&self.path, e)),
        }
    }
}

fn storage_error(path: &Path, e: std::io::Error) -> ApiError {
    ApiError::StorageError(format!("{}: {e}", path.display()))
}

/// Process-local storage; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryTokenStorage {
    slot: Mutex<Option<String>>,
}

impl MemoryTokenStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            slot: Mutex::new(Some(token.to_string())),
        }
    }
}

impl TokenStorage for MemoryTokenStorage {
    fn load(&self) -> Result<Option<String>, ApiError> {
        Ok(self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn save(&self, token: &str) -> Result<(), ApiError> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(token.to_string());
        Ok(())
    }

    fn remove(&self) -> Result<(), ApiError> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}

/// Holds the at-most-one active bearer token.
pub struct Session {
    storage: Box<dyn TokenStorage>,
    token: RwLock<Option<String>>,
}

impl Session {
    /// Rehydrates the token from `storage`. Called once at process start.
    pub fn load(storage: impl TokenStorage + 'static) -> Result<Self, ApiError> {
        let token = storage.load()?;
        debug!(authenticated = token.is_some(), "session loaded");
        Ok(Self {
            storage: Box::new(storage),
            token: RwLock::new(token),
        })
    }

    /// An unauthenticated session that is never persisted.
    pub fn in_memory() -> Self {
        Self {
            storage: Box::new(MemoryTokenStorage::new()),
            token: RwLock::new(None),
        }
    }

    /// Makes `token` the active credential and persists it.
    pub fn set(&self, token: &str) -> Result<(), ApiError> {
        let mut slot = self.token.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(token.to_string());
        self.storage.save(token).inspect_err(|e| {
            warn!(error = %e, "token is active but could not be persisted");
        })
    }

    pub fn get(&self) -> Option<String> {
        self.token.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Drops the active credential and its persisted copy.
    pub fn clear(&self) -> Result<(), ApiError> {
        let mut slot = self.token.write().unwrap_or_else(|e| e.into_inner());
        *slot = None;
        self.storage.remove().inspect_err(|e| {
            warn!(error = %e, "persisted token could not be removed");
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    /// Value for the `Authorization` header, if a token is active.
    pub fn authorization(&self) -> Option<String> {
        self.get().map(|token| format!("Bearer {token}"))
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
