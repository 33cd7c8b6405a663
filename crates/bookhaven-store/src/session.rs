//! # Session Store
//!
//! Persists the logged-in identity under its own well-known key,
//! separate from the table snapshot.
//!
//! The cached value is a single serialized record. Like table snapshots,
//! session writes are best-effort: a failed save is logged and the
//! session simply won't survive a restart.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::snapshot::{SnapshotBackend, SESSION_KEY};

/// Single-record persistence for the current session identity.
#[derive(Debug, Clone)]
pub struct SessionStore {
    backend: Arc<dyn SnapshotBackend>,
    key: String,
}

impl SessionStore {
    /// Creates a session store over a backend, using the default key
    /// ([`SESSION_KEY`]).
    pub fn new(backend: Arc<dyn SnapshotBackend>) -> Self {
        Self::with_key(backend, SESSION_KEY)
    }

    /// Creates a session store under an explicit key.
    pub fn with_key(backend: Arc<dyn SnapshotBackend>, key: impl Into<String>) -> Self {
        SessionStore {
            backend,
            key: key.into(),
        }
    }

    /// Caches the session record. Best-effort.
    pub fn save<T: Serialize>(&self, value: &T) {
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key = %self.key, error = %e, "session record failed to serialize");
                return;
            }
        };
        if let Err(e) = self.backend.save(&self.key, &payload) {
            warn!(key = %self.key, error = %e, "session persist failed");
        }
    }

    /// Loads the cached session record, if present and readable.
    pub fn load<T: DeserializeOwned>(&self) -> Option<T> {
        match self.backend.load(&self.key) {
            Ok(Some(payload)) => match serde_json::from_str(&payload) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!(key = %self.key, error = %e, "corrupt session record, ignoring");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(key = %self.key, error = %e, "session unreadable");
                None
            }
        }
    }

    /// Clears the cached session record.
    pub fn clear(&self) {
        if let Err(e) = self.backend.remove(&self.key) {
            warn!(key = %self.key, error = %e, "session clear failed");
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
