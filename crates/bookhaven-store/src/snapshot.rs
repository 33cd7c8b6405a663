//! # Snapshot Backends
//!
//! The key-value persistence port the record store writes its snapshot
//! through, with two concrete backings.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Snapshot Persistence                                │
//! │                                                                         │
//! │  RecordStore ── save("bookhaven_db", <json>) ──► SnapshotBackend       │
//! │  SessionStore ─ save("bookhaven_session", …) ──►      │                │
//! │                                                        │                │
//! │                       ┌────────────────────────────────┴──────────┐    │
//! │                       ▼                                           ▼    │
//! │                 FileBackend                              MemoryBackend │
//! │            one {key}.json per key                     mutex-guarded map│
//! │            under the data directory                   (tests; optional │
//! │                                                        failing mode)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A `save` failure is the storage-quota case: callers log it and keep
//! their in-memory state; it must never roll back a mutation.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use thiserror::Error;
use tracing::debug;

/// Key the record store snapshot is persisted under.
pub const STORE_KEY: &str = "bookhaven_db";

/// Key the session identity is persisted under.
pub const SESSION_KEY: &str = "bookhaven_session";

// =============================================================================
// Backend Error
// =============================================================================

/// Failure of the underlying key-value storage.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Filesystem failure (permissions, disk full, missing directory).
    #[error("storage I/O error: {0}")]
    Io(#[from] io::Error),

    /// Backend refused the write (simulated quota-exceeded).
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

// =============================================================================
// Backend Port
// =============================================================================

/// Key-value persistence port for serialized snapshots.
///
/// Implementations hold whole serialized payloads per key; the store
/// rewrites the full snapshot on every mutation.
pub trait SnapshotBackend: Send + Sync + fmt::Debug {
    /// Loads the payload stored under `key`, if any.
    fn load(&self, key: &str) -> Result<Option<String>, BackendError>;

    /// Stores `payload` under `key`, replacing any previous value.
    fn save(&self, key: &str, payload: &str) -> Result<(), BackendError>;

    /// Removes the payload stored under `key`. Absent keys are fine.
    fn remove(&self, key: &str) -> Result<(), BackendError>;
}

// =============================================================================
// File Backend
// =============================================================================

/// Snapshot backend writing one `{key}.json` file per key.
///
/// ## Example
/// ```rust,no_run
/// use bookhaven_store::snapshot::FileBackend;
///
/// let backend = FileBackend::new("./data").unwrap();
/// ```
#[derive(Debug)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Creates a file backend rooted at `dir`, creating the directory if
    /// it does not exist.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, BackendError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(FileBackend { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl SnapshotBackend for FileBackend {
    fn load(&self, key: &str) -> Result<Option<String>, BackendError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(payload) => Ok(Some(payload)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, key: &str, payload: &str) -> Result<(), BackendError> {
        let path = self.path_for(key);
        fs::write(&path, payload)?;
        debug!(key = %key, bytes = payload.len(), "snapshot saved");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), BackendError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// =============================================================================
// Memory Backend
// =============================================================================

/// In-memory snapshot backend for tests and ephemeral sessions.
///
/// `failing()` (or `set_fail_writes(true)`) makes every `save` return
/// [`BackendError::Unavailable`], simulating a disabled or quota-exceeded
/// store; reads keep working and callers are expected to carry on with
/// their in-memory state.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, String>>,
    fail_writes: AtomicBool,
}

impl MemoryBackend {
    /// Creates an empty in-memory backend.
    pub fn new() -> Self {
        MemoryBackend::default()
    }

    /// Creates a backend whose writes always fail.
    pub fn failing() -> Self {
        let backend = MemoryBackend::new();
        backend.fail_writes.store(true, Ordering::SeqCst);
        backend
    }

    /// Toggles write failure at runtime.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl SnapshotBackend for MemoryBackend {
    fn load(&self, key: &str) -> Result<Option<String>, BackendError> {
        let entries = self.entries.lock().expect("backend mutex poisoned");
        Ok(entries.get(key).cloned())
    }

    fn save(&self, key: &str, payload: &str) -> Result<(), BackendError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable(
                "memory backend configured to fail writes".to_string(),
            ));
        }
        let mut entries = self.entries.lock().expect("backend mutex poisoned");
        entries.insert(key.to_string(), payload.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), BackendError> {
        let mut entries = self.entries.lock().expect("backend mutex poisoned");
        entries.remove(key);
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_backend_round_trip() {
        let backend = MemoryBackend::new();

        assert!(backend.load("missing").unwrap().is_none());

        backend.save("k", "payload").unwrap();
        assert_eq!(backend.load("k").unwrap().as_deref(), Some("payload"));

        backend.save("k", "replaced").unwrap();
        assert_eq!(backend.load("k").unwrap().as_deref(), Some("replaced"));

        backend.remove("k").unwrap();
        assert!(backend.load("k").unwrap().is_none());
    }

    #[test]
    fn test_memory_backend_failing_mode() {
        let backend = MemoryBackend::failing();
        assert!(backend.save("k", "payload").is_err());
        assert!(backend.load("k").unwrap().is_none());

        backend.set_fail_writes(false);
        backend.save("k", "payload").unwrap();
        assert_eq!(backend.load("k").unwrap().as_deref(), Some("payload"));
    }

    #[test]
    fn test_file_backend_round_trip() {
        let dir = std::env::temp_dir().join(format!(
            "bookhaven-store-test-{}-{}",
            std::process::id(),
            line!()
        ));
        let backend = FileBackend::new(&dir).unwrap();

        assert!(backend.load(STORE_KEY).unwrap().is_none());

        backend.save(STORE_KEY, "{\"users\":[]}").unwrap();
        assert_eq!(
            backend.load(STORE_KEY).unwrap().as_deref(),
            Some("{\"users\":[]}")
        );

        backend.remove(STORE_KEY).unwrap();
        assert!(backend.load(STORE_KEY).unwrap().is_none());
        // Removing a missing key is fine
        backend.remove(STORE_KEY).unwrap();

        fs::remove_dir_all(&dir).ok();
    }
}
