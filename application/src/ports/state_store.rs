//! Port for execution state persistence.
//!
//! Defines the [`ExecutionStateStore`] trait the ledger uses to read and
//! rewrite a session's whole state document, plus [`InMemoryStateStore`] for
//! tests and ephemeral runs.

use maker_domain::{ExecutionState, SessionId};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;

/// Storage failures. Never used to signal "no state exists".
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt state document {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Could not lock session {session_id}: {source}")]
    Lock {
        session_id: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Store poisoned by a panicked writer")]
    Poisoned,
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }

    /// Check if the persisted document exists but could not be decoded
    pub fn is_corrupt(&self) -> bool {
        matches!(self, StoreError::Corrupt { .. })
    }
}

/// Any value whose drop releases a lock.
pub trait LockGuard {}

impl<T> LockGuard for T {}

/// Exclusive hold on one session's state document.
///
/// The lock is released when this value is dropped.
pub struct SessionLock<'a> {
    _guard: Box<dyn LockGuard + 'a>,
}

impl<'a> SessionLock<'a> {
    pub fn new(guard: impl LockGuard + 'a) -> Self {
        Self {
            _guard: Box::new(guard),
        }
    }
}

impl std::fmt::Debug for SessionLock<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionLock")
    }
}

/// Durable storage for execution state documents
///
/// Implementations persist the whole document on every `save`. Callers that
/// read-modify-write must hold the [`SessionLock`] from [`lock`] for the
/// whole sequence.
///
/// [`lock`]: ExecutionStateStore::lock
pub trait ExecutionStateStore: Send + Sync {
    /// Block until this caller holds the session's exclusive lock
    fn lock(&self, session_id: &SessionId) -> Result<SessionLock<'_>, StoreError>;

    /// Load the state document, `Ok(None)` when the session was never
    /// initialized
    fn load(&self, session_id: &SessionId) -> Result<Option<ExecutionState>, StoreError>;

    /// Replace the state document for `state.session_id`
    fn save(&self, state: &ExecutionState) -> Result<(), StoreError>;
}

/// In-memory store for tests.
///
/// Documents are kept serialized so a round trip behaves like the file store.
#[derive(Default)]
pub struct InMemoryStateStore {
    documents: Mutex<HashMap<SessionId, String>>,
    write_lock: Mutex<()>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a raw document, bypassing serialization (used to simulate
    /// corruption)
    pub fn insert_raw(&self, session_id: &SessionId, document: impl Into<String>) {
        if let Ok(mut documents) = self.documents.lock() {
            documents.insert(session_id.clone(), document.into());
        }
    }
}

impl ExecutionStateStore for InMemoryStateStore {
    fn lock(&self, _session_id: &SessionId) -> Result<SessionLock<'_>, StoreError> {
        // One lock for every session: coarser than the file store, same guarantee
        let guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(SessionLock::new(guard))
    }

    fn load(&self, session_id: &SessionId) -> Result<Option<ExecutionState>, StoreError> {
        let documents = self.documents.lock().map_err(|_| StoreError::Poisoned)?;
        let Some(document) = documents.get(session_id) else {
            return Ok(None);
        };
        serde_json::from_str(document)
            .map(Some)
            .map_err(|source| StoreError::Corrupt {
                path: PathBuf::from(format!("memory://{}", session_id)),
                source,
            })
    }

    fn save(&self, state: &ExecutionState) -> Result<(), StoreError> {
        let document = serde_json::to_string(state)?;
        let mut documents = self.documents.lock().map_err(|_| StoreError::Poisoned)?;
        documents.insert(state.session_id.clone(), document);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn id(s: &str) -> SessionId {
        SessionId::parse(s).unwrap()
    }

    #[test]
    fn test_load_missing_is_none() {
        let store = InMemoryStateStore::new();
        assert!(store.load(&id("nope")).unwrap().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let store = InMemoryStateStore::new();
        let state = ExecutionState::new(id("s1"), 4, "task", 2, Utc::now()).unwrap();

        store.save(&state).unwrap();

        assert_eq!(store.load(&id("s1")).unwrap(), Some(state));
        assert!(store.load(&id("s2")).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_document_is_an_error() {
        let store = InMemoryStateStore::new();
        store.insert_raw(&id("bad"), "{\"session_id\": ");

        let err = store.load(&id("bad")).unwrap_err();
        assert!(err.is_corrupt());
    }

    #[test]
    fn test_lock_is_released_on_drop() {
        let store = InMemoryStateStore::new();
        {
            let _lock = store.lock(&id("s")).unwrap();
        }
        // Would deadlock if the first guard were still held
        let _again = store.lock(&id("s")).unwrap();
    }
}
