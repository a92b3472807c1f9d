//! File-backed execution state store.
//!
//! Layout under the state root:
//!
//! ```text
//! <root>/<session>/execution.json   pretty-printed state document
//! <root>/<session>/.lock            flock target for read-modify-write
//! ```
//!
//! Saves write a sibling temp file and rename it over the document, so a
//! reader never observes a half-written state.

use super::file_lock::FileLock;
use maker_application::{ExecutionStateStore, SessionLock, StoreError};
use maker_domain::{ExecutionState, SessionId};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

const STATE_FILE: &str = "execution.json";
const LOCK_FILE: &str = ".lock";

/// State store rooted at a directory, one subdirectory per session
#[derive(Debug, Clone)]
pub struct FileStateStore {
    root: PathBuf,
}

impl FileStateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding everything for one session
    pub fn session_dir(&self, session_id: &SessionId) -> PathBuf {
        self.root.join(session_id.as_str())
    }

    pub fn state_path(&self, session_id: &SessionId) -> PathBuf {
        self.session_dir(session_id).join(STATE_FILE)
    }

    fn ensure_session_dir(&self, session_id: &SessionId) -> Result<PathBuf, StoreError> {
        let dir = self.session_dir(session_id);
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        Ok(dir)
    }
}

impl ExecutionStateStore for FileStateStore {
    fn lock(&self, session_id: &SessionId) -> Result<SessionLock<'_>, StoreError> {
        let dir = self.ensure_session_dir(session_id)?;
        let lock = FileLock::acquire(dir.join(LOCK_FILE)).map_err(|source| StoreError::Lock {
            session_id: session_id.to_string(),
            source,
        })?;
        Ok(SessionLock::new(lock))
    }

    fn load(&self, session_id: &SessionId) -> Result<Option<ExecutionState>, StoreError> {
        let path = self.state_path(session_id);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(path, e)),
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StoreError::Corrupt { path, source })
    }

    fn save(&self, state: &ExecutionState) -> Result<(), StoreError> {
        let dir = self.ensure_session_dir(&state.session_id)?;
        let path = dir.join(STATE_FILE);
        let tmp = dir.join(format!("{}.tmp.{}", STATE_FILE, std::process::id()));

        let mut document = serde_json::to_vec_pretty(state)?;
        document.push(b'\n');

        write_synced(&tmp, &document).map_err(|e| StoreError::io(&tmp, e))?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(StoreError::io(&path, e));
        }

        debug!(path = %path.display(), bytes = document.len(), "State saved");
        Ok(())
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
