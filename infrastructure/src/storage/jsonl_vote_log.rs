//! JSONL-backed vote log.
//!
//! Votes for the current step live in `<dir>/votes.jsonl`, one record per
//! line. Appends and clears take an exclusive flock on the file so
//! concurrent producers never interleave partial lines.

use super::file_lock::flock_exclusive;
use maker_application::{StoreError, VoteLog};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const VOTES_FILE: &str = "votes.jsonl";

/// Vote log stored as a JSONL file inside a vote-source directory
#[derive(Debug, Clone)]
pub struct JsonlVoteLog {
    path: PathBuf,
}

impl JsonlVoteLog {
    /// Vote log for the given vote-source directory
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(VOTES_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_locked(&self, options: &OpenOptions) -> Result<File, StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
        let file = options
            .open(&self.path)
            .map_err(|e| StoreError::io(&self.path, e))?;
        flock_exclusive(&file).map_err(|e| StoreError::io(&self.path, e))?;
        Ok(file)
    }
}

impl VoteLog for JsonlVoteLog {
    fn append(&self, record: &str) -> Result<(), StoreError> {
        let mut line = record.trim_end_matches(['\r', '\n']).to_string();
        if line.contains('\n') {
            warn!("Vote record spans several lines, newlines replaced");
            line = line.replace(['\r', '\n'], " ");
        }
        line.push('\n');

        let mut file = self.open_locked(OpenOptions::new().create(true).append(true))?;
        // One write call per record; with O_APPEND the line lands whole
        file.write_all(line.as_bytes())
            .map_err(|e| StoreError::io(&self.path, e))?;
        debug!(path = %self.path.display(), "Vote appended");
        Ok(())
    }

    fn records(&self) -> Result<Vec<String>, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };

        // Invalid UTF-8 surfaces as an unparseable record rather than an error
        Ok(String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::to_string)
            .collect())
    }

    fn clear(&self) -> Result<(), StoreError> {
        if !self.path.exists() {
            return Ok(());
        }
        let file = self.open_locked(OpenOptions::new().write(true))?;
        file.set_len(0)
            .map_err(|e| StoreError::io(&self.path, e))?;
        debug!(path = %self.path.display(), "Votes cleared");
        Ok(())
    }
}
