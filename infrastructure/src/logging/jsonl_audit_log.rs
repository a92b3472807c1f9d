//! JSONL file writer for step audit events.
//!
//! Each ledger update is serialized as a single JSON line with a `type`
//! field and `timestamp`, appended to `<root>/<session>/metrics.jsonl`.

use maker_application::{StepAuditLog, StoreError};
use maker_domain::{SessionId, StepRecord};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::trace;

const AUDIT_FILE: &str = "metrics.jsonl";
const EVENT_TYPE: &str = "step_update";

/// JSONL audit log that writes one JSON object per step update.
///
/// The in-process mutex orders writers of this instance; across processes
/// each line is written with a single `O_APPEND` write.
pub struct JsonlStepAuditLog {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlStepAuditLog {
    /// Create a logger that writes under the given state root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Get the path to a session's audit file.
    pub fn path(&self, session_id: &SessionId) -> PathBuf {
        self.root.join(session_id.as_str()).join(AUDIT_FILE)
    }

    fn render(session_id: &SessionId, record: &StepRecord) -> Result<String, StoreError> {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

        // Merge the record with type, session and timestamp
        let mut value = serde_json::to_value(record)?;
        if let serde_json::Value::Object(map) = &mut value {
            map.insert(
                "type".to_string(),
                serde_json::Value::String(EVENT_TYPE.to_string()),
            );
            map.insert(
                "session_id".to_string(),
                serde_json::Value::String(session_id.to_string()),
            );
            map.insert(
                "timestamp".to_string(),
                serde_json::Value::String(timestamp),
            );
        }

        let mut line = serde_json::to_string(&value)?;
        line.push('\n');
        Ok(line)
    }
}

impl StepAuditLog for JsonlStepAuditLog {
    fn append(&self, session_id: &SessionId, record: &StepRecord) -> Result<(), StoreError> {
        let path = self.path(session_id);
        let line = Self::render(session_id, record)?;

        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| StoreError::io(&path, e))?;
        file.write_all(line.as_bytes())
            .map_err(|e| StoreError::io(&path, e))?;

        trace!(path = %path.display(), step = %record.step_id, "Audit entry written");
        Ok(())
    }
}

impl std::fmt::Debug for JsonlStepAuditLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonlStepAuditLog")
            .field("root", &self.root)
            .finish()
    }
}
