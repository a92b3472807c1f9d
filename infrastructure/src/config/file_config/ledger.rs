//! Ledger configuration from TOML (`[ledger]` section)

use maker_application::{LedgerPolicy, MissingSessionPolicy};
use maker_domain::MetricsMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Last-resort state directory when the platform has no data dir
const FALLBACK_STATE_DIR: &str = "/tmp/maker-state";

/// Raw ledger configuration from TOML
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLedgerConfig {
    /// Root directory holding one subdirectory per session
    pub state_dir: Option<PathBuf>,
    /// What `update`/`complete` do for a never-initialized session
    pub on_missing_session: MissingSessionPolicy,
    /// How metrics react to repeated updates of the same step
    pub metrics_mode: MetricsMode,
}

impl FileLedgerConfig {
    pub fn policy(&self) -> LedgerPolicy {
        LedgerPolicy::default()
            .with_missing_session(self.on_missing_session)
            .with_metrics_mode(self.metrics_mode)
    }

    /// Resolve the state root: explicit override, then config, then platform default
    pub fn resolve_state_dir(&self, override_dir: Option<&Path>) -> PathBuf {
        override_dir
            .map(Path::to_path_buf)
            .or_else(|| self.state_dir.clone())
            .or_else(|| dirs::data_local_dir().map(|d| d.join("maker").join("state")))
            .unwrap_or_else(|| PathBuf::from(FALLBACK_STATE_DIR))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_wins() {
        let config = FileLedgerConfig {
            state_dir: Some(PathBuf::from("/from/config")),
            ..Default::default()
        };
        assert_eq!(
            config.resolve_state_dir(Some(Path::new("/from/flag"))),
            PathBuf::from("/from/flag")
        );
        assert_eq!(
            config.resolve_state_dir(None),
            PathBuf::from("/from/config")
        );
    }

    #[test]
    fn test_default_state_dir_is_named() {
        let path = FileLedgerConfig::default().resolve_state_dir(None);
        assert!(path.to_string_lossy().contains("maker"));
    }

    #[test]
    fn test_policy_mapping() {
        let config = FileLedgerConfig {
            on_missing_session: MissingSessionPolicy::Create,
            metrics_mode: MetricsMode::Derived,
            ..Default::default()
        };
        let policy = config.policy();
        assert_eq!(policy.on_missing_session, MissingSessionPolicy::Create);
        assert_eq!(policy.metrics_mode, MetricsMode::Derived);
    }
}
