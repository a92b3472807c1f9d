//! Configuration file loading for maker
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `MAKER_*` environment variables (`__` separates sections)
//! 2. `--config <path>` specified file
//! 3. Project root: `./maker.toml` or `./.maker.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/maker/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{ConfigValidationError, FileConfig, FileLedgerConfig, FileVotingConfig};
pub use loader::ConfigLoader;
