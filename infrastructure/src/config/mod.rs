//! Configuration file loading for toolgate
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `TOOLGATE_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./toolgate.toml` or `./.toolgate.toml`
//! 4. Global: `$XDG_CONFIG_HOME/toolgate/config.toml`
//! 5. Default values

mod env_source;
mod error;
mod file_config;
mod loader;

pub use env_source::EnvConfigSource;
pub use error::ConfigError;
pub use file_config::{
    BackendKind, ConfigIssue, FileAlertsConfig, FileBackendConfig, FileConfig, FileHealthConfig,
    FileOrchestratorConfig, FileToolConfig, IssueSeverity,
};
pub use loader::{ConfigLoader, ENV_PREFIX};
