//! Configuration file loading for squadforge
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `SQUADFORGE_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./squadforge.toml` or `./.squadforge.toml`
//! 4. Global: `$XDG_CONFIG_HOME/squadforge/config.toml`
//! 5. Default values

mod file_config;
mod issue;
mod loader;

pub use file_config::{
    FileAgentConfig, FileCompletionConfig, FileConfig, FileContextConfig, FileExecutionConfig,
    FileQualityConfig, FileRetryConfig,
};
pub use issue::{ConfigError, ConfigIssue, ConfigIssueCode, IssueSeverity};
pub use loader::{ConfigLoader, ConfigSource, ENV_PREFIX};
