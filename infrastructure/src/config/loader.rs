//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use super::issue::ConfigError;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Prefix of environment variable overrides, e.g.
/// `SQUADFORGE_COMPLETION__DEFAULT_MODEL=gpt-4o`.
pub const ENV_PREFIX: &str = "SQUADFORGE_";

const PROJECT_FILES: [&str; 2] = ["squadforge.toml", ".squadforge.toml"];

/// A configuration file location and whether it exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSource {
    pub label: &'static str,
    pub path: PathBuf,
    pub found: bool,
}

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. `SQUADFORGE_*` environment variables (`__` separates sections)
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./squadforge.toml` or `./.squadforge.toml`
    /// 4. Global: `$XDG_CONFIG_HOME/squadforge/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&Path>) -> Result<FileConfig, ConfigError> {
        Self::load_from(
            Self::global_config_path().as_deref(),
            Path::new("."),
            config_path,
        )
    }

    /// Same as [`ConfigLoader::load`] with explicit global and project
    /// locations.
    pub fn load_from(
        global: Option<&Path>,
        project_dir: &Path,
        explicit: Option<&Path>,
    ) -> Result<FileConfig, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(path) = global
            && path.exists()
        {
            debug!("Merging global config {}", path.display());
            figment = figment.merge(Toml::file(path));
        }

        if let Some(path) = Self::project_config_path_in(project_dir) {
            debug!("Merging project config {}", path.display());
            figment = figment.merge(Toml::file(path));
        }

        if let Some(path) = explicit {
            if !path.exists() {
                return Err(ConfigError::Load(Box::new(figment::Error::from(format!(
                    "config file not found: {}",
                    path.display()
                )))));
            }
            debug!("Merging explicit config {}", path.display());
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        figment.extract().map_err(|e| ConfigError::Load(Box::new(e)))
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    /// `$XDG_CONFIG_HOME/squadforge/config.toml`, falling back to
    /// `~/.config/squadforge/config.toml`.
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("squadforge").join("config.toml"))
    }

    /// The project-level config file in the current directory, if any.
    pub fn project_config_path() -> Option<PathBuf> {
        Self::project_config_path_in(Path::new("."))
    }

    fn project_config_path_in(dir: &Path) -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.exists())
    }

    /// Every file location consulted, lowest priority first.
    pub fn sources(explicit: Option<&Path>) -> Vec<ConfigSource> {
        let mut sources = Vec::new();
        if let Some(path) = Self::global_config_path() {
            sources.push(ConfigSource {
                label: "Global",
                found: path.exists(),
                path,
            });
        }
        sources.push(match Self::project_config_path() {
            Some(path) => ConfigSource {
                label: "Project",
                path,
                found: true,
            },
            None => ConfigSource {
                label: "Project",
                path: PathBuf::from(PROJECT_FILES[0]),
                found: false,
            },
        });
        if let Some(path) = explicit {
            sources.push(ConfigSource {
                label: "Explicit",
                path: path.to_path_buf(),
                found: path.exists(),
            });
        }
        sources
    }
}
