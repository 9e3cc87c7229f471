use crate::types::BermConfig;
use berm_core::{validate_extension, Limits};
use berm_fs::NativeFileSystem;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Project config file name, looked up in the base directory
pub const CONFIG_FILE_NAME: &str = "berm.toml";

/// Environment variable overriding `rules_dir`
pub const RULES_DIR_ENV: &str = "BERM_RULES_DIR";

/// Errors that can occur during config loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("TOML deserialization error in {path}: {source}")]
    TomlDe {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Security error: {0}")]
    Security(#[from] berm_core::Error),

    #[error("Config file not found at {0}")]
    ConfigNotFound(PathBuf),

    #[error("Invalid limits in {path}: {} must be greater than zero", fields.join(", "))]
    InvalidLimits { path: PathBuf, fields: Vec<String> },
}

/// Loaded Berm configuration and where it came from
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: Option<PathBuf>,
    config: BermConfig,
}

impl ConfigManager {
    /// Get the user config path (`<config dir>/berm/config.toml`)
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("berm").join("config.toml"))
    }

    /// Built-in defaults, no file involved
    pub fn defaults() -> Self {
        Self {
            config_path: None,
            config: BermConfig::default(),
        }
    }

    /// Find and load the configuration for a run rooted at `base_dir`.
    ///
    /// An explicit path must exist. Otherwise `berm.toml` in `base_dir` is
    /// used, then the user config file, then the defaults.
    pub fn discover(base_dir: &Path, explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            let path = if path.is_absolute() {
                path.to_path_buf()
            } else {
                base_dir.join(path)
            };
            return Self::load_from(&path);
        }

        let fs = NativeFileSystem::new(base_dir, Limits::default())?;
        if fs.metadata(Path::new(CONFIG_FILE_NAME))?.is_file {
            return Self::load_with_filesystem(&fs, Path::new(CONFIG_FILE_NAME));
        }

        if let Some(user_path) = Self::user_config_path().filter(|p| p.is_file()) {
            return Self::load_from(&user_path);
        }

        debug!("no config file found, using defaults");
        Ok(Self::defaults())
    }

    /// Load config from a specific path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        // Scope the filesystem to the config directory
        let config_dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let Some(file_name) = path.file_name().filter(|_| config_dir.is_dir()) else {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        };
        let fs = NativeFileSystem::new(config_dir, Limits::default())?;
        Self::load_with_filesystem(&fs, Path::new(file_name))
    }

    /// Load config through an existing filesystem
    pub fn load_with_filesystem(fs: &NativeFileSystem, path: &Path) -> Result<Self, ConfigError> {
        if !fs.metadata(path)?.is_file {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }
        validate_extension(path, &["toml"])?;

        let contents = fs.read_to_string(path)?;
        let config: BermConfig =
            toml::from_str(&contents).map_err(|source| ConfigError::TomlDe {
                path: path.to_path_buf(),
                source,
            })?;

        let zero = config.limits.zero_fields();
        if !zero.is_empty() {
            return Err(ConfigError::InvalidLimits {
                path: path.to_path_buf(),
                fields: zero.into_iter().map(String::from).collect(),
            });
        }

        debug!(path = %path.display(), "loaded config");
        Ok(Self {
            config_path: Some(fs.validate_path(path)?.into_path_buf()),
            config,
        })
    }

    /// Apply `BERM_RULES_DIR` from the process environment
    pub fn apply_env(&mut self) {
        self.apply_rules_dir_override(std::env::var_os(RULES_DIR_ENV));
    }

    /// Replace `rules_dir` with a non-empty override
    pub fn apply_rules_dir_override(&mut self, value: Option<OsString>) {
        if let Some(dir) = value.filter(|v| !v.is_empty()) {
            debug!(rules_dir = ?dir, "rules_dir overridden from environment");
            self.config.rules_dir = PathBuf::from(dir);
        }
    }

    /// Get reference to config
    pub fn config(&self) -> &BermConfig {
        &self.config
    }

    /// Consume the manager, keeping the config
    pub fn into_config(self) -> BermConfig {
        self.config
    }

    /// Path of the loaded file, if any
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }
}
