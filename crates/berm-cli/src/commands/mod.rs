//! Subcommand implementations.

pub mod check;
pub mod init;
pub mod rules;

pub use check::{run_check, CheckOptions};
pub use init::run_init;
pub use rules::{run_explain, run_validate_rules};

use anyhow::{Context, Result};
use berm_config::{BermConfig, ConfigManager};
use berm_core::Limits;
use berm_fs::NativeFileSystem;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Everything a command needs: the containment root and the merged config.
#[derive(Debug, Clone)]
pub struct RunContext {
    fs: NativeFileSystem,
    config: BermConfig,
}

impl RunContext {
    /// Resolve the base directory, load the config and apply `BERM_RULES_DIR`.
    pub fn load(base_dir: Option<&Path>, config_path: Option<&Path>) -> Result<Self> {
        let base_dir = match base_dir {
            Some(dir) => dir.to_path_buf(),
            None => std::env::current_dir().context("Failed to get current working directory")?,
        };

        let mut manager = ConfigManager::discover(&base_dir, config_path)
            .context("Failed to load configuration")?;
        manager.apply_env();
        if let Some(path) = manager.config_path() {
            debug!(path = %path.display(), "using config file");
        }

        Self::from_config(&base_dir, manager.into_config())
    }

    /// Build a context from an already merged config.
    pub fn from_config(base_dir: &Path, config: BermConfig) -> Result<Self> {
        let fs = NativeFileSystem::new(base_dir, config.limits)
            .with_context(|| format!("Invalid base directory {}", base_dir.display()))?;
        Ok(Self { fs, config })
    }

    pub fn fs(&self) -> &NativeFileSystem {
        &self.fs
    }

    pub fn config(&self) -> &BermConfig {
        &self.config
    }

    pub fn limits(&self) -> &Limits {
        &self.config.limits
    }

    /// Command-line value if given, else the configured rules directory.
    pub fn rules_dir(&self, flag: Option<&Path>) -> PathBuf {
        flag.map(Path::to_path_buf)
            .unwrap_or_else(|| self.config.rules_dir.clone())
    }
}
