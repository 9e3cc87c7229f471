use berm_core::{Limits, OutputContext};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Contents of `berm.toml`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct BermConfig {
    /// Directory containing rule files, relative to the base directory
    pub rules_dir: PathBuf,

    /// Default report format
    pub format: OutputContext,

    /// Treat warnings as blocking
    pub strict: bool,

    /// Overrides for the sanitization limits
    pub limits: Limits,
}

impl Default for BermConfig {
    fn default() -> Self {
        Self {
            rules_dir: default_rules_dir(),
            format: OutputContext::default(),
            strict: false,
            limits: Limits::default(),
        }
    }
}

fn default_rules_dir() -> PathBuf {
    PathBuf::from(".berm")
}
