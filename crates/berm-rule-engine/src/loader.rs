//! Rule loading from a directory of JSON files
//!
//! Every file goes through the scoped filesystem, so path, size and depth
//! checks run before a rule is parsed. Any failure aborts the whole load.

use crate::constants::RULE_FILE_EXTENSION;
use crate::rule::{parse_rule, Rule};
use crate::{Result, RuleError};
use berm_core::validate_extension;
use berm_fs::{DiscoveryOptions, NativeFileSystem};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Loads rules through a scoped filesystem
#[derive(Debug, Clone)]
pub struct RuleLoader {
    fs: NativeFileSystem,
}

impl RuleLoader {
    pub fn new(fs: NativeFileSystem) -> Self {
        Self { fs }
    }

    /// Load every `*.json` rule under `dir`, recursively.
    ///
    /// Rules are returned sorted by id.
    ///
    /// # Errors
    ///
    /// - [`RuleError::Security`] if `dir` is not a directory inside the root,
    ///   or if discovery meets a symlink or a directory past the depth limit
    /// - [`RuleError::NoRuleFiles`] if no rule file is found
    /// - [`RuleError::LoadError`] naming the first file that fails
    /// - [`RuleError::DuplicateRuleId`] if two files share an id
    pub fn load_rule_set(&self, dir: &Path) -> Result<Vec<Rule>> {
        let rules_fs = self.fs.scoped(dir)?;
        let options = DiscoveryOptions::from_limits(rules_fs.limits());
        let files =
            rules_fs.discover_files(rules_fs.root(), &[RULE_FILE_EXTENSION], &options)?;

        if files.is_empty() {
            return Err(RuleError::NoRuleFiles {
                path: dir.display().to_string(),
            });
        }

        let mut seen: HashMap<String, PathBuf> = HashMap::new();
        let mut rules = Vec::with_capacity(files.len());
        for path in files {
            let rule = load_from_file(&rules_fs, &path)?;
            if let Some(first) = seen.get(&rule.id) {
                return Err(RuleError::DuplicateRuleId {
                    id: rule.id,
                    first: first.display().to_string(),
                    second: path.display().to_string(),
                });
            }
            seen.insert(rule.id.clone(), path);
            rules.push(rule);
        }

        rules.sort_by(|a, b| a.id.cmp(&b.id));
        info!(dir = %rules_fs.root().display(), count = rules.len(), "loaded rules");

        Ok(rules)
    }

    /// Load one rule file.
    pub fn load_single_rule(&self, path: &Path) -> Result<Rule> {
        load_from_file(&self.fs, path)
    }
}

fn load_from_file(fs: &NativeFileSystem, path: &Path) -> Result<Rule> {
    let wrap = |source: Box<dyn std::error::Error + Send + Sync>| RuleError::LoadError {
        path: path.display().to_string(),
        source,
    };

    validate_extension(path, &[RULE_FILE_EXTENSION]).map_err(|e| wrap(Box::new(e)))?;
    let raw = fs.read_json(path).map_err(|e| wrap(Box::new(e)))?;
    let rule = parse_rule(&raw, fs.limits()).map_err(|e| wrap(Box::new(e)))?;

    debug!(path = %path.display(), rule = %rule.id, "loaded rule");
    Ok(rule)
}
