//! Berm configuration: `berm.toml` defaults and limit overrides.
//!
//! ```toml
//! rules_dir = ".berm"
//! format = "terminal"      # terminal | github | json
//! strict = false
//!
//! [limits]
//! max_file_size = 52428800
//! max_json_depth = 50
//! ```
//!
//! Command-line flags override the file; `BERM_RULES_DIR` overrides
//! `rules_dir` from the file.

pub mod manager;
pub mod types;

pub use manager::{ConfigError, ConfigManager, CONFIG_FILE_NAME, RULES_DIR_ENV};
pub use types::BermConfig;
