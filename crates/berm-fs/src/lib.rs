//! Scoped filesystem access for Berm.
//!
//! [`NativeFileSystem`] is the only way the rest of the workspace reads
//! files. It is bound to a validated root directory and runs every path
//! through the `berm-core` sanitizer before a single byte is read.
//!
//! # Example
//!
//! ```no_run
//! use berm_core::Limits;
//! use berm_fs::NativeFileSystem;
//! use std::path::Path;
//!
//! let fs = NativeFileSystem::new(".", Limits::default())?;
//! let plan = fs.read_json(Path::new("plan.json"))?;
//! println!("{}", plan["format_version"]);
//! # Ok::<(), berm_core::Error>(())
//! ```

mod file_system;
pub use file_system::{DiscoveryOptions, FileMetadata};

pub mod native;
pub use native::NativeFileSystem;
