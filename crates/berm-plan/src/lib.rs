//! Berm Plan - Terraform plan JSON to normalized resources.
//!
//! Reads the output of `terraform show -json` through the scoped filesystem
//! and keeps the resources a deployment would create or update.
//!
//! # Example
//!
//! ```no_run
//! use berm_core::Limits;
//! use berm_fs::NativeFileSystem;
//! use std::path::Path;
//!
//! let fs = NativeFileSystem::new(".", Limits::default())?;
//! let resources = berm_plan::load_plan(&fs, Path::new("plan.json"))?;
//! println!("{} resources to check", resources.len());
//! # Ok::<(), berm_plan::PlanError>(())
//! ```

pub mod terraform;

pub use terraform::{load_plan, resources_from_plan, PLAN_FILE_EXTENSION};

/// Result type for plan loading
pub type Result<T> = std::result::Result<T, PlanError>;

/// Error types for plan loading
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("Invalid plan {path}: {reason}")]
    InvalidPlan { path: String, reason: String },

    #[error(transparent)]
    Security(#[from] berm_core::Error),
}
