//! Shared types, error model, and configuration for bookpipe.
//!
//! This crate is the foundation depended on by the other bookpipe crates.
//! It provides:
//! - [`BookPipeError`], the unified error type
//! - Domain types ([`StepId`], [`StepSet`], [`BookJob`], [`BookPaths`], [`ChapterSelection`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CONFIG_FILE_NAME, DefaultsConfig, PathsConfig, RuntimeConfig, ScriptsConfig,
    config_dir, load_config, load_config_from,
};
pub use error::{BookPipeError, Result};
pub use types::{BookJob, BookPaths, ChapterSelection, StepId, StepSet};
