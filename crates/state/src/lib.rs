//! Resolves where skein keeps its canonical store and how it runs.
//!
//! This crate provides utilities for:
//! - Reading environment variables for configuration.
//! - Loading persisted settings and applying environment overrides.

pub mod env;
pub mod settings;

pub use env::{
    env_no_backup, env_workers, home_dir, settings_file, store_root, ENV_HOME, ENV_NO_BACKUP,
    ENV_SETTINGS, ENV_WORKERS,
};
pub use settings::{load_settings, Settings};
