//! Persisted run settings with environment overrides.

use crate::env::{env_no_backup, env_workers, settings_file};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Settings read from `<store>/settings.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Sync worker threads; `0` picks a default.
    pub workers: usize,
    /// Back up native files before writing.
    pub backup: bool,
    /// Backups kept per native file; `None` keeps all.
    pub keep_backups: Option<usize>,
    /// Tools never synced.
    pub disabled_tools: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            workers: 0,
            backup: true,
            keep_backups: None,
            disabled_tools: Vec::new(),
        }
    }
}

impl Settings {
    /// Reads settings from `path`. A missing file gives defaults; an
    /// unparseable one is logged and also gives defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(e).with_context(|| format!("reading settings {}", path.display()))
            }
        };
        match serde_json::from_str(&text) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unparseable settings");
                Ok(Self::default())
            }
        }
    }

    /// Applies `SKEIN_WORKERS` and `SKEIN_NO_BACKUP` on top of the file.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(workers) = env_workers() {
            self.workers = workers;
        }
        if let Some(no_backup) = env_no_backup() {
            self.backup = !no_backup;
        }
        self
    }

    pub fn is_disabled(&self, tool: &str) -> bool {
        self.disabled_tools.iter().any(|t| t == tool)
    }
}

/// Loads settings from the resolved settings file with env overrides.
pub fn load_settings() -> Result<Settings> {
    let path = settings_file()?;
    Ok(Settings::from_file(&path)?.with_env_overrides())
}
