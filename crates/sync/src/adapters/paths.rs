//! Base directories tool configuration is resolved from.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// The two roots every adapter resolves its paths from.
///
/// Tools that follow the platform convention (Claude Desktop, Zed, VS Code,
/// OpenCode) live under `config_dir`; the rest use dot-directories in `home`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub home: PathBuf,
    pub config_dir: PathBuf,
}

impl ToolPaths {
    pub fn new(home: impl Into<PathBuf>, config_dir: impl Into<PathBuf>) -> Self {
        Self {
            home: home.into(),
            config_dir: config_dir.into(),
        }
    }

    /// Resolves the current user's home and configuration directories.
    pub fn from_env() -> Result<Self> {
        let home = dirs::home_dir().ok_or_else(|| {
            Error::InvalidArgument("could not determine home directory".to_string())
        })?;
        let config_dir = dirs::config_dir().unwrap_or_else(|| home.join(".config"));
        Ok(Self { home, config_dir })
    }

    /// Places both roots under `root` (`<root>/home`, `<root>/config`).
    pub fn under(root: &Path) -> Self {
        Self::new(root.join("home"), root.join("config"))
    }

    pub fn home(&self, rel: &str) -> PathBuf {
        self.home.join(rel)
    }

    pub fn config(&self, rel: &str) -> PathBuf {
        self.config_dir.join(rel)
    }
}
