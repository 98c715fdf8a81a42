//! Error type for the sync engine.

use std::path::{Path, PathBuf};

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by adapters, backups and the orchestrators.
///
/// Per-tool and per-item failures are carried inside reports; only the
/// variants that prevent producing any result are returned at call level.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An existing native document could not be parsed. The file is left
    /// untouched.
    #[error("malformed document {}: {message}", path.display())]
    Malformed { path: PathBuf, message: String },

    #[error("failed to {action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no backup found for {}", path.display())]
    NoBackupFound { path: PathBuf },

    #[error("failed to serialize {what}: {message}")]
    Serialize { what: String, message: String },

    #[error("no adapters registered")]
    NoAdapters,

    #[error("unknown tool '{0}'")]
    UnknownTool(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("store error: {0}")]
    Store(String),
}

impl Error {
    pub(crate) fn io(action: &'static str, path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn malformed(path: &Path, message: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    /// Returns true when a restore found nothing to restore from.
    pub fn is_no_backup(&self) -> bool {
        matches!(self, Self::NoBackupFound { .. })
    }
}
