use anyhow::Result;
use std::path::PathBuf;

/// Canonical store root override.
pub const ENV_HOME: &str = "SKEIN_HOME";
/// Worker thread count for sync.
pub const ENV_WORKERS: &str = "SKEIN_WORKERS";
/// Disables backups when truthy.
pub const ENV_NO_BACKUP: &str = "SKEIN_NO_BACKUP";
/// Settings file override.
pub const ENV_SETTINGS: &str = "SKEIN_SETTINGS";

/// Returns the user's home directory.
pub fn home_dir() -> Result<PathBuf> {
    #[cfg(unix)]
    if let Ok(home) = std::env::var("HOME") {
        return Ok(PathBuf::from(home));
    }
    dirs::home_dir().ok_or_else(|| anyhow::anyhow!("home directory not found"))
}

/// Returns the canonical store root: `SKEIN_HOME`, else `~/.skein`.
pub fn store_root() -> Result<PathBuf> {
    if let Some(custom) = std::env::var_os(ENV_HOME).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(custom));
    }
    Ok(home_dir()?.join(".skein"))
}

/// Returns the settings file path: `SKEIN_SETTINGS`, else
/// `<store>/settings.json`.
pub fn settings_file() -> Result<PathBuf> {
    if let Some(custom) = std::env::var_os(ENV_SETTINGS).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(custom));
    }
    Ok(store_root()?.join("settings.json"))
}

/// Returns `SKEIN_WORKERS` when it parses as a count.
pub fn env_workers() -> Option<usize> {
    std::env::var(ENV_WORKERS)
        .ok()
        .and_then(|s| s.trim().parse().ok())
}

/// Checks if `SKEIN_NO_BACKUP` is set to true.
pub fn env_no_backup() -> Option<bool> {
    std::env::var(ENV_NO_BACKUP)
        .ok()
        .map(|s| s == "1" || s.eq_ignore_ascii_case("true"))
}
