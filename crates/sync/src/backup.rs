//! Timestamped copies of native config files, taken before they are
//! rewritten.
//!
//! Backups live next to the original as `<file>.bak.<timestamp>` where the
//! timestamp is fixed-width UTC (`20250101T120000.000000000Z`), so sorting by
//! name sorts by age. Nothing is recorded outside the filesystem.

use crate::document::write_atomic;
use crate::error::{Error, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

const BACKUP_MARKER: &str = ".bak.";
const TIMESTAMP_LEN: usize = "YYYYMMDDTHHMMSS.nnnnnnnnnZ".len();

/// A backup file found on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupInfo {
    pub path: PathBuf,
    #[serde(serialize_with = "serialize_rfc3339")]
    pub modified: OffsetDateTime,
    pub size: u64,
}

fn serialize_rfc3339<S: serde::Serializer>(
    at: &OffsetDateTime,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    let text = at
        .format(&Rfc3339)
        .map_err(serde::ser::Error::custom)?;
    serializer.serialize_str(&text)
}

fn timestamp(at: OffsetDateTime) -> String {
    format!(
        "{:04}{:02}{:02}T{:02}{:02}{:02}.{:09}Z",
        at.year(),
        u8::from(at.month()),
        at.day(),
        at.hour(),
        at.minute(),
        at.second(),
        at.nanosecond()
    )
}

fn is_timestamp(s: &str) -> bool {
    s.len() == TIMESTAMP_LEN
        && s.ends_with('Z')
        && s.char_indices().all(|(i, c)| match i {
            8 => c == 'T',
            15 => c == '.',
            25 => c == 'Z',
            _ => c.is_ascii_digit(),
        })
}

fn backup_prefix(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| format!("{}{}", n, BACKUP_MARKER))
        .ok_or_else(|| Error::InvalidArgument(format!("not a file path: {}", path.display())))
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

/// Lists backups of `path`, oldest first.
pub fn list_backups(path: &Path) -> Result<Vec<BackupInfo>> {
    let prefix = backup_prefix(path)?;
    let dir = parent_dir(path);
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(Error::io("list", dir, e)),
    };

    let mut backups = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::io("list", dir, e))?;
        let name = entry.file_name();
        let Some(stamp) = name.to_str().and_then(|n| n.strip_prefix(&prefix)) else {
            continue;
        };
        if !is_timestamp(stamp) {
            continue;
        }
        let metadata = entry
            .metadata()
            .map_err(|e| Error::io("stat", &entry.path(), e))?;
        if !metadata.is_file() {
            continue;
        }
        let modified = metadata
            .modified()
            .map(OffsetDateTime::from)
            .unwrap_or(OffsetDateTime::UNIX_EPOCH);
        backups.push(BackupInfo {
            path: entry.path(),
            modified,
            size: metadata.len(),
        });
    }
    backups.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
    Ok(backups)
}

/// Copies `path` to a new timestamped backup.
///
/// Returns `None` when `path` does not exist, or when its contents equal the
/// most recent backup. Older backups are not compared.
pub fn create_backup(path: &Path) -> Result<Option<PathBuf>> {
    let contents = match fs::read(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(Error::io("read", path, e)),
    };

    if let Some(latest) = list_backups(path)?.pop() {
        let previous = fs::read(&latest.path).map_err(|e| Error::io("read", &latest.path, e))?;
        if previous == contents {
            tracing::debug!(path = %path.display(), "unchanged since last backup");
            return Ok(None);
        }
    }

    let prefix = backup_prefix(path)?;
    let dir = parent_dir(path);
    let mut at = OffsetDateTime::now_utc();
    let mut target = dir.join(format!("{}{}", prefix, timestamp(at)));
    while target.exists() {
        at += time::Duration::nanoseconds(1);
        target = dir.join(format!("{}{}", prefix, timestamp(at)));
    }

    fs::write(&target, &contents).map_err(|e| Error::io("write backup", &target, e))?;
    tracing::info!(path = %path.display(), backup = %target.display(), "created backup");
    Ok(Some(target))
}

/// Restores the most recent backup over `path`. Returns the backup used.
pub fn restore_backup(path: &Path) -> Result<PathBuf> {
    let latest = list_backups(path)?
        .pop()
        .ok_or_else(|| Error::NoBackupFound {
            path: path.to_path_buf(),
        })?;
    restore_from(path, &latest.path)?;
    Ok(latest.path)
}

/// Restores a specific backup of `path`.
pub fn restore_from(path: &Path, backup: &Path) -> Result<()> {
    let prefix = backup_prefix(path)?;
    let belongs = backup
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.strip_prefix(&prefix))
        .is_some_and(is_timestamp);
    if !belongs {
        return Err(Error::InvalidArgument(format!(
            "{} is not a backup of {}",
            backup.display(),
            path.display()
        )));
    }
    let contents = fs::read(backup).map_err(|e| Error::io("read backup", backup, e))?;
    write_atomic(path, &contents)?;
    tracing::info!(path = %path.display(), backup = %backup.display(), "restored backup");
    Ok(())
}

/// Deletes all but the newest `keep` backups of `path`. Returns the removed
/// paths.
pub fn prune_backups(path: &Path, keep: usize) -> Result<Vec<PathBuf>> {
    let backups = list_backups(path)?;
    let excess = backups.len().saturating_sub(keep);
    let mut removed = Vec::with_capacity(excess);
    for backup in backups.into_iter().take(excess) {
        fs::remove_file(&backup.path).map_err(|e| Error::io("remove backup", &backup.path, e))?;
        removed.push(backup.path);
    }
    if !removed.is_empty() {
        tracing::debug!(path = %path.display(), removed = removed.len(), "pruned backups");
    }
    Ok(removed)
}
