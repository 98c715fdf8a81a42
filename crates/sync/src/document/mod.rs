//! Schema-free native documents and the ownership-marking merge.
//!
//! Every format follows the same write algorithm: load (missing file is an
//! empty document), drop entries carrying the managed marker from the target
//! section, insert the new entries with the marker attached, write back.
//! Entries without the marker are never modified or removed.

pub mod files;
pub mod json;
pub mod markdown;
pub mod toml;

pub use files::{FileEntry, FileSet};
pub use json::JsonDocument;
pub use markdown::MarkdownFile;
pub use toml::TomlDocument;

use crate::error::{Error, Result};
use crate::report::{SkipReason, WriteReport};
use std::collections::HashSet;
use std::io::Write;
use std::path::Path;

/// Reserved key written onto every entry the engine owns.
pub const MANAGED_KEY: &str = "_managedBy";
/// Value stored under [`MANAGED_KEY`].
pub const MANAGED_VALUE: &str = "skein";

/// Reads a file, returning `None` when it does not exist.
pub(crate) fn read_if_exists(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
            Err(Error::malformed(path, "file is not valid UTF-8"))
        }
        Err(e) => Err(Error::io("read", path, e)),
    }
}

/// Writes `contents` to `path` through a sibling temp file and rename, so a
/// failed write never leaves a truncated file behind.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(|e| Error::io("create directory", parent, e))?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .map_err(|e| Error::io("create temp file in", parent, e))?;
    tmp.write_all(contents)
        .map_err(|e| Error::io("write", tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| Error::io("flush", path, e))?;
    tmp.persist(path)
        .map_err(|e| Error::io("replace", path, e.error))?;
    Ok(())
}

/// Reduces a resource name to something safe to use as a file name.
///
/// Only alphanumerics, `-`, `_` and `.` survive; leading dots are stripped so
/// a name can never address a parent directory or a hidden file.
pub fn sanitize_name(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect();
    kept.trim_start_matches('.').to_string()
}

/// Orders entries by name and drops repeated names (first one wins), noting
/// each dropped duplicate in `report`.
pub(crate) fn plan_entries<T>(entries: Vec<(String, T)>, report: &mut WriteReport) -> Vec<(String, T)> {
    let mut seen = HashSet::new();
    let mut planned = Vec::with_capacity(entries.len());
    for (name, value) in entries {
        if !seen.insert(name.clone()) {
            report.skip(SkipReason::Duplicate { item: name });
            continue;
        }
        planned.push((name, value));
    }
    planned.sort_by(|a, b| a.0.cmp(&b.0));
    planned
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn sanitize_name_removes_path_traversal() {
        assert_eq!(sanitize_name("../../etc/passwd"), "etcpasswd");
        assert_eq!(sanitize_name("my-rule_1"), "my-rule_1");
        assert_eq!(sanitize_name(".hidden"), "hidden");
        assert_eq!(sanitize_name("v1.2"), "v1.2");
        assert_eq!(sanitize_name("../"), "");
    }

    #[test]
    fn plan_entries_sorts_and_dedups() {
        let mut report = WriteReport::default();
        let planned = plan_entries(
            vec![("b".to_string(), 1), ("a".to_string(), 2), ("b".to_string(), 3)],
            &mut report,
        );
        assert_eq!(planned, vec![("a".to_string(), 2), ("b".to_string(), 1)]);
        assert_eq!(report.skipped, vec![SkipReason::Duplicate { item: "b".into() }]);
    }

    #[test]
    fn write_atomic_creates_parents_and_replaces() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("nested/dir/file.json");
        write_atomic(&path, b"one").unwrap();
        write_atomic(&path, b"two").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "two");
        // Only the target file remains; no stray temp files.
        assert_eq!(std::fs::read_dir(path.parent().unwrap()).unwrap().count(), 1);
    }

    #[test]
    fn read_if_exists_missing_is_none() {
        let tmp = tempdir().unwrap();
        assert!(read_if_exists(&tmp.path().join("nope")).unwrap().is_none());
    }
}
