//! Directories where each resource is its own file.
//!
//! The merge works like the keyed-section merge, with files as entries:
//! a file is engine-owned only if its content carries the managed marker.

use super::{plan_entries, sanitize_name, write_atomic};
use crate::error::{Error, Result};
use crate::report::{SkipReason, WriteReport};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    /// `<dir>/<name>.<ext>`
    Flat { extension: &'static str },
    /// `<dir>/<name>/<file_name>`
    Nested { file_name: &'static str },
}

/// A directory holding one file per resource.
#[derive(Debug, Clone)]
pub struct FileSet {
    dir: PathBuf,
    layout: Layout,
}

/// A file found in a [`FileSet`].
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub name: String,
    pub path: PathBuf,
    pub content: String,
}

impl FileSet {
    /// `<dir>/<name>.<extension>` files.
    pub fn flat(dir: PathBuf, extension: &'static str) -> Self {
        Self {
            dir,
            layout: Layout::Flat { extension },
        }
    }

    /// `<dir>/<name>/<file_name>` files, e.g. `skills/<name>/SKILL.md`.
    pub fn nested(dir: PathBuf, file_name: &'static str) -> Self {
        Self {
            dir,
            layout: Layout::Nested { file_name },
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, safe_name: &str) -> PathBuf {
        match self.layout {
            Layout::Flat { extension } => self.dir.join(format!("{}.{}", safe_name, extension)),
            Layout::Nested { file_name } => self.dir.join(safe_name).join(file_name),
        }
    }

    fn name_of(&self, path: &Path) -> Option<String> {
        match self.layout {
            Layout::Flat { extension } => {
                if !path.extension().is_some_and(|e| e == extension) {
                    return None;
                }
                path.file_stem()?.to_str().map(String::from)
            }
            Layout::Nested { file_name } => {
                if !path.file_name().is_some_and(|n| n == file_name) {
                    return None;
                }
                path.parent()?.file_name()?.to_str().map(String::from)
            }
        }
    }

    /// Lists the files in the set. Missing directory is empty; files that
    /// cannot be read as UTF-8 are logged and left out.
    pub fn scan(&self) -> Result<Vec<FileEntry>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let depth = match self.layout {
            Layout::Flat { .. } => 1,
            Layout::Nested { .. } => 2,
        };

        let mut entries = Vec::new();
        for entry in WalkDir::new(&self.dir)
            .min_depth(depth)
            .max_depth(depth)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(self.dir.as_path()).to_path_buf();
                match e.into_io_error() {
                    Some(io) => Error::io("scan", &path, io),
                    None => Error::malformed(&path, "filesystem loop"),
                }
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let Some(name) = self.name_of(path) else {
                continue;
            };
            match fs::read_to_string(path) {
                Ok(content) => entries.push(FileEntry {
                    name,
                    path: path.to_path_buf(),
                    content,
                }),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable file");
                }
            }
        }
        Ok(entries)
    }

    /// Makes the managed files in the set exactly `entries` (name, content).
    ///
    /// Files whose content fails `is_managed` are never touched; a planned
    /// entry colliding with one is skipped as user-owned.
    pub fn merge(
        &self,
        entries: Vec<(String, String)>,
        is_managed: impl Fn(&str) -> bool,
        report: &mut WriteReport,
    ) -> Result<()> {
        let existing = self.scan()?;

        let mut sanitized = Vec::with_capacity(entries.len());
        for (name, content) in entries {
            let safe = sanitize_name(&name);
            if safe.is_empty() {
                report.skip(SkipReason::InvalidName { item: name });
                continue;
            }
            sanitized.push((safe, content));
        }
        let planned = plan_entries(sanitized, report);

        let mut managed: HashMap<&str, &FileEntry> = HashMap::new();
        let mut unmanaged: HashMap<&str, &FileEntry> = HashMap::new();
        for entry in &existing {
            if is_managed(&entry.content) {
                managed.insert(entry.name.as_str(), entry);
            } else {
                unmanaged.insert(entry.name.as_str(), entry);
            }
        }

        for (name, entry) in &managed {
            if planned.iter().any(|(n, _)| n == name) {
                continue;
            }
            self.remove(&entry.path)?;
            report.removed += 1;
            report.changed = true;
        }

        for (name, content) in planned {
            if unmanaged.contains_key(name.as_str()) {
                report.skip(SkipReason::UserOwned { item: name });
                continue;
            }
            report.written += 1;
            if managed
                .get(name.as_str())
                .is_some_and(|existing| existing.content == content)
            {
                continue;
            }
            let path = self.path_for(&name);
            write_atomic(&path, content.as_bytes())?;
            report.changed = true;
            tracing::debug!(path = %path.display(), "wrote managed file");
        }
        Ok(())
    }

    fn remove(&self, path: &Path) -> Result<()> {
        fs::remove_file(path).map_err(|e| Error::io("remove", path, e))?;
        if let Layout::Nested { .. } = self.layout {
            if let Some(parent) = path.parent() {
                // Only succeeds when the skill directory is now empty.
                let _ = fs::remove_dir(parent);
            }
        }
        tracing::debug!(path = %path.display(), "removed managed file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const MARK: &str = "<!-- managed -->";

    fn managed(s: &str) -> bool {
        s.starts_with(MARK)
    }

    #[test]
    fn flat_merge_replaces_only_managed_files() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path().join("commands");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("mine.md"), "hand written").unwrap();
        fs::write(dir.join("stale.md"), format!("{MARK}\nold")).unwrap();
        fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let set = FileSet::flat(dir.clone(), "md");
        let mut report = WriteReport::default();
        set.merge(
            vec![
                ("fresh".into(), format!("{MARK}\nnew")),
                ("mine".into(), format!("{MARK}\nclobber")),
            ],
            managed,
            &mut report,
        )
        .unwrap();

        assert_eq!(fs::read_to_string(dir.join("mine.md")).unwrap(), "hand written");
        assert!(!dir.join("stale.md").exists());
        assert!(dir.join("fresh.md").exists());
        assert!(dir.join("notes.txt").exists());
        assert_eq!(report.written, 1);
        assert_eq!(report.removed, 1);
        assert_eq!(report.skipped, vec![SkipReason::UserOwned { item: "mine".into() }]);
    }

    #[test]
    fn nested_merge_removes_empty_skill_dirs_but_keeps_extra_files() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path().join("skills");
        fs::create_dir_all(dir.join("gone")).unwrap();
        fs::create_dir_all(dir.join("kept")).unwrap();
        fs::write(dir.join("gone/SKILL.md"), format!("{MARK}\n")).unwrap();
        fs::write(dir.join("kept/SKILL.md"), format!("{MARK}\n")).unwrap();
        fs::write(dir.join("kept/helper.py"), "print()").unwrap();

        let set = FileSet::nested(dir.clone(), "SKILL.md");
        let mut report = WriteReport::default();
        set.merge(vec![], managed, &mut report).unwrap();

        assert!(!dir.join("gone").exists());
        assert!(dir.join("kept/helper.py").exists());
        assert!(!dir.join("kept/SKILL.md").exists());
        assert_eq!(report.removed, 2);
    }

    #[test]
    fn unchanged_content_is_not_rewritten() {
        let tmp = tempdir().unwrap();
        let set = FileSet::flat(tmp.path().join("rules"), "mdc");
        let content = format!("{MARK}\nbody");

        let mut first = WriteReport::default();
        set.merge(vec![("r".into(), content.clone())], managed, &mut first)
            .unwrap();
        let mut second = WriteReport::default();
        set.merge(vec![("r".into(), content)], managed, &mut second)
            .unwrap();

        assert!(first.changed);
        assert!(!second.changed);
        assert_eq!(second.written, 1);
    }

    #[test]
    fn unsafe_names_are_sanitized_or_rejected() {
        let tmp = tempdir().unwrap();
        let set = FileSet::flat(tmp.path().join("c"), "md");
        let mut report = WriteReport::default();
        set.merge(
            vec![
                ("../escape".into(), format!("{MARK}\n")),
                ("..".into(), format!("{MARK}\n")),
            ],
            managed,
            &mut report,
        )
        .unwrap();

        assert!(tmp.path().join("c/escape.md").exists());
        assert!(!tmp.path().join("escape.md").exists());
        assert_eq!(report.skipped, vec![SkipReason::InvalidName { item: "..".into() }]);
    }

    #[test]
    fn scan_of_missing_dir_is_empty() {
        let tmp = tempdir().unwrap();
        let set = FileSet::nested(tmp.path().join("nope"), "SKILL.md");
        assert!(set.scan().unwrap().is_empty());
    }
}
