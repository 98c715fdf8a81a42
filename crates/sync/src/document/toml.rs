//! TOML native documents, edited in place with `toml_edit` so comments and
//! formatting outside the managed tables survive.

use super::{plan_entries, read_if_exists, write_atomic, MANAGED_KEY, MANAGED_VALUE};
use crate::error::{Error, Result};
use crate::report::{SkipReason, WriteReport};
use std::path::{Path, PathBuf};
use toml_edit::{value, DocumentMut, Item, Table, TableLike};

#[derive(Debug, Clone)]
pub struct TomlDocument {
    path: PathBuf,
    doc: DocumentMut,
    original: Option<String>,
}

/// Returns true if `item` is a table carrying the managed marker.
pub fn is_managed(item: &Item) -> bool {
    item.as_table_like()
        .and_then(|t| t.get(MANAGED_KEY))
        .and_then(Item::as_str)
        .is_some_and(|v| v == MANAGED_VALUE)
}

impl TomlDocument {
    pub fn load(path: &Path) -> Result<Self> {
        let original = read_if_exists(path)?;
        let doc = match original.as_deref() {
            None => DocumentMut::new(),
            Some(text) => text
                .parse::<DocumentMut>()
                .map_err(|e| Error::malformed(path, e.to_string()))?,
        };
        Ok(Self {
            path: path.to_path_buf(),
            doc,
            original,
        })
    }

    /// Parses a document from text; used for per-resource TOML files.
    pub fn parse(path: &Path, text: &str) -> Result<Self> {
        let doc = text
            .parse::<DocumentMut>()
            .map_err(|e| Error::malformed(path, e.to_string()))?;
        Ok(Self {
            path: path.to_path_buf(),
            doc,
            original: Some(text.to_string()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn root(&self) -> &Table {
        self.doc.as_table()
    }

    /// Returns the table at `key_path`, or `None` if any segment is absent.
    pub fn section(&self, key_path: &[&str]) -> Result<Option<&dyn TableLike>> {
        let mut current: &dyn TableLike = self.doc.as_table();
        for segment in key_path {
            match current.get(segment) {
                None => return Ok(None),
                Some(item) => match item.as_table_like() {
                    Some(table) => current = table,
                    None => {
                        return Err(Error::malformed(
                            &self.path,
                            format!("expected '{}' to be a table", segment),
                        ))
                    }
                },
            }
        }
        Ok(Some(current))
    }

    /// Entries of the section at `key_path`, in document order.
    pub fn entries(&self, key_path: &[&str]) -> Result<Vec<(&str, &Item)>> {
        Ok(self
            .section(key_path)?
            .map(|t| t.iter().collect())
            .unwrap_or_default())
    }

    fn section_mut(&mut self, key_path: &[&str]) -> Result<&mut Table> {
        let path = &self.path;
        let mut current = self.doc.as_table_mut();
        for segment in key_path {
            let item = current.entry(segment).or_insert_with(|| {
                let mut table = Table::new();
                table.set_implicit(true);
                Item::Table(table)
            });
            current = item.as_table_mut().ok_or_else(|| {
                Error::malformed(path, format!("expected '{}' to be a table", segment))
            })?;
        }
        Ok(current)
    }

    /// Replaces the managed tables under `key_path` with `entries`.
    pub fn merge_section(
        &mut self,
        key_path: &[&str],
        entries: Vec<(String, Table)>,
        report: &mut WriteReport,
    ) -> Result<()> {
        let planned = plan_entries(entries, report);
        if planned.is_empty() && self.section(key_path)?.is_none() {
            return Ok(());
        }

        let section = self.section_mut(key_path)?;
        report.removed += section
            .iter()
            .filter(|(name, item)| {
                is_managed(item) && !planned.iter().any(|(n, _)| n.as_str() == *name)
            })
            .count();
        section.retain(|_, item| !is_managed(item));

        for (name, mut table) in planned {
            if section.contains_key(&name) {
                report.skip(SkipReason::UserOwned { item: name });
                continue;
            }
            table.insert(MANAGED_KEY, value(MANAGED_VALUE));
            section.insert(&name, Item::Table(table));
            report.written += 1;
        }
        Ok(())
    }

    /// Reads a top-level string key; used for per-resource TOML files.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.doc.get(key).and_then(Item::as_str)
    }

    pub fn render(&self) -> String {
        self.doc.to_string()
    }

    /// Writes the document back if it changed. Returns whether it did.
    pub fn save(&self) -> Result<bool> {
        if self.original.is_none() && self.doc.as_table().is_empty() {
            return Ok(false);
        }
        let text = self.render();
        if self.original.as_deref() == Some(text.as_str()) {
            return Ok(false);
        }
        write_atomic(&self.path, text.as_bytes())?;
        tracing::debug!(path = %self.path.display(), "wrote TOML document");
        Ok(true)
    }
}

/// Reads an array of strings from a table, skipping non-strings.
pub(crate) fn string_list(table: &dyn TableLike, key: &str) -> Vec<String> {
    table
        .get(key)
        .and_then(Item::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

/// Reads a table of string values, skipping non-strings.
pub(crate) fn string_map(
    table: &dyn TableLike,
    key: &str,
) -> std::collections::BTreeMap<String, String> {
    table
        .get(key)
        .and_then(Item::as_table_like)
        .map(|t| {
            t.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.to_string(), s.to_string())))
                .collect()
        })
        .unwrap_or_default()
}
