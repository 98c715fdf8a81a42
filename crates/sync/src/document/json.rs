//! JSON native documents.

use super::{plan_entries, read_if_exists, write_atomic, MANAGED_KEY, MANAGED_VALUE};
use crate::error::{Error, Result};
use crate::report::{SkipReason, WriteReport};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// A JSON config file held as an order-preserving tree.
#[derive(Debug, Clone)]
pub struct JsonDocument {
    path: PathBuf,
    root: Map<String, Value>,
    original: Option<String>,
    relaxed: bool,
}

/// Returns true if `value` is an object carrying the managed marker.
pub fn is_managed(value: &Value) -> bool {
    value
        .get(MANAGED_KEY)
        .and_then(Value::as_str)
        .is_some_and(|v| v == MANAGED_VALUE)
}

impl JsonDocument {
    /// Loads `path`. A missing or blank file is an empty document; anything
    /// that is not a JSON object is an error.
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_with(path, false)
    }

    /// Like [`load`](Self::load), but also accepts `//` and `/* */` comments
    /// and trailing commas. The result can be read but never saved.
    pub fn load_relaxed(path: &Path) -> Result<Self> {
        Self::load_with(path, true)
    }

    fn load_with(path: &Path, relaxed: bool) -> Result<Self> {
        let original = read_if_exists(path)?;
        let root = match original.as_deref() {
            None => Map::new(),
            Some(text) if relaxed => parse_object(path, &strip_comments(text))?,
            Some(text) => parse_object(path, text)?,
        };
        Ok(Self {
            path: path.to_path_buf(),
            root,
            original,
            relaxed,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn root(&self) -> &Map<String, Value> {
        &self.root
    }

    /// Returns the object at `key_path`, or `None` if any segment is absent.
    pub fn section(&self, key_path: &[&str]) -> Result<Option<&Map<String, Value>>> {
        let mut current = &self.root;
        for segment in key_path {
            match current.get(*segment) {
                None | Some(Value::Null) => return Ok(None),
                Some(Value::Object(map)) => current = map,
                Some(_) => {
                    return Err(Error::malformed(
                        &self.path,
                        format!("expected '{}' to be an object", segment),
                    ))
                }
            }
        }
        Ok(Some(current))
    }

    /// Entries of the section at `key_path`, in document order.
    pub fn entries(&self, key_path: &[&str]) -> Result<Vec<(&str, &Value)>> {
        Ok(self
            .section(key_path)?
            .map(|map| map.iter().map(|(k, v)| (k.as_str(), v)).collect())
            .unwrap_or_default())
    }

    fn section_mut(&mut self, key_path: &[&str]) -> Result<&mut Map<String, Value>> {
        let path = &self.path;
        let mut current = &mut self.root;
        for segment in key_path {
            let slot = current
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if slot.is_null() {
                *slot = Value::Object(Map::new());
            }
            current = match slot {
                Value::Object(map) => map,
                _ => {
                    return Err(Error::malformed(
                        path,
                        format!("expected '{}' to be an object", segment),
                    ))
                }
            };
        }
        Ok(current)
    }

    /// Replaces the managed entries of the section at `key_path` with
    /// `entries`, leaving every unmanaged entry where it is.
    pub fn merge_section(
        &mut self,
        key_path: &[&str],
        entries: Vec<(String, Map<String, Value>)>,
        report: &mut WriteReport,
    ) -> Result<()> {
        let planned = plan_entries(entries, report);
        if planned.is_empty() && self.section(key_path)?.is_none() {
            return Ok(());
        }

        let section = self.section_mut(key_path)?;
        report.removed += section
            .iter()
            .filter(|(name, value)| {
                is_managed(value) && !planned.iter().any(|(n, _)| n == name.as_str())
            })
            .count();
        section.retain(|_, value| !is_managed(value));

        for (name, mut entry) in planned {
            if section.contains_key(&name) {
                report.skip(SkipReason::UserOwned { item: name });
                continue;
            }
            entry.insert(MANAGED_KEY.to_string(), Value::String(MANAGED_VALUE.to_string()));
            section.insert(name, Value::Object(entry));
            report.written += 1;
        }
        Ok(())
    }

    /// Renders the document as written to disk.
    pub fn render(&self) -> Result<String> {
        let mut text = serde_json::to_string_pretty(&self.root).map_err(|e| Error::Serialize {
            what: self.path.display().to_string(),
            message: e.to_string(),
        })?;
        text.push('\n');
        Ok(text)
    }

    /// Writes the document back if its rendering differs from what was
    /// loaded. Returns whether the file changed.
    pub fn save(&self) -> Result<bool> {
        if self.relaxed {
            return Err(Error::malformed(
                &self.path,
                "a file read with comments cannot be rewritten",
            ));
        }
        let blank = self
            .original
            .as_deref()
            .is_none_or(|text| text.trim().is_empty());
        if blank && self.root.is_empty() {
            return Ok(false);
        }
        let text = self.render()?;
        if self.original.as_deref() == Some(text.as_str()) {
            return Ok(false);
        }
        write_atomic(&self.path, text.as_bytes())?;
        tracing::debug!(path = %self.path.display(), "wrote JSON document");
        Ok(true)
    }
}

fn parse_object(path: &Path, text: &str) -> Result<Map<String, Value>> {
    if text.trim().is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(Error::malformed(path, "expected a JSON object at the root")),
        Err(e) => Err(Error::malformed(path, e.to_string())),
    }
}

/// Drops `//` and `/* */` comments and trailing commas outside strings.
fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;
    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(next) = chars.next() {
                        out.push(next);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
                out.push(' ');
            }
            _ => out.push(c),
        }
    }
    drop_trailing_commas(&out)
}

fn drop_trailing_commas(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
        } else if c == ',' {
            let rest = text[i + 1..].trim_start();
            if rest.starts_with('}') || rest.starts_with(']') {
                continue;
            }
        }
        out.push(c);
    }
    out
}

/// Reads a string field.
pub(crate) fn str_field<'a>(entry: &'a Value, key: &str) -> Option<&'a str> {
    entry.get(key).and_then(Value::as_str)
}

/// Reads an array of strings, skipping (and logging) non-string items.
pub(crate) fn string_list(entry: &Value, key: &str, item: &str) -> Vec<String> {
    match entry.get(key) {
        Some(Value::Array(values)) => values
            .iter()
            .filter_map(|v| match v.as_str() {
                Some(s) => Some(s.to_string()),
                None => {
                    tracing::warn!(item, key, value = %v, "skipping non-string value");
                    None
                }
            })
            .collect(),
        Some(other) => {
            tracing::warn!(item, key, actual = %other, "expected an array");
            Vec::new()
        }
        None => Vec::new(),
    }
}

/// Reads an object of string values, skipping (and logging) the others.
pub(crate) fn string_map(
    entry: &Value,
    key: &str,
    item: &str,
) -> std::collections::BTreeMap<String, String> {
    match entry.get(key) {
        Some(Value::Object(values)) => values
            .iter()
            .filter_map(|(k, v)| match v.as_str() {
                Some(s) => Some((k.clone(), s.to_string())),
                None => {
                    tracing::warn!(item, key, field = %k, "skipping non-string value");
                    None
                }
            })
            .collect(),
        Some(other) => {
            tracing::warn!(item, key, actual = %other, "expected an object");
            Default::default()
        }
        None => Default::default(),
    }
}
