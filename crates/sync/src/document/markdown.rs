//! Markdown files with YAML frontmatter.

use super::{MANAGED_KEY, MANAGED_VALUE};
use serde_yaml::{Mapping, Value};

/// A markdown document split into frontmatter and body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkdownFile {
    pub frontmatter: Mapping,
    pub body: String,
}

impl MarkdownFile {
    pub fn new(body: &str) -> Self {
        Self {
            frontmatter: Mapping::new(),
            body: body.trim().to_string(),
        }
    }

    /// Splits `text` into frontmatter and body. Text without a leading `---`
    /// fence is all body. A fence whose contents are not a YAML mapping is
    /// an error.
    pub fn parse(text: &str) -> Result<Self, String> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let Some(rest) = text
            .strip_prefix("---\n")
            .or_else(|| text.strip_prefix("---\r\n"))
        else {
            return Ok(Self::new(text));
        };

        let (yaml, body) = match find_closing_fence(rest) {
            Some((end, body_start)) => (&rest[..end], &rest[body_start..]),
            None => return Err("frontmatter is not closed".to_string()),
        };

        let frontmatter = if yaml.trim().is_empty() {
            Mapping::new()
        } else {
            match serde_yaml::from_str::<Value>(yaml).map_err(|e| e.to_string())? {
                Value::Mapping(map) => map,
                Value::Null => Mapping::new(),
                _ => return Err("frontmatter is not a mapping".to_string()),
            }
        };

        Ok(Self {
            frontmatter,
            body: body.trim().to_string(),
        })
    }

    /// Renders the file. Output is deterministic for equal inputs.
    pub fn render(&self) -> Result<String, String> {
        let body = self.body.trim();
        if self.frontmatter.is_empty() {
            return Ok(format!("{}\n", body));
        }
        let yaml = serde_yaml::to_string(&self.frontmatter).map_err(|e| e.to_string())?;
        if body.is_empty() {
            Ok(format!("---\n{}---\n", yaml))
        } else {
            Ok(format!("---\n{}---\n\n{}\n", yaml, body))
        }
    }

    pub fn is_managed(&self) -> bool {
        self.get_str(MANAGED_KEY) == Some(MANAGED_VALUE)
    }

    pub fn mark_managed(&mut self) {
        self.set_str(MANAGED_KEY, MANAGED_VALUE);
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.frontmatter.get(key).and_then(Value::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.frontmatter.get(key).and_then(Value::as_bool)
    }

    /// Reads a list given either as a YAML sequence or a comma-separated
    /// string.
    pub fn get_list(&self, key: &str) -> Vec<String> {
        match self.frontmatter.get(key) {
            Some(Value::Sequence(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(|s| s.trim().to_string()))
                .filter(|s| !s.is_empty())
                .collect(),
            Some(Value::String(s)) => s
                .split(',')
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn set_str(&mut self, key: &str, value: &str) {
        self.frontmatter
            .insert(Value::String(key.to_string()), Value::String(value.to_string()));
    }

    /// Sets `key` only when `value` is present.
    pub fn set_opt(&mut self, key: &str, value: Option<&str>) {
        if let Some(v) = value {
            self.set_str(key, v);
        }
    }

    pub fn set_bool(&mut self, key: &str, value: bool) {
        self.frontmatter
            .insert(Value::String(key.to_string()), Value::Bool(value));
    }

    pub fn set_list(&mut self, key: &str, values: &[String]) {
        if values.is_empty() {
            return;
        }
        let seq = values.iter().map(|v| Value::String(v.clone())).collect();
        self.frontmatter
            .insert(Value::String(key.to_string()), Value::Sequence(seq));
    }
}

/// Returns (end of yaml, start of body) for the closing `---` line.
fn find_closing_fence(rest: &str) -> Option<(usize, usize)> {
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == "---" {
            return Some((offset, offset + line.len()));
        }
        offset += line.len();
    }
    None
}
