//! Reporting types for what was written, skipped and failed.

use crate::common::ResourceKind;
use crate::error::Error;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Reasons why a canonical item was not written to a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum SkipReason {
    /// An entry with the same name exists in the tool but was authored by
    /// the user, so it is left alone.
    UserOwned { item: String },
    /// The same name appeared more than once in the canonical input.
    Duplicate { item: String },
    /// The item needs a feature the tool's format cannot express.
    Unsupported { item: String, reason: String },
    /// The name is empty once reduced to a safe file name.
    InvalidName { item: String },
}

impl SkipReason {
    /// Human-readable description.
    pub fn description(&self) -> String {
        match self {
            Self::UserOwned { item } => {
                format!("{} exists and is not managed by skein (left untouched)", item)
            }
            Self::Duplicate { item } => format!("{} appears more than once (first kept)", item),
            Self::Unsupported { item, reason } => format!("{} not supported: {}", item, reason),
            Self::InvalidName { item } => format!("'{}' is not a usable name", item),
        }
    }
}

/// Outcome of writing one resource kind to one tool.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WriteReport {
    /// Managed entries present after the write.
    pub written: usize,
    /// Previously managed entries that were dropped.
    pub removed: usize,
    /// Whether anything on disk changed.
    pub changed: bool,
    pub skipped: Vec<SkipReason>,
}

impl WriteReport {
    pub(crate) fn skip(&mut self, reason: SkipReason) {
        tracing::warn!(reason = %reason.description(), "skipping item");
        self.skipped.push(reason);
    }
}

/// Everything one tool did during a sync.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ToolReport {
    pub kinds: BTreeMap<ResourceKind, WriteReport>,
    /// Backups taken before writing.
    pub backups: Vec<PathBuf>,
}

impl ToolReport {
    pub fn total_written(&self) -> usize {
        self.kinds.values().map(|r| r.written).sum()
    }

    pub fn total_skipped(&self) -> usize {
        self.kinds.values().map(|r| r.skipped.len()).sum()
    }

    pub fn changed(&self) -> bool {
        self.kinds.values().any(|r| r.changed)
    }
}

/// Result of syncing one tool.
#[derive(Debug)]
pub struct ToolOutcome {
    pub tool: String,
    pub result: Result<ToolReport, Error>,
}

/// Per-tool outcomes of a sync, in registry order.
#[derive(Debug, Default)]
pub struct SyncResults {
    pub outcomes: Vec<ToolOutcome>,
}

impl SyncResults {
    /// Tool name to error, `None` meaning success.
    pub fn errors(&self) -> BTreeMap<&str, Option<&Error>> {
        self.outcomes
            .iter()
            .map(|o| (o.tool.as_str(), o.result.as_ref().err()))
            .collect()
    }

    pub fn get(&self, tool: &str) -> Option<&ToolOutcome> {
        self.outcomes.iter().find(|o| o.tool == tool)
    }

    pub fn succeeded(&self) -> impl Iterator<Item = (&str, &ToolReport)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().map(|r| (o.tool.as_str(), r)))
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &Error)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.tool.as_str(), e)))
    }

    pub fn is_success(&self) -> bool {
        self.failed().next().is_none()
    }

    /// One-line summary: `"N tools synced, M failed: tool: reason; ..."`.
    pub fn summary(&self) -> String {
        let ok = self.succeeded().count();
        let failed: Vec<String> = self
            .failed()
            .map(|(tool, err)| format!("{}: {}", tool, err))
            .collect();
        let noun = if ok == 1 { "tool" } else { "tools" };
        if failed.is_empty() {
            format!("{} {} synced", ok, noun)
        } else {
            format!(
                "{} {} synced, {} failed: {}",
                ok,
                noun,
                failed.len(),
                failed.join("; ")
            )
        }
    }
}
