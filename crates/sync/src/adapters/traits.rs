//! The adapter contract and its optional per-kind capabilities.
//!
//! Every tool implements [`Adapter`]. Reading and writing a resource kind is
//! an optional capability exposed through one of the `as_*_adapter` probes;
//! a probe returning `None` means the kind is skipped for that tool.

use crate::common::{Agent, Command, McpServer, ResourceKind, ResourceSet, Rule, Skill};
use crate::report::WriteReport;
use crate::Result;
use std::path::PathBuf;

#[cfg(test)]
use mockall::automock;

/// A single AI coding tool.
pub trait Adapter: Send + Sync {
    /// Stable identifier, e.g. `"cursor"`.
    fn name(&self) -> &str;

    /// The tool's primary configuration file. May not exist.
    fn config_path(&self) -> PathBuf;

    /// Every native file the adapter may rewrite, for backups.
    fn config_paths(&self) -> Vec<PathBuf> {
        vec![self.config_path()]
    }

    /// Whether the tool appears to be installed. Checks the tool's own
    /// directory, never the config file.
    fn detect(&self) -> bool;

    /// Kinds this adapter can write.
    fn supported_resources(&self) -> ResourceSet;

    /// Kinds this adapter can read back for import.
    fn importable_resources(&self) -> ResourceSet {
        self.supported_resources()
    }

    fn as_server_adapter(&self) -> Option<&dyn ServerAdapter> {
        None
    }

    fn as_commands_adapter(&self) -> Option<&dyn CommandsAdapter> {
        None
    }

    fn as_rules_adapter(&self) -> Option<&dyn RulesAdapter> {
        None
    }

    fn as_skills_adapter(&self) -> Option<&dyn SkillsAdapter> {
        None
    }

    fn as_agents_adapter(&self) -> Option<&dyn AgentsAdapter> {
        None
    }
}

/// Reads and writes MCP server definitions.
#[cfg_attr(test, automock)]
pub trait ServerAdapter {
    fn read_servers(&self) -> Result<Vec<McpServer>>;

    /// Replaces the managed servers with `servers`.
    fn write_servers(&self, servers: &[McpServer]) -> Result<WriteReport>;
}

#[cfg_attr(test, automock)]
pub trait CommandsAdapter {
    fn read_commands(&self) -> Result<Vec<Command>>;

    fn write_commands(&self, commands: &[Command]) -> Result<WriteReport>;
}

#[cfg_attr(test, automock)]
pub trait RulesAdapter {
    fn read_rules(&self) -> Result<Vec<Rule>>;

    fn write_rules(&self, rules: &[Rule]) -> Result<WriteReport>;
}

#[cfg_attr(test, automock)]
pub trait SkillsAdapter {
    fn read_skills(&self) -> Result<Vec<Skill>>;

    fn write_skills(&self, skills: &[Skill]) -> Result<WriteReport>;
}

#[cfg_attr(test, automock)]
pub trait AgentsAdapter {
    fn read_agents(&self) -> Result<Vec<Agent>>;

    fn write_agents(&self, agents: &[Agent]) -> Result<WriteReport>;
}

/// Whether `adapter` exposes the capability for `kind`.
pub fn has_capability(adapter: &dyn Adapter, kind: ResourceKind) -> bool {
    match kind {
        ResourceKind::Server => adapter.as_server_adapter().is_some(),
        ResourceKind::Command => adapter.as_commands_adapter().is_some(),
        ResourceKind::Rule => adapter.as_rules_adapter().is_some(),
        ResourceKind::Skill => adapter.as_skills_adapter().is_some(),
        ResourceKind::Agent => adapter.as_agents_adapter().is_some(),
    }
}

/// Kinds that can actually be written: declared and backed by a capability.
pub fn writable_kinds(adapter: &dyn Adapter) -> ResourceSet {
    adapter
        .supported_resources()
        .iter()
        .filter(|k| has_capability(adapter, *k))
        .collect()
}

/// Kinds that can actually be imported.
pub fn importable_kinds(adapter: &dyn Adapter) -> ResourceSet {
    adapter
        .importable_resources()
        .intersect(adapter.supported_resources())
        .iter()
        .filter(|k| has_capability(adapter, *k))
        .collect()
}
