//! Claude Code: `~/.claude.json` for servers, `~/.claude/` for the rest.

use super::paths::ToolPaths;
use super::traits::{Adapter, AgentsAdapter, CommandsAdapter, ServerAdapter, SkillsAdapter};
use super::utils;
use crate::common::{Agent, Command, McpServer, ResourceKind, ResourceSet, Skill};
use crate::document::FileSet;
use crate::report::WriteReport;
use crate::Result;
use serde_json::{Map, Value};
use std::path::PathBuf;

const SERVERS_KEY: &[&str] = &["mcpServers"];

/// Adapter for Claude Code.
pub struct ClaudeCodeAdapter {
    root: PathBuf,
    config: PathBuf,
}

impl ClaudeCodeAdapter {
    pub fn new(paths: &ToolPaths) -> Self {
        Self {
            root: paths.home(".claude"),
            config: paths.home(".claude.json"),
        }
    }

    fn commands(&self) -> FileSet {
        FileSet::flat(self.root.join("commands"), "md")
    }

    fn skills(&self) -> FileSet {
        FileSet::nested(self.root.join("skills"), "SKILL.md")
    }

    fn agents(&self) -> FileSet {
        FileSet::flat(self.root.join("agents"), "md")
    }
}

fn encode(server: &McpServer) -> std::result::Result<Map<String, Value>, String> {
    let mut entry = Map::new();
    entry.insert("type".into(), Value::String(server.transport.as_str().into()));
    let body = if server.transport.is_remote() {
        utils::remote_entry(server, "url")?
    } else {
        utils::stdio_entry(server)?
    };
    entry.extend(body);
    Ok(entry)
}

impl Adapter for ClaudeCodeAdapter {
    fn name(&self) -> &str {
        "claude-code"
    }

    fn config_path(&self) -> PathBuf {
        self.config.clone()
    }

    fn detect(&self) -> bool {
        self.root.is_dir()
    }

    fn supported_resources(&self) -> ResourceSet {
        ResourceSet::of(&[
            ResourceKind::Server,
            ResourceKind::Command,
            ResourceKind::Skill,
            ResourceKind::Agent,
        ])
    }

    fn as_server_adapter(&self) -> Option<&dyn ServerAdapter> {
        Some(self)
    }

    fn as_commands_adapter(&self) -> Option<&dyn CommandsAdapter> {
        Some(self)
    }

    fn as_skills_adapter(&self) -> Option<&dyn SkillsAdapter> {
        Some(self)
    }

    fn as_agents_adapter(&self) -> Option<&dyn AgentsAdapter> {
        Some(self)
    }
}

impl ServerAdapter for ClaudeCodeAdapter {
    fn read_servers(&self) -> Result<Vec<McpServer>> {
        utils::read_json_servers(&self.config, SERVERS_KEY, |name, entry| {
            utils::decode_common_server(name, entry, &["url"])
        })
    }

    fn write_servers(&self, servers: &[McpServer]) -> Result<WriteReport> {
        utils::write_json_servers(&self.config, SERVERS_KEY, servers, encode)
    }
}

impl CommandsAdapter for ClaudeCodeAdapter {
    fn read_commands(&self) -> Result<Vec<Command>> {
        utils::read_markdown(&self.commands(), utils::command_from_markdown)
    }

    fn write_commands(&self, commands: &[Command]) -> Result<WriteReport> {
        utils::write_markdown(&self.commands(), commands, utils::command_to_markdown)
    }
}

impl SkillsAdapter for ClaudeCodeAdapter {
    fn read_skills(&self) -> Result<Vec<Skill>> {
        utils::read_markdown(&self.skills(), utils::skill_from_markdown)
    }

    fn write_skills(&self, skills: &[Skill]) -> Result<WriteReport> {
        utils::write_markdown(&self.skills(), skills, utils::skill_to_markdown)
    }
}

impl AgentsAdapter for ClaudeCodeAdapter {
    fn read_agents(&self) -> Result<Vec<Agent>> {
        utils::read_markdown(&self.agents(), utils::agent_from_markdown)
    }

    fn write_agents(&self, agents: &[Agent]) -> Result<WriteReport> {
        utils::write_markdown(&self.agents(), agents, utils::agent_to_markdown)
    }
}
