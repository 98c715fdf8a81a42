//! OpenCode: `opencode.json` servers plus `command/` and `agent/` markdown.

use super::paths::ToolPaths;
use super::traits::{Adapter, AgentsAdapter, CommandsAdapter, ServerAdapter};
use super::utils;
use crate::common::{Agent, Command, McpServer, McpTransport, ResourceKind, ResourceSet};
use crate::document::{json, FileSet, MarkdownFile};
use crate::report::WriteReport;
use crate::Result;
use serde_json::{Map, Value};
use std::path::PathBuf;

const SERVERS_KEY: &[&str] = &["mcp"];

pub struct OpenCodeAdapter {
    root: PathBuf,
}

impl OpenCodeAdapter {
    pub fn new(paths: &ToolPaths) -> Self {
        Self {
            root: paths.config("opencode"),
        }
    }

    fn commands(&self) -> FileSet {
        FileSet::flat(self.root.join("command"), "md")
    }

    fn agents(&self) -> FileSet {
        FileSet::flat(self.root.join("agent"), "md")
    }
}

/// OpenCode folds command and args into one array and calls env
/// `environment`.
fn encode(server: &McpServer) -> std::result::Result<Map<String, Value>, String> {
    let mut entry = Map::new();
    if server.transport.is_remote() {
        entry.insert("type".into(), Value::String("remote".into()));
        entry.extend(utils::remote_entry(server, "url")?);
    } else {
        if server.command.trim().is_empty() {
            return Err("stdio server has no command".to_string());
        }
        let mut command = vec![server.command.clone()];
        command.extend(server.args.iter().cloned());
        entry.insert("type".into(), Value::String("local".into()));
        entry.insert("command".into(), utils::string_array(&command));
        if !server.env.is_empty() {
            entry.insert("environment".into(), utils::string_object(&server.env));
        }
    }
    entry.insert("enabled".into(), Value::Bool(true));
    Ok(entry)
}

fn decode(name: &str, entry: &Value) -> Option<McpServer> {
    let enabled = entry.get("enabled").and_then(Value::as_bool).unwrap_or(true);
    let mut server = match json::str_field(entry, "type") {
        Some("remote") => {
            let url = json::str_field(entry, "url")?;
            let transport = if url.trim_end_matches('/').ends_with("/sse") {
                McpTransport::Sse
            } else {
                McpTransport::Http
            };
            let mut server = McpServer::remote(name, transport, url);
            server.headers = json::string_map(entry, "headers", name);
            server
        }
        _ => {
            let mut parts = json::string_list(entry, "command", name).into_iter();
            let command = parts.next()?;
            let mut server = McpServer::stdio(name, command, &[]);
            server.args = parts.collect();
            server.env = json::string_map(entry, "environment", name);
            server
        }
    };
    server.enabled = enabled;
    Some(server)
}

fn agent_to_markdown(agent: &Agent) -> MarkdownFile {
    let mut file = MarkdownFile::new(&agent.body);
    file.set_opt("description", agent.description.as_deref());
    file.set_str("mode", "subagent");
    file.set_opt("model", agent.model.as_deref());
    if !agent.tools.is_empty() {
        let tools = agent
            .tools
            .iter()
            .map(|t| (serde_yaml::Value::String(t.clone()), serde_yaml::Value::Bool(true)))
            .collect();
        file.frontmatter
            .insert("tools".into(), serde_yaml::Value::Mapping(tools));
    }
    file
}

/// Tools are a map of name to enabled flag; only enabled ones are kept.
fn agent_from_markdown(name: String, file: MarkdownFile) -> Agent {
    let tools = match file.frontmatter.get("tools") {
        Some(serde_yaml::Value::Mapping(map)) => map
            .iter()
            .filter(|(_, enabled)| enabled.as_bool().unwrap_or(false))
            .filter_map(|(k, _)| k.as_str().map(String::from))
            .collect(),
        _ => file.get_list("tools"),
    };
    Agent {
        description: file.get_str("description").map(String::from),
        model: file.get_str("model").map(String::from),
        tools,
        body: file.body,
        name,
        ..Agent::default()
    }
}

impl Adapter for OpenCodeAdapter {
    fn name(&self) -> &str {
        "opencode"
    }

    fn config_path(&self) -> PathBuf {
        self.root.join("opencode.json")
    }

    fn detect(&self) -> bool {
        self.root.is_dir()
    }

    fn supported_resources(&self) -> ResourceSet {
        ResourceSet::of(&[ResourceKind::Server, ResourceKind::Command, ResourceKind::Agent])
    }

    fn as_server_adapter(&self) -> Option<&dyn ServerAdapter> {
        Some(self)
    }

    fn as_commands_adapter(&self) -> Option<&dyn CommandsAdapter> {
        Some(self)
    }

    fn as_agents_adapter(&self) -> Option<&dyn AgentsAdapter> {
        Some(self)
    }
}

impl ServerAdapter for OpenCodeAdapter {
    fn read_servers(&self) -> Result<Vec<McpServer>> {
        utils::read_json_servers(&self.config_path(), SERVERS_KEY, decode)
    }

    fn write_servers(&self, servers: &[McpServer]) -> Result<WriteReport> {
        utils::write_json_servers(&self.config_path(), SERVERS_KEY, servers, encode)
    }
}

impl CommandsAdapter for OpenCodeAdapter {
    fn read_commands(&self) -> Result<Vec<Command>> {
        utils::read_markdown(&self.commands(), utils::command_from_markdown)
    }

    fn write_commands(&self, commands: &[Command]) -> Result<WriteReport> {
        utils::write_markdown(&self.commands(), commands, utils::command_to_markdown)
    }
}

impl AgentsAdapter for OpenCodeAdapter {
    fn read_agents(&self) -> Result<Vec<Agent>> {
        utils::read_markdown(&self.agents(), agent_from_markdown)
    }

    fn write_agents(&self, agents: &[Agent]) -> Result<WriteReport> {
        utils::write_markdown(&self.agents(), agents, agent_to_markdown)
    }
}
