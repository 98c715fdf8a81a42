//! Gemini CLI: `~/.gemini/settings.json` servers and TOML command files.
//!
//! Gemini commands use `{{args}}` where canonical bodies use `$ARGUMENTS`,
//! and may embed shell (`!{..}`) and file (`@{..}`) injections with no
//! canonical equivalent, so commands are written but never imported.

use super::paths::ToolPaths;
use super::traits::{Adapter, CommandsAdapter, ServerAdapter};
use super::utils;
use crate::common::{Command, McpServer, McpTransport, ResourceKind, ResourceSet};
use crate::document::{FileSet, TomlDocument, MANAGED_KEY, MANAGED_VALUE};
use crate::report::WriteReport;
use crate::Result;
use serde_json::{Map, Value};
use std::path::PathBuf;
use toml_edit::{value, DocumentMut};

const SERVERS_KEY: &[&str] = &["mcpServers"];
const CANONICAL_ARGS: &str = "$ARGUMENTS";
const GEMINI_ARGS: &str = "{{args}}";

pub struct GeminiAdapter {
    root: PathBuf,
}

impl GeminiAdapter {
    pub fn new(paths: &ToolPaths) -> Self {
        Self {
            root: paths.home(".gemini"),
        }
    }

    fn commands(&self) -> FileSet {
        FileSet::flat(self.root.join("commands"), "toml")
    }
}

fn encode(server: &McpServer) -> std::result::Result<Map<String, Value>, String> {
    match server.transport {
        McpTransport::Stdio => utils::stdio_entry(server),
        McpTransport::Http => utils::remote_entry(server, "httpUrl"),
        McpTransport::Sse => utils::remote_entry(server, "url"),
    }
}

/// `url` without a `type` is SSE in Gemini's schema.
fn decode(name: &str, entry: &Value) -> Option<McpServer> {
    let mut server = utils::decode_common_server(name, entry, &["httpUrl", "url"])?;
    if entry.get("httpUrl").is_none() && entry.get("url").is_some() && entry.get("type").is_none() {
        server.transport = McpTransport::Sse;
    }
    Some(server)
}

fn render_command(command: &Command) -> String {
    let mut doc = DocumentMut::new();
    if let Some(description) = command.description.as_deref() {
        doc.insert("description", value(description));
    }
    doc.insert("prompt", value(command.body.replace(CANONICAL_ARGS, GEMINI_ARGS)));
    doc.insert(MANAGED_KEY, value(MANAGED_VALUE));
    doc.to_string()
}

fn command_is_managed(content: &str) -> bool {
    TomlDocument::parse(std::path::Path::new(""), content)
        .is_ok_and(|doc| doc.get_str(MANAGED_KEY) == Some(MANAGED_VALUE))
}

impl Adapter for GeminiAdapter {
    fn name(&self) -> &str {
        "gemini"
    }

    fn config_path(&self) -> PathBuf {
        self.root.join("settings.json")
    }

    fn detect(&self) -> bool {
        self.root.is_dir()
    }

    fn supported_resources(&self) -> ResourceSet {
        ResourceSet::of(&[ResourceKind::Server, ResourceKind::Command])
    }

    fn importable_resources(&self) -> ResourceSet {
        ResourceSet::of(&[ResourceKind::Server])
    }

    fn as_server_adapter(&self) -> Option<&dyn ServerAdapter> {
        Some(self)
    }

    fn as_commands_adapter(&self) -> Option<&dyn CommandsAdapter> {
        Some(self)
    }
}

impl ServerAdapter for GeminiAdapter {
    fn read_servers(&self) -> Result<Vec<McpServer>> {
        utils::read_json_servers(&self.config_path(), SERVERS_KEY, decode)
    }

    fn write_servers(&self, servers: &[McpServer]) -> Result<WriteReport> {
        utils::write_json_servers(&self.config_path(), SERVERS_KEY, servers, encode)
    }
}

impl CommandsAdapter for GeminiAdapter {
    /// Reads back managed command files only. Import never calls this.
    fn read_commands(&self) -> Result<Vec<Command>> {
        let mut commands = Vec::new();
        for entry in self.commands().scan()? {
            let doc = match TomlDocument::parse(&entry.path, &entry.content) {
                Ok(doc) => doc,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable command file");
                    continue;
                }
            };
            if doc.get_str(MANAGED_KEY) != Some(MANAGED_VALUE) {
                continue;
            }
            let Some(prompt) = doc.get_str("prompt") else {
                tracing::warn!(path = %entry.path.display(), "command file has no prompt");
                continue;
            };
            commands.push(Command {
                description: doc.get_str("description").map(String::from),
                body: prompt.replace(GEMINI_ARGS, CANONICAL_ARGS).trim().to_string(),
                name: entry.name,
                ..Command::default()
            });
        }
        Ok(commands)
    }

    fn write_commands(&self, commands: &[Command]) -> Result<WriteReport> {
        let entries = commands
            .iter()
            .map(|c| (c.name.clone(), render_command(c)))
            .collect();
        let mut report = WriteReport::default();
        self.commands()
            .merge(entries, command_is_managed, &mut report)?;
        Ok(report)
    }
}
