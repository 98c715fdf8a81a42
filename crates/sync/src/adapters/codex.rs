//! Codex CLI: `[mcp_servers.<name>]` tables in `~/.codex/config.toml`,
//! prompts and skills as markdown under `~/.codex/`.

use super::paths::ToolPaths;
use super::traits::{Adapter, CommandsAdapter, ServerAdapter, SkillsAdapter};
use super::utils;
use crate::common::{Command, McpServer, McpTransport, ResourceKind, ResourceSet, Skill};
use crate::document::toml::{string_list, string_map};
use crate::document::{FileSet, TomlDocument};
use crate::report::{SkipReason, WriteReport};
use crate::Result;
use std::collections::BTreeMap;
use std::path::PathBuf;
use toml_edit::{value, Array, InlineTable, Item, Table, TableLike};

const SERVERS_KEY: &[&str] = &["mcp_servers"];

/// Adapter for the Codex CLI.
pub struct CodexAdapter {
    root: PathBuf,
}

impl CodexAdapter {
    pub fn new(paths: &ToolPaths) -> Self {
        Self {
            root: paths.home(".codex"),
        }
    }

    fn prompts(&self) -> FileSet {
        FileSet::flat(self.root.join("prompts"), "md")
    }

    fn skills(&self) -> FileSet {
        FileSet::nested(self.root.join("skills"), "SKILL.md")
    }
}

fn inline_map(values: &BTreeMap<String, String>) -> InlineTable {
    let mut table = InlineTable::new();
    for (k, v) in values {
        table.insert(k.as_str(), v.as_str().into());
    }
    table
}

fn encode(server: &McpServer) -> std::result::Result<Table, String> {
    let mut table = Table::new();
    match server.transport {
        McpTransport::Stdio => {
            if server.command.trim().is_empty() {
                return Err("stdio server has no command".to_string());
            }
            table.insert("command", value(server.command.as_str()));
            if !server.args.is_empty() {
                let args: Array = server.args.iter().map(String::as_str).collect();
                table.insert("args", value(args));
            }
            if !server.env.is_empty() {
                table.insert("env", value(inline_map(&server.env)));
            }
        }
        McpTransport::Http => {
            let url = server
                .url
                .as_deref()
                .filter(|u| !u.trim().is_empty())
                .ok_or_else(|| "http server has no url".to_string())?;
            table.insert("url", value(url));
            if !server.headers.is_empty() {
                table.insert("http_headers", value(inline_map(&server.headers)));
            }
        }
        McpTransport::Sse => return Err("Codex does not support SSE servers".to_string()),
    }
    Ok(table)
}

fn decode(name: &str, table: &dyn TableLike) -> Option<McpServer> {
    let enabled = table
        .get("enabled")
        .and_then(Item::as_bool)
        .unwrap_or(true);
    let mut server = if let Some(command) = table.get("command").and_then(Item::as_str) {
        let mut server = McpServer::stdio(name, command, &[]);
        server.args = string_list(table, "args");
        server.env = string_map(table, "env");
        server
    } else {
        let url = table.get("url").and_then(Item::as_str)?;
        let mut server = McpServer::remote(name, McpTransport::Http, url);
        server.headers = string_map(table, "http_headers");
        server
    };
    server.enabled = enabled;
    Some(server)
}

impl Adapter for CodexAdapter {
    fn name(&self) -> &str {
        "codex"
    }

    fn config_path(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    fn detect(&self) -> bool {
        self.root.is_dir()
    }

    fn supported_resources(&self) -> ResourceSet {
        ResourceSet::of(&[ResourceKind::Server, ResourceKind::Command, ResourceKind::Skill])
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
}

impl ServerAdapter for CodexAdapter {
    fn read_servers(&self) -> Result<Vec<McpServer>> {
        let path = self.config_path();
        let doc = TomlDocument::load(&path)?;
        let mut servers = Vec::new();
        for (name, item) in doc.entries(SERVERS_KEY)? {
            match item.as_table_like().and_then(|t| decode(name, t)) {
                Some(server) => servers.push(server),
                None => tracing::warn!(
                    server = name,
                    path = %path.display(),
                    "skipping server entry that could not be read"
                ),
            }
        }
        Ok(servers)
    }

    fn write_servers(&self, servers: &[McpServer]) -> Result<WriteReport> {
        let mut report = WriteReport::default();
        let mut entries = Vec::with_capacity(servers.len());
        for server in servers {
            match encode(server) {
                Ok(table) => entries.push((server.name.clone(), table)),
                Err(reason) => report.skip(SkipReason::Unsupported {
                    item: server.name.clone(),
                    reason,
                }),
            }
        }

        let mut doc = TomlDocument::load(&self.config_path())?;
        doc.merge_section(SERVERS_KEY, entries, &mut report)?;
        report.changed = doc.save()?;
        Ok(report)
    }
}

impl CommandsAdapter for CodexAdapter {
    fn read_commands(&self) -> Result<Vec<Command>> {
        utils::read_markdown(&self.prompts(), utils::command_from_markdown)
    }

    fn write_commands(&self, commands: &[Command]) -> Result<WriteReport> {
        utils::write_markdown(&self.prompts(), commands, utils::command_to_markdown)
    }
}

impl SkillsAdapter for CodexAdapter {
    fn read_skills(&self) -> Result<Vec<Skill>> {
        utils::read_markdown(&self.skills(), utils::skill_from_markdown)
    }

    fn write_skills(&self, skills: &[Skill]) -> Result<WriteReport> {
        utils::write_markdown(&self.skills(), skills, utils::skill_to_markdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn setup() -> (tempfile::TempDir, CodexAdapter) {
        let tmp = tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("home/.codex")).unwrap();
        let adapter = CodexAdapter::new(&ToolPaths::under(tmp.path()));
        (tmp, adapter)
    }

    #[test]
    fn writes_server_tables_and_keeps_user_settings() {
        let (_tmp, adapter) = setup();
        fs::write(
            adapter.config_path(),
            "model = \"o3\" # preferred\n\n[mcp_servers.local]\ncommand = \"./run.sh\"\n",
        )
        .unwrap();

        let mut fs_server = McpServer::stdio("fs", "npx", &["-y", "@mcp/fs"]);
        fs_server.env.insert("ROOT".into(), "/tmp".into());
        let mut web = McpServer::remote("web", McpTransport::Http, "https://mcp.example/api");
        web.headers.insert("X-Key".into(), "k".into());
        let report = adapter.write_servers(&[fs_server.clone(), web.clone()]).unwrap();
        assert_eq!(report.written, 2);
        assert!(report.changed);

        let text = fs::read_to_string(adapter.config_path()).unwrap();
        assert!(text.starts_with("model = \"o3\" # preferred\n"));
        assert!(text.contains("[mcp_servers.fs]"));
        assert!(text.contains("args = [\"-y\", \"@mcp/fs\"]"));

        let read = adapter.read_servers().unwrap();
        assert_eq!(read.len(), 3);
        assert_eq!(read[0].command, "./run.sh");
        assert!(read.contains(&fs_server));
        assert!(read.contains(&web));
    }

    #[test]
    fn sse_servers_are_unsupported() {
        let (_tmp, adapter) = setup();
        let report = adapter
            .write_servers(&[McpServer::remote("s", McpTransport::Sse, "https://x/sse")])
            .unwrap();
        assert_eq!(report.written, 0);
        assert_eq!(report.skipped.len(), 1);
        assert!(!adapter.config_path().exists());
    }

    #[test]
    fn second_write_is_byte_identical() {
        let (_tmp, adapter) = setup();
        let servers = [McpServer::stdio("a", "x", &["1"]), McpServer::stdio("b", "y", &[])];
        adapter.write_servers(&servers).unwrap();
        let first = fs::read_to_string(adapter.config_path()).unwrap();
        let report = adapter.write_servers(&servers).unwrap();
        assert!(!report.changed);
        assert_eq!(fs::read_to_string(adapter.config_path()).unwrap(), first);
    }

    #[test]
    fn prompts_are_commands() {
        let (tmp, adapter) = setup();
        let command = Command {
            name: "fix".into(),
            body: "Fix the failing test.".into(),
            ..Command::default()
        };
        adapter.write_commands(&[command.clone()]).unwrap();
        assert!(tmp.path().join("home/.codex/prompts/fix.md").is_file());
        assert_eq!(adapter.read_commands().unwrap(), vec![command]);
    }
}
