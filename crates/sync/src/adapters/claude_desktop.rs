//! Claude Desktop: `claude_desktop_config.json`, stdio servers only.

use super::paths::ToolPaths;
use super::traits::{Adapter, ServerAdapter};
use super::utils;
use crate::common::{McpServer, ResourceKind, ResourceSet};
use crate::report::WriteReport;
use crate::Result;
use serde_json::{Map, Value};
use std::path::PathBuf;

const SERVERS_KEY: &[&str] = &["mcpServers"];

pub struct ClaudeDesktopAdapter {
    root: PathBuf,
}

impl ClaudeDesktopAdapter {
    pub fn new(paths: &ToolPaths) -> Self {
        Self {
            root: paths.config("Claude"),
        }
    }
}

/// The desktop app only launches local processes.
fn encode(server: &McpServer) -> std::result::Result<Map<String, Value>, String> {
    if server.transport.is_remote() {
        return Err(format!(
            "Claude Desktop cannot connect to {} servers",
            server.transport.as_str()
        ));
    }
    utils::stdio_entry(server)
}

impl Adapter for ClaudeDesktopAdapter {
    fn name(&self) -> &str {
        "claude-desktop"
    }

    fn config_path(&self) -> PathBuf {
        self.root.join("claude_desktop_config.json")
    }

    fn detect(&self) -> bool {
        self.root.is_dir()
    }

    fn supported_resources(&self) -> ResourceSet {
        ResourceSet::of(&[ResourceKind::Server])
    }

    fn as_server_adapter(&self) -> Option<&dyn ServerAdapter> {
        Some(self)
    }
}

impl ServerAdapter for ClaudeDesktopAdapter {
    fn read_servers(&self) -> Result<Vec<McpServer>> {
        utils::read_json_servers(&self.config_path(), SERVERS_KEY, |name, entry| {
            utils::decode_common_server(name, entry, &[])
        })
    }

    fn write_servers(&self, servers: &[McpServer]) -> Result<WriteReport> {
        utils::write_json_servers(&self.config_path(), SERVERS_KEY, servers, encode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::McpTransport;
    use crate::report::SkipReason;
    use tempfile::tempdir;

    #[test]
    fn remote_servers_are_skipped_as_unsupported() {
        let tmp = tempdir().unwrap();
        let adapter = ClaudeDesktopAdapter::new(&ToolPaths::under(tmp.path()));
        let report = adapter
            .write_servers(&[
                McpServer::stdio("fs", "npx", &[]),
                McpServer::remote("web", McpTransport::Http, "https://x"),
            ])
            .unwrap();

        assert_eq!(report.written, 1);
        assert!(matches!(
            &report.skipped[..],
            [SkipReason::Unsupported { item, .. }] if item == "web"
        ));
        assert_eq!(adapter.read_servers().unwrap().len(), 1);
        assert!(adapter.config_path().ends_with("config/Claude/claude_desktop_config.json"));
    }
}
