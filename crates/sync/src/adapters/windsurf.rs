//! Windsurf: `~/.codeium/windsurf/mcp_config.json`.

use super::paths::ToolPaths;
use super::traits::{Adapter, ServerAdapter};
use super::utils;
use crate::common::{McpServer, ResourceKind, ResourceSet};
use crate::report::WriteReport;
use crate::Result;
use serde_json::{Map, Value};
use std::path::PathBuf;

const SERVERS_KEY: &[&str] = &["mcpServers"];

pub struct WindsurfAdapter {
    root: PathBuf,
}

impl WindsurfAdapter {
    pub fn new(paths: &ToolPaths) -> Self {
        Self {
            root: paths.home(".codeium/windsurf"),
        }
    }
}

/// Remote servers go under `serverUrl`.
fn encode(server: &McpServer) -> std::result::Result<Map<String, Value>, String> {
    if server.transport.is_remote() {
        utils::remote_entry(server, "serverUrl")
    } else {
        utils::stdio_entry(server)
    }
}

impl Adapter for WindsurfAdapter {
    fn name(&self) -> &str {
        "windsurf"
    }

    fn config_path(&self) -> PathBuf {
        self.root.join("mcp_config.json")
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

impl ServerAdapter for WindsurfAdapter {
    fn read_servers(&self) -> Result<Vec<McpServer>> {
        utils::read_json_servers(&self.config_path(), SERVERS_KEY, |name, entry| {
            utils::decode_common_server(name, entry, &["serverUrl", "url"])
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
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn remote_servers_use_server_url() {
        let tmp = tempdir().unwrap();
        let adapter = WindsurfAdapter::new(&ToolPaths::under(tmp.path()));
        adapter
            .write_servers(&[McpServer::remote("r", McpTransport::Http, "https://r/mcp")])
            .unwrap();

        let text = fs::read_to_string(adapter.config_path()).unwrap();
        assert!(text.contains("\"serverUrl\": \"https://r/mcp\""));
        let read = adapter.read_servers().unwrap();
        assert_eq!(read[0].url.as_deref(), Some("https://r/mcp"));
        assert_eq!(read[0].transport, McpTransport::Http);
    }
}
