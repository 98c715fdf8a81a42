//! VS Code: the user-level `mcp.json` with its `servers` map.

use super::paths::ToolPaths;
use super::traits::{Adapter, ServerAdapter};
use super::utils;
use crate::common::{McpServer, ResourceKind, ResourceSet};
use crate::report::WriteReport;
use crate::Result;
use serde_json::{Map, Value};
use std::path::PathBuf;

const SERVERS_KEY: &[&str] = &["servers"];

pub struct VsCodeAdapter {
    root: PathBuf,
}

impl VsCodeAdapter {
    pub fn new(paths: &ToolPaths) -> Self {
        Self {
            root: paths.config("Code"),
        }
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

impl Adapter for VsCodeAdapter {
    fn name(&self) -> &str {
        "vscode"
    }

    fn config_path(&self) -> PathBuf {
        self.root.join("User").join("mcp.json")
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

impl ServerAdapter for VsCodeAdapter {
    fn read_servers(&self) -> Result<Vec<McpServer>> {
        utils::read_json_servers(&self.config_path(), SERVERS_KEY, |name, entry| {
            utils::decode_common_server(name, entry, &["url"])
        })
    }

    fn write_servers(&self, servers: &[McpServer]) -> Result<WriteReport> {
        utils::write_json_servers(&self.config_path(), SERVERS_KEY, servers, encode)
    }
}
