//! Zed: `context_servers` in the editor's `settings.json`.
//!
//! Zed tolerates comments and trailing commas in its settings. Such a file
//! can be imported from, but a write reports it as malformed and leaves it
//! untouched.

use super::paths::ToolPaths;
use super::traits::{Adapter, ServerAdapter};
use super::utils;
use crate::common::{McpServer, ResourceKind, ResourceSet};
use crate::document::json;
use crate::report::WriteReport;
use crate::Result;
use serde_json::{Map, Value};
use std::path::PathBuf;

const SERVERS_KEY: &[&str] = &["context_servers"];

pub struct ZedAdapter {
    root: PathBuf,
}

impl ZedAdapter {
    pub fn new(paths: &ToolPaths) -> Self {
        Self {
            root: paths.config("zed"),
        }
    }
}

fn encode(server: &McpServer) -> std::result::Result<Map<String, Value>, String> {
    let mut entry = Map::new();
    entry.insert("source".into(), Value::String("custom".into()));
    let body = if server.transport.is_remote() {
        utils::remote_entry(server, "url")?
    } else {
        utils::stdio_entry(server)?
    };
    entry.extend(body);
    Ok(entry)
}

fn decode(name: &str, entry: &Value) -> Option<McpServer> {
    if entry.get("source").and_then(Value::as_str) == Some("extension") {
        return None;
    }
    // Older settings nest the launch command: {"command": {"path", "args", "env"}}.
    if let Some(command) = entry.get("command").filter(|c| c.is_object()) {
        let path = json::str_field(command, "path")?;
        let mut server = McpServer::stdio(name, path, &[]);
        server.args = json::string_list(command, "args", name);
        server.env = json::string_map(command, "env", name);
        return Some(server);
    }
    utils::decode_common_server(name, entry, &["url"])
}

impl Adapter for ZedAdapter {
    fn name(&self) -> &str {
        "zed"
    }

    fn config_path(&self) -> PathBuf {
        self.root.join("settings.json")
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

impl ServerAdapter for ZedAdapter {
    fn read_servers(&self) -> Result<Vec<McpServer>> {
        utils::read_jsonc_servers(&self.config_path(), SERVERS_KEY, decode)
    }

    fn write_servers(&self, servers: &[McpServer]) -> Result<WriteReport> {
        utils::write_json_servers(&self.config_path(), SERVERS_KEY, servers, encode)
    }
}
