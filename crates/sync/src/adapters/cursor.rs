//! Cursor: `~/.cursor/mcp.json` and `.mdc` rule files.

use super::paths::ToolPaths;
use super::traits::{Adapter, RulesAdapter, ServerAdapter};
use super::utils;
use crate::common::{McpServer, ResourceKind, ResourceSet, Rule};
use crate::document::FileSet;
use crate::report::WriteReport;
use crate::Result;
use serde_json::{Map, Value};
use std::path::PathBuf;

const SERVERS_KEY: &[&str] = &["mcpServers"];

pub struct CursorAdapter {
    root: PathBuf,
}

impl CursorAdapter {
    pub fn new(paths: &ToolPaths) -> Self {
        Self {
            root: paths.home(".cursor"),
        }
    }

    fn rules(&self) -> FileSet {
        FileSet::flat(self.root.join("rules"), "mdc")
    }
}

fn encode(server: &McpServer) -> std::result::Result<Map<String, Value>, String> {
    if server.transport.is_remote() {
        utils::remote_entry(server, "url")
    } else {
        utils::stdio_entry(server)
    }
}

impl Adapter for CursorAdapter {
    fn name(&self) -> &str {
        "cursor"
    }

    fn config_path(&self) -> PathBuf {
        self.root.join("mcp.json")
    }

    fn detect(&self) -> bool {
        self.root.is_dir()
    }

    fn supported_resources(&self) -> ResourceSet {
        ResourceSet::of(&[ResourceKind::Server, ResourceKind::Rule])
    }

    fn as_server_adapter(&self) -> Option<&dyn ServerAdapter> {
        Some(self)
    }

    fn as_rules_adapter(&self) -> Option<&dyn RulesAdapter> {
        Some(self)
    }
}

impl ServerAdapter for CursorAdapter {
    fn read_servers(&self) -> Result<Vec<McpServer>> {
        utils::read_json_servers(&self.config_path(), SERVERS_KEY, |name, entry| {
            utils::decode_common_server(name, entry, &["url"])
        })
    }

    fn write_servers(&self, servers: &[McpServer]) -> Result<WriteReport> {
        utils::write_json_servers(&self.config_path(), SERVERS_KEY, servers, encode)
    }
}

impl RulesAdapter for CursorAdapter {
    fn read_rules(&self) -> Result<Vec<Rule>> {
        utils::read_markdown(&self.rules(), utils::rule_from_markdown)
    }

    fn write_rules(&self, rules: &[Rule]) -> Result<WriteReport> {
        utils::write_markdown(&self.rules(), rules, utils::rule_to_markdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::SkipReason;
    use std::fs;
    use tempfile::tempdir;

    fn rule(name: &str, body: &str) -> Rule {
        Rule {
            name: name.into(),
            description: Some(format!("{} rule", name)),
            globs: vec!["**/*.rs".into()],
            body: body.into(),
            ..Rule::default()
        }
    }

    #[test]
    fn rules_are_written_as_mdc_and_hand_rules_survive() {
        let tmp = tempdir().unwrap();
        let adapter = CursorAdapter::new(&ToolPaths::under(tmp.path()));
        let rules_dir = tmp.path().join("home/.cursor/rules");
        fs::create_dir_all(&rules_dir).unwrap();
        let hand = "---\ndescription: mine\nalwaysApply: true\n---\n\nMy rule.\n";
        fs::write(rules_dir.join("style.mdc"), hand).unwrap();

        let report = adapter
            .write_rules(&[rule("rust", "Prefer ?"), rule("style", "Ours")])
            .unwrap();
        assert_eq!(report.written, 1);
        assert_eq!(report.skipped, vec![SkipReason::UserOwned { item: "style".into() }]);
        assert_eq!(fs::read_to_string(rules_dir.join("style.mdc")).unwrap(), hand);

        let text = fs::read_to_string(rules_dir.join("rust.mdc")).unwrap();
        assert!(text.contains("alwaysApply: false"));
        assert!(text.contains("_managedBy: skein"));

        let mut read = adapter.read_rules().unwrap();
        read.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(read[0], rule("rust", "Prefer ?"));
        assert!(read[1].always_apply);
    }

    #[test]
    fn config_path_is_mcp_json() {
        let tmp = tempdir().unwrap();
        let adapter = CursorAdapter::new(&ToolPaths::under(tmp.path()));
        assert!(adapter.config_path().ends_with(".cursor/mcp.json"));
        assert!(!adapter.detect());
    }
}
