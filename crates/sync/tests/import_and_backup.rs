//! Import into a directory store, and backup/restore around a sync.

use skein_sync::{
    list_backups, restore_backup, AdapterRegistry, DirStore, ImportOrchestrator, ImportSkip,
    McpServer, Resource, ResourceBundle, ResourceKind, ResourceSet, ResourceStore, SyncOptions,
    SyncOrchestrator, ToolPaths,
};
use skein_test_utils::TestFixture;

fn registry(fixture: &TestFixture) -> AdapterRegistry {
    AdapterRegistry::builtin(&ToolPaths::new(&fixture.home, &fixture.config))
}

const CLAUDE_CONFIG: &str = r#"{
  "mcpServers": {
    "fs": { "type": "stdio", "command": "npx", "args": ["-y", "@mcp/fs"] },
    "git": { "type": "stdio", "command": "uvx", "args": ["mcp-server-git"] }
  }
}
"#;

#[test]
fn given_store_with_existing_server_when_importing_then_only_new_servers_are_saved() {
    let fixture = TestFixture::new().unwrap();
    fixture.write_home(".claude.json", CLAUDE_CONFIG).unwrap();
    let store = DirStore::new(&fixture.store);
    store
        .save(&Resource::Server(McpServer::stdio("fs", "canonical", &[])))
        .unwrap();
    let registry = registry(&fixture);
    let import = ImportOrchestrator::new(&registry);

    let preview = import
        .preview("claude-code", ResourceSet::of(&[ResourceKind::Server]), &store)
        .unwrap();
    assert_eq!(preview.servers.len(), 1);
    assert_eq!(preview.servers[0].name, "git");
    assert_eq!(preview.servers[0].args, vec!["mcp-server-git".to_string()]);
    assert_eq!(
        preview.skipped,
        vec![ImportSkip::Exists {
            kind: ResourceKind::Server,
            name: "fs".into()
        }]
    );

    let result = import.commit(preview, &store);
    assert_eq!(result.total(), 1);
    assert!(result.errors.is_empty());

    let bundle = store.load_bundle().unwrap();
    let servers = bundle.servers.unwrap();
    let fs_server = servers.iter().find(|s| s.name == "fs").unwrap();
    assert_eq!(fs_server.command, "canonical");
    assert!(servers.iter().any(|s| s.name == "git"));

    let again = import
        .preview("claude-code", ResourceSet::all(), &store)
        .unwrap();
    assert!(again.is_empty());
}

#[test]
fn given_unknown_tool_when_importing_then_call_fails() {
    let fixture = TestFixture::new().unwrap();
    let registry = registry(&fixture);
    let store = DirStore::new(&fixture.store);
    let err = ImportOrchestrator::new(&registry)
        .preview("notepad", ResourceSet::all(), &store)
        .unwrap_err();
    assert!(matches!(err, skein_sync::Error::UnknownTool(_)));
}

#[test]
fn given_imported_store_when_synced_back_then_other_tools_receive_the_servers() {
    let fixture = TestFixture::new().unwrap();
    fixture.write_home(".claude.json", CLAUDE_CONFIG).unwrap();
    let store = DirStore::new(&fixture.store);
    let registry = registry(&fixture);
    let import = ImportOrchestrator::new(&registry);
    let preview = import
        .preview("claude-code", ResourceSet::all(), &store)
        .unwrap();
    import.commit(preview, &store);

    let bundle = store
        .load_bundle()
        .unwrap()
        .restrict(ResourceSet::of(&[ResourceKind::Server]));
    let options = SyncOptions {
        only: Some(vec!["vscode".into()]),
        ..SyncOptions::default()
    };
    let results = SyncOrchestrator::with_options(&registry, options)
        .sync_all(bundle)
        .unwrap();
    assert!(results.is_success());

    let text = fixture.read_config("Code/User/mcp.json").unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["servers"]["git"]["command"], "uvx");
    assert_eq!(value["servers"]["fs"]["_managedBy"], "skein");
}

#[test]
fn given_existing_config_when_synced_with_backup_then_restore_brings_back_original() {
    let fixture = TestFixture::new().unwrap();
    let original = r#"{"mcpServers": {"mine": {"command": "keep"}}}"#;
    let path = fixture.write_home(".cursor/mcp.json", original).unwrap();
    let registry = registry(&fixture);
    let bundle = ResourceBundle {
        servers: Some(vec![McpServer::stdio("fs", "npx", &[])]),
        ..ResourceBundle::default()
    };
    let options = SyncOptions {
        only: Some(vec!["cursor".into()]),
        ..SyncOptions::default()
    };

    let results = SyncOrchestrator::with_options(&registry, options.clone())
        .sync_all(bundle.clone())
        .unwrap();
    let report = results.get("cursor").unwrap().result.as_ref().unwrap();
    assert_eq!(report.backups.len(), 1);
    assert_ne!(fixture.read_home(".cursor/mcp.json").unwrap(), original);

    let used = restore_backup(&path).unwrap();
    assert_eq!(used, report.backups[0]);
    assert_eq!(fixture.read_home(".cursor/mcp.json").unwrap(), original);
}

#[test]
fn given_unchanged_config_when_synced_repeatedly_then_backups_are_not_duplicated() {
    let fixture = TestFixture::new().unwrap();
    let path = fixture
        .write_home(".cursor/mcp.json", r#"{"mcpServers": {}}"#)
        .unwrap();
    let registry = registry(&fixture);
    let bundle = ResourceBundle {
        servers: Some(vec![McpServer::stdio("fs", "npx", &[])]),
        ..ResourceBundle::default()
    };
    let options = SyncOptions {
        only: Some(vec!["cursor".into()]),
        keep_backups: Some(5),
        ..SyncOptions::default()
    };
    let orchestrator = SyncOrchestrator::with_options(&registry, options);

    // original, then the first synced state; later runs see no change
    for _ in 0..4 {
        orchestrator.sync_all(bundle.clone()).unwrap();
    }
    assert_eq!(list_backups(&path).unwrap().len(), 2);
}

#[test]
fn given_missing_config_when_synced_with_backup_then_no_backup_is_made() {
    let fixture = TestFixture::new().unwrap();
    let registry = registry(&fixture);
    let options = SyncOptions {
        only: Some(vec!["windsurf".into()]),
        ..SyncOptions::default()
    };
    let results = SyncOrchestrator::with_options(&registry, options)
        .sync_all(ResourceBundle {
            servers: Some(vec![McpServer::stdio("fs", "npx", &[])]),
            ..ResourceBundle::default()
        })
        .unwrap();
    let report = results.get("windsurf").unwrap().result.as_ref().unwrap();
    assert!(report.backups.is_empty());

    let err = restore_backup(&fixture.home.join(".codeium/windsurf/mcp_config.json")).unwrap_err();
    assert!(err.is_no_backup());
}
