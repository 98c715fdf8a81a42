//! Property tests for the ownership-marker merge.

use proptest::prelude::*;
use skein_sync::{AdapterRegistry, McpServer, ResourceBundle, SyncOptions, SyncOrchestrator, ToolPaths};
use skein_test_utils::TestFixture;
use std::collections::BTreeSet;

fn sync(registry: &AdapterRegistry, names: &[String]) -> bool {
    let bundle = ResourceBundle {
        servers: Some(
            names
                .iter()
                .map(|n| McpServer::stdio(n.as_str(), "npx", &[n.as_str()]))
                .collect(),
        ),
        ..ResourceBundle::default()
    };
    let options = SyncOptions {
        backup: false,
        only: Some(vec!["windsurf".into()]),
        ..SyncOptions::default()
    };
    let results = SyncOrchestrator::with_options(registry, options)
        .sync_all(bundle)
        .unwrap();
    results
        .get("windsurf")
        .unwrap()
        .result
        .as_ref()
        .unwrap()
        .changed()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn merge_is_idempotent_and_keeps_user_entries(
        user in prop::collection::btree_set("[a-e]{1,2}", 0..4),
        managed in prop::collection::vec("[a-e]{1,2}", 0..6),
    ) {
        let fixture = TestFixture::new().unwrap();
        let mut user_servers = serde_json::Map::new();
        for name in &user {
            user_servers.insert(name.clone(), serde_json::json!({"command": format!("user-{}", name)}));
        }
        let original = serde_json::json!({"mcpServers": user_servers}).to_string();
        fixture.write_home(".codeium/windsurf/mcp_config.json", &original).unwrap();
        let registry = AdapterRegistry::builtin(&ToolPaths::new(&fixture.home, &fixture.config));

        sync(&registry, &managed);
        let first = fixture.read_home(".codeium/windsurf/mcp_config.json").unwrap();
        prop_assert!(!sync(&registry, &managed));
        let second = fixture.read_home(".codeium/windsurf/mcp_config.json").unwrap();
        prop_assert_eq!(&first, &second);

        let value: serde_json::Value = serde_json::from_str(&second).unwrap();
        let section = value["mcpServers"].as_object().unwrap();
        for name in &user {
            prop_assert_eq!(&section[name]["command"], &serde_json::json!(format!("user-{}", name)));
            prop_assert!(section[name].get("_managedBy").is_none());
        }
        let expected: BTreeSet<&String> = user.iter().chain(managed.iter()).collect();
        let actual: BTreeSet<&String> = section.keys().collect();
        prop_assert_eq!(actual, expected);

        // An empty canonical list removes every managed entry and nothing else.
        sync(&registry, &[]);
        let cleared: serde_json::Value = serde_json::from_str(
            &fixture.read_home(".codeium/windsurf/mcp_config.json").unwrap(),
        )
        .unwrap();
        let left: BTreeSet<&String> = cleared["mcpServers"].as_object().unwrap().keys().collect();
        prop_assert_eq!(left, user.iter().collect::<BTreeSet<_>>());
    }
}
