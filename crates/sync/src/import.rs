//! Pulls tool-native resources back into the canonical store.
//!
//! Import is two steps so callers can show what would change: `preview`
//! reads and filters, `commit` persists. Existing canonical resources always
//! win; nothing already in the store is overwritten.

use crate::adapters::{importable_kinds, Adapter};
use crate::common::{Agent, Command, McpServer, Named, Resource, ResourceKind, ResourceSet, Rule, Skill};
use crate::error::Result;
use crate::registry::AdapterRegistry;
use crate::store::ResourceStore;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Names already in the canonical store, per kind.
pub type ExistingNames = HashMap<ResourceKind, HashSet<String>>;

/// Why a native resource was left out of a preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ImportSkip {
    /// The canonical store already has this name.
    Exists { kind: ResourceKind, name: String },
    /// The tool listed the name more than once; the first was kept.
    Duplicate { kind: ResourceKind, name: String },
}

/// A kind whose native read failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadFailure {
    pub kind: ResourceKind,
    pub message: String,
}

/// Resources a tool offers that the canonical store does not have yet.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportPreview {
    pub tool: String,
    pub servers: Vec<McpServer>,
    pub commands: Vec<Command>,
    pub rules: Vec<Rule>,
    pub skills: Vec<Skill>,
    pub agents: Vec<Agent>,
    pub skipped: Vec<ImportSkip>,
    pub errors: Vec<ReadFailure>,
}

impl ImportPreview {
    pub fn len(&self) -> usize {
        self.servers.len()
            + self.commands.len()
            + self.rules.len()
            + self.skills.len()
            + self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Accepted resources in kind order.
    pub fn into_resources(self) -> Vec<Resource> {
        let mut resources = Vec::with_capacity(self.len());
        resources.extend(self.servers.into_iter().map(Named::into_resource));
        resources.extend(self.commands.into_iter().map(Named::into_resource));
        resources.extend(self.rules.into_iter().map(Named::into_resource));
        resources.extend(self.skills.into_iter().map(Named::into_resource));
        resources.extend(self.agents.into_iter().map(Named::into_resource));
        resources
    }
}

/// What [`commit`] persisted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportResult {
    pub tool: String,
    pub imported: BTreeMap<ResourceKind, usize>,
    /// One message per resource that could not be saved.
    pub errors: Vec<String>,
}

impl ImportResult {
    pub fn total(&self) -> usize {
        self.imported.values().sum()
    }
}

/// Reads the store's names for `kinds`.
pub fn existing_names(store: &dyn ResourceStore, kinds: ResourceSet) -> Result<ExistingNames> {
    let mut existing = ExistingNames::new();
    for kind in kinds.iter() {
        existing.insert(kind, store.names(kind)?);
    }
    Ok(existing)
}

fn accept<T: Named>(
    items: Vec<T>,
    existing: Option<&HashSet<String>>,
    skipped: &mut Vec<ImportSkip>,
) -> Vec<T> {
    let mut seen = HashSet::new();
    let mut accepted = Vec::with_capacity(items.len());
    for item in items {
        let name = item.name().to_string();
        if existing.is_some_and(|names| names.contains(&name)) {
            skipped.push(ImportSkip::Exists { kind: T::KIND, name });
        } else if !seen.insert(name.clone()) {
            skipped.push(ImportSkip::Duplicate { kind: T::KIND, name });
        } else {
            accepted.push(item);
        }
    }
    accepted
}

/// Reads the requested kinds from `adapter` and drops what the store already
/// has. A kind that fails to read is recorded and the rest continue.
pub fn preview(adapter: &dyn Adapter, kinds: ResourceSet, existing: &ExistingNames) -> ImportPreview {
    let mut preview = ImportPreview {
        tool: adapter.name().to_string(),
        ..ImportPreview::default()
    };
    let kinds = kinds.intersect(importable_kinds(adapter));

    for kind in kinds.iter() {
        let names = existing.get(&kind);
        let outcome = match kind {
            ResourceKind::Server => read(adapter.as_server_adapter().map(|a| a.read_servers()))
                .map(|items| preview.servers = accept(items, names, &mut preview.skipped)),
            ResourceKind::Command => read(adapter.as_commands_adapter().map(|a| a.read_commands()))
                .map(|items| preview.commands = accept(items, names, &mut preview.skipped)),
            ResourceKind::Rule => read(adapter.as_rules_adapter().map(|a| a.read_rules()))
                .map(|items| preview.rules = accept(items, names, &mut preview.skipped)),
            ResourceKind::Skill => read(adapter.as_skills_adapter().map(|a| a.read_skills()))
                .map(|items| preview.skills = accept(items, names, &mut preview.skipped)),
            ResourceKind::Agent => read(adapter.as_agents_adapter().map(|a| a.read_agents()))
                .map(|items| preview.agents = accept(items, names, &mut preview.skipped)),
        };
        if let Err(e) = outcome {
            tracing::warn!(tool = adapter.name(), kind = %kind, error = %e, "import read failed");
            preview.errors.push(ReadFailure {
                kind,
                message: e.to_string(),
            });
        }
    }

    tracing::debug!(
        tool = adapter.name(),
        accepted = preview.len(),
        skipped = preview.skipped.len(),
        "built import preview"
    );
    preview
}

fn read<T>(result: Option<Result<Vec<T>>>) -> Result<Vec<T>> {
    result.unwrap_or_else(|| Ok(Vec::new()))
}

/// Saves every accepted resource. A failed save is recorded and the rest
/// continue.
pub fn commit(preview: ImportPreview, store: &dyn ResourceStore) -> ImportResult {
    let mut result = ImportResult {
        tool: preview.tool.clone(),
        ..ImportResult::default()
    };
    for resource in preview.into_resources() {
        match store.save(&resource) {
            Ok(()) => *result.imported.entry(resource.kind()).or_default() += 1,
            Err(e) => {
                tracing::warn!(kind = %resource.kind(), name = resource.name(), error = %e, "import failed");
                result
                    .errors
                    .push(format!("{} '{}': {}", resource.kind(), resource.name(), e));
            }
        }
    }
    tracing::info!(tool = %result.tool, imported = result.total(), failed = result.errors.len(), "import committed");
    result
}

/// Import entry point bound to a registry.
pub struct ImportOrchestrator<'a> {
    registry: &'a AdapterRegistry,
}

impl<'a> ImportOrchestrator<'a> {
    pub fn new(registry: &'a AdapterRegistry) -> Self {
        Self { registry }
    }

    /// Previews an import from the named tool against `store`.
    pub fn preview(
        &self,
        tool: &str,
        kinds: ResourceSet,
        store: &dyn ResourceStore,
    ) -> Result<ImportPreview> {
        let adapter = self.registry.require(tool)?;
        let existing = existing_names(store, kinds)?;
        Ok(preview(adapter.as_ref(), kinds, &existing))
    }

    pub fn commit(&self, preview: ImportPreview, store: &dyn ResourceStore) -> ImportResult {
        commit(preview, store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::traits::{MockCommandsAdapter, MockServerAdapter};
    use crate::adapters::{CommandsAdapter, ServerAdapter};
    use crate::error::Error;
    use crate::store::MemoryStore;
    use std::path::PathBuf;

    struct Source {
        servers: MockServerAdapter,
        commands: MockCommandsAdapter,
    }

    impl Adapter for Source {
        fn name(&self) -> &str {
            "source"
        }

        fn config_path(&self) -> PathBuf {
            PathBuf::new()
        }

        fn detect(&self) -> bool {
            true
        }

        fn supported_resources(&self) -> ResourceSet {
            ResourceSet::of(&[ResourceKind::Server, ResourceKind::Command])
        }

        fn as_server_adapter(&self) -> Option<&dyn ServerAdapter> {
            Some(&self.servers)
        }

        fn as_commands_adapter(&self) -> Option<&dyn CommandsAdapter> {
            Some(&self.commands)
        }
    }

    fn source(servers: Vec<McpServer>) -> Source {
        let mut mock = MockServerAdapter::new();
        mock.expect_read_servers()
            .returning(move || Ok(servers.clone()));
        let mut commands = MockCommandsAdapter::new();
        commands
            .expect_read_commands()
            .returning(|| Err(Error::Store("unreadable".into())));
        Source {
            servers: mock,
            commands,
        }
    }

    #[test]
    fn existing_names_win_and_duplicates_collapse() {
        let adapter = source(vec![
            McpServer::stdio("fs", "native", &[]),
            McpServer::stdio("git", "uvx", &[]),
            McpServer::stdio("git", "other", &[]),
        ]);
        let store = MemoryStore::with([Resource::Server(McpServer::stdio("fs", "canonical", &[]))]);
        let existing = existing_names(&store, ResourceSet::all()).unwrap();

        let preview = preview(&adapter, ResourceSet::of(&[ResourceKind::Server]), &existing);
        assert_eq!(preview.servers.len(), 1);
        assert_eq!(preview.servers[0].command, "uvx");
        assert_eq!(
            preview.skipped,
            vec![
                ImportSkip::Exists {
                    kind: ResourceKind::Server,
                    name: "fs".into()
                },
                ImportSkip::Duplicate {
                    kind: ResourceKind::Server,
                    name: "git".into()
                },
            ]
        );

        let result = commit(preview, &store);
        assert_eq!(result.total(), 1);
        match store.get(ResourceKind::Server, "fs") {
            Some(Resource::Server(s)) => assert_eq!(s.command, "canonical"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn a_failing_kind_does_not_block_the_others() {
        let adapter = source(vec![McpServer::stdio("fs", "npx", &[])]);
        let preview = preview(&adapter, ResourceSet::all(), &ExistingNames::new());
        assert_eq!(preview.servers.len(), 1);
        assert_eq!(preview.errors.len(), 1);
        assert_eq!(preview.errors[0].kind, ResourceKind::Command);
    }

    #[test]
    fn commit_records_per_item_failures() {
        let store = MemoryStore::with([Resource::Server(McpServer::stdio("taken", "x", &[]))]);
        let preview = ImportPreview {
            tool: "t".into(),
            servers: vec![McpServer::stdio("taken", "y", &[]), McpServer::stdio("new", "z", &[])],
            ..ImportPreview::default()
        };
        let result = commit(preview, &store);
        assert_eq!(result.imported[&ResourceKind::Server], 1);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("taken"));
    }

    #[test]
    fn orchestrator_rejects_unknown_tools() {
        let registry = AdapterRegistry::new();
        let store = MemoryStore::new();
        let err = ImportOrchestrator::new(&registry)
            .preview("ghost", ResourceSet::all(), &store)
            .unwrap_err();
        assert!(matches!(err, Error::UnknownTool(_)));
    }
}
