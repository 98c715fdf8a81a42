//! The canonical store the import commits into and sync reads from.
//!
//! The engine only needs three operations from a store; parsing the
//! canonical resource files themselves is the store's business.

use crate::common::{Resource, ResourceBundle, ResourceKind};
use crate::document::{sanitize_name, write_atomic};
use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Writer and reader for canonical resources.
pub trait ResourceStore: Send + Sync {
    /// Names already present for `kind`.
    fn names(&self, kind: ResourceKind) -> Result<HashSet<String>>;

    /// Persists one resource. Fails if a resource of the same kind and name
    /// already exists.
    fn save(&self, resource: &Resource) -> Result<()>;

    /// Every stored resource, one list per kind (all kinds present).
    fn load_bundle(&self) -> Result<ResourceBundle>;
}

fn push(bundle: &mut ResourceBundle, resource: Resource) {
    match resource {
        Resource::Server(r) => bundle.servers.get_or_insert_with(Vec::new).push(r),
        Resource::Command(r) => bundle.commands.get_or_insert_with(Vec::new).push(r),
        Resource::Rule(r) => bundle.rules.get_or_insert_with(Vec::new).push(r),
        Resource::Skill(r) => bundle.skills.get_or_insert_with(Vec::new).push(r),
        Resource::Agent(r) => bundle.agents.get_or_insert_with(Vec::new).push(r),
    }
}

fn empty_bundle() -> ResourceBundle {
    ResourceBundle {
        servers: Some(Vec::new()),
        commands: Some(Vec::new()),
        rules: Some(Vec::new()),
        skills: Some(Vec::new()),
        agents: Some(Vec::new()),
    }
}

fn kind_dir(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Server => "servers",
        ResourceKind::Command => "commands",
        ResourceKind::Rule => "rules",
        ResourceKind::Skill => "skills",
        ResourceKind::Agent => "agents",
    }
}

/// One JSON file per resource: `<root>/<kind>s/<name>.json`.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, kind: ResourceKind, name: &str) -> Result<PathBuf> {
        let safe = sanitize_name(name);
        if safe.is_empty() {
            return Err(Error::InvalidArgument(format!("'{}' is not a usable name", name)));
        }
        Ok(self.root.join(kind_dir(kind)).join(format!("{}.json", safe)))
    }

    fn read_kind(&self, kind: ResourceKind) -> Result<Vec<Resource>> {
        let dir = self.root.join(kind_dir(kind));
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::io("list", &dir, e)),
        };

        let mut files: Vec<PathBuf> = entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        files.sort();

        let mut resources = Vec::with_capacity(files.len());
        for path in files {
            let text = fs::read_to_string(&path).map_err(|e| Error::io("read", &path, e))?;
            match serde_json::from_str::<Resource>(&text) {
                Ok(resource) if resource.kind() == kind => resources.push(resource),
                Ok(resource) => tracing::warn!(
                    path = %path.display(),
                    found = %resource.kind(),
                    "skipping resource stored under the wrong kind"
                ),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping unreadable resource"),
            }
        }
        Ok(resources)
    }
}

impl ResourceStore for DirStore {
    fn names(&self, kind: ResourceKind) -> Result<HashSet<String>> {
        Ok(self
            .read_kind(kind)?
            .iter()
            .map(|r| r.name().to_string())
            .collect())
    }

    fn save(&self, resource: &Resource) -> Result<()> {
        let path = self.path_for(resource.kind(), resource.name())?;
        if path.exists() {
            return Err(Error::Store(format!(
                "{} '{}' already exists",
                resource.kind(),
                resource.name()
            )));
        }
        let mut text = serde_json::to_string_pretty(resource).map_err(|e| Error::Serialize {
            what: format!("{} '{}'", resource.kind(), resource.name()),
            message: e.to_string(),
        })?;
        text.push('\n');
        write_atomic(&path, text.as_bytes())?;
        tracing::debug!(path = %path.display(), "saved resource");
        Ok(())
    }

    fn load_bundle(&self) -> Result<ResourceBundle> {
        let mut bundle = empty_bundle();
        for kind in ResourceKind::ALL {
            for resource in self.read_kind(kind)? {
                push(&mut bundle, resource);
            }
        }
        Ok(bundle)
    }
}

/// In-memory store for tests and dry runs.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<BTreeMap<(ResourceKind, String), Resource>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-filled with `resources`.
    pub fn with(resources: impl IntoIterator<Item = Resource>) -> Self {
        let store = Self::new();
        {
            let mut inner = store.inner.lock();
            for r in resources {
                inner.insert((r.kind(), r.name().to_string()), r);
            }
        }
        store
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn get(&self, kind: ResourceKind, name: &str) -> Option<Resource> {
        self.inner.lock().get(&(kind, name.to_string())).cloned()
    }
}

impl ResourceStore for MemoryStore {
    fn names(&self, kind: ResourceKind) -> Result<HashSet<String>> {
        Ok(self
            .inner
            .lock()
            .keys()
            .filter(|(k, _)| *k == kind)
            .map(|(_, n)| n.clone())
            .collect())
    }

    fn save(&self, resource: &Resource) -> Result<()> {
        let mut inner = self.inner.lock();
        let key = (resource.kind(), resource.name().to_string());
        if inner.contains_key(&key) {
            return Err(Error::Store(format!(
                "{} '{}' already exists",
                resource.kind(),
                resource.name()
            )));
        }
        inner.insert(key, resource.clone());
        Ok(())
    }

    fn load_bundle(&self) -> Result<ResourceBundle> {
        let mut bundle = empty_bundle();
        for resource in self.inner.lock().values() {
            push(&mut bundle, resource.clone());
        }
        Ok(bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{McpServer, Rule};
    use tempfile::tempdir;

    #[test]
    fn dir_store_round_trips_resources() {
        let tmp = tempdir().unwrap();
        let store = DirStore::new(tmp.path());
        let server = Resource::Server(McpServer::stdio("fs", "npx", &[]));
        let rule = Resource::Rule(Rule {
            name: "style".into(),
            body: "Be terse.".into(),
            ..Rule::default()
        });
        store.save(&server).unwrap();
        store.save(&rule).unwrap();

        assert!(tmp.path().join("servers/fs.json").is_file());
        assert_eq!(
            store.names(ResourceKind::Server).unwrap(),
            HashSet::from(["fs".to_string()])
        );
        let bundle = store.load_bundle().unwrap();
        assert_eq!(bundle.servers.unwrap().len(), 1);
        assert_eq!(bundle.rules.unwrap()[0].body, "Be terse.");
        assert_eq!(bundle.agents, Some(vec![]));
    }

    #[test]
    fn saving_an_existing_name_fails() {
        let tmp = tempdir().unwrap();
        let store = DirStore::new(tmp.path());
        let server = Resource::Server(McpServer::stdio("fs", "npx", &[]));
        store.save(&server).unwrap();
        assert!(matches!(store.save(&server), Err(Error::Store(_))));

        let memory = MemoryStore::new();
        memory.save(&server).unwrap();
        assert!(matches!(memory.save(&server), Err(Error::Store(_))));
    }

    #[test]
    fn corrupt_files_are_skipped() {
        let tmp = tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("servers")).unwrap();
        fs::write(tmp.path().join("servers/bad.json"), "{").unwrap();
        let store = DirStore::new(tmp.path());
        assert!(store.names(ResourceKind::Server).unwrap().is_empty());
    }

    #[test]
    fn memory_store_names_are_per_kind() {
        let store = MemoryStore::with([
            Resource::Server(McpServer::stdio("x", "a", &[])),
            Resource::Rule(Rule {
                name: "y".into(),
                ..Rule::default()
            }),
        ]);
        assert_eq!(store.names(ResourceKind::Server).unwrap().len(), 1);
        assert!(store.names(ResourceKind::Agent).unwrap().is_empty());
        assert!(store.get(ResourceKind::Rule, "y").is_some());
    }
}
