//! The set of adapters a sync or import runs against.
//!
//! A registry is an explicit value, built once and passed by reference.
//! Adapter names are unique within it, so the orchestrator never runs two
//! operations against the same tool at once.

use crate::adapters::{self, Adapter, ToolPaths};
use crate::error::{Error, Result};
use std::sync::Arc;

#[derive(Default, Clone)]
pub struct AdapterRegistry {
    adapters: Vec<Arc<dyn Adapter>>,
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.adapters.iter().map(|a| a.name()))
            .finish()
    }
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in adapter.
    pub fn builtin(paths: &ToolPaths) -> Self {
        Self {
            adapters: adapters::builtin(paths),
        }
    }

    /// Adds an adapter. A second adapter with an existing name is rejected.
    pub fn register(&mut self, adapter: Arc<dyn Adapter>) -> Result<()> {
        if self.get(adapter.name()).is_some() {
            return Err(Error::InvalidArgument(format!(
                "adapter '{}' is already registered",
                adapter.name()
            )));
        }
        tracing::debug!(tool = adapter.name(), "registered adapter");
        self.adapters.push(adapter);
        Ok(())
    }

    /// Every registered adapter, in registration order.
    pub fn all(&self) -> &[Arc<dyn Adapter>] {
        &self.adapters
    }

    /// Adapters whose tool appears to be installed.
    pub fn detected(&self) -> Vec<Arc<dyn Adapter>> {
        self.adapters
            .iter()
            .filter(|a| a.detect())
            .cloned()
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Adapter>> {
        self.adapters.iter().find(|a| a.name() == name)
    }

    /// Like [`get`](Self::get) but fails with [`Error::UnknownTool`].
    pub fn require(&self, name: &str) -> Result<&Arc<dyn Adapter>> {
        self.get(name)
            .ok_or_else(|| Error::UnknownTool(name.to_string()))
    }

    /// Drops the named adapters; unknown names are ignored.
    pub fn without(mut self, names: &[String]) -> Self {
        self.adapters
            .retain(|a| !names.iter().any(|n| n == a.name()));
        self
    }

    pub fn names(&self) -> Vec<&str> {
        self.adapters.iter().map(|a| a.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}
