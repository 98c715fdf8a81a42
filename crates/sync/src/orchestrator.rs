//! Fans one canonical bundle out to every registered tool.

use crate::adapters::{writable_kinds, Adapter};
use crate::backup;
use crate::common::{ResourceBundle, ResourceKind};
use crate::error::{Error, Result};
use crate::registry::AdapterRegistry;
use crate::report::{SyncResults, ToolOutcome, ToolReport, WriteReport};
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation switch. Checked before each adapter starts; an
/// adapter already writing runs to completion.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Options for [`SyncOrchestrator::sync_all`].
///
/// ```
/// use skein_sync::SyncOptions;
///
/// let options = SyncOptions { workers: 2, ..Default::default() };
/// assert!(options.backup);
/// assert!(!options.detected_only);
/// ```
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Back up each native file before the first write to it.
    pub backup: bool,
    /// Keep at most this many backups per file.
    pub keep_backups: Option<usize>,
    /// Worker threads; `0` lets the pool pick.
    pub workers: usize,
    /// Only sync tools whose detection succeeds.
    pub detected_only: bool,
    /// Restrict the run to these tool names.
    pub only: Option<Vec<String>>,
    pub cancel: CancelFlag,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            backup: true,
            keep_backups: None,
            workers: 0,
            detected_only: false,
            only: None,
            cancel: CancelFlag::default(),
        }
    }
}

/// Runs a sync against the adapters of a registry.
pub struct SyncOrchestrator<'a> {
    registry: &'a AdapterRegistry,
    options: SyncOptions,
}

impl<'a> SyncOrchestrator<'a> {
    pub fn new(registry: &'a AdapterRegistry) -> Self {
        Self::with_options(registry, SyncOptions::default())
    }

    pub fn with_options(registry: &'a AdapterRegistry, options: SyncOptions) -> Self {
        Self { registry, options }
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Adapters this run targets, in registry order.
    pub fn targets(&self) -> Result<Vec<Arc<dyn Adapter>>> {
        if self.registry.is_empty() {
            return Err(Error::NoAdapters);
        }
        if let Some(only) = &self.options.only {
            for name in only {
                self.registry.require(name)?;
            }
        }
        Ok(self
            .registry
            .all()
            .iter()
            .filter(|a| {
                self.options
                    .only
                    .as_ref()
                    .is_none_or(|only| only.iter().any(|n| n == a.name()))
            })
            .filter(|a| !self.options.detected_only || a.detect())
            .cloned()
            .collect())
    }

    /// Writes `bundle` to every targeted tool.
    ///
    /// Each tool gets its own outcome; one tool failing never stops the
    /// others. Disabled servers are dropped before any tool sees the bundle.
    pub fn sync_all(&self, bundle: ResourceBundle) -> Result<SyncResults> {
        let targets = self.targets()?;
        let bundle = bundle.without_disabled();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.workers)
            .build()
            .map_err(|e| Error::InvalidArgument(format!("cannot start workers: {}", e)))?;

        let outcomes: Vec<ToolOutcome> = pool.install(|| {
            targets
                .par_iter()
                .map(|adapter| ToolOutcome {
                    tool: adapter.name().to_string(),
                    result: self.sync_one(adapter.as_ref(), &bundle),
                })
                .collect()
        });

        let results = SyncResults { outcomes };
        for (tool, err) in results.failed() {
            tracing::warn!(tool, error = %err, "sync failed");
        }
        tracing::info!(summary = %results.summary(), "sync finished");
        Ok(results)
    }

    fn sync_one(&self, adapter: &dyn Adapter, bundle: &ResourceBundle) -> Result<ToolReport> {
        if self.options.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let mut report = ToolReport::default();
        let kinds = writable_kinds(adapter).intersect(bundle.kinds());
        if kinds.is_empty() {
            tracing::debug!(tool = adapter.name(), "nothing to sync");
            return Ok(report);
        }

        if self.options.backup {
            for path in adapter.config_paths() {
                if let Some(created) = backup::create_backup(&path)? {
                    report.backups.push(created);
                }
                if let Some(keep) = self.options.keep_backups {
                    backup::prune_backups(&path, keep)?;
                }
            }
        }

        for kind in kinds.iter() {
            if let Some(written) = write_kind(adapter, bundle, kind) {
                report.kinds.insert(kind, written?);
            }
        }

        tracing::info!(
            tool = adapter.name(),
            written = report.total_written(),
            skipped = report.total_skipped(),
            changed = report.changed(),
            "synced tool"
        );
        Ok(report)
    }
}

/// Writes one kind through the adapter's capability. `None` when the
/// adapter lacks it or the bundle does not carry the kind.
fn write_kind(
    adapter: &dyn Adapter,
    bundle: &ResourceBundle,
    kind: ResourceKind,
) -> Option<Result<WriteReport>> {
    match kind {
        ResourceKind::Server => {
            let servers = bundle.servers.as_deref()?;
            Some(adapter.as_server_adapter()?.write_servers(servers))
        }
        ResourceKind::Command => {
            let commands = bundle.commands.as_deref()?;
            Some(adapter.as_commands_adapter()?.write_commands(commands))
        }
        ResourceKind::Rule => {
            let rules = bundle.rules.as_deref()?;
            Some(adapter.as_rules_adapter()?.write_rules(rules))
        }
        ResourceKind::Skill => {
            let skills = bundle.skills.as_deref()?;
            Some(adapter.as_skills_adapter()?.write_skills(skills))
        }
        ResourceKind::Agent => {
            let agents = bundle.agents.as_deref()?;
            Some(adapter.as_agents_adapter()?.write_agents(agents))
        }
    }
}
