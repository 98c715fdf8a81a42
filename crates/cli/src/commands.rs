//! Handlers for each subcommand.

use crate::cli::{BackupAction, OutputFormat};
use anyhow::{bail, Context as _, Result};
use serde::Serialize;
use skein_state::{load_settings, store_root, Settings};
use skein_sync::adapters::{importable_kinds, writable_kinds};
use skein_sync::{
    create_backup, list_backups, restore_backup, restore_from, Adapter, AdapterRegistry,
    BackupInfo, DirStore, ImportOrchestrator, ImportPreview, ImportSkip, ResourceKind,
    ResourceSet, ResourceStore, SyncOptions, SyncOrchestrator, SyncResults, ToolPaths, ToolReport,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Everything a command needs, resolved once per run.
pub(crate) struct Context {
    pub settings: Settings,
    pub registry: AdapterRegistry,
    pub store: DirStore,
}

impl Context {
    pub fn load() -> Result<Self> {
        let settings = load_settings().context("loading settings")?;
        let root = store_root()?;
        let paths = ToolPaths::from_env()?;
        let registry = AdapterRegistry::builtin(&paths).without(&settings.disabled_tools);
        tracing::debug!(store = %root.display(), tools = registry.len(), "resolved context");
        Ok(Self {
            settings,
            registry,
            store: DirStore::new(root),
        })
    }

    fn adapter(&self, tool: &str) -> Result<&Arc<dyn Adapter>> {
        Ok(self.registry.require(tool)?)
    }
}

fn kind_set(kinds: &[ResourceKind]) -> ResourceSet {
    if kinds.is_empty() {
        ResourceSet::all()
    } else {
        ResourceSet::of(kinds)
    }
}

fn kind_list(set: ResourceSet) -> Vec<ResourceKind> {
    set.iter().collect()
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Serialize)]
struct ToolView<'a> {
    name: &'a str,
    detected: bool,
    writes: Vec<ResourceKind>,
    imports: Vec<ResourceKind>,
    config_paths: Vec<PathBuf>,
}

pub(crate) fn handle_tools_command(ctx: &Context, format: OutputFormat) -> Result<()> {
    let views: Vec<ToolView<'_>> = ctx
        .registry
        .all()
        .iter()
        .map(|a| ToolView {
            name: a.name(),
            detected: a.detect(),
            writes: kind_list(writable_kinds(a.as_ref())),
            imports: kind_list(importable_kinds(a.as_ref())),
            config_paths: a.config_paths(),
        })
        .collect();

    if format.is_json() {
        return print_json(&views);
    }
    for view in &views {
        let kinds: Vec<&str> = view.writes.iter().map(|k| k.as_str()).collect();
        println!(
            "{:<16}{:<10}{:<34}{}",
            view.name,
            if view.detected { "detected" } else { "-" },
            kinds.join(", "),
            view.config_paths
                .first()
                .map(|p| p.display().to_string())
                .unwrap_or_default()
        );
    }
    Ok(())
}

pub(crate) struct SyncArgs {
    pub tools: Vec<String>,
    pub kinds: Vec<ResourceKind>,
    pub all: bool,
    pub no_backup: bool,
    pub workers: Option<usize>,
}

#[derive(Serialize)]
struct OutcomeView<'a> {
    tool: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<&'a ToolReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct SyncView<'a> {
    outcomes: Vec<OutcomeView<'a>>,
    summary: String,
}

pub(crate) fn handle_sync_command(ctx: &Context, args: SyncArgs, format: OutputFormat) -> Result<()> {
    let bundle = ctx
        .store
        .load_bundle()
        .with_context(|| format!("loading canonical store {}", ctx.store.root().display()))?
        .restrict(kind_set(&args.kinds));

    let options = SyncOptions {
        backup: ctx.settings.backup && !args.no_backup,
        keep_backups: ctx.settings.keep_backups,
        workers: args.workers.unwrap_or(ctx.settings.workers),
        detected_only: args.tools.is_empty() && !args.all,
        only: (!args.tools.is_empty()).then_some(args.tools),
        ..SyncOptions::default()
    };
    let results = SyncOrchestrator::with_options(&ctx.registry, options).sync_all(bundle)?;
    print_sync_results(&results, format)?;

    if !results.is_success() {
        bail!("{}", results.summary());
    }
    Ok(())
}

fn print_sync_results(results: &SyncResults, format: OutputFormat) -> Result<()> {
    if format.is_json() {
        let view = SyncView {
            outcomes: results
                .outcomes
                .iter()
                .map(|o| OutcomeView {
                    tool: &o.tool,
                    report: o.result.as_ref().ok(),
                    error: o.result.as_ref().err().map(|e| e.to_string()),
                })
                .collect(),
            summary: results.summary(),
        };
        return print_json(&view);
    }

    for outcome in &results.outcomes {
        match &outcome.result {
            Ok(report) => {
                println!(
                    "{}: {} written, {} skipped{}",
                    outcome.tool,
                    report.total_written(),
                    report.total_skipped(),
                    if report.changed() { "" } else { " (unchanged)" }
                );
                for reason in report.kinds.values().flat_map(|r| &r.skipped) {
                    println!("  skipped: {}", reason.description());
                }
                for backup in &report.backups {
                    println!("  backup: {}", backup.display());
                }
            }
            Err(e) => println!("{}: failed: {}", outcome.tool, e),
        }
    }
    println!("{}", results.summary());
    Ok(())
}

pub(crate) fn handle_import_command(
    ctx: &Context,
    tool: &str,
    kinds: &[ResourceKind],
    dry_run: bool,
    format: OutputFormat,
) -> Result<()> {
    let import = ImportOrchestrator::new(&ctx.registry);
    let preview = import.preview(tool, kind_set(kinds), &ctx.store)?;
    let read_failures = preview.errors.len();

    if dry_run {
        if format.is_json() {
            print_json(&preview)?;
        } else {
            print_preview(&preview, true);
        }
    } else if format.is_json() {
        #[derive(Serialize)]
        struct ImportView {
            preview: ImportPreview,
            result: skein_sync::ImportResult,
        }
        let result = import.commit(preview.clone(), &ctx.store);
        let failed = result.errors.len();
        print_json(&ImportView { preview, result })?;
        if failed > 0 {
            bail!("{} resources could not be imported", failed);
        }
    } else {
        print_preview(&preview, false);
        let result = import.commit(preview, &ctx.store);
        for error in &result.errors {
            println!("  failed: {}", error);
        }
        println!("imported {} resources from {}", result.total(), result.tool);
        if !result.errors.is_empty() {
            bail!("{} resources could not be imported", result.errors.len());
        }
    }

    if read_failures > 0 {
        bail!("{} resource kinds could not be read from {}", read_failures, tool);
    }
    Ok(())
}

fn print_preview(preview: &ImportPreview, dry_run: bool) {
    let verb = if dry_run { "would import" } else { "importing" };
    if preview.is_empty() {
        println!("{}: nothing new to import", preview.tool);
    } else {
        println!("{}: {} {} resources", preview.tool, verb, preview.len());
    }
    let names = preview
        .servers
        .iter()
        .map(|r| ("server", r.name.as_str()))
        .chain(preview.commands.iter().map(|r| ("command", r.name.as_str())))
        .chain(preview.rules.iter().map(|r| ("rule", r.name.as_str())))
        .chain(preview.skills.iter().map(|r| ("skill", r.name.as_str())))
        .chain(preview.agents.iter().map(|r| ("agent", r.name.as_str())));
    for (kind, name) in names {
        println!("  + {} {}", kind, name);
    }
    for skip in &preview.skipped {
        match skip {
            ImportSkip::Exists { kind, name } => println!("  = {} {} (already in store)", kind, name),
            ImportSkip::Duplicate { kind, name } => println!("  = {} {} (duplicate)", kind, name),
        }
    }
    for failure in &preview.errors {
        println!("  ! {}: {}", failure.kind, failure.message);
    }
}

#[derive(Serialize)]
struct BackupView {
    path: PathBuf,
    backups: Vec<BackupInfo>,
}

pub(crate) fn handle_backup_command(
    ctx: &Context,
    action: BackupAction,
    format: OutputFormat,
) -> Result<()> {
    match action {
        BackupAction::List { tool } => {
            let adapter = ctx.adapter(&tool)?;
            let mut views = Vec::new();
            for path in adapter.config_paths() {
                let backups = list_backups(&path)?;
                views.push(BackupView { path, backups });
            }
            if format.is_json() {
                return print_json(&views);
            }
            for view in &views {
                println!("{}:", view.path.display());
                if view.backups.is_empty() {
                    println!("  (no backups)");
                }
                for backup in &view.backups {
                    println!("  {} ({} bytes)", backup.path.display(), backup.size);
                }
            }
            Ok(())
        }
        BackupAction::Create { tool } => {
            let adapter = ctx.adapter(&tool)?;
            let mut created = Vec::new();
            for path in adapter.config_paths() {
                match create_backup(&path)? {
                    Some(backup) => created.push(backup),
                    None => tracing::info!(path = %path.display(), "nothing to back up"),
                }
            }
            if format.is_json() {
                return print_json(&created);
            }
            if created.is_empty() {
                println!("{}: nothing to back up", tool);
            }
            for backup in &created {
                println!("created {}", backup.display());
            }
            Ok(())
        }
        BackupAction::Restore { tool, file } => {
            let adapter = ctx.adapter(&tool)?;
            let restored = match file {
                Some(file) => vec![restore_named(&adapter.config_paths(), &file)?],
                None => restore_latest(&adapter.config_paths())?,
            };
            if restored.is_empty() {
                bail!("no backups found for {}", tool);
            }
            if format.is_json() {
                return print_json(&restored);
            }
            for (path, backup) in &restored {
                println!("restored {} from {}", path.display(), backup.display());
            }
            Ok(())
        }
    }
}

fn restore_latest(paths: &[PathBuf]) -> Result<Vec<(PathBuf, PathBuf)>> {
    let mut restored = Vec::new();
    for path in paths {
        match restore_backup(path) {
            Ok(backup) => restored.push((path.clone(), backup)),
            Err(e) if e.is_no_backup() => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(restored)
}

fn restore_named(paths: &[PathBuf], file: &Path) -> Result<(PathBuf, PathBuf)> {
    for path in paths {
        let found = list_backups(path)?
            .into_iter()
            .find(|b| b.path.file_name() == file.file_name());
        if let Some(backup) = found {
            restore_from(path, &backup.path)?;
            return Ok((path.clone(), backup.path));
        }
    }
    bail!("{} is not a backup of any of this tool's files", file.display())
}
