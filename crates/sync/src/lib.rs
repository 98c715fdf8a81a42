//! Configuration sync engine for skein.
//!
//! Reconciles one canonical set of MCP servers, commands, rules, skills and
//! agents against the native config files of many AI coding tools. Every
//! entry the engine writes carries a `_managedBy = "skein"` marker; entries
//! without it belong to the user and are never modified, so a sync can run
//! any number of times without touching hand-written configuration.
//!
//! # Examples
//!
//! ```
//! use skein_sync::{AdapterRegistry, McpServer, ResourceBundle, SyncOrchestrator, ToolPaths};
//!
//! let tmp = tempfile::tempdir().unwrap();
//! let registry = AdapterRegistry::builtin(&ToolPaths::under(tmp.path()));
//!
//! let bundle = ResourceBundle {
//!     servers: Some(vec![McpServer::stdio("fs", "npx", &["-y", "@mcp/fs"])]),
//!     ..Default::default()
//! };
//! let results = SyncOrchestrator::new(&registry).sync_all(bundle).unwrap();
//! assert!(results.is_success());
//! assert!(tmp.path().join("home/.cursor/mcp.json").exists());
//! ```

#![deny(unsafe_code)]

pub mod adapters;
pub mod backup;
pub mod common;
pub mod document;
pub mod error;
pub mod import;
pub mod orchestrator;
pub mod registry;
pub mod report;
pub mod store;

pub use adapters::{Adapter, ToolPaths};
pub use backup::{create_backup, list_backups, prune_backups, restore_backup, restore_from, BackupInfo};
pub use common::{
    Agent, Command, McpServer, McpTransport, Resource, ResourceBundle, ResourceKind, ResourceSet,
    Rule, Scope, Skill,
};
pub use document::{MANAGED_KEY, MANAGED_VALUE};
pub use error::{Error, Result};
pub use import::{ImportOrchestrator, ImportPreview, ImportResult, ImportSkip};
pub use orchestrator::{CancelFlag, SyncOptions, SyncOrchestrator};
pub use registry::AdapterRegistry;
pub use report::{SkipReason, SyncResults, ToolOutcome, ToolReport, WriteReport};
pub use store::{DirStore, MemoryStore, ResourceStore};
