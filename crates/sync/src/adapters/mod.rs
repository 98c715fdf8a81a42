//! Adapters translating canonical resources to each tool's native format.

mod claude_code;
mod claude_desktop;
mod codex;
mod cursor;
mod gemini;
mod opencode;
pub mod paths;
pub mod traits;
pub(crate) mod utils;
mod vscode;
mod windsurf;
mod zed;

pub use claude_code::ClaudeCodeAdapter;
pub use claude_desktop::ClaudeDesktopAdapter;
pub use codex::CodexAdapter;
pub use cursor::CursorAdapter;
pub use gemini::GeminiAdapter;
pub use opencode::OpenCodeAdapter;
pub use paths::ToolPaths;
pub use traits::{
    has_capability, importable_kinds, writable_kinds, Adapter, AgentsAdapter, CommandsAdapter,
    RulesAdapter, ServerAdapter, SkillsAdapter,
};
pub use vscode::VsCodeAdapter;
pub use windsurf::WindsurfAdapter;
pub use zed::ZedAdapter;

use std::sync::Arc;

/// Every built-in adapter, resolved against `paths`.
pub fn builtin(paths: &ToolPaths) -> Vec<Arc<dyn Adapter>> {
    vec![
        Arc::new(ClaudeCodeAdapter::new(paths)),
        Arc::new(ClaudeDesktopAdapter::new(paths)),
        Arc::new(CursorAdapter::new(paths)),
        Arc::new(CodexAdapter::new(paths)),
        Arc::new(GeminiAdapter::new(paths)),
        Arc::new(ZedAdapter::new(paths)),
        Arc::new(VsCodeAdapter::new(paths)),
        Arc::new(OpenCodeAdapter::new(paths)),
        Arc::new(WindsurfAdapter::new(paths)),
    ]
}
