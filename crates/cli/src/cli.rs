use clap::{Parser, Subcommand, ValueEnum};
use skein_sync::ResourceKind;
use std::path::PathBuf;

/// Output format for command results.
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn is_json(self) -> bool {
        self == Self::Json
    }
}

/// Command-line interface for the `skein` application.
#[derive(Debug, Parser)]
#[command(
    name = "skein",
    version,
    about = "Keeps MCP servers, commands, rules, skills and agents in sync across AI coding tools"
)]
pub struct Cli {
    /// Output format.
    #[arg(long, value_enum, global = true, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available `skein` commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Lists every supported tool and whether it is installed.
    Tools,
    /// Writes the canonical store into each tool's native configuration.
    Sync {
        /// Only sync these tools (repeatable). Defaults to every detected tool.
        #[arg(long = "tool", value_name = "TOOL")]
        tools: Vec<String>,
        /// Only sync these resource kinds (repeatable).
        #[arg(long = "kind", value_name = "KIND", value_parser = parse_kind)]
        kinds: Vec<ResourceKind>,
        /// Include tools that are not detected on this machine.
        #[arg(long, default_value_t = false)]
        all: bool,
        /// Skip backing up native files before writing.
        #[arg(long, default_value_t = false)]
        no_backup: bool,
        /// Worker threads (overrides `SKEIN_WORKERS` and settings).
        #[arg(long, value_name = "N")]
        workers: Option<usize>,
    },
    /// Copies resources a tool has that the canonical store lacks.
    Import {
        /// Tool to import from.
        tool: String,
        /// Only import these resource kinds (repeatable).
        #[arg(long = "kind", value_name = "KIND", value_parser = parse_kind)]
        kinds: Vec<ResourceKind>,
        /// Show what would be imported without saving anything.
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// Manages backups of a tool's native configuration files.
    Backup {
        #[command(subcommand)]
        action: BackupAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum BackupAction {
    /// Lists backups, oldest first.
    List { tool: String },
    /// Backs up the tool's files now.
    Create { tool: String },
    /// Restores the most recent backup, or a specific one with `--file`.
    Restore {
        tool: String,
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,
    },
}

fn parse_kind(s: &str) -> Result<ResourceKind, String> {
    ResourceKind::parse(s).ok_or_else(|| {
        format!(
            "unknown resource kind '{}' (expected one of: server, command, rule, skill, agent)",
            s
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn sync_accepts_repeated_tools_and_kinds() {
        let cli = Cli::try_parse_from([
            "skein", "sync", "--tool", "cursor", "--tool", "zed", "--kind", "servers", "--kind",
            "rule", "--no-backup",
        ])
        .unwrap();
        match cli.command {
            Commands::Sync {
                tools,
                kinds,
                no_backup,
                all,
                workers,
            } => {
                assert_eq!(tools, vec!["cursor", "zed"]);
                assert_eq!(kinds, vec![ResourceKind::Server, ResourceKind::Rule]);
                assert!(no_backup);
                assert!(!all);
                assert_eq!(workers, None);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err = Cli::try_parse_from(["skein", "import", "cursor", "--kind", "widgets"]).unwrap_err();
        assert!(err.to_string().contains("unknown resource kind"));
    }

    #[test]
    fn format_is_global() {
        let cli = Cli::try_parse_from(["skein", "backup", "list", "codex", "--format", "json"]).unwrap();
        assert!(cli.format.is_json());
        assert!(matches!(
            cli.command,
            Commands::Backup {
                action: BackupAction::List { .. }
            }
        ));
    }
}
