//! Command-line interface for the `skein` application.
//!
//! Resolves settings and tool locations, then hands off to the sync engine.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use commands::{Context, SyncArgs};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let ctx = Context::load()?;

    match cli.command {
        Commands::Tools => commands::handle_tools_command(&ctx, cli.format),
        Commands::Sync {
            tools,
            kinds,
            all,
            no_backup,
            workers,
        } => commands::handle_sync_command(
            &ctx,
            SyncArgs {
                tools,
                kinds,
                all,
                no_backup,
                workers,
            },
            cli.format,
        ),
        Commands::Import {
            tool,
            kinds,
            dry_run,
        } => commands::handle_import_command(&ctx, &tool, &kinds, dry_run, cli.format),
        Commands::Backup { action } => commands::handle_backup_command(&ctx, action, cli.format),
    }
}
