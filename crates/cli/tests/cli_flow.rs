//! Runs the `skein` binary against a throwaway home directory.

use anyhow::{Context, Result};
use skein_test_utils::TestFixture;
use std::fs;
use std::process::{Command, Output};

fn skein(fixture: &TestFixture, args: &[&str]) -> Result<Output> {
    let output = Command::new(env!("CARGO_BIN_EXE_skein"))
        .args(args)
        .env("HOME", &fixture.home)
        .env("XDG_CONFIG_HOME", &fixture.config)
        .env("SKEIN_HOME", &fixture.store)
        .env_remove("SKEIN_SETTINGS")
        .env_remove("SKEIN_WORKERS")
        .env_remove("SKEIN_NO_BACKUP")
        .env_remove("RUST_LOG")
        .output()
        .with_context(|| format!("failed to run skein {:?}", args))?;
    if cfg!(debug_assertions) {
        eprintln!("skein {:?} stdout:\n{}", args, String::from_utf8_lossy(&output.stdout));
        eprintln!("skein {:?} stderr:\n{}", args, String::from_utf8_lossy(&output.stderr));
    }
    Ok(output)
}

fn seed_server(fixture: &TestFixture, name: &str, command: &str) -> Result<()> {
    let dir = fixture.store.join("servers");
    fs::create_dir_all(&dir)?;
    let resource = serde_json::json!({
        "kind": "server",
        "name": name,
        "command": command,
        "args": ["-y", "@mcp/fs"],
    });
    fs::write(
        dir.join(format!("{}.json", name)),
        serde_json::to_string_pretty(&resource)?,
    )?;
    Ok(())
}

#[test]
fn given_store_server_when_syncing_detected_tools_then_config_is_written_once() -> Result<()> {
    let fixture = TestFixture::new()?;
    seed_server(&fixture, "fs", "npx")?;
    fixture.install_home_tool(".cursor")?;

    let output = skein(&fixture, &["sync"])?;
    assert!(output.status.success());
    let text = fixture.read_home(".cursor/mcp.json")?;
    let value: serde_json::Value = serde_json::from_str(&text)?;
    assert_eq!(value["mcpServers"]["fs"]["command"], "npx");
    assert_eq!(value["mcpServers"]["fs"]["_managedBy"], "skein");
    assert!(!fixture.home.join(".codex").exists());

    let output = skein(&fixture, &["sync", "--format", "json"])?;
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(report["outcomes"][0]["tool"], "cursor");
    assert_eq!(report["outcomes"][0]["report"]["kinds"]["server"]["changed"], false);
    assert_eq!(fixture.read_home(".cursor/mcp.json")?, text);
    Ok(())
}

#[test]
fn given_malformed_tool_config_when_syncing_then_exit_fails_but_other_tools_are_written() -> Result<()> {
    let fixture = TestFixture::new()?;
    seed_server(&fixture, "fs", "npx")?;
    fixture.write_home(".cursor/mcp.json", "{")?;
    fixture.install_home_tool(".codex")?;

    let output = skein(&fixture, &["sync", "--tool", "cursor", "--tool", "codex"])?;
    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("cursor: failed"));
    assert!(stdout.contains("1 tool synced, 1 failed"));

    assert_eq!(fixture.read_home(".cursor/mcp.json")?, "{");
    assert!(fixture.read_home(".codex/config.toml")?.contains("[mcp_servers.fs]"));
    Ok(())
}

#[test]
fn given_tool_servers_when_importing_then_dry_run_saves_nothing_and_import_saves() -> Result<()> {
    let fixture = TestFixture::new()?;
    fixture.install_home_tool(".claude")?;
    fixture.write_home(
        ".claude.json",
        r#"{"mcpServers": {"git": {"type": "stdio", "command": "uvx", "args": ["mcp-server-git"]}}}"#,
    )?;

    let output = skein(&fixture, &["import", "claude-code", "--dry-run"])?;
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("+ server git"));
    assert!(!fixture.store.join("servers/git.json").exists());

    let output = skein(&fixture, &["import", "claude-code", "--kind", "server"])?;
    assert!(output.status.success());
    let saved: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(fixture.store.join("servers/git.json"))?)?;
    assert_eq!(saved["command"], "uvx");

    let output = skein(&fixture, &["import", "claude-code"])?;
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("already in store"));
    Ok(())
}

#[test]
fn given_backup_when_config_changes_then_restore_brings_back_the_backup() -> Result<()> {
    let fixture = TestFixture::new()?;
    let original = r#"{"mcpServers": {"mine": {"command": "keep"}}}"#;
    fixture.write_home(".cursor/mcp.json", original)?;

    let output = skein(&fixture, &["backup", "create", "cursor"])?;
    assert!(output.status.success());

    fixture.write_home(".cursor/mcp.json", "{}")?;
    let output = skein(&fixture, &["backup", "list", "cursor", "--format", "json"])?;
    let listed: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(listed[0]["backups"].as_array().map(Vec::len), Some(1));

    let output = skein(&fixture, &["backup", "restore", "cursor"])?;
    assert!(output.status.success());
    assert_eq!(fixture.read_home(".cursor/mcp.json")?, original);

    let output = skein(&fixture, &["backup", "restore", "codex"])?;
    assert!(!output.status.success());
    Ok(())
}

#[test]
fn given_one_installed_tool_when_listing_tools_then_every_tool_is_shown() -> Result<()> {
    let fixture = TestFixture::new()?;
    fixture.install_home_tool(".cursor")?;

    let output = skein(&fixture, &["tools", "--format", "json"])?;
    assert!(output.status.success());
    let tools: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    let tools = tools.as_array().context("tools should be an array")?;
    assert_eq!(tools.len(), 9);
    for tool in tools {
        let expected = tool["name"] == "cursor";
        assert_eq!(tool["detected"], expected, "{}", tool["name"]);
    }
    Ok(())
}

#[test]
fn given_disabled_tool_in_settings_when_syncing_it_then_it_is_unknown() -> Result<()> {
    let fixture = TestFixture::new()?;
    fs::write(
        fixture.store.join("settings.json"),
        r#"{"disabled_tools": ["cursor"]}"#,
    )?;
    fixture.install_home_tool(".cursor")?;

    let output = skein(&fixture, &["sync", "--tool", "cursor"])?;
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown tool 'cursor'"));
    Ok(())
}
