//! Helpers shared by the concrete adapters.

use crate::common::{Agent, Command, McpServer, McpTransport, Named, Rule, Skill};
use crate::document::json::{self, JsonDocument};
use crate::document::{FileSet, MarkdownFile, MANAGED_KEY};
use crate::report::{SkipReason, WriteReport};
use crate::{Error, Result};
use serde_json::{Map, Value};
use std::path::Path;

/// Reads every entry under `key_path` of a JSON document, decoding each with
/// `decode`. Entries that fail to decode are logged and skipped.
pub(crate) fn read_json_servers(
    path: &Path,
    key_path: &[&str],
    decode: impl Fn(&str, &Value) -> Option<McpServer>,
) -> Result<Vec<McpServer>> {
    servers_from(&JsonDocument::load(path)?, key_path, decode)
}

/// [`read_json_servers`] for tools whose settings may carry comments.
pub(crate) fn read_jsonc_servers(
    path: &Path,
    key_path: &[&str],
    decode: impl Fn(&str, &Value) -> Option<McpServer>,
) -> Result<Vec<McpServer>> {
    servers_from(&JsonDocument::load_relaxed(path)?, key_path, decode)
}

fn servers_from(
    doc: &JsonDocument,
    key_path: &[&str],
    decode: impl Fn(&str, &Value) -> Option<McpServer>,
) -> Result<Vec<McpServer>> {
    let path = doc.path();
    let mut servers = Vec::new();
    for (name, entry) in doc.entries(key_path)? {
        match decode(name, entry) {
            Some(server) => servers.push(server),
            None => tracing::warn!(
                server = name,
                path = %path.display(),
                "skipping server entry that could not be read"
            ),
        }
    }
    Ok(servers)
}

/// Merges `servers` into the section at `key_path`. `encode` returns the
/// native entry, or the reason the tool cannot express the server.
pub(crate) fn write_json_servers(
    path: &Path,
    key_path: &[&str],
    servers: &[McpServer],
    encode: impl Fn(&McpServer) -> std::result::Result<Map<String, Value>, String>,
) -> Result<WriteReport> {
    let mut report = WriteReport::default();
    let mut entries = Vec::with_capacity(servers.len());
    for server in servers {
        match encode(server) {
            Ok(entry) => entries.push((server.name.clone(), entry)),
            Err(reason) => report.skip(SkipReason::Unsupported {
                item: server.name.clone(),
                reason,
            }),
        }
    }

    let mut doc = JsonDocument::load(path)?;
    doc.merge_section(key_path, entries, &mut report)?;
    report.changed = doc.save()?;
    tracing::debug!(path = %path.display(), written = report.written, "merged servers");
    Ok(report)
}

/// Decodes the common `{command, args, env}` / `{url, headers}` shape most
/// tools share. `url_keys` lists the keys the tool uses for an endpoint.
pub(crate) fn decode_common_server(name: &str, entry: &Value, url_keys: &[&str]) -> Option<McpServer> {
    entry.as_object()?;
    let enabled = !entry.get("disabled").and_then(Value::as_bool).unwrap_or(false);

    if let Some(command) = json::str_field(entry, "command") {
        let mut server = McpServer::stdio(name, command, &[]);
        server.args = json::string_list(entry, "args", name);
        server.env = json::string_map(entry, "env", name);
        server.enabled = enabled;
        return Some(server);
    }

    let (key, url) = url_keys
        .iter()
        .find_map(|k| json::str_field(entry, k).map(|u| (*k, u)))?;
    let transport = match json::str_field(entry, "type") {
        Some("sse") => McpTransport::Sse,
        Some(_) => McpTransport::Http,
        None if key == "httpUrl" || key == "serverUrl" => McpTransport::Http,
        None if url.trim_end_matches('/').ends_with("/sse") => McpTransport::Sse,
        None => McpTransport::Http,
    };
    let mut server = McpServer::remote(name, transport, url);
    server.headers = json::string_map(entry, "headers", name);
    server.enabled = enabled;
    Some(server)
}

/// Builds `{command, args?, env?}` for a stdio server.
pub(crate) fn stdio_entry(server: &McpServer) -> std::result::Result<Map<String, Value>, String> {
    if server.command.trim().is_empty() {
        return Err("stdio server has no command".to_string());
    }
    let mut entry = Map::new();
    entry.insert("command".into(), Value::String(server.command.clone()));
    if !server.args.is_empty() {
        entry.insert("args".into(), string_array(&server.args));
    }
    if !server.env.is_empty() {
        entry.insert("env".into(), string_object(&server.env));
    }
    Ok(entry)
}

/// Builds `{<url_key>, headers?}` for a remote server.
pub(crate) fn remote_entry(
    server: &McpServer,
    url_key: &str,
) -> std::result::Result<Map<String, Value>, String> {
    let url = match server.url.as_deref() {
        Some(url) if !url.trim().is_empty() => url,
        _ => return Err(format!("{} server has no url", server.transport.as_str())),
    };
    let mut entry = Map::new();
    entry.insert(url_key.into(), Value::String(url.to_string()));
    if !server.headers.is_empty() {
        entry.insert("headers".into(), string_object(&server.headers));
    }
    Ok(entry)
}

pub(crate) fn string_array(values: &[String]) -> Value {
    Value::Array(values.iter().cloned().map(Value::String).collect())
}

pub(crate) fn string_object(values: &std::collections::BTreeMap<String, String>) -> Value {
    Value::Object(
        values
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect(),
    )
}

/// True when the markdown `content` carries the managed marker.
pub(crate) fn markdown_is_managed(content: &str) -> bool {
    MarkdownFile::parse(content).is_ok_and(|file| file.is_managed())
}

/// Reads every markdown file in `set`. Files with broken frontmatter are
/// logged and skipped.
pub(crate) fn read_markdown<T>(set: &FileSet, decode: impl Fn(String, MarkdownFile) -> T) -> Result<Vec<T>> {
    let mut items = Vec::new();
    for entry in set.scan()? {
        match MarkdownFile::parse(&entry.content) {
            Ok(mut file) => {
                file.frontmatter.remove(MANAGED_KEY);
                items.push(decode(entry.name, file));
            }
            Err(message) => tracing::warn!(
                path = %entry.path.display(),
                error = %message,
                "skipping file with unreadable frontmatter"
            ),
        }
    }
    Ok(items)
}

/// Writes `items` as managed markdown files in `set`.
pub(crate) fn write_markdown<T: Named>(
    set: &FileSet,
    items: &[T],
    encode: impl Fn(&T) -> MarkdownFile,
) -> Result<WriteReport> {
    let entries = items
        .iter()
        .map(|item| {
            let mut file = encode(item);
            file.mark_managed();
            let text = file.render().map_err(|message| Error::Serialize {
                what: format!("{} '{}'", T::KIND, item.name()),
                message,
            })?;
            Ok((item.name().to_string(), text))
        })
        .collect::<Result<Vec<_>>>()?;
    let mut report = WriteReport::default();
    set.merge(entries, markdown_is_managed, &mut report)?;
    tracing::debug!(dir = %set.dir().display(), kind = %T::KIND, written = report.written, "merged files");
    Ok(report)
}

pub(crate) fn command_to_markdown(command: &Command) -> MarkdownFile {
    let mut file = MarkdownFile::new(&command.body);
    file.set_opt("description", command.description.as_deref());
    file.set_opt("argument-hint", command.argument_hint.as_deref());
    file
}

pub(crate) fn command_from_markdown(name: String, file: MarkdownFile) -> Command {
    Command {
        description: file.get_str("description").map(String::from),
        argument_hint: file.get_str("argument-hint").map(String::from),
        body: file.body,
        name,
        ..Command::default()
    }
}

/// `SKILL.md` carries its own name in the frontmatter.
pub(crate) fn skill_to_markdown(skill: &Skill) -> MarkdownFile {
    let mut file = MarkdownFile::new(&skill.body);
    file.set_str("name", &skill.name);
    file.set_opt("description", skill.description.as_deref());
    file
}

pub(crate) fn skill_from_markdown(dir_name: String, file: MarkdownFile) -> Skill {
    Skill {
        name: file.get_str("name").map(String::from).unwrap_or(dir_name),
        description: file.get_str("description").map(String::from),
        body: file.body,
        ..Skill::default()
    }
}

/// Agent files in the Claude Code layout (`tools` as a comma list).
pub(crate) fn agent_to_markdown(agent: &Agent) -> MarkdownFile {
    let mut file = MarkdownFile::new(&agent.body);
    file.set_str("name", &agent.name);
    file.set_opt("description", agent.description.as_deref());
    if !agent.tools.is_empty() {
        file.set_str("tools", &agent.tools.join(", "));
    }
    file.set_opt("model", agent.model.as_deref());
    file
}

pub(crate) fn agent_from_markdown(file_name: String, file: MarkdownFile) -> Agent {
    Agent {
        name: file.get_str("name").map(String::from).unwrap_or(file_name),
        description: file.get_str("description").map(String::from),
        model: file.get_str("model").map(String::from),
        tools: file.get_list("tools"),
        body: file.body,
        ..Agent::default()
    }
}

/// Cursor `.mdc` rule files.
pub(crate) fn rule_to_markdown(rule: &Rule) -> MarkdownFile {
    let mut file = MarkdownFile::new(&rule.body);
    file.set_opt("description", rule.description.as_deref());
    if !rule.globs.is_empty() {
        file.set_str("globs", &rule.globs.join(","));
    }
    file.set_bool("alwaysApply", rule.always_apply);
    file
}

pub(crate) fn rule_from_markdown(name: String, file: MarkdownFile) -> Rule {
    Rule {
        description: file.get_str("description").map(String::from),
        globs: file.get_list("globs"),
        always_apply: file.get_bool("alwaysApply").unwrap_or(false),
        body: file.body,
        name,
        ..Rule::default()
    }
}
