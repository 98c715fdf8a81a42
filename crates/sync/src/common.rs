//! Canonical, tool-agnostic resource types.
//!
//! These are handed to the engine by value on every call; nothing here is
//! retained between calls.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The closed set of resource kinds the engine knows how to sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Server,
    Command,
    Rule,
    Skill,
    Agent,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::Server,
        ResourceKind::Command,
        ResourceKind::Rule,
        ResourceKind::Skill,
        ResourceKind::Agent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Server => "server",
            Self::Command => "command",
            Self::Rule => "rule",
            Self::Skill => "skill",
            Self::Agent => "agent",
        }
    }

    /// Parses a kind from user input; accepts singular and plural forms.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "server" | "servers" | "mcp" => Some(Self::Server),
            "command" | "commands" => Some(Self::Command),
            "rule" | "rules" => Some(Self::Rule),
            "skill" | "skills" => Some(Self::Skill),
            "agent" | "agents" => Some(Self::Agent),
            _ => None,
        }
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A small copyable set of [`ResourceKind`]s.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ResourceSet(u8);

impl ResourceSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn all() -> Self {
        ResourceKind::ALL.into_iter().collect()
    }

    pub fn of(kinds: &[ResourceKind]) -> Self {
        kinds.iter().copied().collect()
    }

    pub fn contains(&self, kind: ResourceKind) -> bool {
        self.0 & kind.bit() != 0
    }

    pub fn insert(&mut self, kind: ResourceKind) {
        self.0 |= kind.bit();
    }

    pub fn remove(&mut self, kind: ResourceKind) {
        self.0 &= !kind.bit();
    }

    pub fn intersect(self, other: ResourceSet) -> Self {
        Self(self.0 & other.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = ResourceKind> {
        ResourceKind::ALL
            .into_iter()
            .filter(move |k| self.contains(*k))
    }
}

impl FromIterator<ResourceKind> for ResourceSet {
    fn from_iter<I: IntoIterator<Item = ResourceKind>>(iter: I) -> Self {
        let mut set = Self::empty();
        for kind in iter {
            set.insert(kind);
        }
        set
    }
}

/// Where a resource applies: the current project or the whole machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Local,
    #[default]
    Global,
}

/// Transport used to reach an MCP server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum McpTransport {
    #[default]
    Stdio,
    Http,
    Sse,
}

impl McpTransport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stdio => "stdio",
            Self::Http => "http",
            Self::Sse => "sse",
        }
    }

    pub fn is_remote(&self) -> bool {
        !matches!(self, Self::Stdio)
    }
}

/// An MCP server definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpServer {
    pub name: String,
    #[serde(default)]
    pub scope: Scope,
    #[serde(default)]
    pub transport: McpTransport,
    /// Launch command for stdio servers.
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Endpoint for remote servers.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl McpServer {
    /// Builds an enabled stdio server.
    pub fn stdio(name: impl Into<String>, command: impl Into<String>, args: &[&str]) -> Self {
        Self {
            name: name.into(),
            scope: Scope::Global,
            transport: McpTransport::Stdio,
            command: command.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
            url: None,
            headers: BTreeMap::new(),
            env: BTreeMap::new(),
            enabled: true,
        }
    }

    /// Builds an enabled remote server.
    pub fn remote(name: impl Into<String>, transport: McpTransport, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scope: Scope::Global,
            transport,
            command: String::new(),
            args: Vec::new(),
            url: Some(url.into()),
            headers: BTreeMap::new(),
            env: BTreeMap::new(),
            enabled: true,
        }
    }
}

/// A slash command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub name: String,
    #[serde(default)]
    pub scope: Scope,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub argument_hint: Option<String>,
    /// Prompt body. `$ARGUMENTS` is the placeholder for user input.
    pub body: String,
}

/// A rule: instructions applied automatically, optionally limited to globs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    #[serde(default)]
    pub scope: Scope,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub globs: Vec<String>,
    #[serde(default)]
    pub always_apply: bool,
    pub body: String,
}

/// A skill, delivered as a `SKILL.md` inside a directory named after it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    #[serde(default)]
    pub scope: Scope,
    #[serde(default)]
    pub description: Option<String>,
    pub body: String,
}

/// A subagent definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub name: String,
    #[serde(default)]
    pub scope: Scope,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub tools: Vec<String>,
    pub body: String,
}

/// Any canonical resource. Used where a single value of unknown kind is
/// passed around, e.g. when committing an import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Resource {
    Server(McpServer),
    Command(Command),
    Rule(Rule),
    Skill(Skill),
    Agent(Agent),
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Server(_) => ResourceKind::Server,
            Self::Command(_) => ResourceKind::Command,
            Self::Rule(_) => ResourceKind::Rule,
            Self::Skill(_) => ResourceKind::Skill,
            Self::Agent(_) => ResourceKind::Agent,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Server(r) => &r.name,
            Self::Command(r) => &r.name,
            Self::Rule(r) => &r.name,
            Self::Skill(r) => &r.name,
            Self::Agent(r) => &r.name,
        }
    }
}

/// Implemented by every canonical resource type.
pub trait Named {
    const KIND: ResourceKind;

    fn name(&self) -> &str;

    fn into_resource(self) -> Resource;
}

macro_rules! impl_named {
    ($ty:ty, $kind:ident) => {
        impl Named for $ty {
            const KIND: ResourceKind = ResourceKind::$kind;

            fn name(&self) -> &str {
                &self.name
            }

            fn into_resource(self) -> Resource {
                Resource::$kind(self)
            }
        }
    };
}

impl_named!(McpServer, Server);
impl_named!(Command, Command);
impl_named!(Rule, Rule);
impl_named!(Skill, Skill);
impl_named!(Agent, Agent);

/// The canonical resources for one sync call.
///
/// `None` means "not requested"; `Some(vec![])` means "requested and empty",
/// which removes every managed entry of that kind from each tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceBundle {
    pub servers: Option<Vec<McpServer>>,
    pub commands: Option<Vec<Command>>,
    pub rules: Option<Vec<Rule>>,
    pub skills: Option<Vec<Skill>>,
    pub agents: Option<Vec<Agent>>,
}

impl ResourceBundle {
    /// Kinds present in this bundle.
    pub fn kinds(&self) -> ResourceSet {
        let mut set = ResourceSet::empty();
        if self.servers.is_some() {
            set.insert(ResourceKind::Server);
        }
        if self.commands.is_some() {
            set.insert(ResourceKind::Command);
        }
        if self.rules.is_some() {
            set.insert(ResourceKind::Rule);
        }
        if self.skills.is_some() {
            set.insert(ResourceKind::Skill);
        }
        if self.agents.is_some() {
            set.insert(ResourceKind::Agent);
        }
        set
    }

    /// Drops every kind not in `kinds`.
    pub fn restrict(mut self, kinds: ResourceSet) -> Self {
        if !kinds.contains(ResourceKind::Server) {
            self.servers = None;
        }
        if !kinds.contains(ResourceKind::Command) {
            self.commands = None;
        }
        if !kinds.contains(ResourceKind::Rule) {
            self.rules = None;
        }
        if !kinds.contains(ResourceKind::Skill) {
            self.skills = None;
        }
        if !kinds.contains(ResourceKind::Agent) {
            self.agents = None;
        }
        self
    }

    /// Removes disabled servers. Applied once before any adapter sees the
    /// bundle.
    pub fn without_disabled(mut self) -> Self {
        if let Some(servers) = self.servers.as_mut() {
            let before = servers.len();
            servers.retain(|s| s.enabled);
            let dropped = before - servers.len();
            if dropped > 0 {
                tracing::debug!(dropped, "excluded disabled servers from sync");
            }
        }
        self
    }
}
