// src/models.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// --- REGISTRY MODELS ---
// These are the read-only views handed to help/introspection tooling.

/// Identifies who registered a command (a plugin, a module, a test...).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Owner {
    /// Human readable name of the owner.
    pub name: String,
    /// Unique identity, stable for the lifetime of the owning `CommandManager`.
    pub id: Uuid,
}

impl Owner {
    /// Creates an owner with a fresh random identity.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: Uuid::new_v4(),
        }
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// A registry entry as seen from outside the engine.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RegisteredCommand {
    /// Canonical command name.
    pub name: String,
    /// Alternate names that redirect to the canonical root.
    pub aliases: Vec<String>,
    /// One entry per executable route, each a list of argument signatures
    /// such as `<amount:integer>` or `[player:string]`.
    pub arguments: Vec<Vec<String>>,
    /// The command-level permission, rendered.
    pub permission: String,
    /// Short help line.
    pub short_description: Option<String>,
    /// Full help text.
    pub full_description: Option<String>,
    /// Usage lines supplied by the declaration.
    pub usage: Vec<String>,
    /// Who registered the command.
    pub owner: Option<Owner>,
}

impl RegisteredCommand {
    /// Returns `true` if `name` is the canonical name or one of the aliases
    /// (case-insensitive).
    pub fn answers_to(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
    }
}

// --- SERIALIZATION HOOK MODELS ---

/// How an argument type consumes input.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Consumption {
    /// Exactly one whitespace-delimited token.
    #[default]
    SingleToken,
    /// One token, or one quoted string that may contain spaces.
    Quotable,
    /// Everything up to the end of the line.
    Greedy,
}

/// The kind tag of a described node.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NodeKindTag {
    /// The implicit root holding every registered command.
    Root,
    /// A fixed keyword (command names, aliases, literal arguments).
    Literal,
    /// A typed argument.
    Argument,
}

/// One node of a [`TreeDescription`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NodeDescription {
    /// Node kind.
    pub kind: NodeKindTag,
    /// Literal text or argument name. `None` for the root.
    pub name: Option<String>,
    /// Parser id for argument nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parser: Option<String>,
    /// Consumption rule for argument nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumption: Option<Consumption>,
    /// Parser properties for argument nodes (bounds, literal sets...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<serde_json::Value>,
    /// Whether input may end at this node.
    pub executable: bool,
    /// Indices of child nodes, in dispatch order.
    pub children: Vec<usize>,
    /// Index of the node dispatch continues at, for alias nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<usize>,
}

/// A flat, deterministic description of the whole command tree.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct TreeDescription {
    /// Index of the root node in `nodes`.
    pub root: usize,
    /// All nodes in breadth-first order.
    pub nodes: Vec<NodeDescription>,
}
