// src/core/permission.rs

use crate::core::errors::DeclarationError;
use crate::core::sender::CommandSender;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

lazy_static! {
    // Dot separated segments; the last ones may be a `*` wildcard.
    static ref PERMISSION_NODE_RE: Regex =
        Regex::new(r"^[A-Za-z0-9_\-]+(\.([A-Za-z0-9_\-]+|\*))*$").unwrap();
}

/// A structured permission predicate over a sender's permission set.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CommandPermission {
    /// Everyone passes.
    #[default]
    None,
    /// Operators only.
    Op,
    /// Senders holding the given permission node.
    Node(String),
    /// Senders failing the inner permission.
    Not(Box<CommandPermission>),
    /// Senders passing every inner permission.
    All(Vec<CommandPermission>),
    /// Senders passing at least one inner permission.
    Any(Vec<CommandPermission>),
}

impl CommandPermission {
    /// A permission node such as `economy.admin`.
    pub fn node(node: impl Into<String>) -> Self {
        Self::Node(node.into())
    }

    /// Operators only.
    pub fn op() -> Self {
        Self::Op
    }

    /// The negation of this permission. Negating twice gives the original back.
    pub fn negate(self) -> Self {
        match self {
            Self::Not(inner) => *inner,
            other => Self::Not(Box::new(other)),
        }
    }

    /// Both this and `other` must pass.
    pub fn and(self, other: CommandPermission) -> Self {
        match (self, other) {
            (Self::None, p) | (p, Self::None) => p,
            (Self::All(mut left), Self::All(right)) => {
                left.extend(right);
                Self::All(left)
            }
            (Self::All(mut left), p) => {
                left.push(p);
                Self::All(left)
            }
            (p, q) => Self::All(vec![p, q]),
        }
    }

    /// Either this or `other` must pass.
    pub fn or(self, other: CommandPermission) -> Self {
        match (self, other) {
            (Self::Any(mut left), Self::Any(right)) => {
                left.extend(right);
                Self::Any(left)
            }
            (Self::Any(mut left), p) => {
                left.push(p);
                Self::Any(left)
            }
            (p, q) => Self::Any(vec![p, q]),
        }
    }

    /// Evaluates the permission for `sender`.
    pub fn test<S: CommandSender + ?Sized>(&self, sender: &S) -> bool {
        match self {
            Self::None => true,
            Self::Op => sender.is_op(),
            Self::Node(node) => sender.has_permission(node),
            Self::Not(inner) => !inner.test(sender),
            Self::All(all) => all.iter().all(|p| p.test(sender)),
            Self::Any(any) => any.iter().any(|p| p.test(sender)),
        }
    }

    /// Returns `true` for [`CommandPermission::None`].
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// All permission nodes referenced by this predicate.
    pub fn nodes(&self) -> Vec<&str> {
        let mut nodes = Vec::new();
        self.collect_nodes(&mut nodes);
        nodes
    }

    fn collect_nodes<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::None | Self::Op => {}
            Self::Node(node) => out.push(node),
            Self::Not(inner) => inner.collect_nodes(out),
            Self::All(list) | Self::Any(list) => {
                for p in list {
                    p.collect_nodes(out);
                }
            }
        }
    }

    /// Checks that every referenced node is well formed.
    pub fn validate(&self) -> Result<(), DeclarationError> {
        match self.nodes().into_iter().find(|n| !PERMISSION_NODE_RE.is_match(n)) {
            Some(bad) => Err(DeclarationError::InvalidPermission {
                node: bad.to_string(),
            }),
            None => Ok(()),
        }
    }
}

impl From<&str> for CommandPermission {
    fn from(node: &str) -> Self {
        Self::node(node)
    }
}

impl From<String> for CommandPermission {
    fn from(node: String) -> Self {
        Self::Node(node)
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, list: &[CommandPermission], sep: &str) -> fmt::Result {
    let parts: Vec<String> = list.iter().map(ToString::to_string).collect();
    write!(f, "({})", parts.join(sep))
}

impl fmt::Display for CommandPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            Self::Op => f.write_str("op"),
            Self::Node(node) => f.write_str(node),
            Self::Not(inner) => write!(f, "!{}", inner),
            Self::All(list) => write_joined(f, list, " & "),
            Self::Any(list) => write_joined(f, list, " | "),
        }
    }
}
