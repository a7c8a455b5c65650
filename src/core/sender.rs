// src/core/sender.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of entity a command was sent by.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SenderKind {
    /// A connected player.
    Player,
    /// The server console.
    Console,
    /// A command block or similar scripted block.
    BlockCommand,
    /// A non-player entity.
    Entity,
    /// A sender acting on behalf of another one.
    Proxy,
    /// A remote console connection.
    Remote,
}

impl SenderKind {
    /// Every kind, in declaration order.
    pub const ALL: [SenderKind; 6] = [
        SenderKind::Player,
        SenderKind::Console,
        SenderKind::BlockCommand,
        SenderKind::Entity,
        SenderKind::Proxy,
        SenderKind::Remote,
    ];

    /// The lowercase name used in messages and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Console => "console",
            Self::BlockCommand => "block_command",
            Self::Entity => "entity",
            Self::Proxy => "proxy",
            Self::Remote => "remote",
        }
    }
}

impl fmt::Display for SenderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whoever typed the command. Requirement and permission predicates are evaluated
/// solely through this trait.
pub trait CommandSender: Send + Sync {
    /// The sender's display name.
    fn name(&self) -> &str;

    /// What kind of sender this is.
    fn kind(&self) -> SenderKind;

    /// Whether the sender holds permission `node`.
    fn has_permission(&self, node: &str) -> bool;

    /// Whether the sender is an operator.
    fn is_op(&self) -> bool {
        false
    }

    /// Shorthand for `self.kind() == kind`.
    fn is_kind(&self, kind: SenderKind) -> bool {
        self.kind() == kind
    }

    /// Delivers a message to the sender. Silently dropped by default.
    fn send_message(&self, _message: &str) {}
}
