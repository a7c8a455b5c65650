// src/cli/sender.rs

use crate::core::sender::{CommandSender, SenderKind};
use colored::Colorize;
use std::collections::HashSet;

/// The sender simulated by the binary. Messages go to stdout.
#[derive(Debug, Clone)]
pub struct TerminalSender {
    name: String,
    kind: SenderKind,
    op: bool,
    permissions: HashSet<String>,
}

impl TerminalSender {
    /// A sender without permissions.
    pub fn new(name: impl Into<String>, kind: SenderKind) -> Self {
        Self {
            name: name.into(),
            kind,
            op: false,
            permissions: HashSet::new(),
        }
    }

    /// Sets operator status.
    pub fn with_op(mut self, op: bool) -> Self {
        self.op = op;
        self
    }

    /// Grants permission nodes.
    pub fn with_permissions<I, T>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.permissions.extend(permissions.into_iter().map(Into::into));
        self
    }
}

impl CommandSender for TerminalSender {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> SenderKind {
        self.kind
    }

    /// Exact nodes, plus `a.b.*` granting everything under `a.b`.
    fn has_permission(&self, node: &str) -> bool {
        self.permissions.contains(node)
            || self.permissions.iter().any(|held| {
                held.strip_suffix(".*")
                    .and_then(|prefix| node.strip_prefix(prefix))
                    .is_some_and(|rest| rest.starts_with('.'))
            })
    }

    fn is_op(&self) -> bool {
        self.op
    }

    fn send_message(&self, message: &str) {
        println!("{} {}", "»".cyan(), message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_permissions() {
        let sender = TerminalSender::new("Steve", SenderKind::Player)
            .with_permissions(["economy.*", "demo.pvp"]);

        assert!(sender.has_permission("demo.pvp"));
        assert!(sender.has_permission("economy.admin"));
        assert!(sender.has_permission("economy.admin.reset"));
        assert!(!sender.has_permission("economy"));
        assert!(!sender.has_permission("economyx.admin"));
        assert!(!sender.is_op());
        assert!(sender.clone().with_op(true).is_op());
    }
}
