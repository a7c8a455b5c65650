// src/core/test_support.rs

use crate::core::sender::{CommandSender, SenderKind};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

/// An in-memory sender for tests. Clones share their permission set and inbox, so a
/// test can revoke a permission after a command has been parsed.
#[derive(Debug, Clone)]
pub struct TestSender {
    name: String,
    kind: SenderKind,
    op: bool,
    permissions: Arc<Mutex<HashSet<String>>>,
    messages: Arc<Mutex<Vec<String>>>,
}

impl TestSender {
    pub fn new(name: &str, kind: SenderKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            op: false,
            permissions: Arc::default(),
            messages: Arc::default(),
        }
    }

    pub fn player(name: &str) -> Self {
        Self::new(name, SenderKind::Player)
    }

    pub fn console(name: &str) -> Self {
        Self::new(name, SenderKind::Console)
    }

    pub fn with_permission(self, node: &str) -> Self {
        self.grant(node);
        self
    }

    pub fn as_op(mut self) -> Self {
        self.op = true;
        self
    }

    pub fn grant(&self, node: &str) {
        self.permissions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(node.to_string());
    }

    pub fn revoke(&self, node: &str) {
        self.permissions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(node);
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl CommandSender for TestSender {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> SenderKind {
        self.kind
    }

    fn has_permission(&self, node: &str) -> bool {
        let permissions = self.permissions.lock().unwrap_or_else(PoisonError::into_inner);
        permissions.contains(node)
            || permissions.iter().any(|held| {
                held.strip_suffix(".*")
                    .and_then(|prefix| node.strip_prefix(prefix))
                    .is_some_and(|rest| rest.starts_with('.'))
            })
    }

    fn is_op(&self) -> bool {
        self.op
    }

    fn send_message(&self, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }
}
