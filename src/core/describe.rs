// src/core/describe.rs

//! # Describe
//!
//! Flattens the registry into a [`TreeDescription`] for clients that need the command
//! graph (e.g. a remote client building its own completion tree). Node indices are
//! assigned breadth-first from a synthetic root, visiting commands in registration
//! order, so the same registry always produces the same description.

use crate::constants::FINGERPRINT_LENGTH;
use crate::core::node::{CommandNode, NodeId, NodeKind};
use crate::core::registry::Registry;
use crate::models::{NodeDescription, NodeKindTag, TreeDescription};
use anyhow::{Context, Result};
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::Path;

/// Builds the flat description of every registered command.
pub fn describe<S: ?Sized>(registry: &Registry<S>) -> TreeDescription {
    let mut nodes = vec![NodeDescription {
        kind: NodeKindTag::Root,
        name: None,
        parser: None,
        consumption: None,
        properties: None,
        executable: false,
        children: Vec::new(),
        redirect: None,
    }];
    let mut indices: HashMap<(usize, NodeId), usize> = HashMap::new();
    let mut queue: VecDeque<(usize, NodeId)> = VecDeque::new();

    // 1. Command roots and alias nodes hang off the synthetic root.
    let mut top_level = Vec::new();
    for (entry_index, entry) in registry.entries().iter().enumerate() {
        let tree = &entry.tree;
        for id in std::iter::once(tree.root()).chain(tree.aliases().iter().copied()) {
            let index = nodes.len();
            indices.insert((entry_index, id), index);
            nodes.push(placeholder());
            top_level.push(index);
            queue.push_back((entry_index, id));
        }
    }
    if let Some(root) = nodes.first_mut() {
        root.children = top_level;
    }

    // 2. Breadth-first over every command tree.
    while let Some((entry_index, id)) = queue.pop_front() {
        let Some(entry) = registry.entries().get(entry_index) else {
            continue;
        };
        let Some(node) = entry.tree.node(id) else {
            continue;
        };

        let mut children = Vec::with_capacity(node.children().len());
        for child in node.children() {
            let index = nodes.len();
            indices.insert((entry_index, *child), index);
            nodes.push(placeholder());
            children.push(index);
            queue.push_back((entry_index, *child));
        }

        let redirect = node
            .redirect()
            .and_then(|target| indices.get(&(entry_index, target)).copied());
        let own_index = indices.get(&(entry_index, id)).copied();
        if let Some(slot) = own_index.and_then(|i| nodes.get_mut(i)) {
            *slot = node_description(node, children, redirect);
        }
    }

    TreeDescription { root: 0, nodes }
}

fn placeholder() -> NodeDescription {
    NodeDescription {
        kind: NodeKindTag::Literal,
        name: None,
        parser: None,
        consumption: None,
        properties: None,
        executable: false,
        children: Vec::new(),
        redirect: None,
    }
}

fn node_description<S: ?Sized>(
    node: &CommandNode<S>,
    children: Vec<usize>,
    redirect: Option<usize>,
) -> NodeDescription {
    let (kind, parser, consumption, properties) = match node.kind() {
        NodeKind::Literal { .. } | NodeKind::Redirect { .. } => (NodeKindTag::Literal, None, None, None),
        NodeKind::Argument { argument_type, .. } => (
            NodeKindTag::Argument,
            Some(argument_type.id().to_string()),
            Some(argument_type.consumption_rule()),
            argument_type.describe_properties(),
        ),
    };
    NodeDescription {
        kind,
        name: Some(node.name().to_string()),
        parser,
        consumption,
        properties,
        executable: node.is_executable(),
        children,
        redirect,
    }
}

impl TreeDescription {
    /// A short, stable digest of the description. Two registries with the same
    /// commands produce the same fingerprint.
    pub fn fingerprint(&self) -> String {
        let json = serde_json::to_vec(self).unwrap_or_default();
        let digest = blake3::hash(&json);
        let bytes = digest.as_bytes();
        hex::encode(bytes.get(..FINGERPRINT_LENGTH).unwrap_or(bytes))
    }

    /// Looks a node up by index.
    pub fn node(&self, index: usize) -> Option<&NodeDescription> {
        self.nodes.get(index)
    }
}

/// Writes the description as pretty JSON to `path`, creating parent directories.
pub fn write_dispatcher_file(description: &TreeDescription, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory '{}'", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(description)
        .context("Failed to serialize the command tree")?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write dispatcher file '{}'", path.display()))?;
    log::debug!("Wrote dispatcher file to '{}'.", path.display());
    Ok(())
}
