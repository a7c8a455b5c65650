// src/core/graph_display.rs

use crate::models::{NodeDescription, NodeKindTag, TreeDescription};
use std::fmt::Write;

/// Renders a described command tree as ASCII art, one node per line.
///
/// Executable nodes are marked with `(*)`, alias nodes show where they redirect.
pub fn render_tree(description: &TreeDescription) -> String {
    let mut out = String::new();
    let Some(root) = description.node(description.root) else {
        return out;
    };
    if root.children.is_empty() {
        out.push_str("No commands registered.\n");
        return out;
    }

    out.push_str("/\n");
    for (i, child) in root.children.iter().enumerate() {
        let is_last = i + 1 == root.children.len();
        render_node(description, *child, "", is_last, &mut out);
    }
    out
}

/// Recursive function to render a node and its descendants.
fn render_node(
    description: &TreeDescription,
    index: usize,
    prefix: &str,
    is_last: bool,
    out: &mut String,
) {
    let Some(node) = description.node(index) else {
        return;
    };
    let connector = if is_last { "└─" } else { "├─" };
    let executable_marker = if node.executable { " (*)" } else { "" };
    let _ = writeln!(
        out,
        "{}{}{}{}",
        prefix,
        connector,
        label(description, node),
        executable_marker
    );

    // Prepare the prefix for the children of this node
    let child_prefix = format!("{}{}", prefix, if is_last { "   " } else { "│  " });
    for (i, child) in node.children.iter().enumerate() {
        let is_last_child = i + 1 == node.children.len();
        render_node(description, *child, &child_prefix, is_last_child, out);
    }
}

fn label(description: &TreeDescription, node: &NodeDescription) -> String {
    let name = node.name.as_deref().unwrap_or_default();
    match (node.kind, node.redirect) {
        (_, Some(target)) => {
            let target = description
                .node(target)
                .and_then(|t| t.name.as_deref())
                .unwrap_or("?");
            format!("{} -> {}", name, target)
        }
        (NodeKindTag::Argument, None) => {
            format!("<{}:{}>", name, node.parser.as_deref().unwrap_or("?"))
        }
        (NodeKindTag::Literal | NodeKindTag::Root, None) => name.to_string(),
    }
}
