// src/core/node.rs

//! # Command Nodes
//!
//! Each registered command owns one [`CommandTree`]: an arena of nodes rooted at the
//! command's literal, plus one redirect node per alias. Nodes refer to each other by
//! [`NodeId`]; the parent link is a plain index and never owns anything.

use crate::core::arguments::{DefaultProvider, DynArgumentType, SuggestionProvider};
use crate::core::builder::Executor;
use crate::core::permission::CommandPermission;
use crate::core::sender::CommandSender;
use std::fmt;
use std::sync::Arc;

/// A predicate a sender must satisfy to use a node.
pub type Requirement<S> = Arc<dyn Fn(&S) -> bool + Send + Sync>;

/// Index of a node inside its [`CommandTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// The raw arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

/// What a node matches.
pub enum NodeKind<S: ?Sized> {
    /// A fixed word: a command name or a literal argument.
    Literal {
        /// The word.
        name: String,
    },
    /// A typed argument.
    Argument {
        /// The name handlers look the value up by.
        name: String,
        /// How the token is parsed.
        argument_type: Arc<dyn DynArgumentType>,
        /// Whether the parsed value is handed to the handler.
        listed: bool,
        /// Overrides the type's built-in suggestions.
        suggestions: Option<SuggestionProvider<S>>,
    },
    /// An alias. Dispatch continues at `target`.
    Redirect {
        /// The alias word.
        name: String,
        /// Where dispatch continues.
        target: NodeId,
    },
}

impl<S: ?Sized> Clone for NodeKind<S> {
    fn clone(&self) -> Self {
        match self {
            Self::Literal { name } => Self::Literal { name: name.clone() },
            Self::Argument {
                name,
                argument_type,
                listed,
                suggestions,
            } => Self::Argument {
                name: name.clone(),
                argument_type: Arc::clone(argument_type),
                listed: *listed,
                suggestions: suggestions.clone(),
            },
            Self::Redirect { name, target } => Self::Redirect {
                name: name.clone(),
                target: *target,
            },
        }
    }
}

impl<S: ?Sized> fmt::Debug for NodeKind<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal { name } => f.debug_struct("Literal").field("name", name).finish(),
            Self::Argument {
                name,
                argument_type,
                listed,
                ..
            } => f
                .debug_struct("Argument")
                .field("name", name)
                .field("parser", &argument_type.id())
                .field("listed", listed)
                .finish(),
            Self::Redirect { name, target } => f
                .debug_struct("Redirect")
                .field("name", name)
                .field("target", target)
                .finish(),
        }
    }
}

impl<S: ?Sized> NodeKind<S> {
    /// Two nodes with the same identity are the same node when trees are merged:
    /// literals by word, arguments by name, parser and parser properties.
    fn same_identity(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Literal { name: a }, Self::Literal { name: b }) => a == b,
            (
                Self::Argument {
                    name: a,
                    argument_type: ta,
                    ..
                },
                Self::Argument {
                    name: b,
                    argument_type: tb,
                    ..
                },
            ) => a == b && ta.id() == tb.id() && ta.describe_properties() == tb.describe_properties(),
            (Self::Redirect { name: a, .. }, Self::Redirect { name: b, .. }) => a == b,
            _ => false,
        }
    }
}

/// A value for an omitted optional argument, resolved when the command runs.
pub struct PendingDefault<S: ?Sized> {
    /// The argument name.
    pub(crate) name: String,
    /// `None` when the argument has no default and is simply absent.
    pub(crate) provider: Option<DefaultProvider<S>>,
}

impl<S: ?Sized> Clone for PendingDefault<S> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            provider: self.provider.clone(),
        }
    }
}

/// The executor attached to a node, with the defaults of the arguments cut off
/// after it.
pub struct Binding<S: ?Sized> {
    pub(crate) executor: Arc<Executor<S>>,
    pub(crate) defaults: Vec<PendingDefault<S>>,
    truncated: bool,
}

impl<S: ?Sized> Clone for Binding<S> {
    fn clone(&self) -> Self {
        Self {
            executor: Arc::clone(&self.executor),
            defaults: self.defaults.clone(),
            truncated: self.truncated,
        }
    }
}

impl<S: ?Sized> Binding<S> {
    /// A binding on the last node of a route.
    pub(crate) fn full(executor: Arc<Executor<S>>) -> Self {
        Self {
            executor,
            defaults: Vec::new(),
            truncated: false,
        }
    }

    /// A binding on a route cut short before its optional arguments.
    pub(crate) fn truncated(executor: Arc<Executor<S>>, defaults: Vec<PendingDefault<S>>) -> Self {
        Self {
            executor,
            defaults,
            truncated: true,
        }
    }

    /// Whether the route was cut short before optional arguments.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Names of the arguments filled in when the command ends here.
    pub fn default_names(&self) -> impl Iterator<Item = &str> {
        self.defaults.iter().map(|d| d.name.as_str())
    }
}

/// One node of a command tree.
pub struct CommandNode<S: ?Sized> {
    pub(crate) kind: NodeKind<S>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) permission: CommandPermission,
    pub(crate) requirements: Vec<Requirement<S>>,
    pub(crate) binding: Option<Binding<S>>,
}

impl<S: ?Sized> Clone for CommandNode<S> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind.clone(),
            parent: self.parent,
            children: self.children.clone(),
            permission: self.permission.clone(),
            requirements: self.requirements.clone(),
            binding: self.binding.clone(),
        }
    }
}

impl<S: ?Sized> fmt::Debug for CommandNode<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandNode")
            .field("kind", &self.kind)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("permission", &self.permission)
            .field("requirements", &self.requirements.len())
            .field("executable", &self.binding.is_some())
            .finish()
    }
}

impl<S: ?Sized> CommandNode<S> {
    pub(crate) fn new(kind: NodeKind<S>) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            permission: CommandPermission::None,
            requirements: Vec::new(),
            binding: None,
        }
    }

    pub(crate) fn guarded(
        mut self,
        permission: CommandPermission,
        requirements: Vec<Requirement<S>>,
    ) -> Self {
        self.permission = permission;
        self.requirements = requirements;
        self
    }

    /// The literal word, argument name or alias word.
    pub fn name(&self) -> &str {
        match &self.kind {
            NodeKind::Literal { name }
            | NodeKind::Argument { name, .. }
            | NodeKind::Redirect { name, .. } => name,
        }
    }

    /// What the node matches.
    pub fn kind(&self) -> &NodeKind<S> {
        &self.kind
    }

    /// Children in dispatch order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// The parent node, `None` for roots and alias nodes.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// The permission guarding this node.
    pub fn permission(&self) -> &CommandPermission {
        &self.permission
    }

    /// The executor bound here, if input may end at this node.
    pub fn binding(&self) -> Option<&Binding<S>> {
        self.binding.as_ref()
    }

    /// Whether input may end at this node.
    pub fn is_executable(&self) -> bool {
        self.binding.is_some()
    }

    /// Where dispatch continues for alias nodes.
    pub fn redirect(&self) -> Option<NodeId> {
        match self.kind {
            NodeKind::Redirect { target, .. } => Some(target),
            _ => None,
        }
    }

    /// A node that can never end a command nor lead anywhere.
    pub fn is_dead_end(&self) -> bool {
        self.binding.is_none() && self.children.is_empty() && self.redirect().is_none()
    }
}

impl<S: CommandSender + ?Sized> CommandNode<S> {
    /// Evaluates the node's permission and requirements for `sender`.
    pub fn can_use(&self, sender: &S) -> bool {
        self.permission.test(sender) && self.requirements.iter().all(|req| req(sender))
    }
}

// --- TREE ---

/// The node arena of one registered command.
pub struct CommandTree<S: ?Sized> {
    nodes: Vec<CommandNode<S>>,
    root: NodeId,
    aliases: Vec<NodeId>,
}

impl<S: ?Sized> Clone for CommandTree<S> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes.clone(),
            root: self.root,
            aliases: self.aliases.clone(),
        }
    }
}

impl<S: ?Sized> fmt::Debug for CommandTree<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandTree")
            .field("root", &self.root_name())
            .field("aliases", &self.alias_names())
            .field("nodes", &self.nodes.len())
            .finish()
    }
}

impl<S: ?Sized> CommandTree<S> {
    /// Creates a tree holding only the command's root literal.
    pub(crate) fn new(root: CommandNode<S>) -> Self {
        Self {
            nodes: vec![root],
            root: NodeId(0),
            aliases: Vec::new(),
        }
    }

    /// The root literal.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The canonical command name.
    pub fn root_name(&self) -> &str {
        self.node(self.root).map(CommandNode::name).unwrap_or_default()
    }

    /// The alias redirect nodes, in declaration order.
    pub fn aliases(&self) -> &[NodeId] {
        &self.aliases
    }

    /// The alias words, in declaration order.
    pub fn alias_names(&self) -> Vec<&str> {
        self.aliases
            .iter()
            .filter_map(|id| self.node(*id))
            .map(CommandNode::name)
            .collect()
    }

    /// Looks a node up.
    pub fn node(&self, id: NodeId) -> Option<&CommandNode<S>> {
        self.nodes.get(id.0)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut CommandNode<S>> {
        self.nodes.get_mut(id.0)
    }

    /// Number of nodes, alias nodes included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`: a tree has at least its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Finds the child of `parent` with the same identity as `kind`.
    pub(crate) fn find_child(&self, parent: NodeId, kind: &NodeKind<S>) -> Option<NodeId> {
        let parent = self.node(parent)?;
        parent.children.iter().copied().find(|id| {
            self.node(*id)
                .is_some_and(|child| child.kind.same_identity(kind))
        })
    }

    /// Appends `node` under `parent`, or returns the existing child with the same
    /// identity. An existing child keeps its own guard.
    pub(crate) fn add_child(&mut self, parent: NodeId, mut node: CommandNode<S>) -> NodeId {
        if let Some(existing) = self.find_child(parent, &node.kind) {
            return existing;
        }
        let id = NodeId(self.nodes.len());
        node.parent = Some(parent);
        self.nodes.push(node);
        if let Some(parent) = self.node_mut(parent) {
            parent.children.push(id);
        }
        id
    }

    /// Adds a redirect node named `name` pointing at the root. Duplicates are ignored.
    pub(crate) fn add_alias(&mut self, name: &str) -> NodeId {
        if let Some(existing) = self
            .aliases
            .iter()
            .copied()
            .find(|id| self.node(*id).is_some_and(|n| n.name() == name))
        {
            return existing;
        }
        let (permission, requirements) = match self.node(self.root) {
            Some(root) => (root.permission.clone(), root.requirements.clone()),
            None => (CommandPermission::None, Vec::new()),
        };
        let id = NodeId(self.nodes.len());
        self.nodes.push(
            CommandNode::new(NodeKind::Redirect {
                name: name.to_string(),
                target: self.root,
            })
            .guarded(permission, requirements),
        );
        self.aliases.push(id);
        id
    }

    /// Removes the alias named `name`. The node stays in the arena, unreachable.
    pub(crate) fn remove_alias(&mut self, name: &str) -> bool {
        let before = self.aliases.len();
        let nodes = &self.nodes;
        self.aliases.retain(|id| {
            nodes
                .get(id.0)
                .is_none_or(|n| !n.name().eq_ignore_ascii_case(name))
        });
        before != self.aliases.len()
    }

    /// Attaches `binding` to `id`. A truncated binding never replaces an existing one,
    /// so the full-arity executor of a longer route wins over a default-filling one.
    pub(crate) fn bind(&mut self, id: NodeId, binding: Binding<S>) {
        if let Some(node) = self.node_mut(id) {
            if binding.is_truncated() && node.binding.is_some() {
                return;
            }
            node.binding = Some(binding);
        }
    }

    /// The nodes from the root down to `id`, both included.
    pub fn path(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = vec![id];
        let mut current = self.node(id).and_then(CommandNode::parent);
        while let Some(parent) = current {
            path.push(parent);
            current = self.node(parent).and_then(CommandNode::parent);
        }
        path.reverse();
        path
    }

    /// Nodes that are neither executable, nor have children, nor redirect.
    pub fn dead_ends(&self) -> Vec<NodeId> {
        (0..self.nodes.len())
            .map(NodeId)
            .filter(|id| self.node(*id).is_some_and(CommandNode::is_dead_end))
            .collect()
    }

    /// Merges `other` into this tree. Nodes are matched by identity, new nodes are
    /// appended after the existing children, incoming executors replace existing
    /// ones and aliases are unioned. A root spelled differently becomes an alias.
    pub(crate) fn merge_from(&mut self, other: &CommandTree<S>) {
        self.merge_node(self.root, other, other.root);
        if other.root_name() != self.root_name() {
            self.add_alias(other.root_name());
        }
        for alias in other.alias_names() {
            self.add_alias(alias);
        }
    }

    fn merge_node(&mut self, into: NodeId, other: &CommandTree<S>, from: NodeId) {
        let Some(source) = other.node(from) else {
            return;
        };
        if let Some(binding) = &source.binding {
            if let Some(target) = self.node_mut(into) {
                target.binding = Some(binding.clone());
            }
        }
        for child_id in &source.children {
            let Some(child) = other.node(*child_id) else {
                continue;
            };
            let mut copy = CommandNode::new(child.kind.clone())
                .guarded(child.permission.clone(), child.requirements.clone());
            copy.binding = None;
            let merged = self.add_child(into, copy);
            self.merge_node(merged, other, *child_id);
        }
    }
}
