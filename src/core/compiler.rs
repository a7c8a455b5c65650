//! # Compiler
//!
//! This module turns a [`CommandBuilder`] (and its nested subcommand builders) into the
//! [`CommandTree`] that gets registered. Compilation happens in three passes:
//!
//! 1. **Validation**: names, argument ordering, duplicate names, permission nodes,
//!    default value types and missing executors. The first problem aborts compilation.
//! 2. **Flattening**: every executable builder becomes one route, a flat list of steps
//!    from the root literal to its last argument. Subcommands contribute a multi-literal
//!    step for "which subcommand word was typed", placed after the arguments of every
//!    ancestor.
//! 3. **Tree construction**: routes are inserted into a shared trie, the executor is
//!    bound on the last node of each route, and a default-filling copy of it is bound
//!    in front of every optional argument.

use crate::core::arguments::{Argument, ArgumentSpec};
use crate::core::builder::{CommandBuilder, Executor, is_valid_name};
use crate::core::errors::DeclarationError;
use crate::core::node::{Binding, CommandNode, CommandTree, NodeId, NodeKind, PendingDefault, Requirement};
use crate::core::permission::CommandPermission;
use crate::models::RegisteredCommand;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// The result of compiling one command declaration.
pub struct CompiledCommand<S: ?Sized> {
    /// The node arena, root literal and alias redirects included.
    pub tree: CommandTree<S>,
    /// The read-only summary handed to introspection tooling.
    pub info: RegisteredCommand,
}

impl<S: ?Sized> fmt::Debug for CompiledCommand<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledCommand")
            .field("tree", &self.tree)
            .field("info", &self.info)
            .finish()
    }
}

/// A permission plus requirements, accumulated from the root downwards.
struct Guard<S: ?Sized> {
    permission: CommandPermission,
    requirements: Vec<Requirement<S>>,
}

impl<S: ?Sized> Clone for Guard<S> {
    fn clone(&self) -> Self {
        Self {
            permission: self.permission.clone(),
            requirements: self.requirements.clone(),
        }
    }
}

impl<S: ?Sized> Guard<S> {
    fn and(&self, permission: &CommandPermission, requirements: &[Requirement<S>]) -> Self {
        let mut combined = self.requirements.clone();
        combined.extend(requirements.iter().cloned());
        Self {
            permission: self.permission.clone().and(permission.clone()),
            requirements: combined,
        }
    }
}

/// One element of a route.
struct Step<S: ?Sized> {
    argument: Argument<S>,
    guard: Guard<S>,
    /// The synthesized "which subcommand" step.
    subcommand: bool,
}

impl<S: ?Sized> Clone for Step<S> {
    fn clone(&self) -> Self {
        Self {
            argument: self.argument.clone(),
            guard: self.guard.clone(),
            subcommand: self.subcommand,
        }
    }
}

/// A complete path from the root literal to an executor.
struct Route<S: ?Sized> {
    steps: Vec<Step<S>>,
    executor: Arc<Executor<S>>,
}

// --- PUBLIC COMPILER API ---

/// Compiles a declaration into its command tree and summary.
///
/// # Errors
///
/// Returns the first [`DeclarationError`] found. Nothing is partially built.
pub fn compile<S: ?Sized>(builder: CommandBuilder<S>) -> Result<CompiledCommand<S>, DeclarationError> {
    // 1. Validate the whole declaration before building anything.
    validate(&builder, &builder.meta.name, &[])?;

    // 2. Flatten the builder tree into routes.
    let root_guard = Guard {
        permission: builder.meta.permission.clone(),
        requirements: builder.meta.requirements.clone(),
    };
    let mut routes = Vec::new();
    flatten(&builder, Vec::new(), root_guard.clone(), &mut routes);

    // 3. Build the trie.
    let root = CommandNode::new(NodeKind::Literal {
        name: builder.meta.name.clone(),
    })
    .guarded(root_guard.permission, root_guard.requirements);
    let mut tree = CommandTree::new(root);
    for route in &routes {
        insert_route(&mut tree, route);
    }
    for alias in &builder.meta.aliases {
        tree.add_alias(alias);
    }

    if let Some(dead) = tree.dead_ends().first() {
        let name = tree.node(*dead).map(CommandNode::name).unwrap_or_default();
        return Err(DeclarationError::MissingExecutor {
            command: format!("{} {}", builder.meta.name, name),
        });
    }

    let info = summarize(&builder, &routes);
    log::debug!(
        "Compiled command '{}' into {} node(s) over {} route(s).",
        info.name,
        tree.len(),
        routes.len()
    );
    Ok(CompiledCommand { tree, info })
}

// --- VALIDATION ---

/// Validates `builder` and its subcommands. `label` is the space separated path used in
/// error messages, `inherited` the names already bound by ancestors.
fn validate<S: ?Sized>(
    builder: &CommandBuilder<S>,
    label: &str,
    inherited: &[String],
) -> Result<(), DeclarationError> {
    let meta = &builder.meta;
    for name in std::iter::once(&meta.name).chain(meta.aliases.iter()) {
        if !is_valid_name(name) {
            return Err(DeclarationError::InvalidCommandName { name: name.clone() });
        }
    }
    meta.permission.validate()?;

    if builder.executor.is_empty() && builder.subcommands.is_empty() {
        return Err(DeclarationError::MissingExecutor {
            command: label.to_string(),
        });
    }

    let mut bound: Vec<String> = inherited.to_vec();
    let mut first_optional: Option<&str> = None;
    for argument in &builder.arguments {
        if !is_valid_name(&argument.name) {
            return Err(DeclarationError::InvalidArgumentName {
                command: label.to_string(),
                name: argument.name.clone(),
            });
        }

        // Optional arguments may only be followed by optional arguments.
        match (first_optional, argument.optional) {
            (Some(optional), false) => {
                return Err(DeclarationError::Ordering {
                    command: label.to_string(),
                    optional: optional.to_string(),
                    required: argument.name.clone(),
                });
            }
            (None, true) => first_optional = Some(&argument.name),
            _ => {}
        }

        if argument.listed {
            if bound.contains(&argument.name) {
                return Err(DeclarationError::DuplicateArgumentName {
                    command: label.to_string(),
                    name: argument.name.clone(),
                });
            }
            bound.push(argument.name.clone());
        }

        argument.permission.validate()?;

        if let Some(default) = &argument.default {
            let matches = match &argument.spec {
                ArgumentSpec::Typed(ty) => ty.value_type() == default.value_type,
                ArgumentSpec::Literal => false,
            };
            if !matches {
                return Err(DeclarationError::DefaultTypeMismatch {
                    command: label.to_string(),
                    name: argument.name.clone(),
                });
            }
        }
    }

    // Sibling subcommands share one position, so their words must not overlap.
    let mut sibling_words: HashSet<&str> = HashSet::new();
    for sub in &builder.subcommands {
        // The subcommand word is itself bound under the subcommand's name.
        if bound.contains(&sub.meta.name) {
            return Err(DeclarationError::DuplicateArgumentName {
                command: label.to_string(),
                name: sub.meta.name.clone(),
            });
        }
        for word in std::iter::once(&sub.meta.name).chain(sub.meta.aliases.iter()) {
            if !sibling_words.insert(word.as_str()) {
                return Err(DeclarationError::DuplicateArgumentName {
                    command: label.to_string(),
                    name: word.clone(),
                });
            }
        }
        let mut sub_inherited = bound.clone();
        sub_inherited.push(sub.meta.name.clone());
        validate(sub, &format!("{} {}", label, sub.meta.name), &sub_inherited)?;
    }

    Ok(())
}

// --- FLATTENING ---

fn flatten<S: ?Sized>(
    builder: &CommandBuilder<S>,
    prefix: Vec<Step<S>>,
    guard: Guard<S>,
    routes: &mut Vec<Route<S>>,
) {
    // An argument's own guard applies to it and to everything after it.
    let mut running = guard;
    let mut steps = prefix;
    for argument in &builder.arguments {
        running = running.and(&argument.permission, &argument.requirements);
        steps.push(Step {
            argument: argument.clone(),
            guard: running.clone(),
            subcommand: false,
        });
    }

    if !builder.executor.is_empty() {
        routes.push(Route {
            steps: steps.clone(),
            executor: Arc::new(builder.executor.clone()),
        });
    }

    // Inside a subcommand route the ancestor arguments are followed by the subcommand
    // word, so none of them can be omitted any more.
    let inherited: Vec<Step<S>> = steps
        .into_iter()
        .map(|mut step| {
            step.argument.optional = false;
            step.argument.default = None;
            step
        })
        .collect();

    for sub in &builder.subcommands {
        let sub_guard = running.and(&sub.meta.permission, &sub.meta.requirements);
        let mut prefix = inherited.clone();
        prefix.push(Step {
            argument: Argument::multi_literal(sub.meta.name.clone(), sub.meta.aliases.clone()),
            guard: sub_guard.clone(),
            subcommand: true,
        });
        flatten(sub, prefix, sub_guard, routes);
    }
}

// --- TREE CONSTRUCTION ---

fn step_node<S: ?Sized>(step: &Step<S>) -> CommandNode<S> {
    let argument = &step.argument;
    let kind = match &argument.spec {
        ArgumentSpec::Literal => NodeKind::Literal {
            name: argument.name.clone(),
        },
        ArgumentSpec::Typed(ty) => NodeKind::Argument {
            name: argument.name.clone(),
            argument_type: Arc::clone(ty),
            listed: argument.listed,
            suggestions: argument.suggestions.clone(),
        },
    };
    CommandNode::new(kind).guarded(step.guard.permission.clone(), step.guard.requirements.clone())
}

fn insert_route<S: ?Sized>(tree: &mut CommandTree<S>, route: &Route<S>) {
    let root = tree.root();
    let mut ids: Vec<NodeId> = Vec::with_capacity(route.steps.len());
    let mut current = root;
    for step in &route.steps {
        current = tree.add_child(current, step_node(step));
        ids.push(current);
    }
    tree.bind(current, Binding::full(Arc::clone(&route.executor)));

    // A truncated binding in front of each optional argument. Ordering guarantees
    // that every step after an optional one is optional as well.
    for (position, step) in route.steps.iter().enumerate() {
        if !step.argument.optional {
            continue;
        }
        let anchor = match position.checked_sub(1) {
            Some(previous) => ids.get(previous).copied().unwrap_or(root),
            None => root,
        };
        let defaults = route
            .steps
            .iter()
            .skip(position)
            .filter(|s| s.argument.listed)
            .map(|s| PendingDefault {
                name: s.argument.name.clone(),
                provider: s.argument.default.as_ref().map(|d| Arc::clone(&d.provider)),
            })
            .collect();
        tree.bind(anchor, Binding::truncated(Arc::clone(&route.executor), defaults));
    }
}

// --- SUMMARY ---

fn summarize<S: ?Sized>(builder: &CommandBuilder<S>, routes: &[Route<S>]) -> RegisteredCommand {
    let arguments = routes
        .iter()
        .map(|route| {
            route
                .steps
                .iter()
                .map(|step| {
                    if step.subcommand {
                        step.argument.name.clone()
                    } else {
                        step.argument.signature()
                    }
                })
                .collect()
        })
        .collect();

    RegisteredCommand {
        name: builder.meta.name.clone(),
        aliases: dedup(&builder.meta.aliases),
        arguments,
        permission: builder.meta.permission.to_string(),
        short_description: builder.meta.short_description.clone(),
        full_description: builder.meta.full_description.clone(),
        usage: builder.meta.usage.clone(),
        owner: None,
    }
}

fn dedup(values: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .iter()
        .filter(|v| seen.insert(v.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::arguments::{IntegerArgument, StringArgument};
    use crate::core::sender::CommandSender;
    use crate::core::test_support::TestSender;

    type Builder = CommandBuilder<TestSender>;

    fn child_names(tree: &CommandTree<TestSender>, id: NodeId) -> Vec<String> {
        tree.node(id)
            .unwrap()
            .children()
            .iter()
            .map(|c| tree.node(*c).unwrap().name().to_string())
            .collect()
    }

    #[test]
    fn test_compile_simple_command_with_alias() {
        // --- Setup ---
        let builder = Builder::new("give")
            .with_alias("g")
            .with_argument(Argument::new("item", StringArgument))
            .with_argument(Argument::new("amount", IntegerArgument::at_least(1)))
            .executes(|_, _| Ok(()));

        // --- Execute ---
        let compiled = compile(builder).unwrap();
        let tree = &compiled.tree;

        // --- Assert ---
        assert_eq!(tree.root_name(), "give");
        assert_eq!(tree.alias_names(), vec!["g"]);
        let alias = tree.node(*tree.aliases().first().unwrap()).unwrap();
        assert_eq!(alias.redirect(), Some(tree.root()));
        assert!(!tree.node(tree.root()).unwrap().is_executable());
        assert_eq!(child_names(tree, tree.root()), vec!["item"]);
        assert_eq!(
            compiled.info.arguments,
            vec![vec!["<item:string>".to_string(), "<amount:integer>".to_string()]]
        );
    }

    #[test]
    fn test_optional_arguments_bind_truncated_executors() {
        let builder = Builder::new("gamemode")
            .with_argument(Argument::new("mode", StringArgument))
            .with_argument(Argument::new("player", StringArgument).with_default(|s: &TestSender| s.name().to_string()))
            .executes(|_, _| Ok(()));

        let compiled = compile(builder).unwrap();
        let tree = &compiled.tree;
        let mode = *tree.node(tree.root()).unwrap().children().first().unwrap();
        let player = *tree.node(mode).unwrap().children().first().unwrap();

        let truncated = tree.node(mode).unwrap().binding().unwrap();
        assert!(truncated.is_truncated());
        assert_eq!(truncated.default_names().collect::<Vec<_>>(), vec!["player"]);

        let full = tree.node(player).unwrap().binding().unwrap();
        assert!(!full.is_truncated());
        assert!(Arc::ptr_eq(&truncated.executor, &full.executor));
        assert_eq!(
            compiled.info.arguments,
            vec![vec!["<mode:string>".to_string(), "[player:string]".to_string()]]
        );
    }

    #[test]
    fn test_optional_first_argument_binds_on_root() {
        let builder = Builder::new("spawn")
            .with_argument(Argument::new("player", StringArgument).optional())
            .executes(|_, _| Ok(()));
        let compiled = compile(builder).unwrap();
        let root = compiled.tree.node(compiled.tree.root()).unwrap();
        assert!(root.binding().unwrap().is_truncated());
    }

    #[test]
    fn test_subcommands_become_multi_literal_steps() {
        // --- Setup ---
        let builder = Builder::new("economy")
            .with_subcommand(
                Builder::new("deposit")
                    .with_alias("dep")
                    .with_argument(Argument::new("amount", IntegerArgument::new()))
                    .executes(|_, _| Ok(())),
            )
            .with_subcommand(
                Builder::new("withdraw")
                    .with_alias("with")
                    .with_argument(Argument::new("amount", IntegerArgument::new()))
                    .executes(|_, _| Ok(())),
            );

        // --- Execute ---
        let compiled = compile(builder).unwrap();
        let tree = &compiled.tree;

        // --- Assert ---
        assert_eq!(child_names(tree, tree.root()), vec!["deposit", "withdraw"]);
        let deposit = *tree.node(tree.root()).unwrap().children().first().unwrap();
        match tree.node(deposit).unwrap().kind() {
            NodeKind::Argument { argument_type, .. } => {
                assert_eq!(argument_type.id(), "multi_literal");
                assert_eq!(
                    argument_type.describe_properties(),
                    Some(serde_json::json!({ "literals": ["deposit", "dep"] }))
                );
            }
            other => panic!("expected an argument node, got {:?}", other),
        }
        assert_eq!(
            compiled.info.arguments,
            vec![
                vec!["deposit".to_string(), "<amount:integer>".to_string()],
                vec!["withdraw".to_string(), "<amount:integer>".to_string()],
            ]
        );
    }

    #[test]
    fn test_inherited_arguments_precede_subcommand_word() {
        let builder = Builder::new("region")
            .with_argument(Argument::new("name", StringArgument).optional())
            .executes(|_, _| Ok(()))
            .with_subcommand(Builder::new("delete").executes(|_, _| Ok(())));

        let compiled = compile(builder).unwrap();
        assert_eq!(
            compiled.info.arguments,
            vec![
                vec!["[name:string]".to_string()],
                vec!["<name:string>".to_string(), "delete".to_string()],
            ]
        );
    }

    #[test]
    fn test_ordering_error() {
        let builder = Builder::new("tp")
            .with_argument(Argument::new("target", StringArgument).optional())
            .with_argument(Argument::new("destination", StringArgument))
            .executes(|_, _| Ok(()));
        assert_eq!(
            compile(builder).unwrap_err(),
            DeclarationError::Ordering {
                command: "tp".to_string(),
                optional: "target".to_string(),
                required: "destination".to_string(),
            }
        );
    }

    #[test]
    fn test_duplicate_argument_names_across_route() {
        let builder = Builder::new("shop")
            .with_argument(Argument::new("item", StringArgument))
            .with_subcommand(
                Builder::new("buy")
                    .with_argument(Argument::new("item", StringArgument))
                    .executes(|_, _| Ok(())),
            );
        assert_eq!(
            compile(builder).unwrap_err(),
            DeclarationError::DuplicateArgumentName {
                command: "shop buy".to_string(),
                name: "item".to_string(),
            }
        );
    }

    #[test]
    fn test_sibling_subcommands_must_not_share_words() {
        // --- Setup ---
        let deposit = |code: i32| {
            Builder::new("deposit")
                .with_argument(Argument::new("amount", IntegerArgument::new()))
                .executes_with_result(move |_, _| Ok(code))
        };
        let same_name = Builder::new("economy")
            .with_subcommand(deposit(1))
            .with_subcommand(deposit(2));
        let overlapping_alias = Builder::new("economy")
            .with_subcommand(deposit(1).with_alias("dep"))
            .with_subcommand(
                Builder::new("withdraw")
                    .with_alias("dep")
                    .executes(|_, _| Ok(())),
            );

        // --- Execute & Assert ---
        assert_eq!(
            compile(same_name).unwrap_err(),
            DeclarationError::DuplicateArgumentName {
                command: "economy".to_string(),
                name: "deposit".to_string(),
            }
        );
        assert_eq!(
            compile(overlapping_alias).unwrap_err(),
            DeclarationError::DuplicateArgumentName {
                command: "economy".to_string(),
                name: "dep".to_string(),
            }
        );
    }

    #[test]
    fn test_invalid_names_and_missing_executor() {
        assert!(matches!(
            compile(Builder::new("bad name").executes(|_, _| Ok(()))),
            Err(DeclarationError::InvalidCommandName { .. })
        ));
        assert!(matches!(
            compile(Builder::new("ok").with_alias("").executes(|_, _| Ok(()))),
            Err(DeclarationError::InvalidCommandName { .. })
        ));
        assert!(matches!(
            compile(Builder::new("ok").with_subcommand(Builder::new("empty"))),
            Err(DeclarationError::MissingExecutor { command }) if command == "ok empty"
        ));
    }

    #[test]
    fn test_default_type_mismatch() {
        let builder = Builder::new("heal")
            .with_argument(Argument::new("amount", IntegerArgument::new()).with_default(|_: &TestSender| 2.5f64))
            .executes(|_, _| Ok(()));
        assert_eq!(
            compile(builder).unwrap_err(),
            DeclarationError::DefaultTypeMismatch {
                command: "heal".to_string(),
                name: "amount".to_string(),
            }
        );
    }

    #[test]
    fn test_invalid_permission_node() {
        let builder = Builder::new("ban")
            .with_permission("mod ban")
            .executes(|_, _| Ok(()));
        assert!(matches!(
            compile(builder),
            Err(DeclarationError::InvalidPermission { .. })
        ));
    }

    #[test]
    fn test_guard_is_copied_down_the_chain() {
        let builder = Builder::new("kick")
            .with_permission("mod.kick")
            .with_argument(Argument::new("player", StringArgument))
            .with_argument(Argument::new("reason", StringArgument).with_permission("mod.kick.reason"))
            .executes(|_, _| Ok(()));
        let compiled = compile(builder).unwrap();
        let tree = &compiled.tree;
        let player = *tree.node(tree.root()).unwrap().children().first().unwrap();
        let reason = *tree.node(player).unwrap().children().first().unwrap();

        let moderator = TestSender::player("Mod").with_permission("mod.kick");
        assert!(tree.node(player).unwrap().can_use(&moderator));
        assert!(!tree.node(reason).unwrap().can_use(&moderator));
        assert!(tree.node(reason).unwrap().can_use(&moderator.clone().with_permission("mod.kick.reason")));
        // A sender holding only the argument permission still fails the command guard.
        let outsider = TestSender::player("Out").with_permission("mod.kick.reason");
        assert!(!tree.node(reason).unwrap().can_use(&outsider));
    }
}
