// src/core/dispatcher.rs

//! # Dispatcher
//!
//! Walks a registry snapshot with one input line. The walk is deterministic and never
//! backtracks: at every node the literal children are tried first, then the argument
//! children in declaration order, and the first child that accepts the token wins.
//!
//! Permission failures are hidden by default: a node the sender may not use is skipped
//! as if it did not exist, so an unprivileged sender cannot tell "not allowed" from
//! "no such command". `DispatcherOptions::reveal_permission_errors` turns this off.

use crate::constants::{ARGUMENT_SEPARATOR, MISSING_EXECUTOR_MESSAGE};
use crate::core::arguments::ArgumentValue;
use crate::core::errors::{DispatchError, ExecutionError, SyntaxError, SyntaxErrorKind};
use crate::core::node::{CommandTree, NodeId, NodeKind};
use crate::core::reader::StringReader;
use crate::core::registry::Registry;
use crate::core::sender::CommandSender;
use serde::Serialize;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

// --- HANDLER ARGUMENTS ---

#[derive(Clone)]
struct ArgumentEntry {
    name: String,
    value: Arc<dyn Any + Send + Sync>,
    /// The typed text, `None` for default values.
    raw: Option<String>,
}

/// The parsed argument values handed to a handler, in route order.
#[derive(Clone, Default)]
pub struct CommandArguments {
    input: String,
    entries: Vec<ArgumentEntry>,
}

impl fmt::Debug for CommandArguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandArguments")
            .field("input", &self.input)
            .field(
                "entries",
                &self
                    .entries
                    .iter()
                    .map(|e| (e.name.as_str(), e.raw.as_deref()))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl CommandArguments {
    fn new(input: &str) -> Self {
        Self {
            input: input.to_string(),
            entries: Vec::new(),
        }
    }

    fn push(&mut self, name: String, value: ArgumentValue, raw: Option<String>) {
        self.entries.push(ArgumentEntry {
            name,
            value: Arc::from(value),
            raw,
        });
    }

    /// The value of argument `name`, if present and of type `T`.
    pub fn get<T: 'static>(&self, name: &str) -> Option<&T> {
        let entry = self.entries.iter().find(|e| e.name == name)?;
        let value: &(dyn Any + Send + Sync) = &*entry.value;
        value.downcast_ref::<T>()
    }

    /// The value at `index`, if present and of type `T`.
    pub fn get_at<T: 'static>(&self, index: usize) -> Option<&T> {
        let entry = self.entries.get(index)?;
        let value: &(dyn Any + Send + Sync) = &*entry.value;
        value.downcast_ref::<T>()
    }

    /// Like [`CommandArguments::get`], failing with a handler error.
    pub fn require<T: 'static>(&self, name: &str) -> Result<&T, ExecutionError> {
        self.get(name)
            .ok_or_else(|| ExecutionError::new(format!("Missing argument '{}'", name)))
    }

    /// The text typed for argument `name`. `None` for defaults and absent arguments.
    pub fn raw(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .and_then(|e| e.raw.as_deref())
    }

    /// Whether argument `name` is present.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no values.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Argument names, in route order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// The whole input line.
    pub fn input(&self) -> &str {
        &self.input
    }
}

// --- DISPATCHER ---

/// Dispatch behaviour switches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherOptions {
    /// Report `PermissionDenied` instead of hiding denied nodes.
    pub reveal_permission_errors: bool,
    /// Message used when no handler accepts the sender's kind. `%s` is the kind.
    pub missing_executor_message: String,
}

impl Default for DispatcherOptions {
    fn default() -> Self {
        Self {
            reveal_permission_errors: false,
            missing_executor_message: MISSING_EXECUTOR_MESSAGE.to_string(),
        }
    }
}

/// The result of a successful parse: an executable path plus the parsed values.
pub struct ParsedCommand<S: ?Sized> {
    tree: Arc<CommandTree<S>>,
    /// Matched nodes with the cursor their token starts at.
    path: Vec<(NodeId, usize)>,
    end: NodeId,
    arguments: CommandArguments,
}

impl<S: ?Sized> fmt::Debug for ParsedCommand<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParsedCommand")
            .field("command", &self.tree.root_name())
            .field("path", &self.path)
            .field("end", &self.end)
            .field("arguments", &self.arguments)
            .finish()
    }
}

impl<S: ?Sized> ParsedCommand<S> {
    /// The canonical name of the matched command.
    pub fn command_name(&self) -> &str {
        self.tree.root_name()
    }

    /// The typed values. Defaults are only added by `execute`.
    pub fn arguments(&self) -> &CommandArguments {
        &self.arguments
    }

    /// The input line.
    pub fn input(&self) -> &str {
        self.arguments.input()
    }

    /// The matched nodes, from the command word on.
    pub fn nodes(&self) -> Vec<NodeId> {
        self.path.iter().map(|(id, _)| *id).collect()
    }
}

/// Completion candidates for the last token of a line.
#[derive(Serialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Suggestions {
    /// Byte offset the candidates replace from.
    pub start: usize,
    /// Candidate tokens.
    pub candidates: Vec<String>,
}

struct Matched {
    node: NodeId,
    end: usize,
    value: Option<(String, ArgumentValue)>,
}

/// Parses and executes input lines against one registry snapshot.
pub struct Dispatcher<S: ?Sized = dyn CommandSender> {
    registry: Arc<Registry<S>>,
    options: DispatcherOptions,
}

impl<S: ?Sized> Clone for Dispatcher<S> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            options: self.options.clone(),
        }
    }
}

impl<S: ?Sized> fmt::Debug for Dispatcher<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("options", &self.options)
            .finish()
    }
}

fn starts_with_ignore_case(candidate: &str, partial: &str) -> bool {
    candidate
        .get(..partial.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(partial))
}

impl<S: ?Sized> Dispatcher<S> {
    /// A dispatcher over `registry`.
    pub fn new(registry: Arc<Registry<S>>, options: DispatcherOptions) -> Self {
        Self { registry, options }
    }

    /// The snapshot this dispatcher works on.
    pub fn registry(&self) -> &Registry<S> {
        &self.registry
    }

    /// The dispatch options.
    pub fn options(&self) -> &DispatcherOptions {
        &self.options
    }

    /// The error for a node the sender may not use, honouring information hiding.
    fn denied(&self, input: &str, cursor: usize) -> DispatchError {
        if self.options.reveal_permission_errors {
            return DispatchError::Permission(SyntaxError::with_context(
                SyntaxErrorKind::PermissionDenied,
                input,
                cursor,
            ));
        }
        let kind = if cursor == 0 {
            SyntaxErrorKind::UnknownCommand
        } else {
            SyntaxErrorKind::UnknownArgument
        };
        DispatchError::Syntax(SyntaxError::with_context(kind, input, cursor))
    }
}

impl<S: CommandSender + ?Sized> Dispatcher<S> {
    /// Parses and executes `input`.
    pub fn dispatch(&self, sender: &S, input: &str) -> Result<i32, DispatchError> {
        let parsed = self.parse(sender, input)?;
        self.execute(sender, &parsed)
    }

    /// Matches `input` against the tree without running anything.
    pub fn parse(&self, sender: &S, input: &str) -> Result<ParsedCommand<S>, DispatchError> {
        let parsed = self.walk(sender, input)?;
        let executable = parsed
            .tree
            .node(parsed.end)
            .is_some_and(|node| node.is_executable());
        if !executable {
            return Err(SyntaxError::with_context(
                SyntaxErrorKind::IncompleteCommand,
                input,
                input.len(),
            )
            .into());
        }
        log::trace!(
            "Parsed '{}' as command '{}' ({} node(s)).",
            input,
            parsed.command_name(),
            parsed.path.len()
        );
        Ok(parsed)
    }

    /// Runs a parsed command. Every node's guard is checked again, since the sender's
    /// permissions may have changed since parsing, and default values are computed now.
    pub fn execute(&self, sender: &S, parsed: &ParsedCommand<S>) -> Result<i32, DispatchError> {
        let tree = &parsed.tree;
        let input = parsed.input();

        // 1. Re-check requirements along the whole path.
        for (id, cursor) in &parsed.path {
            if !tree.node(*id).is_some_and(|node| node.can_use(sender)) {
                log::debug!(
                    "Sender '{}' no longer satisfies the requirements of '{}'.",
                    sender.name(),
                    parsed.command_name()
                );
                return Err(self.denied(input, *cursor));
            }
        }

        // 2. Resolve the executor bound at the end of the path.
        let Some(binding) = tree.node(parsed.end).and_then(|node| node.binding()) else {
            return Err(SyntaxError::with_context(
                SyntaxErrorKind::IncompleteCommand,
                input,
                input.len(),
            )
            .into());
        };

        // 3. Fill in omitted optional arguments.
        let mut arguments = parsed.arguments.clone();
        for default in &binding.defaults {
            if arguments.contains(&default.name) {
                continue;
            }
            if let Some(provider) = &default.provider {
                arguments.push(default.name.clone(), provider(sender), None);
            }
        }

        // 4. Run the handler for the sender's kind.
        log::debug!(
            "Executing '{}' for sender '{}' ({}).",
            parsed.command_name(),
            sender.name(),
            sender.kind()
        );
        binding
            .executor
            .run(sender, &arguments, &self.options.missing_executor_message)
            .map_err(DispatchError::from)
    }

    /// Completion candidates for the last token of `input`.
    pub fn complete(&self, sender: &S, input: &str) -> Suggestions {
        let Some(separator) = input.rfind(ARGUMENT_SEPARATOR) else {
            return Suggestions {
                start: 0,
                candidates: self.command_words(sender, input),
            };
        };

        let start = separator + ARGUMENT_SEPARATOR.len_utf8();
        let prefix = input.get(..separator).unwrap_or_default();
        let partial = input.get(start..).unwrap_or_default();
        let candidates = match self.walk(sender, prefix) {
            Ok(parsed) => self.child_candidates(sender, &parsed.tree, parsed.end, partial),
            Err(_) => Vec::new(),
        };
        Suggestions { start, candidates }
    }

    fn command_words(&self, sender: &S, partial: &str) -> Vec<String> {
        let mut words: Vec<String> = Vec::new();
        for entry in self.registry.entries() {
            let tree = &entry.tree;
            for id in std::iter::once(tree.root()).chain(tree.aliases().iter().copied()) {
                let Some(node) = tree.node(id) else {
                    continue;
                };
                let name = node.name();
                if starts_with_ignore_case(name, partial)
                    && node.can_use(sender)
                    && !words.iter().any(|w| w == name)
                {
                    words.push(name.to_string());
                }
            }
        }
        words
    }

    fn child_candidates(
        &self,
        sender: &S,
        tree: &CommandTree<S>,
        parent: NodeId,
        partial: &str,
    ) -> Vec<String> {
        let Some(parent) = tree.node(parent) else {
            return Vec::new();
        };
        let mut candidates: Vec<String> = Vec::new();
        for node in parent.children().iter().filter_map(|id| tree.node(*id)) {
            if !node.can_use(sender) {
                continue;
            }
            let offered = match node.kind() {
                NodeKind::Literal { name } => vec![name.clone()],
                NodeKind::Argument {
                    argument_type,
                    suggestions,
                    ..
                } => match suggestions {
                    Some(provider) => provider(sender, partial),
                    None => argument_type.suggest(),
                },
                NodeKind::Redirect { .. } => Vec::new(),
            };
            for candidate in offered {
                if starts_with_ignore_case(&candidate, partial) && !candidates.contains(&candidate) {
                    candidates.push(candidate);
                }
            }
        }
        candidates
    }

    // --- TREE WALK ---

    /// Matches as much of `input` as possible. Does not require the end node to be
    /// executable.
    fn walk(&self, sender: &S, input: &str) -> Result<ParsedCommand<S>, DispatchError> {
        let unknown_command =
            || DispatchError::from(SyntaxError::with_context(SyntaxErrorKind::UnknownCommand, input, 0));
        let mut reader = StringReader::new(input);

        // 1. The command word selects a root or an alias.
        let word = reader.read_word();
        let Some((entry, matched)) = self.registry.resolve_literal(word) else {
            return Err(unknown_command());
        };
        let tree = Arc::clone(&entry.tree);
        let Some(node) = tree.node(matched) else {
            return Err(unknown_command());
        };
        if !node.can_use(sender) {
            return Err(self.denied(input, 0));
        }
        let mut path = vec![(matched, 0)];
        let mut current = node.redirect().unwrap_or(matched);
        let mut arguments = CommandArguments::new(input);

        // 2. One child per token.
        while reader.can_read() {
            if reader.peek() != Some(ARGUMENT_SEPARATOR) {
                return Err(reader
                    .error(SyntaxErrorKind::ExpectedArgumentSeparator)
                    .into());
            }
            reader.skip();
            if !reader.can_read() {
                return Err(reader.error(SyntaxErrorKind::UnknownArgument).into());
            }

            let start = reader.cursor();
            let step = self.match_child(sender, &tree, current, &reader)?;
            reader.set_cursor(step.end);
            if let Some((name, value)) = step.value {
                let raw = input.get(start..step.end).map(str::to_string);
                arguments.push(name, value, raw);
            }
            path.push((step.node, start));
            current = tree
                .node(step.node)
                .and_then(|n| n.redirect())
                .unwrap_or(step.node);
        }

        Ok(ParsedCommand {
            tree,
            path,
            end: current,
            arguments,
        })
    }

    /// Picks the child of `parent` that accepts the token at the reader's cursor.
    fn match_child(
        &self,
        sender: &S,
        tree: &CommandTree<S>,
        parent: NodeId,
        reader: &StringReader<'_>,
    ) -> Result<Matched, DispatchError> {
        let input = reader.input();
        let start = reader.cursor();
        let children = tree.node(parent).map(|n| n.children()).unwrap_or_default();

        // Literals first.
        let word = reader.clone().read_word();
        for id in children {
            let Some(node) = tree.node(*id) else {
                continue;
            };
            let NodeKind::Literal { name } = node.kind() else {
                continue;
            };
            if name != word {
                continue;
            }
            if node.can_use(sender) {
                return Ok(Matched {
                    node: *id,
                    end: start + word.len(),
                    value: None,
                });
            }
            if self.options.reveal_permission_errors {
                return Err(self.denied(input, start));
            }
        }

        // Then arguments, in declaration order. The first one that parses wins.
        let mut errors: Vec<SyntaxError> = Vec::new();
        for id in children {
            let Some(node) = tree.node(*id) else {
                continue;
            };
            let NodeKind::Argument {
                name,
                argument_type,
                listed,
                ..
            } = node.kind()
            else {
                continue;
            };
            let usable = node.can_use(sender);
            if !usable && !self.options.reveal_permission_errors {
                continue;
            }

            let mut attempt = reader.clone();
            match argument_type.parse_erased(&mut attempt) {
                Ok(value) if attempt.at_token_end() => {
                    if !usable {
                        return Err(self.denied(input, start));
                    }
                    return Ok(Matched {
                        node: *id,
                        end: attempt.cursor(),
                        value: listed.then(|| (name.clone(), value)),
                    });
                }
                Ok(_) => errors.push(attempt.error(SyntaxErrorKind::ExpectedArgumentSeparator)),
                Err(error) => errors.push(error.or_context(input, start)),
            }
        }

        // A single failed candidate explains itself; otherwise the token matched nothing.
        match (errors.pop(), errors.is_empty()) {
            (Some(only), true) => Err(only.into()),
            _ => Err(SyntaxError::with_context(SyntaxErrorKind::UnknownArgument, input, start).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::arguments::{
        Argument, ChoiceArgument, GreedyStringArgument, IntegerArgument, StringArgument,
    };
    use crate::core::builder::CommandBuilder;
    use crate::core::compiler::compile;
    use crate::core::registry::{MergeStrategy, RegistryEntry};
    use crate::core::sender::SenderKind;
    use crate::core::test_support::TestSender;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    type Builder = CommandBuilder<TestSender>;

    fn dispatcher(builders: Vec<Builder>, options: DispatcherOptions) -> Dispatcher<TestSender> {
        let mut registry = Registry::new();
        for builder in builders {
            let compiled = compile(builder).unwrap();
            registry
                .upsert(
                    RegistryEntry {
                        tree: Arc::new(compiled.tree),
                        info: compiled.info,
                    },
                    &MergeStrategy,
                )
                .unwrap();
        }
        Dispatcher::new(Arc::new(registry), options)
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum GameMode {
        Survival,
        Creative,
    }

    type Calls = Arc<Mutex<Vec<(GameMode, String)>>>;

    fn gamemode(calls: &Calls) -> Builder {
        let calls = Arc::clone(calls);
        Builder::new("gamemode")
            .with_argument(Argument::new(
                "mode",
                ChoiceArgument::new([("survival", GameMode::Survival), ("creative", GameMode::Creative)]),
            ))
            .with_argument(
                Argument::new("player", StringArgument)
                    .with_default(|sender: &TestSender| sender.name().to_string()),
            )
            .executes(move |_, args| {
                let mode = *args.require::<GameMode>("mode")?;
                let player = args.require::<String>("player")?.clone();
                calls.lock().unwrap().push((mode, player));
                Ok(())
            })
    }

    #[test]
    fn test_optional_argument_uses_default_provider() {
        // --- Setup ---
        let calls: Calls = Arc::default();
        let dispatcher = dispatcher(vec![gamemode(&calls)], DispatcherOptions::default());
        let steve = TestSender::player("Steve");

        // --- Execute ---
        assert_eq!(dispatcher.dispatch(&steve, "gamemode creative"), Ok(1));
        assert_eq!(dispatcher.dispatch(&steve, "gamemode creative Notch"), Ok(1));

        // --- Assert ---
        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                (GameMode::Creative, "Steve".to_string()),
                (GameMode::Creative, "Notch".to_string()),
            ]
        );
    }

    #[test]
    fn test_defaults_are_evaluated_at_dispatch_time() {
        let counter = Arc::new(AtomicUsize::new(0));
        let provider_counter = Arc::clone(&counter);
        let seen: Arc<Mutex<Vec<i32>>> = Arc::default();
        let seen_in_handler = Arc::clone(&seen);
        let builder = Builder::new("roll")
            .with_argument(Argument::new("sides", IntegerArgument::new()).with_default(
                move |_: &TestSender| {
                    let n = provider_counter.fetch_add(1, Ordering::SeqCst);
                    i32::try_from(n).unwrap_or_default() + 6
                },
            ))
            .executes(move |_, args| {
                seen_in_handler.lock().unwrap().push(*args.require::<i32>("sides")?);
                Ok(())
            });
        let dispatcher = dispatcher(vec![builder], DispatcherOptions::default());
        assert_eq!(counter.load(Ordering::SeqCst), 0, "not evaluated at compile time");

        let sender = TestSender::player("Alex");
        dispatcher.dispatch(&sender, "roll").unwrap();
        dispatcher.dispatch(&sender, "roll").unwrap();
        dispatcher.dispatch(&sender, "roll 20").unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![6, 7, 20]);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    fn economy(hits: &Arc<Mutex<Vec<(String, i32)>>>) -> Builder {
        let deposits = Arc::clone(hits);
        let withdrawals = Arc::clone(hits);
        Builder::new("economy")
            .with_alias("eco")
            .with_subcommand(
                Builder::new("deposit")
                    .with_alias("dep")
                    .with_argument(Argument::new("amount", IntegerArgument::at_least(1)))
                    .executes(move |_, args| {
                        let which = args.require::<String>("deposit")?.clone();
                        deposits.lock().unwrap().push((which, *args.require::<i32>("amount")?));
                        Ok(())
                    }),
            )
            .with_subcommand(
                Builder::new("withdraw")
                    .with_alias("with")
                    .with_argument(Argument::new("amount", IntegerArgument::at_least(1)))
                    .executes(move |_, args| {
                        let which = args.require::<String>("withdraw")?.clone();
                        withdrawals.lock().unwrap().push((which, -*args.require::<i32>("amount")?));
                        Ok(())
                    }),
            )
    }

    #[test]
    fn test_subcommand_aliases_reach_the_same_handler() {
        // --- Setup ---
        let hits: Arc<Mutex<Vec<(String, i32)>>> = Arc::default();
        let dispatcher = dispatcher(vec![economy(&hits)], DispatcherOptions::default());
        let sender = TestSender::player("Steve");

        // --- Execute ---
        dispatcher.dispatch(&sender, "economy dep 50").unwrap();
        dispatcher.dispatch(&sender, "economy deposit 50").unwrap();
        dispatcher.dispatch(&sender, "eco with 5").unwrap();

        // --- Assert ---
        assert_eq!(
            *hits.lock().unwrap(),
            vec![
                ("deposit".to_string(), 50),
                ("deposit".to_string(), 50),
                ("withdraw".to_string(), -5),
            ]
        );
    }

    #[test]
    fn test_command_aliases_share_children() {
        let builder = Builder::new("give")
            .with_alias("g")
            .with_argument(Argument::new("item", StringArgument))
            .executes_with_result(|_, args| {
                Ok(i32::try_from(args.require::<String>("item")?.len()).unwrap_or_default())
            });
        let dispatcher = dispatcher(vec![builder], DispatcherOptions::default());
        let sender = TestSender::player("Steve");

        assert_eq!(dispatcher.dispatch(&sender, "give diamond"), Ok(7));
        assert_eq!(dispatcher.dispatch(&sender, "g diamond"), Ok(7));

        let parsed = dispatcher.parse(&sender, "g diamond").unwrap();
        assert_eq!(parsed.command_name(), "give");
        assert_eq!(parsed.arguments().raw("item"), Some("diamond"));
    }

    #[test]
    fn test_error_reporting() {
        let hits = Arc::default();
        let dispatcher = dispatcher(vec![economy(&hits)], hidden());
        let sender = TestSender::player("Steve");

        let err = dispatcher.dispatch(&sender, "bank deposit 5").unwrap_err();
        assert_eq!(err.cursor(), Some(0));
        assert!(matches!(&err, DispatchError::Syntax(e) if e.kind() == &SyntaxErrorKind::UnknownCommand));

        let err = dispatcher.dispatch(&sender, "economy").unwrap_err();
        assert!(matches!(&err, DispatchError::Syntax(e) if e.kind() == &SyntaxErrorKind::IncompleteCommand));
        assert_eq!(err.cursor(), Some(7));

        // Two candidates failed: nothing specific to report.
        let err = dispatcher.dispatch(&sender, "economy steal 5").unwrap_err();
        assert!(matches!(&err, DispatchError::Syntax(e) if e.kind() == &SyntaxErrorKind::UnknownArgument));
        assert_eq!(err.cursor(), Some(8));

        // A single candidate failed: its own error is reported.
        let err = dispatcher.dispatch(&sender, "economy dep 0").unwrap_err();
        assert!(matches!(
            &err,
            DispatchError::Syntax(e) if e.kind() == &SyntaxErrorKind::IntegerTooLow { min: 1, found: 0 }
        ));
        assert_eq!(err.cursor(), Some(12));
        assert_eq!(
            err.to_string(),
            "Integer must not be less than 1, found 0 at position 12: ...onomy dep <--[HERE]"
        );

        let err = dispatcher.dispatch(&sender, "economy dep 5x").unwrap_err();
        assert!(matches!(
            &err,
            DispatchError::Syntax(e) if e.kind() == &SyntaxErrorKind::ExpectedArgumentSeparator
        ));
        assert_eq!(err.cursor(), Some(13));

        let err = dispatcher.dispatch(&sender, "economy dep 5 extra").unwrap_err();
        assert!(matches!(&err, DispatchError::Syntax(e) if e.kind() == &SyntaxErrorKind::UnknownArgument));
    }

    fn hidden() -> DispatcherOptions {
        DispatcherOptions::default()
    }

    fn revealed() -> DispatcherOptions {
        DispatcherOptions {
            reveal_permission_errors: true,
            ..DispatcherOptions::default()
        }
    }

    fn admin_commands() -> Vec<Builder> {
        vec![
            Builder::new("ban")
                .with_permission("mod.ban")
                .with_argument(Argument::new("player", StringArgument))
                .executes(|_, _| Ok(())),
            Builder::new("warp")
                .with_argument(Argument::literal("set").with_permission("warp.admin"))
                .with_argument(Argument::new("name", StringArgument))
                .executes(|_, _| Ok(())),
        ]
    }

    #[test]
    fn test_permission_failures_are_hidden_by_default() {
        let dispatcher = dispatcher(admin_commands(), hidden());
        let nobody = TestSender::player("Nobody");

        let denied = dispatcher.dispatch(&nobody, "ban Griefer").unwrap_err();
        let missing = dispatcher.dispatch(&nobody, "unban Griefer").unwrap_err();
        assert_eq!(
            std::mem::discriminant(&denied),
            std::mem::discriminant(&missing)
        );
        assert!(matches!(&denied, DispatchError::Syntax(e) if e.kind() == &SyntaxErrorKind::UnknownCommand));

        // The denied literal is skipped and nothing else accepts the word.
        let err = dispatcher.dispatch(&nobody, "warp set home").unwrap_err();
        assert!(matches!(&err, DispatchError::Syntax(e) if e.kind() == &SyntaxErrorKind::UnknownArgument));
    }

    #[test]
    fn test_permission_failures_can_be_revealed() {
        let dispatcher = dispatcher(admin_commands(), revealed());
        let nobody = TestSender::player("Nobody");

        let err = dispatcher.dispatch(&nobody, "ban Griefer").unwrap_err();
        assert!(matches!(&err, DispatchError::Permission(e) if e.kind() == &SyntaxErrorKind::PermissionDenied));
        assert_eq!(err.cursor(), Some(0));

        let err = dispatcher.dispatch(&nobody, "warp set home").unwrap_err();
        assert!(matches!(&err, DispatchError::Permission(_)));
        assert_eq!(err.cursor(), Some(5));

        let moderator = TestSender::player("Mod").with_permission("mod.ban");
        assert_eq!(dispatcher.dispatch(&moderator, "ban Griefer"), Ok(1));
    }

    #[test]
    fn test_requirement_is_rechecked_at_execute_time() {
        // --- Setup ---
        let dispatcher = dispatcher(admin_commands(), hidden());
        let moderator = TestSender::player("Mod").with_permission("mod.ban");
        let parsed = dispatcher.parse(&moderator, "ban Griefer").unwrap();

        // --- Execute ---
        moderator.revoke("mod.ban");
        let err = dispatcher.execute(&moderator, &parsed).unwrap_err();

        // --- Assert ---
        assert!(matches!(&err, DispatchError::Syntax(e) if e.kind() == &SyntaxErrorKind::UnknownCommand));
    }

    #[test]
    fn test_first_declared_argument_wins_without_backtracking() {
        // --- Setup ---
        // Both declarations merge under the same root, text first.
        let text = Builder::new("pick")
            .with_argument(Argument::new("text", StringArgument))
            .executes_with_result(|_, _| Ok(2));
        let number = Builder::new("pick")
            .with_argument(Argument::new("number", IntegerArgument::new()))
            .with_argument(Argument::new("label", StringArgument))
            .executes_with_result(|_, _| Ok(1));
        let dispatcher = dispatcher(vec![text, number], DispatcherOptions::default());
        let sender = TestSender::player("Steve");

        // --- Execute & Assert ---
        assert_eq!(dispatcher.dispatch(&sender, "pick 5"), Ok(2));
        // "5" is taken by the string argument and the number branch is never retried.
        let err = dispatcher.dispatch(&sender, "pick 5 apples").unwrap_err();
        assert!(matches!(&err, DispatchError::Syntax(e) if e.kind() == &SyntaxErrorKind::UnknownArgument));
    }

    #[test]
    fn test_literal_arguments_take_precedence() {
        let named = Builder::new("home")
            .with_argument(Argument::new("name", StringArgument))
            .executes_with_result(|_, _| Ok(1));
        let list = Builder::new("home")
            .with_argument(Argument::literal("list"))
            .executes_with_result(|_, args| Ok(i32::try_from(args.len()).unwrap_or_default() + 10));
        let dispatcher = dispatcher(vec![named, list], DispatcherOptions::default());
        let sender = TestSender::player("Steve");

        assert_eq!(dispatcher.dispatch(&sender, "home base"), Ok(1));
        // Literals are not handed to the handler.
        assert_eq!(dispatcher.dispatch(&sender, "home list"), Ok(10));
    }

    #[test]
    fn test_greedy_and_per_kind_executors() {
        let builder = Builder::new("tell")
            .with_argument(Argument::new("target", StringArgument))
            .with_argument(Argument::new("message", GreedyStringArgument))
            .executes_player(|sender, args| {
                sender.send_message(args.require::<String>("message")?);
                Ok(())
            });
        let dispatcher = dispatcher(vec![builder], DispatcherOptions::default());

        let player = TestSender::player("Steve");
        dispatcher.dispatch(&player, "tell Alex hello there friend").unwrap();
        assert_eq!(player.messages(), vec!["hello there friend"]);

        let console = TestSender::console("Server");
        let err = dispatcher.dispatch(&console, "tell Alex hi").unwrap_err();
        assert_eq!(
            err,
            DispatchError::Execution(ExecutionError::new("This command has no implementations for console"))
        );
        assert_eq!(console.kind(), SenderKind::Console);
    }

    #[test]
    fn test_complete() {
        let hits = Arc::default();
        let calls: Calls = Arc::default();
        let mut builders = vec![economy(&hits), gamemode(&calls)];
        builders.extend(admin_commands());
        let dispatcher = dispatcher(builders, DispatcherOptions::default());
        let sender = TestSender::player("Steve");

        assert_eq!(
            dispatcher.complete(&sender, "e"),
            Suggestions {
                start: 0,
                candidates: vec!["economy".to_string(), "eco".to_string()],
            }
        );
        // "ban" is filtered out by its permission.
        assert!(dispatcher.complete(&sender, "b").candidates.is_empty());

        let suggestions = dispatcher.complete(&sender, "economy dep");
        assert_eq!(suggestions.start, 8);
        assert_eq!(suggestions.candidates, vec!["deposit", "dep"]);

        let suggestions = dispatcher.complete(&sender, "gamemode ");
        assert_eq!(suggestions.candidates, vec!["survival", "creative"]);

        assert!(dispatcher.complete(&sender, "nothing here").candidates.is_empty());
    }

    #[test]
    fn test_custom_suggestions() {
        let builder = Builder::new("msg")
            .with_argument(
                Argument::new("target", StringArgument)
                    .with_suggestions(|_, _| vec!["Alex".to_string(), "Steve".to_string()]),
            )
            .executes(|_, _| Ok(()));
        let dispatcher = dispatcher(vec![builder], DispatcherOptions::default());
        let sender = TestSender::player("Notch");
        assert_eq!(dispatcher.complete(&sender, "msg s").candidates, vec!["Steve"]);
    }

    #[test]
    fn test_command_arguments_access() {
        let builder = Builder::new("pay")
            .with_argument(Argument::new("target", StringArgument))
            .with_argument(Argument::new("amount", IntegerArgument::new()))
            .executes(|_, _| Ok(()));
        let dispatcher = dispatcher(vec![builder], DispatcherOptions::default());
        let parsed = dispatcher.parse(&TestSender::player("A"), "pay Bob 30").unwrap();
        let args = parsed.arguments();

        assert_eq!(args.len(), 2);
        assert_eq!(args.names().collect::<Vec<_>>(), vec!["target", "amount"]);
        assert_eq!(args.get_at::<i32>(1), Some(&30));
        assert_eq!(args.get::<String>("amount"), None, "wrong type");
        assert_eq!(args.input(), "pay Bob 30");
        assert_eq!(
            args.require::<i32>("missing").unwrap_err().message(),
            "Missing argument 'missing'"
        );
    }
}
