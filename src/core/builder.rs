// src/core/builder.rs

//! # Command Builder
//!
//! The fluent declaration API. A [`CommandBuilder`] only accumulates what the command
//! looks like; nothing is validated until it is compiled, which happens when it is
//! registered with a `CommandManager`.

use crate::constants::DEFAULT_SUCCESS_CODE;
use crate::core::arguments::Argument;
use crate::core::dispatcher::CommandArguments;
use crate::core::errors::{DeclarationError, ExecutionError, RegistrationError};
use crate::core::manager::CommandManager;
use crate::core::node::Requirement;
use crate::core::permission::CommandPermission;
use crate::core::sender::{CommandSender, SenderKind};
use std::fmt;
use std::sync::Arc;

/// A command handler. Returns the outcome code reported by `dispatch`.
pub type Handler<S> =
    Arc<dyn Fn(&S, &CommandArguments) -> Result<i32, ExecutionError> + Send + Sync>;

/// Which senders a handler accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutorKind {
    /// Any sender without a more specific handler.
    Any,
    /// Only senders of this kind.
    Sender(SenderKind),
}

/// The handlers bound to one command route, at most one per [`ExecutorKind`].
pub struct Executor<S: ?Sized> {
    handlers: Vec<(ExecutorKind, Handler<S>)>,
}

impl<S: ?Sized> Default for Executor<S> {
    fn default() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }
}

impl<S: ?Sized> Clone for Executor<S> {
    fn clone(&self) -> Self {
        Self {
            handlers: self.handlers.clone(),
        }
    }
}

impl<S: ?Sized> fmt::Debug for Executor<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("kinds", &self.kinds())
            .finish()
    }
}

impl<S: ?Sized> Executor<S> {
    /// An executor with a single any-sender handler.
    pub fn any<F>(handler: F) -> Self
    where
        F: Fn(&S, &CommandArguments) -> Result<i32, ExecutionError> + Send + Sync + 'static,
    {
        let mut executor = Self::default();
        executor.insert(ExecutorKind::Any, Arc::new(handler));
        executor
    }

    /// Binds `handler` for `kind`, replacing an earlier one.
    pub(crate) fn insert(&mut self, kind: ExecutorKind, handler: Handler<S>) {
        match self.handlers.iter_mut().find(|(k, _)| *k == kind) {
            Some(slot) => slot.1 = handler,
            None => self.handlers.push((kind, handler)),
        }
    }

    /// Returns `true` if no handler is bound.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// The kinds a handler is bound for, in binding order.
    pub fn kinds(&self) -> Vec<ExecutorKind> {
        self.handlers.iter().map(|(k, _)| *k).collect()
    }
}

impl<S: CommandSender + ?Sized> Executor<S> {
    /// Runs the handler for the sender's kind, falling back to the any-sender one.
    /// `missing_message` is used (with `%s` replaced by the kind) when neither exists.
    pub fn run(
        &self,
        sender: &S,
        arguments: &CommandArguments,
        missing_message: &str,
    ) -> Result<i32, ExecutionError> {
        let kind = sender.kind();
        let handler = self
            .handlers
            .iter()
            .find(|(k, _)| *k == ExecutorKind::Sender(kind))
            .or_else(|| self.handlers.iter().find(|(k, _)| *k == ExecutorKind::Any));
        match handler {
            Some((_, handler)) => handler(sender, arguments),
            None => Err(ExecutionError::new(
                missing_message.replace("%s", kind.as_str()),
            )),
        }
    }
}

// --- SHARED DECLARATION FIELDS ---

/// The fields every command and subcommand declares.
pub struct CommandMeta<S: ?Sized> {
    pub(crate) name: String,
    pub(crate) aliases: Vec<String>,
    pub(crate) permission: CommandPermission,
    pub(crate) requirements: Vec<Requirement<S>>,
    pub(crate) short_description: Option<String>,
    pub(crate) full_description: Option<String>,
    pub(crate) usage: Vec<String>,
}

impl<S: ?Sized> Clone for CommandMeta<S> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            aliases: self.aliases.clone(),
            permission: self.permission.clone(),
            requirements: self.requirements.clone(),
            short_description: self.short_description.clone(),
            full_description: self.full_description.clone(),
            usage: self.usage.clone(),
        }
    }
}

impl<S: ?Sized> CommandMeta<S> {
    fn new(name: String) -> Self {
        Self {
            name,
            aliases: Vec::new(),
            permission: CommandPermission::None,
            requirements: Vec::new(),
            short_description: None,
            full_description: None,
            usage: Vec::new(),
        }
    }

    /// The canonical name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Alternate names.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// The declared permission.
    pub fn permission(&self) -> &CommandPermission {
        &self.permission
    }

    /// One-line help.
    pub fn short_description(&self) -> Option<&str> {
        self.short_description.as_deref()
    }

    /// Full help text.
    pub fn full_description(&self) -> Option<&str> {
        self.full_description.as_deref()
    }

    /// Usage lines.
    pub fn usage(&self) -> &[String] {
        &self.usage
    }
}

// --- BUILDER ---

/// Declares a command: name, aliases, arguments, guard, help and handlers.
///
/// ```ignore
/// CommandBuilder::new("gamemode")
///     .with_argument(Argument::new("mode", modes))
///     .with_argument(Argument::new("player", StringArgument)
///         .with_default(|sender: &(dyn CommandSender + 'static)| sender.name().to_string()))
///     .executes(|sender, args| { /* ... */ Ok(()) })
///     .register(&manager)?;
/// ```
pub struct CommandBuilder<S: ?Sized = dyn CommandSender> {
    pub(crate) meta: CommandMeta<S>,
    pub(crate) arguments: Vec<Argument<S>>,
    pub(crate) subcommands: Vec<CommandBuilder<S>>,
    pub(crate) executor: Executor<S>,
}

impl<S: ?Sized> Clone for CommandBuilder<S> {
    fn clone(&self) -> Self {
        Self {
            meta: self.meta.clone(),
            arguments: self.arguments.clone(),
            subcommands: self.subcommands.clone(),
            executor: self.executor.clone(),
        }
    }
}

impl<S: ?Sized> fmt::Debug for CommandBuilder<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandBuilder")
            .field("name", &self.meta.name)
            .field("aliases", &self.meta.aliases)
            .field("permission", &self.meta.permission)
            .field("arguments", &self.arguments)
            .field("subcommands", &self.subcommands)
            .field("executor", &self.executor)
            .finish()
    }
}

impl<S: ?Sized> CommandBuilder<S> {
    /// Starts a declaration. The name is validated when the command is compiled.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            meta: CommandMeta::new(name.into()),
            arguments: Vec::new(),
            subcommands: Vec::new(),
            executor: Executor::default(),
        }
    }

    /// Starts a declaration, rejecting an invalid name straight away.
    pub fn try_new(name: impl Into<String>) -> Result<Self, DeclarationError> {
        let name = name.into();
        if !is_valid_name(&name) {
            return Err(DeclarationError::InvalidCommandName { name });
        }
        Ok(Self::new(name))
    }

    // --- Metadata ---

    /// Replaces the alias list.
    pub fn with_aliases<I, T>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.meta.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    /// Adds one alias.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.meta.aliases.push(alias.into());
        self
    }

    /// Sets the permission senders need.
    pub fn with_permission(mut self, permission: impl Into<CommandPermission>) -> Self {
        self.meta.permission = permission.into();
        self
    }

    /// Sets a permission senders must NOT hold.
    pub fn without_permission(mut self, permission: impl Into<CommandPermission>) -> Self {
        self.meta.permission = permission.into().negate();
        self
    }

    /// Adds a requirement. Requirements accumulate and must all pass.
    pub fn with_requirement<F>(mut self, requirement: F) -> Self
    where
        F: Fn(&S) -> bool + Send + Sync + 'static,
    {
        self.meta.requirements.push(Arc::new(requirement));
        self
    }

    /// Sets the one-line help.
    pub fn with_short_description(mut self, description: impl Into<String>) -> Self {
        self.meta.short_description = Some(description.into());
        self
    }

    /// Sets the full help text.
    pub fn with_full_description(mut self, description: impl Into<String>) -> Self {
        self.meta.full_description = Some(description.into());
        self
    }

    /// Sets both help texts.
    pub fn with_help(self, short: impl Into<String>, full: impl Into<String>) -> Self {
        self.with_short_description(short).with_full_description(full)
    }

    /// Replaces the usage lines.
    pub fn with_usage<I, T>(mut self, usage: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.meta.usage = usage.into_iter().map(Into::into).collect();
        self
    }

    // --- Structure ---

    /// Appends an argument.
    pub fn with_argument(mut self, argument: Argument<S>) -> Self {
        self.arguments.push(argument);
        self
    }

    /// Appends several arguments.
    pub fn with_arguments<I>(mut self, arguments: I) -> Self
    where
        I: IntoIterator<Item = Argument<S>>,
    {
        self.arguments.extend(arguments);
        self
    }

    /// Appends a subcommand. Its name and aliases become a word typed after this
    /// command's own arguments.
    pub fn with_subcommand(mut self, subcommand: CommandBuilder<S>) -> Self {
        self.subcommands.push(subcommand);
        self
    }

    // --- Handlers ---

    /// Binds a handler for any sender. The command reports 1 on success.
    pub fn executes<F>(self, handler: F) -> Self
    where
        F: Fn(&S, &CommandArguments) -> Result<(), ExecutionError> + Send + Sync + 'static,
    {
        self.bind(ExecutorKind::Any, handler)
    }

    /// Binds a handler for any sender that reports its own outcome code.
    pub fn executes_with_result<F>(mut self, handler: F) -> Self
    where
        F: Fn(&S, &CommandArguments) -> Result<i32, ExecutionError> + Send + Sync + 'static,
    {
        self.executor.insert(ExecutorKind::Any, Arc::new(handler));
        self
    }

    /// Binds a handler for players only.
    pub fn executes_player<F>(self, handler: F) -> Self
    where
        F: Fn(&S, &CommandArguments) -> Result<(), ExecutionError> + Send + Sync + 'static,
    {
        self.bind(ExecutorKind::Sender(SenderKind::Player), handler)
    }

    /// Binds a handler for the console only.
    pub fn executes_console<F>(self, handler: F) -> Self
    where
        F: Fn(&S, &CommandArguments) -> Result<(), ExecutionError> + Send + Sync + 'static,
    {
        self.bind(ExecutorKind::Sender(SenderKind::Console), handler)
    }

    /// Binds a handler for one sender kind.
    pub fn executes_for<F>(self, kind: SenderKind, handler: F) -> Self
    where
        F: Fn(&S, &CommandArguments) -> Result<(), ExecutionError> + Send + Sync + 'static,
    {
        self.bind(ExecutorKind::Sender(kind), handler)
    }

    fn bind<F>(mut self, kind: ExecutorKind, handler: F) -> Self
    where
        F: Fn(&S, &CommandArguments) -> Result<(), ExecutionError> + Send + Sync + 'static,
    {
        self.executor.insert(
            kind,
            Arc::new(move |sender: &S, args: &CommandArguments| {
                handler(sender, args).map(|()| DEFAULT_SUCCESS_CODE)
            }),
        );
        self
    }

    // --- Accessors ---

    /// Name, aliases, guard and help.
    pub fn meta(&self) -> &CommandMeta<S> {
        &self.meta
    }

    /// The canonical name.
    pub fn name(&self) -> &str {
        &self.meta.name
    }

    /// The declared arguments.
    pub fn arguments(&self) -> &[Argument<S>] {
        &self.arguments
    }

    /// The declared subcommands.
    pub fn subcommands(&self) -> &[CommandBuilder<S>] {
        &self.subcommands
    }

    /// Whether a handler is bound.
    pub fn has_executor(&self) -> bool {
        !self.executor.is_empty()
    }
}

impl<S: CommandSender + ?Sized> CommandBuilder<S> {
    /// Compiles and registers the command with `manager`.
    pub fn register(self, manager: &CommandManager<S>) -> Result<(), RegistrationError> {
        manager.register(self)
    }

    /// Unregisters any command of the same name, then registers this one.
    pub fn override_registration(self, manager: &CommandManager<S>) -> Result<(), RegistrationError> {
        manager.override_command(self)
    }
}

/// Non-empty and free of whitespace.
pub(crate) fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && !name.chars().any(char::is_whitespace)
}
