// src/core/manager.rs

//! # Command Manager
//!
//! The context object a host creates once and threads through its code. It owns the
//! shared registry, the configuration and the lifecycle:
//!
//! ```text
//! Unloaded --load--> Loaded --enable--> Enabled --disable--> Disabled --load--> Loaded
//! ```
//!
//! Registrations are accepted while `Loaded` or `Enabled`, until
//! [`CommandManager::stop_command_registration`] is called. Every registration is a
//! single copy-on-write transaction: it either publishes a new registry or leaves the
//! current one untouched.

use crate::core::builder::CommandBuilder;
use crate::core::compiler::compile;
use crate::core::config::Config;
use crate::core::describe::{describe, write_dispatcher_file};
use crate::core::dispatcher::{Dispatcher, Suggestions};
use crate::core::errors::{DispatchError, LifecycleError, RegistrationError};
use crate::core::logger::Logger;
use crate::core::paths;
use crate::core::registry::{ConflictStrategy, RegistryEntry, ReplaceStrategy, SharedRegistry};
use crate::core::sender::CommandSender;
use crate::models::{Owner, RegisteredCommand, TreeDescription};
use anyhow::Result;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Where the manager is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Created, `load` not called yet.
    Unloaded,
    /// Configured and accepting registrations.
    Loaded,
    /// Live. Registrations are still accepted until registration is stopped.
    Enabled,
    /// Shut down. The registry has been cleared.
    Disabled,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unloaded => "unloaded",
            Self::Loaded => "loaded",
            Self::Enabled => "enabled",
            Self::Disabled => "disabled",
        };
        f.write_str(name)
    }
}

/// Owns the command registry of one host.
pub struct CommandManager<S: ?Sized = dyn CommandSender> {
    owner: Owner,
    registry: SharedRegistry<S>,
    state: Mutex<LifecycleState>,
    registration_open: AtomicBool,
    config: RwLock<Config>,
    strategy: Option<Arc<dyn ConflictStrategy<S>>>,
}

impl<S: ?Sized> fmt::Debug for CommandManager<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandManager")
            .field("owner", &self.owner)
            .field("state", &self.state())
            .field("registration_open", &self.registration_open.load(Ordering::SeqCst))
            .field("registry", &self.registry)
            .finish()
    }
}

impl<S: ?Sized> CommandManager<S> {
    /// Creates an unloaded manager. `owner` is stamped on every command it registers.
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: Owner::new(owner),
            registry: SharedRegistry::default(),
            state: Mutex::new(LifecycleState::Unloaded),
            registration_open: AtomicBool::new(true),
            config: RwLock::new(Config::default()),
            strategy: None,
        }
    }

    /// Installs a custom conflict strategy, overriding `Config::conflict_resolution`.
    pub fn with_conflict_strategy(mut self, strategy: Arc<dyn ConflictStrategy<S>>) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// The owner stamped on every command this manager registers.
    pub fn owner(&self) -> &Owner {
        &self.owner
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A copy of the active configuration.
    pub fn config(&self) -> Config {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn logger(&self) -> Logger {
        Logger::from_config(&self.config.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn strategy(&self) -> Arc<dyn ConflictStrategy<S>> {
        match &self.strategy {
            Some(strategy) => Arc::clone(strategy),
            None => self.config().conflict_resolution.strategy(),
        }
    }

    // --- LIFECYCLE ---

    /// Applies `config` and opens registration.
    pub fn load(&self, config: Config) -> Result<(), LifecycleError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match *state {
            LifecycleState::Unloaded | LifecycleState::Disabled => {}
            LifecycleState::Loaded | LifecycleState::Enabled => {
                self.logger()
                    .error("The command manager has already been loaded; ignoring the second load");
                return Err(LifecycleError::AlreadyLoaded);
            }
        }

        *self.config.write().unwrap_or_else(PoisonError::into_inner) = config;
        self.registration_open.store(true, Ordering::SeqCst);
        *state = LifecycleState::Loaded;
        self.logger().info(&format!("Loaded command manager for {}", self.owner.name));
        Ok(())
    }

    /// Goes live. Writes the dispatcher file if one is configured; failing to write it
    /// is logged and does not prevent enabling.
    pub fn enable(&self) -> Result<(), LifecycleError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state != LifecycleState::Loaded {
            return Err(LifecycleError::InvalidState {
                action: "enable",
                state: *state,
            });
        }
        *state = LifecycleState::Enabled;
        drop(state);

        let logger = self.logger();
        if let Some(template) = self.config().dispatcher_file {
            if let Err(e) = self.export_dispatcher_file(&template.to_string_lossy()) {
                logger.error(&format!("Failed to write the dispatcher file: {:#}", e));
            }
        }
        logger.normal(&format!(
            "Enabled with {} registered command(s)",
            self.registry.snapshot().len()
        ));
        Ok(())
    }

    /// Shuts down: clears the registry and re-opens registration for the next load.
    pub fn disable(&self) -> Result<(), LifecycleError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match *state {
            LifecycleState::Loaded | LifecycleState::Enabled => {}
            other => {
                return Err(LifecycleError::InvalidState {
                    action: "disable",
                    state: other,
                });
            }
        }

        let mut transaction = self.registry.begin();
        if !transaction.is_empty() {
            transaction.clear();
        }
        transaction.commit();
        self.registration_open.store(true, Ordering::SeqCst);
        *state = LifecycleState::Disabled;
        self.logger().info("Disabled command manager");
        Ok(())
    }

    /// Refuses every later registration until the next `load`.
    pub fn stop_command_registration(&self) {
        self.registration_open.store(false, Ordering::SeqCst);
        self.logger().info("Command registration stopped");
    }

    /// Whether `register` would currently be accepted.
    pub fn can_register(&self) -> bool {
        matches!(self.state(), LifecycleState::Loaded | LifecycleState::Enabled)
            && self.registration_open.load(Ordering::SeqCst)
    }

    fn export_dispatcher_file(&self, template: &str) -> Result<()> {
        let path = paths::expand_path(template)?;
        let description = self.describe();
        write_dispatcher_file(&description, &path)?;
        self.logger().info(&format!(
            "Wrote command tree {} to '{}'",
            description.fingerprint(),
            path.display()
        ));
        Ok(())
    }

    // --- REGISTRATION ---

    /// Compiles `builder` and adds it to the registry. On any error the registry is
    /// unchanged.
    pub fn register(&self, builder: CommandBuilder<S>) -> Result<(), RegistrationError> {
        self.install(builder, false)
    }

    /// Registers `builder` in place of any command with the same name, including
    /// commands that use the name as an alias.
    pub fn override_command(&self, builder: CommandBuilder<S>) -> Result<(), RegistrationError> {
        self.install(builder, true)
    }

    fn install(&self, builder: CommandBuilder<S>, replace: bool) -> Result<(), RegistrationError> {
        let logger = self.logger();
        let name = builder.name().to_string();

        // 1. Lifecycle gates.
        let state = self.state();
        if !matches!(state, LifecycleState::Loaded | LifecycleState::Enabled) {
            let error = LifecycleError::InvalidState {
                action: "register commands",
                state,
            };
            logger.error(&format!("Failed to register command '{}': {}", name, error));
            return Err(error.into());
        }
        if !self.registration_open.load(Ordering::SeqCst) {
            logger.warning(&format!(
                "Command registration has been stopped; '{}' was not registered",
                name
            ));
            return Err(RegistrationError::Closed { name });
        }

        // 2. Compile outside the registry lock.
        let mut compiled = compile(builder).map_err(|e| {
            logger.error(&format!("Failed to register command '{}': {}", name, e));
            e
        })?;
        compiled.info.owner = Some(self.owner.clone());
        let entry = RegistryEntry {
            tree: Arc::new(compiled.tree),
            info: compiled.info,
        };

        // 3. One transaction, published only if everything succeeded.
        let mut transaction = self.registry.begin();
        let result = if replace {
            transaction.remove(&name, true);
            transaction.upsert(entry, &ReplaceStrategy)
        } else {
            transaction.upsert(entry, &*self.strategy())
        };
        if let Err(e) = result {
            logger.error(&format!("Failed to register command '{}': {}", name, e));
            return Err(e.into());
        }
        transaction.commit();

        if state == LifecycleState::Enabled {
            logger.warning(&format!(
                "Command '{}' was registered after enable; connected clients may hold a stale command tree",
                name
            ));
        }
        logger.info(&format!("Registered command '{}'", name));
        Ok(())
    }

    /// Removes the command named `name` (case-insensitive). With `force`, `name` is
    /// also stripped from the aliases of every other command. Returns `true` if the
    /// registry changed.
    pub fn unregister(&self, name: &str, force: bool) -> bool {
        let logger = self.logger();
        if self.state() == LifecycleState::Enabled {
            logger.warning(&format!(
                "Unregistering '{}' while enabled; connected clients may hold a stale command tree",
                name
            ));
        }

        let mut transaction = self.registry.begin();
        let present = transaction.get(name).is_some()
            || (force && transaction.entries().iter().any(|e| e.info.answers_to(name)));
        if !present {
            logger.info(&format!("No command named '{}' to unregister", name));
            return false;
        }
        let changed = transaction.remove(name, force);
        transaction.commit();
        logger.info(&format!("Unregistered command '{}'", name));
        changed
    }

    // --- QUERIES ---

    /// A snapshot of the registered commands.
    pub fn registered_commands(&self) -> Vec<RegisteredCommand> {
        self.registry.snapshot().commands()
    }

    /// A dispatcher over the current registry. Later registrations are not visible
    /// to it.
    pub fn dispatcher(&self) -> Dispatcher<S> {
        Dispatcher::new(self.registry.snapshot(), self.config().dispatcher_options())
    }

    /// The serialization hook over the current registry.
    pub fn describe(&self) -> TreeDescription {
        describe(&self.registry.snapshot())
    }
}

impl<S: CommandSender + ?Sized> CommandManager<S> {
    /// Parses and runs `input` for `sender`.
    pub fn dispatch(&self, sender: &S, input: &str) -> Result<i32, DispatchError> {
        self.dispatcher().dispatch(sender, input)
    }

    /// Completion candidates for the last token of `input`.
    pub fn complete(&self, sender: &S, input: &str) -> Suggestions {
        self.dispatcher().complete(sender, input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::arguments::{Argument, ChoiceArgument, IntegerArgument, StringArgument};
    use crate::core::errors::{DeclarationError, SyntaxErrorKind};
    use crate::core::registry::{ConflictResolution, MergeStrategy};
    use crate::core::test_support::TestSender;
    use std::fs;

    type Manager = CommandManager<TestSender>;
    type Builder = CommandBuilder<TestSender>;

    fn loaded() -> Manager {
        let manager = Manager::new("TestPlugin");
        manager.load(Config::default()).unwrap();
        manager
    }

    fn simple(name: &str, code: i32) -> Builder {
        Builder::new(name).executes_with_result(move |_, _| Ok(code))
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum GameMode {
        Survival,
        Creative,
    }

    #[test]
    fn test_gamemode_round_trip() {
        // --- Setup ---
        let manager = loaded();
        let calls: Arc<Mutex<Vec<(GameMode, String)>>> = Arc::default();
        let recorded = Arc::clone(&calls);
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
                let entry = (*args.require::<GameMode>("mode")?, args.require::<String>("player")?.clone());
                recorded.lock().unwrap().push(entry);
                Ok(())
            })
            .register(&manager)
            .unwrap();
        manager.enable().unwrap();
        let steve = TestSender::player("Steve");

        // --- Execute ---
        manager.dispatch(&steve, "gamemode creative").unwrap();
        manager.dispatch(&steve, "gamemode survival Notch").unwrap();

        // --- Assert ---
        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                (GameMode::Creative, "Steve".to_string()),
                (GameMode::Survival, "Notch".to_string()),
            ]
        );
    }

    #[test]
    fn test_ordering_error_leaves_registry_unchanged() {
        // --- Setup ---
        let manager = loaded();
        manager.register(simple("ping", 1)).unwrap();
        let before = manager.registered_commands();
        let broken = Builder::new("ping")
            .with_argument(Argument::new("page", IntegerArgument::new()).optional())
            .with_argument(Argument::new("target", StringArgument))
            .executes(|_, _| Ok(()));

        // --- Execute ---
        let result = manager.register(broken);

        // --- Assert ---
        assert!(matches!(
            result,
            Err(RegistrationError::Declaration(DeclarationError::Ordering { .. }))
        ));
        assert_eq!(manager.registered_commands(), before);
        assert_eq!(manager.dispatch(&TestSender::console("c"), "ping"), Ok(1));
    }

    #[test]
    fn test_lifecycle_transitions() {
        let manager = Manager::new("TestPlugin");
        assert_eq!(manager.state(), LifecycleState::Unloaded);
        assert!(!manager.can_register());
        assert!(matches!(
            manager.register(simple("early", 1)),
            Err(RegistrationError::Lifecycle(LifecycleError::InvalidState {
                state: LifecycleState::Unloaded,
                ..
            }))
        ));
        assert_eq!(
            manager.enable(),
            Err(LifecycleError::InvalidState {
                action: "enable",
                state: LifecycleState::Unloaded
            })
        );

        manager.load(Config::default()).unwrap();
        assert_eq!(manager.load(Config::default()), Err(LifecycleError::AlreadyLoaded));
        manager.register(simple("ping", 1)).unwrap();
        manager.enable().unwrap();
        assert_eq!(manager.state(), LifecycleState::Enabled);

        manager.disable().unwrap();
        assert_eq!(manager.state(), LifecycleState::Disabled);
        assert!(manager.registered_commands().is_empty());

        // A disabled manager can be loaded again.
        manager.load(Config::default()).unwrap();
        assert!(manager.can_register());
    }

    #[test]
    fn test_stop_command_registration() {
        let manager = loaded();
        manager.register(simple("first", 1)).unwrap();
        manager.stop_command_registration();

        assert!(!manager.can_register());
        assert_eq!(
            manager.register(simple("second", 2)),
            Err(RegistrationError::Closed {
                name: "second".to_string()
            })
        );
        assert_eq!(manager.registered_commands().len(), 1);
    }

    #[test]
    fn test_registered_commands_are_stamped_with_owner() {
        let manager = loaded();
        manager.register(simple("ping", 1).with_alias("p")).unwrap();

        let commands = manager.registered_commands();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands.first().unwrap().owner.as_ref(), Some(manager.owner()));
        assert_eq!(commands.first().unwrap().aliases, vec!["p".to_string()]);
    }

    #[test]
    fn test_conflict_resolution_from_config() {
        let manager = Manager::new("TestPlugin");
        manager
            .load(Config::default().with_conflict_resolution(ConflictResolution::Reject))
            .unwrap();
        manager.register(simple("ping", 1)).unwrap();

        let result = manager.register(simple("PING", 2));
        assert_eq!(
            result,
            Err(RegistrationError::Declaration(DeclarationError::Conflict {
                name: "ping".to_string()
            }))
        );
        assert_eq!(manager.dispatch(&TestSender::console("c"), "ping"), Ok(1));
    }

    #[test]
    fn test_custom_strategy_overrides_config() {
        let manager = Manager::new("TestPlugin").with_conflict_strategy(Arc::new(MergeStrategy));
        manager
            .load(Config::default().with_conflict_resolution(ConflictResolution::Reject))
            .unwrap();
        manager.register(simple("ping", 1)).unwrap();
        manager.register(simple("ping", 2)).unwrap();

        assert_eq!(manager.dispatch(&TestSender::console("c"), "ping"), Ok(2));
    }

    #[test]
    fn test_merging_a_respelled_command_keeps_both_spellings() {
        let manager = loaded();
        let sender = TestSender::console("c");
        manager.register(simple("Heal", 1)).unwrap();
        manager.register(simple("heal", 2)).unwrap();

        assert_eq!(manager.dispatch(&sender, "heal"), Ok(2));
        assert_eq!(manager.dispatch(&sender, "Heal"), Ok(2));
        assert_eq!(manager.registered_commands().len(), 1);
    }

    #[test]
    fn test_duplicate_subcommands_are_rejected() {
        // --- Setup ---
        let manager = loaded();
        let economy = Builder::new("economy")
            .with_subcommand(simple("deposit", 1))
            .with_subcommand(simple("deposit", 2));

        // --- Execute ---
        let result = manager.register(economy);

        // --- Assert ---
        assert_eq!(
            result,
            Err(RegistrationError::Declaration(DeclarationError::DuplicateArgumentName {
                command: "economy".to_string(),
                name: "deposit".to_string(),
            }))
        );
        assert!(manager.registered_commands().is_empty());
    }

    #[test]
    fn test_unregister_and_override() {
        // --- Setup ---
        let manager = loaded();
        manager.register(simple("teleport", 1).with_alias("tp")).unwrap();
        manager.register(simple("warp", 2)).unwrap();
        let sender = TestSender::console("c");

        // --- Execute & Assert ---
        assert!(!manager.unregister("missing", false));

        // Overriding 'tp' strips it from teleport's aliases.
        manager.override_command(simple("tp", 3)).unwrap();
        assert_eq!(manager.dispatch(&sender, "tp"), Ok(3));
        assert_eq!(manager.dispatch(&sender, "teleport"), Ok(1));
        let teleport = manager
            .registered_commands()
            .into_iter()
            .find(|c| c.name == "teleport")
            .unwrap();
        assert!(teleport.aliases.is_empty());

        assert!(manager.unregister("WARP", false));
        let err = manager.dispatch(&sender, "warp").unwrap_err();
        assert!(matches!(&err, DispatchError::Syntax(e) if e.kind() == &SyntaxErrorKind::UnknownCommand));
    }

    #[test]
    fn test_dispatcher_is_a_snapshot() {
        let manager = loaded();
        manager.register(simple("ping", 1)).unwrap();
        let dispatcher = manager.dispatcher();
        manager.register(simple("pong", 2)).unwrap();

        let sender = TestSender::console("c");
        assert!(dispatcher.dispatch(&sender, "pong").is_err());
        assert_eq!(manager.dispatch(&sender, "pong"), Ok(2));
    }

    #[test]
    fn test_enable_writes_dispatcher_file() {
        // --- Setup ---
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("command_registration.json");
        let manager = Manager::new("TestPlugin");
        manager
            .load(Config::default().with_dispatcher_file(&path))
            .unwrap();
        manager.register(simple("ping", 1).with_alias("p")).unwrap();

        // --- Execute ---
        manager.enable().unwrap();

        // --- Assert ---
        let written: TreeDescription =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, manager.describe());
        assert_eq!(written.nodes.len(), 3);
    }

    #[test]
    fn test_revealed_permission_errors_from_config() {
        let manager = Manager::new("TestPlugin");
        manager
            .load(Config::default().with_reveal_permission_errors(true))
            .unwrap();
        manager
            .register(simple("stop", 1).with_permission("server.stop"))
            .unwrap();

        let err = manager.dispatch(&TestSender::player("Steve"), "stop").unwrap_err();
        assert!(matches!(err, DispatchError::Permission(_)));

        let admin = TestSender::player("Admin").with_permission("server.stop");
        assert_eq!(manager.dispatch(&admin, "stop"), Ok(1));
    }

    #[test]
    fn test_complete_through_manager() {
        let manager = loaded();
        manager.register(simple("ping", 1)).unwrap();
        manager.register(simple("pong", 1)).unwrap();
        manager.register(simple("warp", 1)).unwrap();

        let suggestions = manager.complete(&TestSender::console("c"), "p");
        assert_eq!(suggestions.start, 0);
        assert_eq!(suggestions.candidates, vec!["ping".to_string(), "pong".to_string()]);
    }
}
