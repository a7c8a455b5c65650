// src/core/registry.rs

//! # Registry
//!
//! The set of registered commands, published as an immutable snapshot. Readers
//! (dispatchers) clone the `Arc` and never block writers for longer than that clone.
//! Writers serialize on a mutex and work on a [`RegistryTransaction`], which stays
//! pristine (sharing the published snapshot) until the first mutable access and only
//! becomes visible to readers on [`RegistryTransaction::commit`].

use crate::core::errors::DeclarationError;
use crate::core::node::{CommandTree, NodeId};
use crate::models::RegisteredCommand;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

/// One registered command.
pub struct RegistryEntry<S: ?Sized> {
    /// The compiled tree.
    pub tree: Arc<CommandTree<S>>,
    /// The summary shown to introspection tooling.
    pub info: RegisteredCommand,
}

impl<S: ?Sized> Clone for RegistryEntry<S> {
    fn clone(&self) -> Self {
        Self {
            tree: Arc::clone(&self.tree),
            info: self.info.clone(),
        }
    }
}

impl<S: ?Sized> fmt::Debug for RegistryEntry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("tree", &self.tree)
            .field("info", &self.info)
            .finish()
    }
}

// --- CONFLICT STRATEGIES ---

/// Decides what happens when a command is registered under a name that is already
/// taken (compared case-insensitively).
pub trait ConflictStrategy<S: ?Sized>: Send + Sync {
    /// A short name used in logs.
    fn name(&self) -> &'static str;

    /// Produces the entry that takes the existing one's place, or refuses.
    fn resolve(
        &self,
        existing: &RegistryEntry<S>,
        incoming: RegistryEntry<S>,
    ) -> Result<RegistryEntry<S>, DeclarationError>;
}

/// Merges the incoming tree into the existing one. Incoming executors win on shared
/// nodes, new branches are appended and aliases are unioned.
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeStrategy;

impl<S: ?Sized> ConflictStrategy<S> for MergeStrategy {
    fn name(&self) -> &'static str {
        "merge"
    }

    fn resolve(
        &self,
        existing: &RegistryEntry<S>,
        incoming: RegistryEntry<S>,
    ) -> Result<RegistryEntry<S>, DeclarationError> {
        let mut tree = CommandTree::clone(&existing.tree);
        tree.merge_from(&incoming.tree);

        let mut info = existing.info.clone();
        let incoming_info = incoming.info;
        let respelled = (incoming_info.name != info.name).then_some(incoming_info.name);
        for alias in respelled.into_iter().chain(incoming_info.aliases) {
            if !info.aliases.contains(&alias) {
                info.aliases.push(alias);
            }
        }
        for route in incoming_info.arguments {
            if !info.arguments.contains(&route) {
                info.arguments.push(route);
            }
        }
        for line in incoming_info.usage {
            if !info.usage.contains(&line) {
                info.usage.push(line);
            }
        }
        info.short_description = incoming_info.short_description.or(info.short_description);
        info.full_description = incoming_info.full_description.or(info.full_description);

        Ok(RegistryEntry {
            tree: Arc::new(tree),
            info,
        })
    }
}

/// Drops the existing command and keeps the incoming one.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplaceStrategy;

impl<S: ?Sized> ConflictStrategy<S> for ReplaceStrategy {
    fn name(&self) -> &'static str {
        "replace"
    }

    fn resolve(
        &self,
        _existing: &RegistryEntry<S>,
        incoming: RegistryEntry<S>,
    ) -> Result<RegistryEntry<S>, DeclarationError> {
        Ok(incoming)
    }
}

/// Refuses to register over an existing command.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectStrategy;

impl<S: ?Sized> ConflictStrategy<S> for RejectStrategy {
    fn name(&self) -> &'static str {
        "reject"
    }

    fn resolve(
        &self,
        existing: &RegistryEntry<S>,
        _incoming: RegistryEntry<S>,
    ) -> Result<RegistryEntry<S>, DeclarationError> {
        Err(DeclarationError::Conflict {
            name: existing.info.name.clone(),
        })
    }
}

/// The built-in strategies, as selected from configuration.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConflictResolution {
    /// [`MergeStrategy`].
    #[default]
    Merge,
    /// [`ReplaceStrategy`].
    Replace,
    /// [`RejectStrategy`].
    Reject,
}

impl ConflictResolution {
    /// The strategy object for this choice.
    pub fn strategy<S: ?Sized>(self) -> Arc<dyn ConflictStrategy<S>> {
        match self {
            Self::Merge => Arc::new(MergeStrategy),
            Self::Replace => Arc::new(ReplaceStrategy),
            Self::Reject => Arc::new(RejectStrategy),
        }
    }
}

// --- REGISTRY ---

/// The registered commands, in registration order.
pub struct Registry<S: ?Sized> {
    entries: Vec<RegistryEntry<S>>,
}

impl<S: ?Sized> Default for Registry<S> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<S: ?Sized> Clone for Registry<S> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<S: ?Sized> fmt::Debug for Registry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| &e.info.name))
            .finish()
    }
}

impl<S: ?Sized> Registry<S> {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries, in registration order.
    pub fn entries(&self) -> &[RegistryEntry<S>] {
        &self.entries
    }

    /// Number of registered commands.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks a command up by canonical name, case-insensitively.
    pub fn get(&self, name: &str) -> Option<&RegistryEntry<S>> {
        self.entries
            .iter()
            .find(|e| e.info.name.eq_ignore_ascii_case(name))
    }

    /// Finds the node the first token of an input line lands on: a canonical root
    /// (exact match) first, then an alias (exact match), in registration order.
    pub fn resolve_literal(&self, word: &str) -> Option<(&RegistryEntry<S>, NodeId)> {
        self.entries
            .iter()
            .find(|e| e.tree.root_name() == word)
            .map(|e| (e, e.tree.root()))
            .or_else(|| {
                self.entries.iter().find_map(|e| {
                    e.tree
                        .aliases()
                        .iter()
                        .copied()
                        .find(|id| e.tree.node(*id).is_some_and(|n| n.name() == word))
                        .map(|id| (e, id))
                })
            })
    }

    /// Read-only summaries of every command.
    pub fn commands(&self) -> Vec<RegisteredCommand> {
        self.entries.iter().map(|e| e.info.clone()).collect()
    }

    /// Adds `entry`, handing name conflicts to `strategy`.
    pub fn upsert(
        &mut self,
        entry: RegistryEntry<S>,
        strategy: &dyn ConflictStrategy<S>,
    ) -> Result<(), DeclarationError> {
        let position = self
            .entries
            .iter()
            .position(|e| e.info.name.eq_ignore_ascii_case(&entry.info.name));
        match position.and_then(|p| self.entries.get_mut(p)) {
            Some(slot) => {
                log::debug!(
                    "Command '{}' is already registered; resolving with the '{}' strategy.",
                    slot.info.name,
                    strategy.name()
                );
                *slot = strategy.resolve(slot, entry)?;
            }
            None => self.entries.push(entry),
        }
        Ok(())
    }

    /// Removes the command named `name`. With `force`, `name` is also stripped from
    /// the aliases of every other command. Returns `true` if anything changed.
    pub fn remove(&mut self, name: &str, force: bool) -> bool {
        let before = self.entries.len();
        self.entries
            .retain(|e| !e.info.name.eq_ignore_ascii_case(name));
        let mut changed = before != self.entries.len();

        if force {
            for entry in &mut self.entries {
                if entry.info.aliases.iter().any(|a| a.eq_ignore_ascii_case(name)) {
                    entry.info.aliases.retain(|a| !a.eq_ignore_ascii_case(name));
                    Arc::make_mut(&mut entry.tree).remove_alias(name);
                    changed = true;
                }
            }
        }
        changed
    }

    /// Removes every command.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

// --- SHARED, COPY-ON-WRITE HANDLE ---

/// The published registry plus the writer lock.
pub struct SharedRegistry<S: ?Sized> {
    published: RwLock<Arc<Registry<S>>>,
    writer: Mutex<()>,
}

impl<S: ?Sized> Default for SharedRegistry<S> {
    fn default() -> Self {
        Self {
            published: RwLock::new(Arc::new(Registry::default())),
            writer: Mutex::new(()),
        }
    }
}

impl<S: ?Sized> fmt::Debug for SharedRegistry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedRegistry")
            .field("published", &self.snapshot())
            .finish()
    }
}

impl<S: ?Sized> SharedRegistry<S> {
    /// The currently published registry.
    pub fn snapshot(&self) -> Arc<Registry<S>> {
        let published = self.published.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&published)
    }

    /// Starts a write. Other writers wait until the transaction is dropped.
    pub fn begin(&self) -> RegistryTransaction<'_, S> {
        let writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        RegistryTransaction {
            shared: self,
            _writer: writer,
            snapshot: self.snapshot(),
            current: None,
        }
    }
}

/// A pending change to a [`SharedRegistry`].
///
/// Reads go to the snapshot taken when the transaction began. The first mutable access
/// clones it (the only clone of the transaction), and `commit` publishes the clone.
/// Dropping the transaction without committing discards the changes.
pub struct RegistryTransaction<'a, S: ?Sized> {
    shared: &'a SharedRegistry<S>,
    _writer: MutexGuard<'a, ()>,
    snapshot: Arc<Registry<S>>,
    current: Option<Registry<S>>,
}

impl<S: ?Sized> fmt::Debug for RegistryTransaction<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryTransaction")
            .field("dirty", &self.is_dirty())
            .finish()
    }
}

impl<S: ?Sized> RegistryTransaction<'_, S> {
    /// Whether a mutable access has happened.
    pub fn is_dirty(&self) -> bool {
        self.current.is_some()
    }

    /// Publishes the changes. Returns `false` if there was nothing to publish.
    pub fn commit(self) -> bool {
        let Some(current) = self.current else {
            return false;
        };
        let mut published = self
            .shared
            .published
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *published = Arc::new(current);
        true
    }
}

impl<S: ?Sized> Deref for RegistryTransaction<'_, S> {
    type Target = Registry<S>;

    fn deref(&self) -> &Registry<S> {
        self.current.as_ref().unwrap_or(&*self.snapshot)
    }
}

impl<S: ?Sized> DerefMut for RegistryTransaction<'_, S> {
    fn deref_mut(&mut self) -> &mut Registry<S> {
        let snapshot = &self.snapshot;
        self.current.get_or_insert_with(|| Registry::clone(snapshot))
    }
}
