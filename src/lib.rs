//! Declarative command trees.
//!
//! Commands are declared with a [`CommandBuilder`], compiled into a tree of literal
//! and typed argument nodes, and registered with a [`CommandManager`]. A
//! [`Dispatcher`] then parses raw input lines against the registry and runs the
//! bound handler.

pub mod cli;
pub mod constants;
pub mod core;
pub mod models;

pub use crate::core::arguments::{
    Argument, ArgumentType, BooleanArgument, ChoiceArgument, DoubleArgument,
    GreedyStringArgument, IntegerArgument, MultiLiteralArgument, StringArgument, TextArgument,
};
pub use crate::core::builder::{CommandBuilder, Executor};
pub use crate::core::config::Config;
pub use crate::core::dispatcher::{CommandArguments, Dispatcher, DispatcherOptions, Suggestions};
pub use crate::core::errors::{
    DeclarationError, DispatchError, ExecutionError, LifecycleError, RegistrationError,
    SyntaxError, SyntaxErrorKind, fail,
};
pub use crate::core::manager::{CommandManager, LifecycleState};
pub use crate::core::permission::CommandPermission;
pub use crate::core::reader::StringReader;
pub use crate::core::registry::{
    ConflictResolution, ConflictStrategy, MergeStrategy, RejectStrategy, ReplaceStrategy,
};
pub use crate::core::sender::{CommandSender, SenderKind};
pub use crate::models::{RegisteredCommand, TreeDescription};
