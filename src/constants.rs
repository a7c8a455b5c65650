// src/constants.rs

/// The name of the configuration file looked up in the user config directory.
pub const CONFIG_FILENAME: &str = "cmdtree.toml";

/// The name of the directory (inside the system config dir) holding `cmdtree.toml`.
pub const CONFIG_DIR_NAME: &str = "cmdtree";

/// The only character accepted between two tokens of a command line.
pub const ARGUMENT_SEPARATOR: char = ' ';

/// How many bytes of input are shown before the `<--[HERE]` marker of a syntax error.
pub const ERROR_CONTEXT_WIDTH: usize = 10;

/// The outcome code reported by handlers that do not return one explicitly.
pub const DEFAULT_SUCCESS_CODE: i32 = 1;

/// The outcome code carried by an `ExecutionError` unless overridden.
pub const DEFAULT_FAILURE_CODE: i32 = 0;

/// The default message used when no handler accepts the sender's kind.
/// `%s` is replaced with the sender kind.
pub const MISSING_EXECUTOR_MESSAGE: &str = "This command has no implementations for %s";

/// Number of leading bytes of the blake3 digest kept in a tree fingerprint.
pub const FINGERPRINT_LENGTH: usize = 16;
