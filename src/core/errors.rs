//! # Errors
//!
//! The error taxonomy of the engine:
//!
//! - [`DeclarationError`]: a malformed command declaration, detected when compiling or
//!   registering. Fatal to that registration only.
//! - [`SyntaxError`]: the input line does not match the tree. Carries the cursor position.
//! - [`DispatchError::Permission`]: only produced when permission errors are revealed,
//!   otherwise a denied node is reported exactly like a missing one.
//! - [`ExecutionError`]: a handler-level failure with a user-facing message and a code.

use crate::constants::{DEFAULT_FAILURE_CODE, ERROR_CONTEXT_WIDTH};
use crate::core::manager::LifecycleState;
use std::fmt;
use thiserror::Error;

// --- SYNTAX ERRORS ---

/// What went wrong while reading a command line.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyntaxErrorKind {
    /// No integer characters at the cursor.
    #[error("Expected integer")]
    ExpectedInt,
    /// Integer characters that do not form a valid integer.
    #[error("Invalid integer '{0}'")]
    InvalidInt(String),
    /// Integer below the declared minimum.
    #[error("Integer must not be less than {min}, found {found}")]
    IntegerTooLow {
        /// The declared minimum.
        min: i32,
        /// The parsed value.
        found: i32,
    },
    /// Integer above the declared maximum.
    #[error("Integer must not be more than {max}, found {found}")]
    IntegerTooHigh {
        /// The declared maximum.
        max: i32,
        /// The parsed value.
        found: i32,
    },
    /// No number characters at the cursor.
    #[error("Expected double")]
    ExpectedDouble,
    /// Number characters that do not form a valid double.
    #[error("Invalid double '{0}'")]
    InvalidDouble(String),
    /// Double below the declared minimum.
    #[error("Double must not be less than {min}, found {found}")]
    DoubleTooLow {
        /// The declared minimum.
        min: f64,
        /// The parsed value.
        found: f64,
    },
    /// Double above the declared maximum.
    #[error("Double must not be more than {max}, found {found}")]
    DoubleTooHigh {
        /// The declared maximum.
        max: f64,
        /// The parsed value.
        found: f64,
    },
    /// Nothing to read where a boolean was expected.
    #[error("Expected bool")]
    ExpectedBool,
    /// A word that is neither `true` nor `false`.
    #[error("Invalid bool, expected true or false but found '{0}'")]
    InvalidBool(String),
    /// Nothing to read where a word was expected.
    #[error("Expected string")]
    ExpectedString,
    /// A quoted string was expected.
    #[error("Expected quote to start a string")]
    ExpectedStartOfQuote,
    /// A quoted string was never closed.
    #[error("Unclosed quoted string")]
    ExpectedEndOfQuote,
    /// A backslash followed by something other than a quote or a backslash.
    #[error("Invalid escape sequence '{0}' in quoted string")]
    InvalidEscape(char),
    /// A word that is not one of the accepted literals.
    #[error("Expected literal {0}")]
    ExpectedLiteral(String),
    /// A word that is not one of the accepted choices.
    #[error("Unknown value '{found}', expected one of: {expected}")]
    InvalidChoice {
        /// The word that was read.
        found: String,
        /// The accepted words, comma separated.
        expected: String,
    },
    /// The first token matches no registered command.
    #[error("Unknown command")]
    UnknownCommand,
    /// The input ended on a node that has no executor.
    #[error("Unknown or incomplete command")]
    IncompleteCommand,
    /// A token matches no child of the current node.
    #[error("Incorrect argument for command")]
    UnknownArgument,
    /// A token was followed by something other than the separator.
    #[error("Expected whitespace to end one argument, but found trailing data")]
    ExpectedArgumentSeparator,
    /// The sender fails a requirement on the matched path.
    #[error("You do not have permission to use this command")]
    PermissionDenied,
    /// A message supplied by a custom argument type.
    #[error("{0}")]
    Custom(String),
}

/// A syntax error with the position it occurred at.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxError {
    kind: SyntaxErrorKind,
    input: Option<String>,
    cursor: Option<usize>,
}

impl SyntaxError {
    /// Creates an error without position information.
    pub fn new(kind: SyntaxErrorKind) -> Self {
        Self {
            kind,
            input: None,
            cursor: None,
        }
    }

    /// Creates an error pointing at `cursor` inside `input`.
    pub fn with_context(kind: SyntaxErrorKind, input: &str, cursor: usize) -> Self {
        Self {
            kind,
            input: Some(input.to_string()),
            cursor: Some(cursor.min(input.len())),
        }
    }

    /// Shorthand for a [`SyntaxErrorKind::Custom`] error.
    pub fn custom(message: impl Into<String>) -> Self {
        Self::new(SyntaxErrorKind::Custom(message.into()))
    }

    /// Fills in the position if the error was created without one.
    pub(crate) fn or_context(self, input: &str, cursor: usize) -> Self {
        if self.cursor.is_some() {
            self
        } else {
            Self::with_context(self.kind, input, cursor)
        }
    }

    /// The error kind.
    pub fn kind(&self) -> &SyntaxErrorKind {
        &self.kind
    }

    /// The byte offset of the offending token, if known.
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// The full input line, if known.
    pub fn input(&self) -> Option<&str> {
        self.input.as_deref()
    }

    /// The bare message, without position.
    pub fn message(&self) -> String {
        self.kind.to_string()
    }

    /// The tail of the input up to the cursor followed by `<--[HERE]`.
    pub fn context(&self) -> Option<String> {
        let (input, cursor) = (self.input.as_deref()?, self.cursor?);
        let mut start = cursor.saturating_sub(ERROR_CONTEXT_WIDTH);
        while !input.is_char_boundary(start) {
            start += 1;
        }
        let mut context = String::new();
        if start > 0 {
            context.push_str("...");
        }
        context.push_str(input.get(start..cursor).unwrap_or_default());
        context.push_str("<--[HERE]");
        Some(context)
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let (Some(context), Some(cursor)) = (self.context(), self.cursor) {
            write!(f, " at position {}: {}", cursor, context)?;
        }
        Ok(())
    }
}

impl std::error::Error for SyntaxError {}

// --- DECLARATION ERRORS ---

/// A command declaration that cannot be compiled or registered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeclarationError {
    /// A command, subcommand or alias name is empty or contains whitespace.
    #[error("Invalid command name '{name}': names must be non-empty and contain no whitespace")]
    InvalidCommandName {
        /// The rejected name.
        name: String,
    },
    /// An argument name is empty or contains whitespace.
    #[error("Command '{command}' declares an invalid argument name '{name}'")]
    InvalidArgumentName {
        /// The command declaring the argument.
        command: String,
        /// The rejected name.
        name: String,
    },
    /// An optional argument is followed by a required one.
    #[error(
        "Command '{command}': optional argument '{optional}' cannot be followed by required argument '{required}'"
    )]
    Ordering {
        /// The command declaring the arguments.
        command: String,
        /// The earlier, optional argument.
        optional: String,
        /// The later, required argument.
        required: String,
    },
    /// Two arguments on the same route share a name.
    #[error("Command '{command}' declares argument '{name}' more than once")]
    DuplicateArgumentName {
        /// The command declaring the arguments.
        command: String,
        /// The duplicated name.
        name: String,
    },
    /// A permission node has an invalid shape.
    #[error("Invalid permission node '{node}'")]
    InvalidPermission {
        /// The rejected node.
        node: String,
    },
    /// A default value provider produces a different type than the argument parses to.
    #[error("Command '{command}': default value of argument '{name}' does not match its type")]
    DefaultTypeMismatch {
        /// The command declaring the argument.
        command: String,
        /// The argument name.
        name: String,
    },
    /// A command or subcommand with neither a handler nor subcommands.
    #[error("Command '{command}' has no executor and no subcommands")]
    MissingExecutor {
        /// The dead command.
        command: String,
    },
    /// The conflict strategy refused to register over an existing command.
    #[error("Command '{name}' is already registered")]
    Conflict {
        /// The conflicting name.
        name: String,
    },
}

// --- EXECUTION ERRORS ---

/// A failure raised by a handler. Its message is shown to the sender.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ExecutionError {
    message: String,
    code: i32,
}

impl ExecutionError {
    /// Creates an error with the conventional failure code.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: DEFAULT_FAILURE_CODE,
        }
    }

    /// Overrides the outcome code reported for this failure.
    pub fn with_code(mut self, code: i32) -> Self {
        self.code = code;
        self
    }

    /// The user-facing message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The outcome code reported for this failure.
    pub fn code(&self) -> i32 {
        self.code
    }
}

/// Builds the error a handler returns to abort with `message`.
pub fn fail(message: impl Into<String>) -> ExecutionError {
    ExecutionError::new(message)
}

// --- DISPATCH ERRORS ---

/// Why a dispatch call did not succeed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DispatchError {
    /// The input does not match the tree (or, when hidden, the sender lacks permission).
    #[error(transparent)]
    Syntax(SyntaxError),
    /// The sender fails a requirement. Only produced when permission errors are revealed.
    #[error(transparent)]
    Permission(SyntaxError),
    /// The handler reported a failure.
    #[error(transparent)]
    Execution(ExecutionError),
}

impl DispatchError {
    /// The input cursor of syntax and permission errors.
    pub fn cursor(&self) -> Option<usize> {
        match self {
            Self::Syntax(e) | Self::Permission(e) => e.cursor(),
            Self::Execution(_) => None,
        }
    }

    /// The outcome code this failure reports.
    pub fn code(&self) -> i32 {
        match self {
            Self::Execution(e) => e.code(),
            Self::Syntax(_) | Self::Permission(_) => DEFAULT_FAILURE_CODE,
        }
    }
}

impl From<SyntaxError> for DispatchError {
    fn from(error: SyntaxError) -> Self {
        Self::Syntax(error)
    }
}

impl From<ExecutionError> for DispatchError {
    fn from(error: ExecutionError) -> Self {
        Self::Execution(error)
    }
}

// --- LIFECYCLE & REGISTRATION ERRORS ---

/// An operation that is not valid in the manager's current lifecycle state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// `load` was called on a manager that is already loaded or enabled.
    #[error("The command manager has already been loaded")]
    AlreadyLoaded,
    /// The operation requires a different state.
    #[error("Cannot {action} while the command manager is {state}")]
    InvalidState {
        /// What was attempted.
        action: &'static str,
        /// The state the manager was in.
        state: LifecycleState,
    },
}

/// Why a `register` call failed. The registry is unchanged in every case.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// The declaration is invalid.
    #[error(transparent)]
    Declaration(#[from] DeclarationError),
    /// The manager is not in a state that accepts registrations.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    /// Registration was stopped with `stop_command_registration`.
    #[error("Command registration has been stopped; '{name}' was not registered")]
    Closed {
        /// The command that was refused.
        name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_display_with_context() {
        let error = SyntaxError::with_context(SyntaxErrorKind::UnknownArgument, "gamemode creativ", 9);
        assert_eq!(
            error.to_string(),
            "Incorrect argument for command at position 9: gamemode <--[HERE]"
        );
    }

    #[test]
    fn test_syntax_error_context_is_truncated() {
        let input = "economy deposit lots";
        let error = SyntaxError::with_context(SyntaxErrorKind::ExpectedDouble, input, 16);
        assert_eq!(error.context().as_deref(), Some("...y deposit <--[HERE]"));
    }

    #[test]
    fn test_syntax_error_without_context_displays_message_only() {
        let error = SyntaxError::custom("Not a colour");
        assert_eq!(error.to_string(), "Not a colour");
        assert!(error.context().is_none());

        // Filling in the position afterwards.
        let error = error.or_context("paint red", 6);
        assert_eq!(error.cursor(), Some(6));
    }

    #[test]
    fn test_execution_error_code_override() {
        let error = fail("Not enough money").with_code(-1);
        assert_eq!(error.message(), "Not enough money");
        assert_eq!(DispatchError::from(error).code(), -1);
    }
}
