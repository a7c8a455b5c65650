// src/cli/handlers/commons.rs

// Shared output helpers.

use crate::core::errors::DispatchError;
use colored::Colorize;

/// A line of spaces with a `^` under the character at byte offset `cursor`.
pub fn caret_line(input: &str, cursor: usize) -> String {
    let width = input
        .get(..cursor.min(input.len()))
        .map(|prefix| prefix.chars().count())
        .unwrap_or_else(|| input.chars().count());
    format!("{}^", " ".repeat(width))
}

/// The plain-text lines describing a failed dispatch of `input`.
pub fn describe_dispatch_error(input: &str, error: &DispatchError) -> Vec<String> {
    match error {
        DispatchError::Syntax(e) | DispatchError::Permission(e) => {
            let mut lines = vec![e.message()];
            if let Some(cursor) = e.cursor() {
                lines.push(format!("  {}", input));
                lines.push(format!("  {}", caret_line(input, cursor)));
            }
            lines
        }
        DispatchError::Execution(e) => vec![e.message().to_string()],
    }
}

/// Prints a failed dispatch to stderr, the offending position marked with a caret.
pub fn print_dispatch_error(input: &str, error: &DispatchError) {
    let mut lines = describe_dispatch_error(input, error).into_iter();
    if let Some(headline) = lines.next() {
        eprintln!("{}: {}", "Error".red().bold(), headline);
    }
    for line in lines {
        eprintln!("{}", line.dimmed());
    }
}
