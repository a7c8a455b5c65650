// src/cli/handlers/complete.rs

use crate::core::dispatcher::Suggestions;
use crate::core::manager::CommandManager;
use crate::core::sender::CommandSender;
use colored::Colorize;

/// Prints the completion candidates for `partial`, one per line.
pub fn handle(manager: &CommandManager, sender: &(dyn CommandSender + 'static), partial: &str) {
    let suggestions = manager.complete(sender, partial.trim_start_matches('/'));
    print_suggestions(&suggestions);
}

/// Prints `suggestions`, or a dimmed placeholder when there are none.
pub fn print_suggestions(suggestions: &Suggestions) {
    if suggestions.candidates.is_empty() {
        println!("{}", "(no suggestions)".dimmed());
        return;
    }
    for candidate in &suggestions.candidates {
        println!("{}", candidate);
    }
}
