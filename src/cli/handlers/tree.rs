// src/cli/handlers/tree.rs

use crate::core::graph_display;
use crate::core::manager::CommandManager;
use colored::Colorize;

/// Renders the registered command tree.
pub fn handle(manager: &CommandManager) {
    let description = manager.describe();
    println!(
        "\n{} {}",
        "Command tree".bold(),
        format!("({})", description.fingerprint()).dimmed()
    );
    print!("{}", graph_display::render_tree(&description));
}
