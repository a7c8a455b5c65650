// src/cli/handlers/list.rs

use crate::core::manager::CommandManager;
use crate::models::RegisteredCommand;
use colored::Colorize;

/// Lists every registered command with its aliases and argument signatures.
pub fn handle(manager: &CommandManager) {
    let commands = manager.registered_commands();
    if commands.is_empty() {
        println!("No commands registered.");
        return;
    }

    println!("\n--- {} ({}) ---", "Registered commands".yellow(), commands.len());
    for command in &commands {
        let mut header = format!("  {}", command.name.cyan().bold());
        if !command.aliases.is_empty() {
            header.push_str(&format!(" {}", format!("[{}]", command.aliases.join(", ")).dimmed()));
        }
        if let Some(short) = &command.short_description {
            header.push_str(&format!(" - {}", short));
        }
        println!("{}", header);
        for line in signature_lines(command) {
            println!("      {}", line);
        }
        if command.permission != "none" {
            println!("      {} {}", "permission:".blue(), command.permission);
        }
    }
}

/// One `/name <arg> [arg]` line per executable route.
pub fn signature_lines(command: &RegisteredCommand) -> Vec<String> {
    command
        .arguments
        .iter()
        .map(|route| {
            let mut line = format!("/{}", command.name);
            for argument in route {
                line.push(' ');
                line.push_str(argument);
            }
            line
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::demo;
    use crate::core::config::Config;

    #[test]
    fn test_signature_lines() {
        // --- Setup ---
        let manager = demo::build_manager(Config::default()).unwrap();
        let commands = manager.registered_commands();
        let gamemode = commands.iter().find(|c| c.name == "gamemode").unwrap();
        let time = commands.iter().find(|c| c.name == "time").unwrap();

        // --- Execute & Assert ---
        assert_eq!(
            signature_lines(gamemode),
            vec!["/gamemode <mode:choice> [player:string]".to_string()]
        );
        assert_eq!(signature_lines(time), vec!["/time set <ticks:integer>".to_string()]);
    }
}
