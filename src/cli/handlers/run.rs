// src/cli/handlers/run.rs

use crate::cli::handlers::commons;
use crate::core::manager::CommandManager;
use crate::core::sender::CommandSender;

/// Dispatches a single command line. Returns the process exit code.
pub fn handle(manager: &CommandManager, sender: &(dyn CommandSender + 'static), line: &str) -> i32 {
    let line = line.trim_start_matches('/');
    log::debug!("Dispatching '{}' as {} ({})", line, sender.name(), sender.kind());
    match manager.dispatch(sender, line) {
        Ok(code) => {
            log::debug!("Command returned {}", code);
            0
        }
        Err(e) => {
            commons::print_dispatch_error(line, &e);
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::demo;
    use crate::cli::sender::TerminalSender;
    use crate::core::sender::SenderKind;
    use crate::core::config::Config;
    use crate::core::test_support::TestSender;

    #[test]
    fn test_exit_codes() {
        let manager = demo::build_manager(Config::default()).unwrap();
        let steve = TestSender::player("Steve");

        assert_eq!(handle(&manager, &steve, "/gamemode creative"), 0);
        assert_eq!(handle(&manager, &steve, "gamemode flying"), 1);
        assert_eq!(steve.messages(), vec!["Set Steve's game mode to creative".to_string()]);
    }

    #[test]
    fn test_terminal_sender_reaches_demo_handlers() {
        // --- Setup ---
        let manager = demo::build_manager(Config::default()).unwrap();
        let steve: Box<dyn CommandSender> = Box::new(TerminalSender::new("Steve", SenderKind::Player));
        let console: Box<dyn CommandSender> = Box::new(TerminalSender::new("Console", SenderKind::Console));

        // --- Execute & Assert ---
        // Defaults and suggestions are evaluated against the trait object.
        assert_eq!(handle(&manager, steve.as_ref(), "gamemode creative"), 0);
        assert_eq!(handle(&manager, steve.as_ref(), "give diamond"), 0);
        assert_eq!(handle(&manager, steve.as_ref(), "economy bal"), 0);
        assert_eq!(manager.complete(steve.as_ref(), "give i").candidates, vec!["iron_ingot".to_string()]);

        assert_eq!(handle(&manager, console.as_ref(), "give diamond"), 1);
        assert_eq!(handle(&manager, console.as_ref(), "stop"), 1);
    }
}
