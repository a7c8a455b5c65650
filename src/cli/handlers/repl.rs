// src/cli/handlers/repl.rs

use crate::cli::handlers::{commons, complete};
use crate::core::manager::CommandManager;
use crate::core::sender::CommandSender;
use anyhow::{Context, Result};
use colored::Colorize;
use std::io::{self, BufRead, Write};

/// Reads command lines from `input` until `exit`, `quit` or end of input.
///
/// A line ending in `?` prints the completions for the text before it instead of
/// dispatching it.
pub fn handle(
    manager: &CommandManager,
    sender: &(dyn CommandSender + 'static),
    input: impl BufRead,
) -> Result<usize> {
    println!(
        "{} Type a command, `<partial>?` for completions, or `exit`.",
        "cmdtree".bold().cyan()
    );

    let mut dispatched = 0;
    let mut lines = input.lines();
    loop {
        print!("{} ", ">".green());
        io::stdout().flush().context("Failed to flush stdout")?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line.context("Failed to read from stdin")?;
        let line = line.trim_end_matches(['\r', '\n']).trim_start_matches('/');
        match line.trim() {
            "" => continue,
            "exit" | "quit" => break,
            _ => {}
        }

        if let Some(partial) = line.strip_suffix('?') {
            complete::print_suggestions(&manager.complete(sender, partial));
            continue;
        }

        dispatched += 1;
        match manager.dispatch(sender, line) {
            Ok(code) => log::debug!("'{}' returned {}", line, code),
            Err(e) => commons::print_dispatch_error(line, &e),
        }
    }
    Ok(dispatched)
}
