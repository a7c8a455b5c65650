// src/bin/cmdtree.rs

use anyhow::{Result, anyhow};
use clap::Parser;
use cmdtree::cli::{self, Cli, demo, handlers, sender::TerminalSender};
use colored::*;
use std::io;

/// The main entry point of the `cmdtree` binary.
/// It sets up logging, parses arguments, builds the demo command manager and routes
/// to the handler for the requested mode.
fn main() {
    env_logger::init();

    match run_cli(Cli::parse()) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("\n{}: {:#}", "Error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

/// Returns the process exit code.
fn run_cli(cli: Cli) -> Result<i32> {
    log::debug!("CLI args parsed: {:?}", cli);

    let config = cli::load_config(cli.config.as_deref())?;
    let manager = demo::build_manager(config)?;
    let sender = TerminalSender::new(cli.sender.clone(), cli.kind.into())
        .with_op(cli.op)
        .with_permissions(cli.permissions.iter().cloned());

    // --- Inspection modes ---
    if cli.list {
        handlers::list::handle(&manager);
        return Ok(0);
    }
    if cli.tree {
        handlers::tree::handle(&manager);
        return Ok(0);
    }
    if cli.describe {
        handlers::describe::handle(&manager)?;
        return Ok(0);
    }
    if let Some(partial) = &cli.complete {
        handlers::complete::handle(&manager, &sender, partial);
        return Ok(0);
    }

    // --- Dispatch ---
    if !cli.command.is_empty() {
        // Re-quote the words so arguments containing spaces survive as one token.
        let line = shlex::try_join(cli.command.iter().map(String::as_str))
            .map_err(|e| anyhow!("Could not rebuild the command line: {}", e))?;
        return Ok(handlers::run::handle(&manager, &sender, &line));
    }

    handlers::repl::handle(&manager, &sender, io::stdin().lock())?;
    Ok(0)
}
