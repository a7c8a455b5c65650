// src/cli/handlers/describe.rs

use crate::core::manager::CommandManager;
use anyhow::{Context, Result};

/// Prints the JSON description of the command tree, followed by its fingerprint on
/// stderr.
pub fn handle(manager: &CommandManager) -> Result<()> {
    let description = manager.describe();
    let json = serde_json::to_string_pretty(&description)
        .context("Failed to serialize the command tree")?;
    println!("{}", json);
    eprintln!("fingerprint: {}", description.fingerprint());
    Ok(())
}
