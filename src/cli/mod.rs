// src/cli/mod.rs

use crate::core::config::Config;
use crate::core::paths;
use crate::core::sender::SenderKind;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};

pub mod demo;
pub mod handlers;
pub mod sender;

/// cmdtree: dispatch, complete and inspect a demo command tree from the terminal.
///
/// With a command line it dispatches that single line and exits. With `--list`,
/// `--tree`, `--describe` or `--complete` it inspects the registry instead. With
/// neither, it reads command lines from stdin until `exit` or end of input.
///
/// Examples:
///   cmdtree gamemode creative
///   cmdtree --kind player --sender Steve economy dep 50
///   cmdtree --complete "economy w"
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to a `cmdtree.toml`. Defaults to the one in the user config directory.
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Name of the simulated sender.
    #[arg(long, default_value = "Console")]
    pub sender: String,

    /// Kind of the simulated sender.
    #[arg(long, value_enum, default_value_t = KindArg::Console)]
    pub kind: KindArg,

    /// Make the simulated sender an operator.
    #[arg(long)]
    pub op: bool,

    /// Grant a permission node to the simulated sender. Repeatable; `a.*` grants a subtree.
    #[arg(long = "permission", short = 'p', value_name = "NODE")]
    pub permissions: Vec<String>,

    /// List the registered commands with their signatures.
    #[arg(long, conflicts_with_all = ["tree", "describe", "complete"])]
    pub list: bool,

    /// Render the command tree.
    #[arg(long, conflicts_with_all = ["describe", "complete"])]
    pub tree: bool,

    /// Print the JSON description of the command tree.
    #[arg(long, conflicts_with = "complete")]
    pub describe: bool,

    /// Print completion candidates for a partial command line.
    #[arg(long, value_name = "PARTIAL")]
    pub complete: Option<String>,

    /// The command line to dispatch.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

/// Sender kinds accepted on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindArg {
    Player,
    Console,
    BlockCommand,
    Entity,
    Proxy,
    Remote,
}

impl From<KindArg> for SenderKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Player => SenderKind::Player,
            KindArg::Console => SenderKind::Console,
            KindArg::BlockCommand => SenderKind::BlockCommand,
            KindArg::Entity => SenderKind::Entity,
            KindArg::Proxy => SenderKind::Proxy,
            KindArg::Remote => SenderKind::Remote,
        }
    }
}

/// Loads the configuration: the explicit file if given, otherwise the default file if
/// it exists, otherwise the defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        return Config::load(path)
            .with_context(|| format!("Could not load configuration from '{}'", path.display()));
    }

    let default_path = match paths::default_config_path() {
        Ok(path) => path,
        Err(e) => {
            log::debug!("No config directory available ({}); using defaults.", e);
            return Ok(Config::default());
        }
    };
    if !default_path.is_file() {
        log::debug!("No config file at '{}'; using defaults.", default_path.display());
        return Ok(Config::default());
    }
    Config::load(&default_path).with_context(|| {
        format!(
            "Could not load configuration from '{}'",
            default_path.display()
        )
    })
}
