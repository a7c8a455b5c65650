// src/cli/demo.rs

//! The command set hosted by the `cmdtree` binary. It exercises every feature of the
//! engine: choice and optional arguments with sender-based defaults, subcommands with
//! aliases, literal arguments, per-sender-kind handlers, greedy text, permissions and
//! custom suggestions.

use crate::core::arguments::{
    Argument, BooleanArgument, ChoiceArgument, DoubleArgument, GreedyStringArgument,
    IntegerArgument, StringArgument, TextArgument,
};
use crate::core::builder::CommandBuilder;
use crate::core::config::Config;
use crate::core::errors::{RegistrationError, fail};
use crate::core::manager::CommandManager;
use crate::core::permission::CommandPermission;
use crate::core::sender::CommandSender;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

type Sender = dyn CommandSender;
type Builder = CommandBuilder<Sender>;

const ITEMS: [&str; 6] = ["apple", "bread", "diamond", "iron_ingot", "stone", "torch"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GameMode {
    Survival,
    Creative,
    Adventure,
    Spectator,
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Survival => "survival",
            Self::Creative => "creative",
            Self::Adventure => "adventure",
            Self::Spectator => "spectator",
        };
        f.write_str(name)
    }
}

/// Balances of the `economy` command, keyed by player name.
type Bank = Arc<Mutex<HashMap<String, f64>>>;

/// Creates a manager, loads `config`, registers the demo commands and enables it.
pub fn build_manager(config: Config) -> Result<CommandManager> {
    let manager = CommandManager::new("cmdtree-demo");
    manager.load(config).context("Failed to load the command manager")?;
    register_demo_commands(&manager).context("Failed to register the demo commands")?;
    manager.enable().context("Failed to enable the command manager")?;
    Ok(manager)
}

/// Registers every demo command with `manager`.
pub fn register_demo_commands(manager: &CommandManager) -> Result<(), RegistrationError> {
    let bank: Bank = Arc::default();

    gamemode().register(manager)?;
    economy(&bank).register(manager)?;
    give().register(manager)?;
    tell().register(manager)?;
    warp().register(manager)?;
    time().register(manager)?;
    pvp().register(manager)?;
    stop().register(manager)?;
    Ok(())
}

fn gamemode() -> Builder {
    Builder::new("gamemode")
        .with_alias("gm")
        .with_help(
            "Changes a player's game mode",
            "Changes the game mode of the given player, or of the sender when no player is named.",
        )
        .with_usage(["/gamemode <mode> [player]"])
        .with_argument(Argument::new(
            "mode",
            ChoiceArgument::new([
                ("survival", GameMode::Survival),
                ("creative", GameMode::Creative),
                ("adventure", GameMode::Adventure),
                ("spectator", GameMode::Spectator),
            ]),
        ))
        .with_argument(
            Argument::new("player", StringArgument)
                .with_default(|sender: &Sender| sender.name().to_string()),
        )
        .executes(|sender, args| {
            let mode = args.require::<GameMode>("mode")?;
            let player = args.require::<String>("player")?;
            sender.send_message(&format!("Set {}'s game mode to {}", player, mode));
            Ok(())
        })
}

fn economy(bank: &Bank) -> Builder {
    let deposits = Arc::clone(bank);
    let withdrawals = Arc::clone(bank);
    let balances = Arc::clone(bank);

    Builder::new("economy")
        .with_alias("eco")
        .with_short_description("Manages the sender's balance")
        .with_subcommand(
            Builder::new("deposit")
                .with_alias("dep")
                .with_argument(Argument::new("amount", DoubleArgument::at_least(0.01)))
                .executes(move |sender, args| {
                    let amount = *args.require::<f64>("amount")?;
                    let mut bank = deposits.lock().unwrap_or_else(PoisonError::into_inner);
                    let balance = bank.entry(sender.name().to_string()).or_default();
                    *balance += amount;
                    sender.send_message(&format!("Deposited {:.2}, balance is now {:.2}", amount, balance));
                    Ok(())
                }),
        )
        .with_subcommand(
            Builder::new("withdraw")
                .with_alias("with")
                .with_argument(Argument::new("amount", DoubleArgument::at_least(0.01)))
                .executes(move |sender, args| {
                    let amount = *args.require::<f64>("amount")?;
                    let mut bank = withdrawals.lock().unwrap_or_else(PoisonError::into_inner);
                    let balance = bank.entry(sender.name().to_string()).or_default();
                    if *balance < amount {
                        return Err(fail(format!("Insufficient funds: balance is {:.2}", balance)));
                    }
                    *balance -= amount;
                    sender.send_message(&format!("Withdrew {:.2}, balance is now {:.2}", amount, balance));
                    Ok(())
                }),
        )
        .with_subcommand(
            Builder::new("balance")
                .with_alias("bal")
                .with_argument(
                    Argument::new("player", StringArgument)
                        .with_default(|sender: &Sender| sender.name().to_string())
                        .with_permission("economy.others"),
                )
                .executes(move |sender, args| {
                    let player = args.require::<String>("player")?;
                    let bank = balances.lock().unwrap_or_else(PoisonError::into_inner);
                    let balance = bank.get(player).copied().unwrap_or_default();
                    sender.send_message(&format!("{} has {:.2}", player, balance));
                    Ok(())
                }),
        )
}

fn give() -> Builder {
    Builder::new("give")
        .with_alias("g")
        .with_short_description("Gives the sender an item")
        .with_argument(
            Argument::new("item", StringArgument).with_suggestions(|_: &Sender, _: &str| {
                ITEMS.iter().map(|item| item.to_string()).collect()
            }),
        )
        .with_argument(
            Argument::new("amount", IntegerArgument::with_bounds(1, 64))
                .with_default(|_: &Sender| 1),
        )
        .executes_player(|sender, args| {
            let item = args.require::<String>("item")?;
            let amount = *args.require::<i32>("amount")?;
            sender.send_message(&format!("Gave {} x {} to {}", amount, item, sender.name()));
            Ok(())
        })
}

fn tell() -> Builder {
    Builder::new("tell")
        .with_aliases(["msg", "w"])
        .with_short_description("Sends a private message")
        .with_argument(Argument::new("target", StringArgument))
        .with_argument(Argument::new("message", GreedyStringArgument))
        .executes(|sender, args| {
            let target = args.require::<String>("target")?;
            let message = args.require::<String>("message")?;
            sender.send_message(&format!("[{} -> {}] {}", sender.name(), target, message));
            Ok(())
        })
}

fn warp() -> Builder {
    Builder::new("warp")
        .with_short_description("Teleports to a named warp")
        .with_subcommand(
            Builder::new("to")
                .with_argument(Argument::new("name", TextArgument))
                .executes(|sender, args| {
                    let name = args.require::<String>("name")?;
                    sender.send_message(&format!("Warping to '{}'", name));
                    Ok(())
                }),
        )
        .with_subcommand(Builder::new("list").executes(|sender, _| {
            sender.send_message("Warps: spawn, \"market square\"");
            Ok(())
        }))
}

fn time() -> Builder {
    Builder::new("time")
        .with_permission("demo.time")
        .with_short_description("Sets the time of day")
        .with_argument(Argument::literal("set"))
        .with_argument(Argument::new("ticks", IntegerArgument::with_bounds(0, 24000)))
        .executes(|sender, args| {
            let ticks = *args.require::<i32>("ticks")?;
            sender.send_message(&format!("Set the time to {}", ticks));
            Ok(())
        })
}

fn pvp() -> Builder {
    Builder::new("pvp")
        .with_permission("demo.pvp")
        .with_short_description("Toggles player combat")
        .with_argument(Argument::new("enabled", BooleanArgument))
        .executes(|sender, args| {
            let enabled = *args.require::<bool>("enabled")?;
            let state = if enabled { "enabled" } else { "disabled" };
            sender.send_message(&format!("PvP is now {}", state));
            Ok(())
        })
}

fn stop() -> Builder {
    Builder::new("stop")
        .with_permission(CommandPermission::op())
        .with_short_description("Stops the server")
        .executes_with_result(|sender, _| {
            sender.send_message("Stopping the server...");
            Ok(0)
        })
}
