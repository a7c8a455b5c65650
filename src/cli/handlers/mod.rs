// src/cli/handlers/mod.rs

// One module per mode of the binary.

pub mod commons;
pub mod complete;
pub mod describe;
pub mod list;
pub mod repl;
pub mod run;
pub mod tree;
