// src/core/mod.rs

pub mod arguments;
pub mod builder;
pub mod compiler;
pub mod config;
pub mod describe;
pub mod dispatcher;
pub mod errors;
pub mod graph_display;
pub mod logger;
pub mod manager;
pub mod node;
pub mod paths;
pub mod permission;
pub mod reader;
pub mod registry;
pub mod sender;

#[cfg(test)]
pub(crate) mod test_support;
