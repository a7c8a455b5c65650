// src/core/config.rs

//! # Config
//!
//! Runtime settings of a [`CommandManager`](crate::core::manager::CommandManager),
//! loadable from a `cmdtree.toml` file. Every field has a default, so an empty file
//! (or no file at all) is a valid configuration.

use crate::constants::MISSING_EXECUTOR_MESSAGE;
use crate::core::dispatcher::DispatcherOptions;
use crate::core::registry::ConflictResolution;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure to read or parse a configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML from '{path}': {source}")]
    TomlParse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Manager settings.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Emit info-level messages.
    pub verbose_output: bool,
    /// Suppress everything except errors.
    pub silent_logs: bool,
    /// Where `enable()` writes the JSON description of the command tree.
    /// `~` and environment variables are expanded.
    pub dispatcher_file: Option<PathBuf>,
    /// What happens when a command is registered under a name already in use.
    pub conflict_resolution: ConflictResolution,
    /// Report permission failures instead of treating denied nodes as missing.
    pub reveal_permission_errors: bool,
    /// Shown when no handler accepts the sender's kind. `%s` is the kind.
    pub missing_executor_message: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            verbose_output: false,
            silent_logs: false,
            dispatcher_file: None,
            conflict_resolution: ConflictResolution::default(),
            reveal_permission_errors: false,
            missing_executor_message: MISSING_EXECUTOR_MESSAGE.to_string(),
        }
    }
}

impl Config {
    /// Emits `info` level messages.
    pub fn with_verbose_output(mut self, verbose: bool) -> Self {
        self.verbose_output = verbose;
        self
    }

    /// Mutes everything but errors.
    pub fn with_silent_logs(mut self, silent: bool) -> Self {
        self.silent_logs = silent;
        self
    }

    /// Writes the command tree description to `path` on enable.
    pub fn with_dispatcher_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.dispatcher_file = Some(path.into());
        self
    }

    /// How registering a taken name is resolved.
    pub fn with_conflict_resolution(mut self, resolution: ConflictResolution) -> Self {
        self.conflict_resolution = resolution;
        self
    }

    /// Reports permission failures as such instead of as unknown commands.
    pub fn with_reveal_permission_errors(mut self, reveal: bool) -> Self {
        self.reveal_permission_errors = reveal;
        self
    }

    /// Message used when no handler accepts the sender kind. `%s` is the kind.
    pub fn with_missing_executor_message(mut self, message: impl Into<String>) -> Self {
        self.missing_executor_message = message.into();
        self
    }

    /// Parses a configuration from TOML text. `origin` names the source in errors.
    pub fn from_toml_str(content: &str, origin: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::TomlParse {
            path: origin.to_string(),
            source: e,
        })
    }

    /// Reads and parses a `cmdtree.toml` file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        log::debug!("Loading configuration from '{}'", path.display());
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_toml_str(&content, &path.display().to_string())
    }

    /// The dispatch switches derived from this configuration.
    pub fn dispatcher_options(&self) -> DispatcherOptions {
        DispatcherOptions {
            reveal_permission_errors: self.reveal_permission_errors,
            missing_executor_message: self.missing_executor_message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_yields_defaults() {
        let config = Config::from_toml_str("", "<memory>").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.conflict_resolution, ConflictResolution::Merge);
        assert_eq!(config.missing_executor_message, MISSING_EXECUTOR_MESSAGE);
    }

    #[test]
    fn test_full_toml() {
        // --- Setup ---
        let content = r#"
            verbose_output = true
            dispatcher_file = "~/out/command_registration.json"
            conflict_resolution = "reject"
            reveal_permission_errors = true
            missing_executor_message = "No handler for %s"
        "#;

        // --- Execute ---
        let config = Config::from_toml_str(content, "<memory>").unwrap();

        // --- Assert ---
        assert!(config.verbose_output);
        assert!(!config.silent_logs);
        assert_eq!(
            config.dispatcher_file,
            Some(PathBuf::from("~/out/command_registration.json"))
        );
        assert_eq!(config.conflict_resolution, ConflictResolution::Reject);
        let options = config.dispatcher_options();
        assert!(options.reveal_permission_errors);
        assert_eq!(options.missing_executor_message, "No handler for %s");
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let result = Config::from_toml_str("colour_output = true", "cmdtree.toml");
        assert!(matches!(result, Err(ConfigError::TomlParse { path, .. }) if path == "cmdtree.toml"));
    }

    #[test]
    fn test_load_from_file() {
        // --- Setup ---
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cmdtree.toml");
        fs::write(&path, "silent_logs = true\nconflict_resolution = \"replace\"\n").unwrap();

        // --- Execute ---
        let config = Config::load(&path).unwrap();

        // --- Assert ---
        assert!(config.silent_logs);
        assert_eq!(config.conflict_resolution, ConflictResolution::Replace);
        assert!(matches!(
            Config::load(&dir.path().join("missing.toml")),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_builder_setters() {
        let config = Config::default()
            .with_verbose_output(true)
            .with_dispatcher_file("tree.json")
            .with_conflict_resolution(ConflictResolution::Replace)
            .with_reveal_permission_errors(true);
        assert!(config.verbose_output);
        assert_eq!(config.dispatcher_file, Some(PathBuf::from("tree.json")));
        assert_eq!(config.conflict_resolution, ConflictResolution::Replace);
        assert!(config.reveal_permission_errors);
    }
}
