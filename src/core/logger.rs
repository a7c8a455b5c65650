// src/core/logger.rs

use crate::core::config::Config;

/// Gates user-facing log output on the manager's configuration.
///
/// `info` needs `verbose_output`, `normal` and `warning` are muted by `silent_logs`,
/// `error` always goes through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Logger {
    verbose: bool,
    silent: bool,
}

impl Logger {
    /// A gate with explicit flags.
    pub fn new(verbose: bool, silent: bool) -> Self {
        Self { verbose, silent }
    }

    /// Reads `verbose_output` and `silent_logs`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.verbose_output, config.silent_logs)
    }

    /// Whether `info` messages are emitted.
    pub fn info_enabled(&self) -> bool {
        self.verbose && !self.silent
    }

    /// Whether `normal` and `warning` messages are emitted.
    pub fn normal_enabled(&self) -> bool {
        !self.silent
    }

    /// Detail for verbose runs.
    pub fn info(&self, message: &str) {
        if self.info_enabled() {
            log::info!("{}", message);
        }
    }

    /// Lifecycle milestones.
    pub fn normal(&self, message: &str) {
        if self.normal_enabled() {
            log::info!("{}", message);
        }
    }

    /// Recoverable misuse.
    pub fn warning(&self, message: &str) {
        if self.normal_enabled() {
            log::warn!("{}", message);
        }
    }

    /// Failures. Never muted.
    pub fn error(&self, message: &str) {
        log::error!("{}", message);
    }
}
