// svnop-rs: Subversion operation engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration management for svnop-rs.
//!
//! # Configuration Hierarchy
//!
//! ```text
//! Priority (low → high)
//! 1. defaults
//! 2. svnop.toml next to the executable (optional)
//! 3. svnop.toml in the working directory (optional)
//! 4. --ini FILE (repeatable, required)
//! 5. SVNOP_* env vars
//! 6. CLI overrides
//! ```
//!
//! # Environment Variable Mapping
//!
//! Sections and keys are separated by a double underscore:
//!
//! ```text
//! SVNOP_SCHEDULER__MAX_WORKERS=2        → scheduler.max_workers = 2
//! SVNOP_RETRY__UNSUPPORTED_FEATURE=false → retry.unsupported_feature = false
//! SVNOP_GLOBAL__LOG_FILE=/tmp/s.log     → global.log_file = "/tmp/s.log"
//! ```

pub mod loader;
pub mod types;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{ConfigError, Result};

use loader::ConfigLoader;
use types::{ConsoleConfig, GlobalConfig, RetryConfig, SchedulerConfig, SortConfig};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "svnop.toml";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "SVNOP";

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Global options.
    pub global: GlobalConfig,
    /// Background scheduler.
    pub scheduler: SchedulerConfig,
    /// Unsupported-feature retry.
    pub retry: RetryConfig,
    /// Console output.
    pub console: ConsoleConfig,
    /// Natural ordering.
    pub sort: SortConfig,
}

impl Config {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use svnop_rs::config::Config;
    ///
    /// let config = Config::builder()
    ///     .add_toml_file("svnop.toml")
    ///     .with_env_prefix("SVNOP")
    ///     .build()?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    #[must_use]
    pub fn builder() -> ConfigLoader {
        ConfigLoader::new()
    }

    /// Load configuration from a single TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, contains invalid TOML, or
    /// does not match the `Config` structure.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::builder().add_toml_file(path).build()
    }

    /// Load configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not valid TOML or does not match the
    /// `Config` structure.
    pub fn parse(content: &str) -> Result<Self> {
        Self::builder().add_toml_str(content).build()
    }

    /// Checks value ranges serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when `scheduler.max_workers`
    /// is zero.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.scheduler.max_workers == 0 {
            return Err(ConfigError::InvalidValue {
                section: "scheduler".to_string(),
                key: "max_workers".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Format configuration options for display.
    ///
    /// One `key = value` line per option, sorted by key, with keys padded
    /// to the same width.
    #[must_use]
    pub fn format_options(&self) -> Vec<String> {
        let mut options = BTreeMap::new();
        self.format_global_options(&mut options);
        self.format_scheduler_options(&mut options);
        options.insert(
            "retry.unsupported_feature".into(),
            self.retry.unsupported_feature.to_string(),
        );
        options.insert("console.enabled".into(), self.console.enabled.to_string());
        options.insert(
            "console.show_progress_bar".into(),
            self.console.show_progress_bar.to_string(),
        );
        options.insert(
            "sort.case_insensitive".into(),
            self.sort.case_insensitive.to_string(),
        );

        let max_key_len = options.keys().map(String::len).max().unwrap_or(0);

        options
            .into_iter()
            .map(|(key, value)| format!("{key:<max_key_len$} = {value}"))
            .collect()
    }

    fn format_global_options(&self, options: &mut BTreeMap<String, String>) {
        options.insert(
            "global.output_log_level".into(),
            self.global.output_log_level.as_u8().to_string(),
        );
        options.insert(
            "global.file_log_level".into(),
            self.global.file_log_level.as_u8().to_string(),
        );
        options.insert(
            "global.log_file".into(),
            self.global.log_file.display().to_string(),
        );
        options.insert("global.log_json".into(), self.global.log_json.to_string());
    }

    fn format_scheduler_options(&self, options: &mut BTreeMap<String, String>) {
        options.insert(
            "scheduler.max_workers".into(),
            self.scheduler.max_workers.to_string(),
        );
        options.insert("scheduler.fifo".into(), self.scheduler.fifo.to_string());
    }
}
