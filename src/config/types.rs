// svnop-rs: Subversion operation engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration sections.
//!
//! ```text
//! Config: GlobalConfig, SchedulerConfig, RetryConfig, ConsoleConfig, SortConfig
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::logging::LogLevel;
use crate::scheduling::default_max_workers;

/// Global configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Log level for stdout output (0-6).
    pub output_log_level: LogLevel,
    /// Log level for file output (0-6).
    pub file_log_level: LogLevel,
    /// Path to log file.
    pub log_file: PathBuf,
    /// Write the log file as JSON lines instead of text.
    pub log_json: bool,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            output_log_level: LogLevel::INFO,
            file_log_level: LogLevel::TRACE,
            log_file: PathBuf::from("svnop.log"),
            log_json: false,
        }
    }
}

/// Background scheduler settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Operations allowed to run at once (at least 1).
    pub max_workers: usize,
    /// Start waiting operations in submission order.
    pub fifo: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            fifo: true,
        }
    }
}

/// Capability downgrade settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    /// Retry once without a flag the server reports as unsupported.
    pub unsupported_feature: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            unsupported_feature: true,
        }
    }
}

/// Console output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConsoleConfig {
    /// Print command echoes and results.
    pub enabled: bool,
    /// Draw a progress bar while a plan runs.
    pub show_progress_bar: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            show_progress_bar: false,
        }
    }
}

/// Name ordering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SortConfig {
    pub case_insensitive: bool,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            case_insensitive: true,
        }
    }
}
