// svnop-rs: Subversion operation engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration loading from multiple sources.
//!
//! # Loader Pipeline
//!
//! ```text
//! ConfigLoader::new()
//!   .add_toml_file_optional()
//!   .add_toml_file(req)
//!   .add_toml_str()
//!   .with_env_prefix()
//!   .set()
//!        |
//!        v
//!    build() --> Config (validated)
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;

use super::Config;
use crate::error::{ConfigError, Result};

/// Where a configuration layer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Required file.
    File,
    /// Optional file that existed when added.
    Optional,
    /// Inline TOML text.
    Inline,
}

impl SourceKind {
    /// Label used when listing sources.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Optional => "optional",
            Self::Inline => "string",
        }
    }
}

/// Builder for loading configuration from multiple sources.
pub struct ConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
    env_prefix: Option<String>,
    sources: Vec<(SourceKind, PathBuf)>,
}

impl ConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        Self {
            builder: config::Config::builder(),
            env_prefix: None,
            sources: Vec::new(),
        }
    }

    /// Adds a TOML configuration file to the loader.
    ///
    /// The file will be read when `build()` is called. If the file doesn't exist
    /// or contains invalid TOML, `build()` will return an error.
    #[must_use]
    pub fn add_toml_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        use config::{File, FileFormat};
        let p = path.as_ref();
        self.builder = self
            .builder
            .add_source(File::from(p).format(FileFormat::Toml).required(true));
        self.sources.push((SourceKind::File, p.to_path_buf()));
        self
    }

    /// Adds a TOML file that is skipped when absent.
    #[must_use]
    pub fn add_toml_file_optional<P: AsRef<Path>>(mut self, path: P) -> Self {
        use config::{File, FileFormat};
        let p = path.as_ref();
        self.builder = self
            .builder
            .add_source(File::from(p).format(FileFormat::Toml).required(false));
        if p.exists() {
            self.sources.push((SourceKind::Optional, p.to_path_buf()));
        }
        self
    }

    #[must_use]
    pub fn add_toml_str(mut self, content: &str) -> Self {
        use config::{File, FileFormat};
        self.builder = self
            .builder
            .add_source(File::from_str(content, FileFormat::Toml));
        self.sources
            .push((SourceKind::Inline, PathBuf::from("<string>")));
        self
    }

    /// Reads `<PREFIX>_<SECTION>__<KEY>` environment variables.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self
    }

    /// Sets a configuration override.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or if the value cannot be converted
    /// to a configuration value.
    pub fn set<T: Into<config::Value>>(mut self, key: &str, value: T) -> Result<Self> {
        self.builder = self
            .builder
            .set_override(key, value)
            .with_context(|| format!("invalid override for '{key}'"))?;
        Ok(self)
    }

    /// Builds the configuration from all added sources.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A required file cannot be read ([`ConfigError::ReadError`]).
    /// - A file or string has invalid TOML syntax ([`ConfigError::ParseError`]).
    /// - Environment variables cannot be parsed.
    /// - The merged configuration cannot be deserialized into the `Config` struct.
    /// - A value is out of range ([`ConfigError::InvalidValue`]).
    pub fn build(self) -> Result<Config> {
        for (kind, path) in &self.sources {
            if *kind == SourceKind::File {
                std::fs::metadata(path).map_err(|source| ConfigError::ReadError {
                    path: path.display().to_string(),
                    source,
                })?;
            }
        }

        let builder = match &self.env_prefix {
            Some(prefix) => self.builder.add_source(
                config::Environment::with_prefix(prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            ),
            None => self.builder,
        };
        let cfg = builder.build().map_err(typed_parse_error)?;
        let config: Config = cfg.try_deserialize()?;
        config.validate()?;
        tracing::debug!(sources = self.sources.len(), "configuration loaded");
        Ok(config)
    }

    /// Sources added so far, lowest priority first.
    #[must_use]
    pub fn loaded_sources(&self) -> Vec<(SourceKind, PathBuf)> {
        self.sources.clone()
    }

    #[must_use]
    pub fn format_loaded_sources(&self) -> Vec<String> {
        self.sources
            .iter()
            .enumerate()
            .map(|(i, (kind, path))| format!("{}. [{}] {}", i + 1, kind.label(), path.display()))
            .collect()
    }
}

/// Surfaces TOML syntax errors as [`ConfigError::ParseError`].
fn typed_parse_error(err: config::ConfigError) -> anyhow::Error {
    match err {
        config::ConfigError::FileParse { uri, cause } => ConfigError::ParseError {
            path: uri.unwrap_or_else(|| "<string>".to_string()),
            message: cause.to_string(),
        }
        .into(),
        other => other.into(),
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
