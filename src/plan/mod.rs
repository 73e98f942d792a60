// svnop-rs: Subversion operation engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Workflow plans.
//!
//! A plan is a TOML document describing a repository and a list of
//! operations wired into a [`CompositeOperation`](crate::composite::CompositeOperation).
//!
//! ```toml
//! name = "release"
//!
//! [repository]
//! url = "https://svn.example.com/repo"
//! seed = ["/trunk/README", "/branches/", "/tags/"]
//!
//! [[operation]]
//! id = "branch"
//! kind = "branch"
//! paths = ["/trunk"]
//! destination = "/branches/1.0"
//! message = "Branch 1.0"
//!
//! [[operation]]
//! id = "stamp"
//! kind = "set-author"
//! revisions_from = "branch"
//! author = "release-bot"
//! ```
//!
//! # Operation Fields
//!
//! | Field | Used by | Meaning |
//! |-------|---------|---------|
//! | `id` | all | Unique name, shown in status and console |
//! | `kind` | all | See [`OperationKind`] |
//! | `paths` | most | Fixed targets or sources |
//! | `paths_from` | path kinds | Use the paths another operation created |
//! | `destination` | transfers, import | Target URL |
//! | `message` | mutating kinds | Log message or lock comment |
//! | `author` | `set-author` | New `svn:author` value |
//! | `revisions_from` | `set-author` | Operation whose revisions are stamped |
//! | `after` | all | Extra prerequisites |
//! | `weight` | all | Progress weight override, at least 1 |
//! | `force` | lock, unlock, delete | Adds `--force` |
//! | `content` | `commit` | Staged into every path before the run |
//! | `retry` | log, annotate | Overrides the configured retry opt-in |
//! | `limit` | log | Maximum entries per URL |
//! | `source` | import | Local file or directory |
//!
//! `paths_from` and `revisions_from` imply a dependency on the referenced
//! operation, which must appear earlier in the file.

mod build;

pub use build::{BuiltPlan, PlannedOperation};

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::error::{PlanError, Result};

/// Operation kinds a plan can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Mkdir,
    Copy,
    Move,
    Branch,
    Tag,
    Delete,
    Commit,
    Import,
    Lock,
    Unlock,
    Log,
    Annotate,
    SetAuthor,
}

impl OperationKind {
    /// Every kind, in documentation order.
    pub const ALL: [Self; 13] = [
        Self::Mkdir,
        Self::Copy,
        Self::Move,
        Self::Branch,
        Self::Tag,
        Self::Delete,
        Self::Commit,
        Self::Import,
        Self::Lock,
        Self::Unlock,
        Self::Log,
        Self::Annotate,
        Self::SetAuthor,
    ];

    /// Spelling used in plan files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mkdir => "mkdir",
            Self::Copy => "copy",
            Self::Move => "move",
            Self::Branch => "branch",
            Self::Tag => "tag",
            Self::Delete => "delete",
            Self::Commit => "commit",
            Self::Import => "import",
            Self::Lock => "lock",
            Self::Unlock => "unlock",
            Self::Log => "log",
            Self::Annotate => "annotate",
            Self::SetAuthor => "set-author",
        }
    }

    /// Looks a kind up by its plan spelling.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    /// Whether operations of this kind record the revisions they create.
    #[must_use]
    pub const fn has_ledger(self) -> bool {
        matches!(
            self,
            Self::Mkdir
                | Self::Copy
                | Self::Move
                | Self::Branch
                | Self::Tag
                | Self::Delete
                | Self::Commit
                | Self::Import
        )
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `[repository]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct RepositorySpec {
    pub url: String,
    /// Paths present at revision 0; a trailing `/` marks a directory.
    #[serde(default)]
    pub seed: Vec<String>,
    /// Author recorded on new revisions.
    #[serde(default)]
    pub author: Option<String>,
}

/// One `[[operation]]` entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OperationSpec {
    pub id: String,
    pub kind: String,
    #[serde(default)]
    pub paths: Vec<String>,
    #[serde(default)]
    pub paths_from: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub revisions_from: Option<String>,
    #[serde(default)]
    pub after: Vec<String>,
    #[serde(default)]
    pub weight: Option<u64>,
    #[serde(default)]
    pub force: bool,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub retry: Option<bool>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub source: Option<PathBuf>,
}

impl OperationSpec {
    /// Parsed kind.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::UnknownKind`] for unrecognised kinds.
    pub fn kind(&self) -> std::result::Result<OperationKind, PlanError> {
        OperationKind::parse(&self.kind).ok_or_else(|| PlanError::UnknownKind {
            id: self.id.clone(),
            kind: self.kind.clone(),
        })
    }

    /// Every operation id this entry depends on, without duplicates.
    #[must_use]
    pub fn references(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        let implied = self.paths_from.iter().chain(self.revisions_from.iter());
        for reference in self.after.iter().chain(implied) {
            if !out.contains(&reference.as_str()) {
                out.push(reference);
            }
        }
        out
    }
}

/// A parsed plan file.
#[derive(Debug, Clone, Deserialize)]
pub struct Plan {
    #[serde(default = "default_name")]
    pub name: String,
    pub repository: RepositorySpec,
    #[serde(default, rename = "operation")]
    pub operations: Vec<OperationSpec>,
}

fn default_name() -> String {
    "plan".to_string()
}

impl Plan {
    /// Loads a plan file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, is not valid TOML, or does
    /// not match the plan layout.
    pub fn from_path(path: &Path) -> Result<Self> {
        use config::{File, FileFormat};
        let plan = config::Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml).required(true))
            .build()
            .and_then(|cfg| cfg.try_deserialize::<Self>())
            .with_context(|| format!("failed to load plan '{}'", path.display()))?;
        tracing::debug!(path = %path.display(), "plan loaded");
        Ok(plan)
    }

    /// Parses a plan from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML or does not match
    /// the plan layout.
    pub fn from_toml(text: &str) -> Result<Self> {
        use config::{File, FileFormat};
        let plan = config::Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()
            .and_then(|cfg| cfg.try_deserialize::<Self>())
            .context("failed to parse plan")?;
        Ok(plan)
    }
}
