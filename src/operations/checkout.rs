// svnop-rs: Subversion operation engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Checkout into a workspace project.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use futures_util::future::BoxFuture;

use crate::connector::{CommandOptions, Connector};
use crate::console::{CommandLine, ConsoleLevel};
use crate::error::{OperationError, Result};
use crate::operation::{ActionOperation, OperationContext, StepReporter};
use crate::scheduling::{LockingDomain, Workspace, WorkspaceProject};

/// Relative weight of a checkout; it dominates most other operations.
pub const CHECKOUT_WEIGHT: u64 = 19;

/// Checks `url` out as a workspace project named `project` under
/// `location`.
///
/// Any project whose content lives at or below the destination has its
/// files deleted and is then removed from the workspace. If some content
/// cannot be deleted the operation stops with a "locked externally"
/// error before contacting the server, and that project stays
/// registered.
pub struct CheckoutAsOperation {
    project: String,
    url: String,
    revision: Option<i64>,
    destination: PathBuf,
    options: CommandOptions,
    overlapping: Vec<WorkspaceProject>,
    domain: LockingDomain,
    connector: Arc<dyn Connector>,
    workspace: Arc<dyn Workspace>,
}

impl CheckoutAsOperation {
    /// Resolves overlapping projects and the locking domain immediately.
    pub fn new(
        connector: Arc<dyn Connector>,
        workspace: Arc<dyn Workspace>,
        project: impl Into<String>,
        url: impl Into<String>,
        location: impl AsRef<Path>,
    ) -> Self {
        let project = project.into();
        let destination = location.as_ref().join(&project);
        let overlapping: Vec<WorkspaceProject> = workspace
            .projects()
            .into_iter()
            .filter(|p| p.location.starts_with(&destination))
            .collect();
        let target = destination.to_string_lossy().into_owned();
        let domain = LockingDomain::for_targets(&[target], workspace.as_ref());
        Self {
            project,
            url: url.into(),
            revision: None,
            destination,
            options: CommandOptions::empty(),
            overlapping,
            domain,
            connector,
            workspace,
        }
    }

    /// Checks out `revision` instead of HEAD.
    #[must_use]
    pub const fn with_revision(mut self, revision: i64) -> Self {
        self.revision = Some(revision);
        self
    }

    /// `IGNORE_EXTERNALS` skips externals definitions.
    #[must_use]
    pub const fn with_options(mut self, options: CommandOptions) -> Self {
        self.options = options;
        self
    }

    /// Where the project will live.
    #[must_use]
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Projects that will be replaced.
    #[must_use]
    pub fn overlapping(&self) -> &[WorkspaceProject] {
        &self.overlapping
    }

    async fn prepare(&self, ctx: &OperationContext) -> Result<()> {
        for project in &self.overlapping {
            if ctx.is_cancelled() {
                return Err(OperationError::Cancelled(self.name().to_string()).into());
            }
            tracing::info!(project = %project.name, "removing overlapping project");
            clear_location(&project.location).await?;
            self.workspace.unregister(&project.name);
        }
        clear_location(&self.destination).await
    }
}

/// Deletes `path`. Content that survives deletion is fatal.
async fn clear_location(path: &Path) -> Result<()> {
    let metadata = match tokio::fs::symlink_metadata(path).await {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to inspect {}", path.display()));
        }
    };
    let removed = if metadata.is_dir() {
        tokio::fs::remove_dir_all(path).await
    } else {
        tokio::fs::remove_file(path).await
    };
    let Err(err) = removed else {
        return Ok(());
    };

    tracing::warn!(path = %path.display(), error = %err, "could not clear location");
    if let Some(survivor) = first_survivor(path).await {
        return Err(OperationError::LockedExternally {
            path: survivor.display().to_string(),
        }
        .into());
    }
    match tokio::fs::symlink_metadata(path).await {
        Err(gone) if gone.kind() == io::ErrorKind::NotFound => Ok(()),
        _ => Err(err).with_context(|| format!("failed to remove {}", path.display())),
    }
}

/// First entry still present at or below `path`, if any.
async fn first_survivor(path: &Path) -> Option<PathBuf> {
    let metadata = tokio::fs::symlink_metadata(path).await.ok()?;
    if !metadata.is_dir() {
        return Some(path.to_path_buf());
    }
    let mut entries = tokio::fs::read_dir(path).await.ok()?;
    entries.next_entry().await.ok().flatten().map(|e| e.path())
}

impl ActionOperation for CheckoutAsOperation {
    fn name(&self) -> &str {
        "Check Out As"
    }

    fn weight(&self) -> u64 {
        CHECKOUT_WEIGHT
    }

    fn locking_domain(&self) -> LockingDomain {
        self.domain.clone()
    }

    fn run_impl<'a>(
        &'a self,
        ctx: &'a OperationContext,
        steps: &'a mut StepReporter,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let progress = ctx.progress();
            progress.begin_task(self.name(), CHECKOUT_WEIGHT + 1);

            progress.subtask("Prepare file system");
            let prepared = steps
                .protect(progress, 1, |_| self.prepare(ctx))
                .await;
            if !prepared.is_completed() {
                return Ok(());
            }

            let peg = self
                .revision
                .map_or_else(|| "HEAD".to_string(), |r| r.to_string());
            CommandLine::new("checkout")
                .path(format!("{}@{peg}", self.url))
                .arg(&format!("-r {peg}"))
                .path(self.destination.to_string_lossy())
                .flags(self.options)
                .emit(ctx.console());

            steps
                .protect(progress, CHECKOUT_WEIGHT, |_| async move {
                    let revision = self
                        .connector
                        .checkout(&self.url, self.revision, &self.destination, self.options)
                        .await?;
                    self.workspace.register(WorkspaceProject::new(
                        self.project.clone(),
                        self.destination.clone(),
                    ));
                    ctx.console().write(
                        ConsoleLevel::Ok,
                        &format!("Checked out revision {revision}."),
                    );
                    tracing::info!(project = %self.project, revision, "checked out");
                    Ok(())
                })
                .await;
            Ok(())
        })
    }
}
