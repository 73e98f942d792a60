// svnop-rs: Subversion operation engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Delete, mkdir, commit and import.

use std::path::PathBuf;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use super::{ResourceSet, recorded};
use crate::connector::{CommandOptions, Connector};
use crate::console::CommandLine;
use crate::error::Result;
use crate::ledger::RevisionLedger;
use crate::operation::{ActionOperation, OperationContext, StepReporter};
use crate::scheduling::LockingDomain;

/// Deletes resources directly in the repository.
pub struct DeleteRemoteOperation {
    paths: ResourceSet,
    message: String,
    options: CommandOptions,
    connector: Arc<dyn Connector>,
    ledger: Arc<RevisionLedger>,
}

impl DeleteRemoteOperation {
    pub fn new(
        connector: Arc<dyn Connector>,
        paths: impl Into<ResourceSet>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            paths: paths.into(),
            message: message.into(),
            options: CommandOptions::empty(),
            connector,
            ledger: Arc::new(RevisionLedger::new()),
        }
    }

    /// `FORCE` deletes even when something below is locked.
    #[must_use]
    pub const fn with_options(mut self, options: CommandOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn ledger(&self) -> Arc<RevisionLedger> {
        Arc::clone(&self.ledger)
    }
}

impl ActionOperation for DeleteRemoteOperation {
    fn name(&self) -> &str {
        "Delete"
    }

    fn locking_domain(&self) -> LockingDomain {
        self.paths.locking_domain()
    }

    fn run_impl<'a>(
        &'a self,
        ctx: &'a OperationContext,
        steps: &'a mut StepReporter,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.ledger.clear();
            let paths = self.paths.require(self.name(), "paths")?;
            CommandLine::new("delete")
                .paths(&paths)
                .message(&self.message)
                .flags(self.options)
                .emit(ctx.console());

            steps
                .protect(ctx.progress(), 1, |_| {
                    recorded(
                        ctx,
                        self.connector.as_ref(),
                        &self.ledger,
                        paths.clone(),
                        |hub| async move {
                            self.connector
                                .remove(&paths, &self.message, self.options, &hub)
                                .await
                        },
                    )
                })
                .await;
            Ok(())
        })
    }
}

/// Creates folders in the repository.
pub struct CreateFolderOperation {
    paths: ResourceSet,
    message: String,
    options: CommandOptions,
    connector: Arc<dyn Connector>,
    ledger: Arc<RevisionLedger>,
}

impl CreateFolderOperation {
    /// Creates missing parents by default.
    pub fn new(
        connector: Arc<dyn Connector>,
        paths: impl Into<ResourceSet>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            paths: paths.into(),
            message: message.into(),
            options: CommandOptions::MAKE_PARENTS,
            connector,
            ledger: Arc::new(RevisionLedger::new()),
        }
    }

    #[must_use]
    pub const fn with_options(mut self, options: CommandOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn ledger(&self) -> Arc<RevisionLedger> {
        Arc::clone(&self.ledger)
    }
}

impl ActionOperation for CreateFolderOperation {
    fn name(&self) -> &str {
        "Create Folder"
    }

    fn locking_domain(&self) -> LockingDomain {
        self.paths.locking_domain()
    }

    fn run_impl<'a>(
        &'a self,
        ctx: &'a OperationContext,
        steps: &'a mut StepReporter,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.ledger.clear();
            let paths = self.paths.require(self.name(), "paths")?;
            CommandLine::new("mkdir")
                .paths(&paths)
                .message(&self.message)
                .flags(self.options)
                .emit(ctx.console());

            steps
                .protect(ctx.progress(), 1, |_| {
                    recorded(
                        ctx,
                        self.connector.as_ref(),
                        &self.ledger,
                        paths.clone(),
                        |hub| async move {
                            self.connector
                                .mkdir(&paths, &self.message, self.options, &hub)
                                .await
                        },
                    )
                })
                .await;
            Ok(())
        })
    }
}

/// Commits local modifications below the given paths.
///
/// A commit with nothing to send creates no revision and leaves the
/// ledger empty.
pub struct CommitOperation {
    paths: ResourceSet,
    message: String,
    options: CommandOptions,
    connector: Arc<dyn Connector>,
    ledger: Arc<RevisionLedger>,
}

impl CommitOperation {
    pub fn new(
        connector: Arc<dyn Connector>,
        paths: impl Into<ResourceSet>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            paths: paths.into(),
            message: message.into(),
            options: CommandOptions::empty(),
            connector,
            ledger: Arc::new(RevisionLedger::new()),
        }
    }

    /// `KEEP_LOCKS` keeps locks on committed paths.
    #[must_use]
    pub const fn with_options(mut self, options: CommandOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn ledger(&self) -> Arc<RevisionLedger> {
        Arc::clone(&self.ledger)
    }
}

impl ActionOperation for CommitOperation {
    fn name(&self) -> &str {
        "Commit"
    }

    fn locking_domain(&self) -> LockingDomain {
        self.paths.locking_domain()
    }

    fn run_impl<'a>(
        &'a self,
        ctx: &'a OperationContext,
        steps: &'a mut StepReporter,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.ledger.clear();
            let paths = self.paths.require(self.name(), "paths")?;
            CommandLine::new("commit")
                .paths(&paths)
                .flags(self.options)
                .message(&self.message)
                .emit(ctx.console());

            steps
                .protect(ctx.progress(), 1, |_| {
                    recorded(
                        ctx,
                        self.connector.as_ref(),
                        &self.ledger,
                        paths.clone(),
                        |hub| async move {
                            self.connector
                                .commit(&paths, &self.message, self.options, &hub)
                                .await
                        },
                    )
                })
                .await;
            Ok(())
        })
    }
}

/// Imports a local directory tree into the repository.
pub struct ImportOperation {
    source: PathBuf,
    url: String,
    message: String,
    options: CommandOptions,
    connector: Arc<dyn Connector>,
    ledger: Arc<RevisionLedger>,
}

impl ImportOperation {
    pub fn new(
        connector: Arc<dyn Connector>,
        source: impl Into<PathBuf>,
        url: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            url: url.into(),
            message: message.into(),
            options: CommandOptions::MAKE_PARENTS,
            connector,
            ledger: Arc::new(RevisionLedger::new()),
        }
    }

    #[must_use]
    pub const fn with_options(mut self, options: CommandOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn ledger(&self) -> Arc<RevisionLedger> {
        Arc::clone(&self.ledger)
    }
}

impl ActionOperation for ImportOperation {
    fn name(&self) -> &str {
        "Import"
    }

    fn locking_domain(&self) -> LockingDomain {
        LockingDomain::paths([&self.url])
    }

    fn run_impl<'a>(
        &'a self,
        ctx: &'a OperationContext,
        steps: &'a mut StepReporter,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.ledger.clear();
            CommandLine::new("import")
                .path(self.source.to_string_lossy())
                .path(&self.url)
                .message(&self.message)
                .flags(self.options)
                .emit(ctx.console());

            steps
                .protect(ctx.progress(), 1, |_| {
                    recorded(
                        ctx,
                        self.connector.as_ref(),
                        &self.ledger,
                        vec![self.url.clone()],
                        |hub| async move {
                            self.connector
                                .import(&self.source, &self.url, &self.message, self.options, &hub)
                                .await
                        },
                    )
                })
                .await;
            Ok(())
        })
    }
}
