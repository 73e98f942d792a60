// svnop-rs: Subversion operation engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Lock and unlock, one protected step per path.

use std::sync::Arc;

use futures_util::future::BoxFuture;

use super::ResourceSet;
use crate::connector::{CommandOptions, Connector};
use crate::console::CommandLine;
use crate::error::Result;
use crate::operation::{ActionOperation, OperationContext, StepReporter};
use crate::scheduling::LockingDomain;

/// Runs `command` for each path in its own protected step.
///
/// A failing path is recorded and the rest are still processed; the loop
/// only stops on cancellation or a fatal error.
async fn per_path<'a, F>(
    ctx: &OperationContext,
    steps: &mut StepReporter,
    name: &str,
    paths: &'a [String],
    command: F,
) where
    F: Fn(&'a [String]) -> BoxFuture<'a, crate::error::ConnectorResult<()>>,
{
    let progress = ctx.progress();
    progress.begin_task(name, paths.len() as u64);
    for path in paths {
        let outcome = steps
            .protect(progress, 1, |_| {
                let request = command(std::slice::from_ref(path));
                async move {
                    request.await?;
                    Ok(())
                }
            })
            .await;
        if outcome.should_stop() {
            break;
        }
    }
}

/// Locks files in the repository.
pub struct LockOperation {
    paths: ResourceSet,
    comment: String,
    options: CommandOptions,
    connector: Arc<dyn Connector>,
}

impl LockOperation {
    pub fn new(
        connector: Arc<dyn Connector>,
        paths: impl Into<ResourceSet>,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            paths: paths.into(),
            comment: comment.into(),
            options: CommandOptions::empty(),
            connector,
        }
    }

    /// `FORCE` steals existing locks.
    #[must_use]
    pub const fn with_options(mut self, options: CommandOptions) -> Self {
        self.options = options;
        self
    }
}

impl ActionOperation for LockOperation {
    fn name(&self) -> &str {
        "Lock"
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
            let paths = self.paths.require(self.name(), "paths")?;
            CommandLine::new("lock")
                .paths(&paths)
                .message(&self.comment)
                .flags(self.options)
                .emit(ctx.console());

            per_path(ctx, steps, self.name(), &paths, |path| {
                self.connector.lock(path, &self.comment, self.options)
            })
            .await;
            Ok(())
        })
    }
}

/// Releases repository locks.
pub struct UnlockOperation {
    paths: ResourceSet,
    options: CommandOptions,
    connector: Arc<dyn Connector>,
}

impl UnlockOperation {
    pub fn new(connector: Arc<dyn Connector>, paths: impl Into<ResourceSet>) -> Self {
        Self {
            paths: paths.into(),
            options: CommandOptions::empty(),
            connector,
        }
    }

    /// `FORCE` breaks locks owned by others.
    #[must_use]
    pub const fn with_options(mut self, options: CommandOptions) -> Self {
        self.options = options;
        self
    }
}

impl ActionOperation for UnlockOperation {
    fn name(&self) -> &str {
        "Unlock"
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
            let paths = self.paths.require(self.name(), "paths")?;
            CommandLine::new("unlock")
                .paths(&paths)
                .flags(self.options)
                .emit(ctx.console());

            per_path(ctx, steps, self.name(), &paths, |path| {
                self.connector.unlock(path, self.options)
            })
            .await;
            Ok(())
        })
    }
}
