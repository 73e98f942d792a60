// svnop-rs: Subversion operation engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Author stamping on freshly created revisions.

use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::connector::Connector;
use crate::console::CommandLine;
use crate::error::Result;
use crate::ledger::RevisionProvider;
use crate::operation::{ActionOperation, OperationContext, StepReporter};

const AUTHOR_PROPERTY: &str = "svn:author";

/// Sets `svn:author` on every revision a prerequisite created.
///
/// Revisions are read from the provider when the run starts, so the
/// operation must be wired after the one that fills the provider.
pub struct SetRevisionAuthorOperation {
    provider: Arc<dyn RevisionProvider>,
    author: String,
    connector: Arc<dyn Connector>,
}

impl SetRevisionAuthorOperation {
    pub fn new(
        connector: Arc<dyn Connector>,
        provider: Arc<dyn RevisionProvider>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            author: author.into(),
            connector,
        }
    }
}

impl ActionOperation for SetRevisionAuthorOperation {
    fn name(&self) -> &str {
        "Set Revision Author"
    }

    fn run_impl<'a>(
        &'a self,
        ctx: &'a OperationContext,
        steps: &'a mut StepReporter,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let revisions = self.provider.revisions();
            if revisions.is_empty() {
                tracing::debug!("no revisions to stamp");
                return Ok(());
            }

            let progress = ctx.progress();
            progress.begin_task(self.name(), revisions.len() as u64);
            for pair in &revisions {
                CommandLine::new("propset")
                    .arg(AUTHOR_PROPERTY)
                    .path(&self.author)
                    .arg("--revprop")
                    .revision(pair.revision)
                    .path(&pair.location)
                    .emit(ctx.console());

                let outcome = steps
                    .protect(progress, 1, |_| async move {
                        self.connector
                            .set_revision_property(
                                &pair.location,
                                pair.revision,
                                AUTHOR_PROPERTY,
                                &self.author,
                            )
                            .await?;
                        tracing::debug!(revision = pair.revision, author = %self.author, "author stamped");
                        Ok(())
                    })
                    .await;
                if outcome.should_stop() {
                    break;
                }
            }
            Ok(())
        })
    }
}
