// svnop-rs: Subversion operation engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Server-side copy, move, branch and tag.

use std::sync::Arc;

use futures_util::future::BoxFuture;

use super::{ResourceSet, recorded};
use crate::connector::{CommandOptions, Connector, NotificationHub};
use crate::console::CommandLine;
use crate::error::{ConnectorResult, Result};
use crate::ledger::RevisionLedger;
use crate::operation::{ActionOperation, OperationContext, StepReporter};
use crate::scheduling::LockingDomain;

/// Which repository-side transfer to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    Copy,
    Move,
    /// Copy into a branch location, creating missing parents.
    Branch,
    /// Copy into a tag location, creating missing parents.
    Tag,
}

impl TransferKind {
    /// Command verb echoed on the console.
    #[must_use]
    pub const fn verb(self) -> &'static str {
        match self {
            Self::Move => "move",
            Self::Copy | Self::Branch | Self::Tag => "copy",
        }
    }

    /// Default operation name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Copy => "Copy",
            Self::Move => "Move",
            Self::Branch => "Branch",
            Self::Tag => "Tag",
        }
    }

    /// Options every transfer of this kind carries.
    #[must_use]
    pub const fn base_options(self) -> CommandOptions {
        match self {
            Self::Copy | Self::Move => CommandOptions::empty(),
            Self::Branch | Self::Tag => CommandOptions::MAKE_PARENTS,
        }
    }

    /// Sends the command for this kind.
    fn issue<'a>(
        self,
        connector: &'a dyn Connector,
        sources: &'a [String],
        destination: &'a str,
        message: &'a str,
        options: CommandOptions,
        notify: &'a NotificationHub,
    ) -> BoxFuture<'a, ConnectorResult<()>> {
        match self {
            Self::Move => connector.move_to(sources, destination, message, options, notify),
            Self::Copy | Self::Branch | Self::Tag => {
                connector.copy(sources, destination, message, options, notify)
            }
        }
    }
}

/// Copies or moves repository resources to a destination URL.
///
/// New revisions are recorded against the destination.
pub struct RepositoryTransferOperation {
    name: String,
    kind: TransferKind,
    sources: ResourceSet,
    destination: String,
    message: String,
    options: CommandOptions,
    connector: Arc<dyn Connector>,
    ledger: Arc<RevisionLedger>,
}

impl RepositoryTransferOperation {
    pub fn new(
        kind: TransferKind,
        connector: Arc<dyn Connector>,
        sources: impl Into<ResourceSet>,
        destination: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: kind.label().to_string(),
            kind,
            sources: sources.into(),
            destination: destination.into(),
            message: message.into(),
            options: kind.base_options(),
            connector,
            ledger: Arc::new(RevisionLedger::new()),
        }
    }

    /// Adds command options on top of the kind's defaults.
    #[must_use]
    pub fn with_options(mut self, options: CommandOptions) -> Self {
        self.options |= options;
        self
    }

    /// Overrides the operation name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub const fn kind(&self) -> TransferKind {
        self.kind
    }

    /// Revisions created by the last run.
    #[must_use]
    pub fn ledger(&self) -> Arc<RevisionLedger> {
        Arc::clone(&self.ledger)
    }
}

impl ActionOperation for RepositoryTransferOperation {
    fn name(&self) -> &str {
        &self.name
    }

    /// Moves also claim their sources.
    fn locking_domain(&self) -> LockingDomain {
        let destination = LockingDomain::paths([&self.destination]);
        match self.kind {
            TransferKind::Move => destination.merge(&self.sources.locking_domain()),
            _ => destination,
        }
    }

    fn run_impl<'a>(
        &'a self,
        ctx: &'a OperationContext,
        steps: &'a mut StepReporter,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.ledger.clear();
            let sources = self.sources.require(&self.name, "sources")?;

            CommandLine::new(self.kind.verb())
                .paths(&sources)
                .path(&self.destination)
                .message(&self.message)
                .flags(self.options)
                .emit(ctx.console());

            steps
                .protect(ctx.progress(), 1, |_| {
                    recorded(
                        ctx,
                        self.connector.as_ref(),
                        &self.ledger,
                        vec![self.destination.clone()],
                        |hub| async move {
                            self.kind
                                .issue(
                                    self.connector.as_ref(),
                                    &sources,
                                    &self.destination,
                                    &self.message,
                                    self.options,
                                    &hub,
                                )
                                .await
                        },
                    )
                })
                .await;
            Ok(())
        })
    }
}
