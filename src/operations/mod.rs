// svnop-rs: Subversion operation engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Concrete Subversion operations.
//!
//! # Operation Catalogue
//!
//! | Operation | Command | Ledger | Retry flag |
//! |-----------|---------|--------|------------|
//! | [`CheckoutAsOperation`] | `checkout` | - | - |
//! | [`RepositoryTransferOperation`] | `copy` / `move` | yes | - |
//! | [`DeleteRemoteOperation`] | `delete` | yes | - |
//! | [`CreateFolderOperation`] | `mkdir` | yes | - |
//! | [`CommitOperation`] | `commit` | yes | - |
//! | [`ImportOperation`] | `import` | yes | - |
//! | [`SetRevisionAuthorOperation`] | `propset --revprop` | reads | - |
//! | [`LockOperation`] / [`UnlockOperation`] | `lock` / `unlock` | - | - |
//! | [`GetLogMessagesOperation`] | `log` | - | `INCLUDE_MERGED_REVISIONS` |
//! | [`AnnotateOperation`] | `annotate` | - | `IGNORE_MIME_TYPE` |
//!
//! Every command is echoed on the console as a `svn ...` line before it is
//! sent. Mutating commands hand the connector a notification hub of their
//! own for the duration of the call and record each new revision it
//! reports in their ledger.

mod annotate;
mod checkout;
mod lock;
mod log;
mod mutate;
mod revprop;
mod transfer;

pub use annotate::AnnotateOperation;
pub use checkout::{CHECKOUT_WEIGHT, CheckoutAsOperation};
pub use lock::{LockOperation, UnlockOperation};
pub use log::{GetLogMessagesOperation, LogCache};
pub use mutate::{CommitOperation, CreateFolderOperation, DeleteRemoteOperation, ImportOperation};
pub use revprop::SetRevisionAuthorOperation;
pub use transfer::{RepositoryTransferOperation, TransferKind};

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::connector::{Connector, NotificationHub};
use crate::error::{ConnectorResult, OperationError, Result};
use crate::ledger::{ResourceProvider, RevisionLedger};
use crate::operation::OperationContext;
use crate::scheduling::LockingDomain;

/// Resources an operation works on: fixed at construction, or resolved
/// from another operation when the run starts.
#[derive(Clone)]
pub enum ResourceSet {
    Fixed(Vec<String>),
    Provided(Arc<dyn ResourceProvider>),
}

impl ResourceSet {
    /// Current list of resources.
    #[must_use]
    pub fn resolve(&self) -> Vec<String> {
        match self {
            Self::Fixed(paths) => paths.clone(),
            Self::Provided(provider) => provider.resources(),
        }
    }

    /// Domain over the fixed paths. Provided sets are unknown until the
    /// run starts and claim the whole workspace.
    #[must_use]
    pub fn locking_domain(&self) -> LockingDomain {
        match self {
            Self::Fixed(paths) => LockingDomain::paths(paths),
            Self::Provided(_) => LockingDomain::workspace(),
        }
    }

    /// Resolves the set, failing when it is empty.
    pub(crate) fn require(&self, operation: &str, what: &'static str) -> Result<Vec<String>> {
        let paths = self.resolve();
        if paths.is_empty() {
            return Err(OperationError::MissingInput {
                operation: operation.to_string(),
                what: what.to_string(),
            }
            .into());
        }
        Ok(paths)
    }
}

impl<S: Into<String>> FromIterator<S> for ResourceSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::Fixed(iter.into_iter().map(Into::into).collect())
    }
}

impl From<Vec<String>> for ResourceSet {
    fn from(paths: Vec<String>) -> Self {
        Self::Fixed(paths)
    }
}

impl From<Arc<dyn ResourceProvider>> for ResourceSet {
    fn from(provider: Arc<dyn ResourceProvider>) -> Self {
        Self::Provided(provider)
    }
}

impl fmt::Debug for ResourceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(paths) => f.debug_tuple("Fixed").field(paths).finish(),
            Self::Provided(_) => f.write_str("Provided"),
        }
    }
}

/// Issues a mutating command while `ledger` records the revisions it
/// announces for `paths`.
///
/// The command gets a hub of its own, so revisions created concurrently
/// by other operations on the same connector never reach this ledger.
async fn recorded<F, Fut>(
    ctx: &OperationContext,
    connector: &dyn Connector,
    ledger: &Arc<RevisionLedger>,
    paths: Vec<String>,
    command: F,
) -> Result<()>
where
    F: FnOnce(NotificationHub) -> Fut,
    Fut: Future<Output = ConnectorResult<()>>,
{
    let hub = NotificationHub::new();
    let _watch = ledger.watch(&hub, paths, connector.location(), ctx.console_handle());
    command(hub.clone()).await?;
    Ok(())
}

#[cfg(test)]
mod tests;
