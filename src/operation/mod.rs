// svnop-rs: Subversion operation engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Action operations.
//!
//! # Architecture
//!
//! ```text
//! ActionOperation::run(ctx)            (provided)
//!      |  console.mark_start
//!      |  cancelled? -> CANCELLED
//!      v
//! ActionOperation::run_impl(ctx, steps) (implemented per operation)
//!      |
//!      +-- steps.protect(progress, units, |sub| step)   x N
//!      |      Ok       -> Completed
//!      |      Err      -> ERROR recorded, continue
//!      |      fatal    -> ERROR recorded, operation stops
//!      |      cancel   -> CANCELLED recorded, operation stops
//!      v
//! StepReporter::finish -> Status (aggregate of recorded steps)
//! ```
//!
//! # Key Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`ActionOperation`] | Named, weighted, cancellable unit of work |
//! | [`OperationContext`] | Progress handle, console and run scope for one run |
//! | [`StepReporter`] | Protected step executor and status collector |
//! | [`FeatureRetry`] | One-shot capability downgrade on unsupported-feature errors |
//! | [`RunScope`] | Request-scoped typed store owned by the top-level run |
//!
//! Operations take `&self`; anything they produce during a run (revision
//! ledgers, fetched log entries) lives behind interior mutability and is
//! reset when the run starts.

mod retry;
mod scope;
mod step;

pub use retry::FeatureRetry;
pub use scope::RunScope;
pub use step::{StepOutcome, StepReporter};

use std::fmt;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use tracing::Instrument;

use crate::console::{ConsoleStream, NullConsole};
use crate::error::{OperationError, Result};
use crate::progress::ProgressMonitor;
use crate::scheduling::LockingDomain;
use crate::status::Status;

/// Weight of an operation that does not declare one.
pub const DEFAULT_WEIGHT: u64 = 1;

/// A single named unit of cancellable, weighted work.
///
/// Implementors provide [`run_impl`](Self::run_impl); the provided
/// [`run`](Self::run) wraps it with console markers, cancellation checks
/// and error capture, and never fails.
///
/// # Example
///
/// ```ignore
/// impl ActionOperation for Touch {
///     fn name(&self) -> &str { "Touch" }
///     fn run_impl<'a>(
///         &'a self,
///         ctx: &'a OperationContext,
///         steps: &'a mut StepReporter,
///     ) -> BoxFuture<'a, Result<()>> {
///         Box::pin(async move {
///             steps.protect(ctx.progress(), 1, |_| async { Ok(()) }).await;
///             Ok(())
///         })
///     }
/// }
/// ```
pub trait ActionOperation: Send + Sync {
    /// Returns the operation name.
    fn name(&self) -> &str;

    /// Relative share of the parent's progress.
    fn weight(&self) -> u64 {
        DEFAULT_WEIGHT
    }

    /// Resources this operation needs exclusive access to.
    fn locking_domain(&self) -> LockingDomain {
        LockingDomain::none()
    }

    /// Operation body. Errors returned here are recorded like step errors.
    fn run_impl<'a>(
        &'a self,
        ctx: &'a OperationContext,
        steps: &'a mut StepReporter,
    ) -> BoxFuture<'a, Result<()>>;

    /// Runs the operation and returns its final status.
    fn run<'a>(&'a self, ctx: &'a OperationContext) -> BoxFuture<'a, Status> {
        let span = tracing::info_span!("operation", operation = %self.name(), weight = self.weight());
        Box::pin(
            async move {
                let name = self.name();
                ctx.console().mark_start(name);
                let mut steps = StepReporter::new(name, ctx);
                let result = if ctx.is_cancelled() {
                    Err(OperationError::Cancelled(name.to_string()).into())
                } else {
                    self.run_impl(ctx, &mut steps).await
                };
                let status = steps.finish(result);
                ctx.console().mark_end(name);
                tracing::debug!(severity = %status.severity(), "operation finished");
                status
            }
            .instrument(span),
        )
    }
}

/// Execution context handed to an operation run.
#[derive(Clone)]
pub struct OperationContext {
    progress: ProgressMonitor,
    console: Arc<dyn ConsoleStream>,
    scope: RunScope,
}

impl OperationContext {
    /// Creates a context with a fresh [`RunScope`].
    #[must_use]
    pub fn new(progress: ProgressMonitor, console: Arc<dyn ConsoleStream>) -> Self {
        Self {
            progress,
            console,
            scope: RunScope::new(),
        }
    }

    /// Context with no sink, no console and its own cancellation token.
    #[must_use]
    pub fn detached() -> Self {
        Self::new(ProgressMonitor::detached(), Arc::new(NullConsole))
    }

    /// Gets the progress handle.
    #[must_use]
    pub const fn progress(&self) -> &ProgressMonitor {
        &self.progress
    }

    /// Gets the console stream.
    #[must_use]
    pub fn console(&self) -> &dyn ConsoleStream {
        self.console.as_ref()
    }

    /// Gets a shared handle to the console stream.
    #[must_use]
    pub fn console_handle(&self) -> Arc<dyn ConsoleStream> {
        Arc::clone(&self.console)
    }

    /// Gets the run scope.
    #[must_use]
    pub const fn scope(&self) -> &RunScope {
        &self.scope
    }

    /// Same console and scope, different progress range.
    #[must_use]
    pub fn with_progress(&self, progress: ProgressMonitor) -> Self {
        Self {
            progress,
            console: Arc::clone(&self.console),
            scope: self.scope.clone(),
        }
    }

    /// Checks if cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.progress.is_cancelled()
    }
}

impl fmt::Debug for OperationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationContext")
            .field("progress", &self.progress)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}
