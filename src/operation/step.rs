// svnop-rs: Subversion operation engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Protected step execution.

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::OperationContext;
use crate::console::{ConsoleLevel, ConsoleStream};
use crate::error::{OperationError, Result, is_cancellation, is_fatal};
use crate::progress::ProgressMonitor;
use crate::status::{Severity, Status, StatusAggregate};

/// What happened to a protected step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Step succeeded.
    Completed,
    /// Step failed; later steps may still run.
    Failed,
    /// Step failed in a way that ends the operation.
    Fatal,
    /// Cancellation was observed.
    Cancelled,
}

impl StepOutcome {
    /// Whether the operation must not run further steps.
    #[must_use]
    pub const fn should_stop(self) -> bool {
        matches!(self, Self::Fatal | Self::Cancelled)
    }

    /// Whether the step succeeded.
    #[must_use]
    pub const fn is_completed(self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Collects step outcomes of one operation run into a [`Status`].
pub struct StepReporter {
    operation: String,
    console: Arc<dyn ConsoleStream>,
    cancel: CancellationToken,
    aggregate: StatusAggregate,
}

impl StepReporter {
    /// Creates a reporter for `operation` running in `ctx`.
    #[must_use]
    pub fn new(operation: &str, ctx: &OperationContext) -> Self {
        Self {
            operation: operation.to_string(),
            console: ctx.console_handle(),
            cancel: ctx.progress().cancel_token().clone(),
            aggregate: StatusAggregate::new(operation),
        }
    }

    /// Name of the operation being reported.
    #[must_use]
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Worst severity recorded so far.
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.aggregate.severity()
    }

    /// Runs `step` in a sub-range worth `units` of `progress`.
    ///
    /// Errors are recorded, never propagated. The sub-range is finished
    /// whatever the outcome, so progress stays conserved.
    pub async fn protect<F, Fut>(
        &mut self,
        progress: &ProgressMonitor,
        units: u64,
        step: F,
    ) -> StepOutcome
    where
        F: FnOnce(ProgressMonitor) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let sub = progress.subrange(units);
        let outcome = if sub.is_cancelled() {
            self.report_error(OperationError::Cancelled(self.operation.clone()).into())
        } else {
            match step(sub.clone()).await {
                Ok(()) => StepOutcome::Completed,
                Err(err) => self.report_error(err),
            }
        };
        sub.done();
        outcome
    }

    /// Records a failure, classifying it as cancellation, fatal or plain.
    pub fn report_error(&mut self, err: anyhow::Error) -> StepOutcome {
        if is_cancellation(&err) {
            self.report_cancelled();
            return StepOutcome::Cancelled;
        }

        let fatal = is_fatal(&err);
        tracing::warn!(
            operation = %self.operation,
            error = %format!("{err:#}"),
            fatal,
            "step failed"
        );
        self.console
            .write(ConsoleLevel::Error, &format!("{}: {err:#}", self.operation));
        self.aggregate
            .push(Status::error(format!("{}: {err}", self.operation), Some(err)));

        if fatal {
            StepOutcome::Fatal
        } else {
            StepOutcome::Failed
        }
    }

    /// Records a non-blocking problem.
    pub fn report_warning(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(operation = %self.operation, "{message}");
        self.console.write(ConsoleLevel::Warning, &message);
        self.aggregate.push(Status::warning(message));
    }

    /// Records a status produced elsewhere, such as a child operation.
    ///
    /// OK statuses are kept so that aggregates list every contribution.
    pub fn record(&mut self, status: Status) {
        self.aggregate.push(status);
    }

    fn report_cancelled(&mut self) {
        if self.aggregate.has_cancellation() {
            return;
        }
        tracing::info!(operation = %self.operation, "cancelled");
        self.console.mark_cancelled(&self.operation);
        self.aggregate
            .push(Status::cancelled(format!("{} cancelled", self.operation)));
    }

    /// Folds the body result in and freezes the status.
    #[must_use]
    pub fn finish(mut self, result: Result<()>) -> Status {
        if let Err(err) = result {
            self.report_error(err);
        }
        if self.cancel.is_cancelled() {
            self.report_cancelled();
        }
        self.aggregate.finish()
    }
}
