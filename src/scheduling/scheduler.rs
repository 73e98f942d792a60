// svnop-rs: Subversion operation engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Operation scheduler.
//!
//! ```text
//! submit(op) --> ticket queued (FIFO) --> tokio task
//!                                           |
//!                 DomainGate: wait until no running domain overlaps
//!                 (and, with fifo, no earlier queued domain overlaps)
//!                                           |
//!                 Semaphore: wait for a worker slot
//!                                           |
//!                 op.run(ctx) --> Status --> SubmittedOperation::wait()
//!                                           |
//!                 TicketGuard drop: release domain, wake waiters
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{Notify, Semaphore};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::LockingDomain;
use crate::console::{ConsoleStream, TracingConsole};
use crate::operation::{ActionOperation, OperationContext};
use crate::progress::{NullSink, ProgressMonitor, ProgressSink};
use crate::status::Status;

/// Upper bound on the default number of workers.
const DEFAULT_MAX_WORKERS: usize = 8;

#[derive(Debug, Default)]
struct GateState {
    next_ticket: u64,
    waiting: VecDeque<(u64, LockingDomain)>,
    running: Vec<(u64, LockingDomain)>,
}

impl GateState {
    fn can_start(&self, ticket: u64, fifo: bool) -> bool {
        let Some(position) = self.waiting.iter().position(|(t, _)| *t == ticket) else {
            return false;
        };
        let domain = &self.waiting[position].1;
        let blocked_by_running = self.running.iter().any(|(_, d)| d.overlaps(domain));
        let blocked_by_queue = fifo
            && self
                .waiting
                .iter()
                .take(position)
                .any(|(_, d)| d.overlaps(domain));
        !blocked_by_running && !blocked_by_queue
    }

    fn promote(&mut self, ticket: u64) {
        if let Some(position) = self.waiting.iter().position(|(t, _)| *t == ticket)
            && let Some(entry) = self.waiting.remove(position)
        {
            self.running.push(entry);
        }
    }

    fn release(&mut self, ticket: u64) {
        self.waiting.retain(|(t, _)| *t != ticket);
        self.running.retain(|(t, _)| *t != ticket);
    }
}

#[derive(Debug)]
struct DomainGate {
    state: Mutex<GateState>,
    changed: Notify,
    fifo: bool,
}

impl DomainGate {
    fn new(fifo: bool) -> Self {
        Self {
            state: Mutex::new(GateState::default()),
            changed: Notify::new(),
            fifo,
        }
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn enqueue(self: &Arc<Self>, domain: LockingDomain) -> TicketGuard {
        let mut state = self.lock();
        let ticket = state.next_ticket;
        state.next_ticket += 1;
        state.waiting.push_back((ticket, domain));
        TicketGuard {
            gate: Arc::clone(self),
            ticket,
        }
    }

    /// Waits until `ticket` may run. Returns `false` if cancelled first.
    async fn admit(&self, ticket: u64, cancel: &CancellationToken) -> bool {
        loop {
            if cancel.is_cancelled() {
                return false;
            }
            let notified = self.changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            {
                let mut state = self.lock();
                if state.can_start(ticket, self.fifo) {
                    state.promote(ticket);
                    return true;
                }
            }
            tokio::select! {
                () = &mut notified => {}
                () = cancel.cancelled() => return false,
            }
        }
    }

    fn running(&self) -> usize {
        self.lock().running.len()
    }
}

/// Queue entry; releases its domain and wakes waiters when dropped.
struct TicketGuard {
    gate: Arc<DomainGate>,
    ticket: u64,
}

impl Drop for TicketGuard {
    fn drop(&mut self) {
        self.gate.lock().release(self.ticket);
        self.gate.changed.notify_waiters();
    }
}

/// Handle to an operation submitted to an [`OperationScheduler`].
#[derive(Debug)]
pub struct SubmittedOperation {
    name: String,
    handle: JoinHandle<Status>,
    cancel: CancellationToken,
}

impl SubmittedOperation {
    /// Name of the submitted operation.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Requests cancellation of this operation only.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Waits for the final status.
    pub async fn wait(self) -> Status {
        match self.handle.await {
            Ok(status) => status,
            Err(err) => Status::error(
                format!("{} did not complete", self.name),
                Some(anyhow::Error::new(err)),
            ),
        }
    }
}

/// Runs submitted operations on background workers, never letting two
/// operations with overlapping locking domains run at the same time.
pub struct OperationScheduler {
    gate: Arc<DomainGate>,
    workers: Arc<Semaphore>,
    max_workers: usize,
    sink: Arc<dyn ProgressSink>,
    console: Arc<dyn ConsoleStream>,
    cancel_token: CancellationToken,
}

/// Number of CPU cores, capped at 8.
#[must_use]
pub fn default_max_workers() -> usize {
    std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(4)
        .min(DEFAULT_MAX_WORKERS)
}

impl OperationScheduler {
    /// Creates a scheduler sized to the machine.
    ///
    /// The default worker count is the number of CPU cores, capped at 8.
    #[must_use]
    pub fn new() -> Self {
        Self::with_concurrency(default_max_workers())
    }

    /// Creates a scheduler with a specific worker count (at least one).
    #[must_use]
    pub fn with_concurrency(max_workers: usize) -> Self {
        let max_workers = max_workers.max(1);
        Self {
            gate: Arc::new(DomainGate::new(true)),
            workers: Arc::new(Semaphore::new(max_workers)),
            max_workers,
            sink: Arc::new(NullSink),
            console: Arc::new(TracingConsole),
            cancel_token: CancellationToken::new(),
        }
    }

    /// Disables queue fairness: a later operation may start before an
    /// earlier, still blocked one when their domains do not collide.
    #[must_use]
    pub fn with_fifo(mut self, fifo: bool) -> Self {
        self.gate = Arc::new(DomainGate::new(fifo));
        self
    }

    /// Sets the progress sink handed to every run.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Sets the console stream handed to every run.
    #[must_use]
    pub fn with_console(mut self, console: Arc<dyn ConsoleStream>) -> Self {
        self.console = console;
        self
    }

    /// Maximum number of operations running at once.
    #[must_use]
    pub const fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Number of operations currently holding their domain.
    #[must_use]
    pub fn running(&self) -> usize {
        self.gate.running()
    }

    /// Returns the scheduler-wide cancellation token.
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Cancels every submitted operation.
    pub fn interrupt_all(&self) {
        tracing::info!("Interrupting all operations");
        self.cancel_token.cancel();
    }

    /// Queues `operation` and starts it as soon as its domain is free.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&self, operation: Arc<dyn ActionOperation>) -> SubmittedOperation {
        let name = operation.name().to_string();
        let domain = operation.locking_domain();
        tracing::debug!(operation = %name, %domain, "submitting operation");

        let ticket = self.gate.enqueue(domain);
        let cancel = self.cancel_token.child_token();
        let token = cancel.clone();
        let gate = Arc::clone(&self.gate);
        let workers = Arc::clone(&self.workers);
        let sink = Arc::clone(&self.sink);
        let console = Arc::clone(&self.console);

        let handle = tokio::spawn(async move {
            let name = operation.name().to_string();
            if !gate.admit(ticket.ticket, &token).await {
                return Status::cancelled(format!("{name} cancelled before start"));
            }
            let Ok(_permit) = workers.acquire_owned().await else {
                return Status::cancelled(format!("{name} cancelled before start"));
            };

            tracing::info!(operation = %name, "operation started");
            let progress = ProgressMonitor::new(sink, token);
            progress.begin_task(&name, operation.weight());
            let ctx = OperationContext::new(progress.clone(), console);
            let status = operation.run(&ctx).await;
            progress.done();
            tracing::info!(operation = %name, severity = %status.severity(), "operation finished");

            drop(ticket);
            status
        });

        SubmittedOperation {
            name,
            handle,
            cancel,
        }
    }
}

impl Default for OperationScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for OperationScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationScheduler")
            .field("max_workers", &self.max_workers)
            .field("running", &self.running())
            .field("cancelled", &self.cancel_token.is_cancelled())
            .finish_non_exhaustive()
    }
}
