// svnop-rs: Subversion operation engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Cancellable, weighted progress reporting.
//!
//! ```text
//! ProgressMonitor (root, total = T) ----> ProgressSink
//!    |                                     Null | Counting | Bar
//!    +-- subrange(A1) total = t1
//!    |      worked(u) => parent += floor((c+u)*A1/t1) - floor(c*A1/t1)
//!    +-- subrange(A2)
//!           done()/drop => parent += A2 - reported
//! ```
//!
//! Every sub-range forwards exactly its allocation to its parent once it
//! is finished, whatever happened inside, so the root sink always sees
//! the declared total. Cancellation is a shared [`CancellationToken`].

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;

/// Receiver of progress events emitted by the root monitor.
pub trait ProgressSink: Send + Sync {
    /// Root task started with `total` units.
    fn begin(&self, name: &str, total: u64);

    /// A nested step started.
    fn subtask(&self, name: &str);

    /// `units` of work completed.
    fn worked(&self, units: u64);

    /// Root monitor finished.
    fn finish(&self) {}
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn begin(&self, _name: &str, _total: u64) {}
    fn subtask(&self, _name: &str) {}
    fn worked(&self, _units: u64) {}
}

/// Sink that records totals; used to verify progress conservation.
#[derive(Debug, Default)]
pub struct CountingSink {
    worked: AtomicU64,
    begun: Mutex<Vec<(String, u64)>>,
    subtasks: Mutex<Vec<String>>,
}

impl CountingSink {
    /// Creates an empty counting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of all `worked` calls.
    #[must_use]
    pub fn total_worked(&self) -> u64 {
        self.worked.load(Ordering::SeqCst)
    }

    /// `(name, total)` of every `begin` call.
    #[must_use]
    pub fn begun(&self) -> Vec<(String, u64)> {
        self.begun
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Names of every subtask announced.
    #[must_use]
    pub fn subtasks(&self) -> Vec<String> {
        self.subtasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ProgressSink for CountingSink {
    fn begin(&self, name: &str, total: u64) {
        self.begun
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((name.to_string(), total));
    }

    fn subtask(&self, name: &str) {
        self.subtasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(name.to_string());
    }

    fn worked(&self, units: u64) {
        self.worked.fetch_add(units, Ordering::SeqCst);
    }
}

/// Pre-validated progress bar style.
fn bar_style() -> ProgressStyle {
    static STYLE: OnceLock<ProgressStyle> = OnceLock::new();
    STYLE
        .get_or_init(|| {
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-")
        })
        .clone()
}

/// Terminal progress bar backed by `indicatif`.
pub struct BarSink {
    bar: ProgressBar,
}

impl BarSink {
    /// Creates a hidden bar that becomes visible on `begin`.
    #[must_use]
    pub fn new() -> Self {
        let bar = ProgressBar::hidden();
        bar.set_style(bar_style());
        Self { bar }
    }
}

impl Default for BarSink {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BarSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BarSink")
            .field("position", &self.bar.position())
            .finish()
    }
}

impl ProgressSink for BarSink {
    fn begin(&self, name: &str, total: u64) {
        self.bar.set_draw_target(indicatif::ProgressDrawTarget::stderr());
        self.bar.set_length(total);
        self.bar.set_message(name.to_string());
    }

    fn subtask(&self, name: &str) {
        self.bar.set_message(name.to_string());
    }

    fn worked(&self, units: u64) {
        self.bar.inc(units);
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

#[derive(Debug, Default)]
struct RangeState {
    total: u64,
    consumed: u64,
    reported: u64,
    begun: bool,
    finished: bool,
}

struct Range {
    sink: Arc<dyn ProgressSink>,
    parent: Option<Arc<Self>>,
    allocation: u64,
    state: Mutex<RangeState>,
}

impl Range {
    fn lock(&self) -> std::sync::MutexGuard<'_, RangeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Accepts `units` of local work and forwards the scaled delta upwards.
    fn advance(&self, units: u64) {
        let delta = {
            let mut state = self.lock();
            if state.finished || units == 0 {
                return;
            }
            match self.parent {
                None => {
                    let room = if state.total == 0 {
                        units
                    } else {
                        state.total.saturating_sub(state.consumed).min(units)
                    };
                    state.consumed += room;
                    room
                }
                Some(_) => {
                    state.consumed = state.consumed.saturating_add(units).min(state.total);
                    let scaled = scale(state.consumed, self.allocation, state.total);
                    let delta = scaled.saturating_sub(state.reported);
                    state.reported += delta;
                    delta
                }
            }
        };
        self.forward(delta);
    }

    fn forward(&self, delta: u64) {
        if delta == 0 {
            return;
        }
        match &self.parent {
            Some(parent) => parent.advance(delta),
            None => self.sink.worked(delta),
        }
    }

    /// Flushes whatever part of the allocation was not reported yet.
    fn finish(&self) {
        let remaining = {
            let mut state = self.lock();
            if state.finished {
                return;
            }
            state.finished = true;
            match self.parent {
                Some(_) => {
                    let rest = self.allocation.saturating_sub(state.reported);
                    state.reported = self.allocation;
                    rest
                }
                None => {
                    let rest = state.total.saturating_sub(state.consumed);
                    state.consumed = state.total;
                    rest
                }
            }
        };
        self.forward(remaining);
        if self.parent.is_none() {
            self.sink.finish();
        }
    }
}

impl Drop for Range {
    fn drop(&mut self) {
        if self.parent.is_some() {
            self.finish();
        }
    }
}

/// `floor(consumed * allocation / total)` without overflow.
fn scale(consumed: u64, allocation: u64, total: u64) -> u64 {
    if total == 0 {
        return allocation;
    }
    let value = u128::from(consumed) * u128::from(allocation) / u128::from(total);
    u64::try_from(value).unwrap_or(u64::MAX)
}

/// Cancellable handle over a weighted progress range.
///
/// Clones share the same range. Sub-ranges share the cancellation token.
#[derive(Clone)]
pub struct ProgressMonitor {
    range: Arc<Range>,
    cancel: CancellationToken,
}

impl ProgressMonitor {
    /// Creates a root monitor reporting to `sink`.
    #[must_use]
    pub fn new(sink: Arc<dyn ProgressSink>, cancel: CancellationToken) -> Self {
        Self {
            range: Arc::new(Range {
                sink,
                parent: None,
                allocation: 0,
                state: Mutex::new(RangeState::default()),
            }),
            cancel,
        }
    }

    /// Creates a root monitor that reports nowhere.
    #[must_use]
    pub fn detached() -> Self {
        Self::new(Arc::new(NullSink), CancellationToken::new())
    }

    /// Declares the number of local units this range will be split into.
    ///
    /// Only the first call on a range takes effect.
    pub fn begin_task(&self, name: &str, total: u64) {
        {
            let mut state = self.range.lock();
            if state.begun {
                drop(state);
                self.subtask(name);
                return;
            }
            state.begun = true;
            if state.consumed == 0 {
                state.total = total;
            }
        }
        if self.range.parent.is_none() {
            self.range.sink.begin(name, total);
        } else {
            self.subtask(name);
        }
    }

    /// Announces a nested step by name.
    pub fn subtask(&self, name: &str) {
        self.range.sink.subtask(name);
    }

    /// Reports `units` of local work.
    pub fn worked(&self, units: u64) {
        self.range.advance(units);
    }

    /// Creates a child range worth `weight` units of this range.
    ///
    /// Until the child calls [`begin_task`](Self::begin_task) its own
    /// total equals `weight`.
    #[must_use]
    pub fn subrange(&self, weight: u64) -> Self {
        Self {
            range: Arc::new(Range {
                sink: Arc::clone(&self.range.sink),
                parent: Some(Arc::clone(&self.range)),
                allocation: weight,
                state: Mutex::new(RangeState {
                    total: weight,
                    ..RangeState::default()
                }),
            }),
            cancel: self.cancel.clone(),
        }
    }

    /// Finishes this range, flushing any unreported allocation.
    pub fn done(&self) {
        self.range.finish();
    }

    /// Returns whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Requests cancellation for every holder of this token.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns the shared cancellation token.
    #[must_use]
    pub const fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Local total declared for this range.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.range.lock().total
    }
}

impl fmt::Debug for ProgressMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.range.lock();
        f.debug_struct("ProgressMonitor")
            .field("total", &state.total)
            .field("consumed", &state.consumed)
            .field("finished", &state.finished)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}
