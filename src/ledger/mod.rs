// svnop-rs: Subversion operation engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Revisions created during a run.
//!
//! ```text
//!   mutating operation                      dependent operation
//!   ------------------                      -------------------
//!   let hub = NotificationHub::new()        provider.revisions()
//!   let _watch = ledger.watch(&hub, ..)          |
//!   connector.copy(.., &hub) --notify(rev)-->    |
//!        |               RevisionLedger  --------'
//!        |               (arrival order)
//!   _watch dropped: listener removed on every exit path
//! ```
//!
//! A mutating operation owns an `Arc<RevisionLedger>` and hands it to
//! its dependents as a [`RevisionProvider`] (revision numbers) or a
//! [`ResourceProvider`] (the paths those revisions touched).

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::connector::{INVALID_REVISION, Notification, NotificationHub, Subscription};
use crate::console::{ConsoleLevel, ConsoleStream};

/// One server-assigned revision and what it affected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionPair {
    pub revision: i64,
    /// Paths supplied to the command that produced the revision.
    pub paths: Vec<String>,
    /// Repository the revision belongs to.
    pub location: String,
}

impl RevisionPair {
    pub fn new(revision: i64, paths: Vec<String>, location: impl Into<String>) -> Self {
        Self {
            revision,
            paths,
            location: location.into(),
        }
    }
}

impl fmt::Display for RevisionPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{} {} [{}]", self.revision, self.location, self.paths.join(", "))
    }
}

/// Read side of a ledger, consumed by dependent operations.
pub trait RevisionProvider: Send + Sync {
    /// Revisions created so far, in notification order.
    fn revisions(&self) -> Vec<RevisionPair>;
}

/// Lazily resolved list of resources.
pub trait ResourceProvider: Send + Sync {
    /// Resources available now.
    fn resources(&self) -> Vec<String>;
}

/// Append-only record of revisions created by one operation.
#[derive(Debug, Default)]
pub struct RevisionLedger {
    entries: Mutex<Vec<RevisionPair>>,
}

impl RevisionLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<RevisionPair>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `pair` unless its revision is the invalid sentinel.
    ///
    /// Returns whether the pair was kept.
    pub fn record(&self, pair: RevisionPair) -> bool {
        if pair.revision <= INVALID_REVISION {
            tracing::debug!(location = %pair.location, "no revision created");
            return false;
        }
        tracing::debug!(revision = pair.revision, location = %pair.location, "revision recorded");
        self.lock().push(pair);
        true
    }

    /// Forgets every entry. Called when the owning operation starts a run.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of recorded revisions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Records every revision announced on `hub` until the returned
    /// [`Subscription`] is dropped, echoing each on `console`.
    #[must_use = "the ledger stops recording when the subscription is dropped"]
    pub fn watch(
        self: &Arc<Self>,
        hub: &NotificationHub,
        paths: Vec<String>,
        location: impl Into<String>,
        console: Arc<dyn ConsoleStream>,
    ) -> Subscription {
        let ledger = Arc::clone(self);
        let location = location.into();
        hub.subscribe(move |notification: &Notification| {
            let pair = RevisionPair::new(notification.revision, paths.clone(), location.clone());
            if ledger.record(pair) {
                console.write(
                    ConsoleLevel::Ok,
                    &format!("Committed revision {}.", notification.revision),
                );
            }
        })
    }
}

impl RevisionProvider for RevisionLedger {
    fn revisions(&self) -> Vec<RevisionPair> {
        self.lock().clone()
    }
}

/// Every path touched by the recorded revisions, first occurrence first.
impl ResourceProvider for RevisionLedger {
    fn resources(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for pair in self.lock().iter() {
            for path in &pair.paths {
                if !out.contains(path) {
                    out.push(path.clone());
                }
            }
        }
        out
    }
}
