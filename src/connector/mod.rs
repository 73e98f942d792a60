// svnop-rs: Subversion operation engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Protocol client boundary.
//!
//! ```text
//!            Connector (async verbs, BoxFuture)
//!   checkout copy move_to remove mkdir import commit
//!   lock unlock log annotate get/set_property set_revision_property
//!        |                         |
//!        | CommandOptions          | NotificationHub
//!        | (capability bitmask)    |   subscribe() -> Subscription
//!        v                         |   (deregisters on drop)
//!   ConnectorError{code}           v
//!                              Notification{revision, path}
//! ```
//!
//! [`MemoryRepository`] is the in-process implementation used by the CLI
//! and the test suite.

mod memory;

pub use memory::{CallRecord, MemoryRepository};

use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use bitflags::bitflags;
use futures_util::future::BoxFuture;

use crate::error::ConnectorResult;

/// Revision value meaning "no revision was produced".
pub const INVALID_REVISION: i64 = -1;

bitflags! {
    /// Capability and behaviour flags passed with a command.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CommandOptions: u32 {
        /// Override locks or local modifications.
        const FORCE = 0x01;
        /// Keep locks on committed paths.
        const KEEP_LOCKS = 0x02;
        /// Skip externals definitions.
        const IGNORE_EXTERNALS = 0x04;
        /// Include revisions merged into the reported ones.
        const INCLUDE_MERGED_REVISIONS = 0x08;
        /// Annotate files regardless of their MIME type.
        const IGNORE_MIME_TYPE = 0x10;
        /// Stop history traversal at copy sources.
        const STOP_ON_COPY = 0x20;
        /// Create missing parent directories.
        const MAKE_PARENTS = 0x40;
        /// Treat the destination as the parent of the copied item.
        const INTERPRET_AS_CHILD = 0x80;
    }
}

impl CommandOptions {
    /// Renders the flags the way `svn` spells them, each with a leading space.
    #[must_use]
    pub fn as_command_line(self) -> String {
        let mut out = String::new();
        for (flag, arg) in [
            (Self::FORCE, "--force"),
            (Self::KEEP_LOCKS, "--no-unlock"),
            (Self::IGNORE_EXTERNALS, "--ignore-externals"),
            (Self::INCLUDE_MERGED_REVISIONS, "--use-merge-history"),
            (Self::IGNORE_MIME_TYPE, "--force-binary"),
            (Self::STOP_ON_COPY, "--stop-on-copy"),
            (Self::MAKE_PARENTS, "--parents"),
        ] {
            if self.contains(flag) {
                out.push(' ');
                out.push_str(arg);
            }
        }
        out
    }
}

/// Event delivered while a command executes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Revision the server assigned, or [`INVALID_REVISION`].
    pub revision: i64,
    /// Path the event refers to, if any.
    pub path: Option<String>,
}

impl Notification {
    /// Commit notification for `revision`.
    #[must_use]
    pub const fn committed(revision: i64) -> Self {
        Self {
            revision,
            path: None,
        }
    }
}

type Listener = Arc<dyn Fn(&Notification) + Send + Sync>;

#[derive(Default)]
struct HubInner {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(u64, Listener)>>,
}

/// Registration point for notification listeners.
#[derive(Clone, Default)]
pub struct NotificationHub {
    inner: Arc<HubInner>,
}

impl NotificationHub {
    /// Creates an empty hub.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` until the returned [`Subscription`] is dropped.
    #[must_use = "dropping the subscription deregisters the listener"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(listener)));
        Subscription {
            hub: Arc::downgrade(&self.inner),
            id,
        }
    }

    /// Delivers `notification` to every registered listener.
    pub fn notify(&self, notification: &Notification) {
        let listeners: Vec<Listener> = self
            .inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in listeners {
            listener(notification);
        }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl fmt::Debug for NotificationHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationHub")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Scoped listener registration.
#[derive(Debug)]
pub struct Subscription {
    hub: Weak<HubInner>,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|(id, _)| *id != self.id);
        }
    }
}

/// One `log` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub revision: i64,
    pub author: String,
    pub message: String,
    pub changed_paths: Vec<String>,
    /// Revisions merged by this one; only filled with
    /// [`CommandOptions::INCLUDE_MERGED_REVISIONS`].
    pub merged_revisions: Vec<i64>,
}

/// One `annotate` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationLine {
    pub revision: i64,
    pub author: String,
    pub text: String,
}

/// Asynchronous protocol client.
///
/// Mutating verbs report the revision they create to the `notify` hub
/// handed in with the call, so a caller only hears about its own
/// command. The same notification also reaches the repository-wide
/// [`Connector::notifications`] hub, which observes every caller.
pub trait Connector: Send + Sync {
    /// Repository root URL; recorded as the location of new revisions.
    fn location(&self) -> &str;

    /// Repository-wide notification hub; sees the revisions of every caller.
    fn notifications(&self) -> &NotificationHub;

    /// Checks out `url` at `revision` (`None` for HEAD) into `destination`.
    /// Returns the revision checked out.
    fn checkout<'a>(
        &'a self,
        url: &'a str,
        revision: Option<i64>,
        destination: &'a Path,
        options: CommandOptions,
    ) -> BoxFuture<'a, ConnectorResult<i64>>;

    /// Server-side copy of `sources` to `destination`.
    fn copy<'a>(
        &'a self,
        sources: &'a [String],
        destination: &'a str,
        message: &'a str,
        options: CommandOptions,
        notify: &'a NotificationHub,
    ) -> BoxFuture<'a, ConnectorResult<()>>;

    /// Server-side move of `sources` to `destination`.
    fn move_to<'a>(
        &'a self,
        sources: &'a [String],
        destination: &'a str,
        message: &'a str,
        options: CommandOptions,
        notify: &'a NotificationHub,
    ) -> BoxFuture<'a, ConnectorResult<()>>;

    /// Deletes `paths` from the repository.
    fn remove<'a>(
        &'a self,
        paths: &'a [String],
        message: &'a str,
        options: CommandOptions,
        notify: &'a NotificationHub,
    ) -> BoxFuture<'a, ConnectorResult<()>>;

    /// Creates directories.
    fn mkdir<'a>(
        &'a self,
        paths: &'a [String],
        message: &'a str,
        options: CommandOptions,
        notify: &'a NotificationHub,
    ) -> BoxFuture<'a, ConnectorResult<()>>;

    /// Imports the local tree at `source` as `url`.
    fn import<'a>(
        &'a self,
        source: &'a Path,
        url: &'a str,
        message: &'a str,
        options: CommandOptions,
        notify: &'a NotificationHub,
    ) -> BoxFuture<'a, ConnectorResult<()>>;

    /// Commits local modifications under `paths`.
    fn commit<'a>(
        &'a self,
        paths: &'a [String],
        message: &'a str,
        options: CommandOptions,
        notify: &'a NotificationHub,
    ) -> BoxFuture<'a, ConnectorResult<()>>;

    /// Locks `paths`.
    fn lock<'a>(
        &'a self,
        paths: &'a [String],
        comment: &'a str,
        options: CommandOptions,
    ) -> BoxFuture<'a, ConnectorResult<()>>;

    /// Releases locks on `paths`.
    fn unlock<'a>(
        &'a self,
        paths: &'a [String],
        options: CommandOptions,
    ) -> BoxFuture<'a, ConnectorResult<()>>;

    /// History of `url`, newest first, at most `limit` entries (0 = all).
    fn log<'a>(
        &'a self,
        url: &'a str,
        limit: usize,
        options: CommandOptions,
    ) -> BoxFuture<'a, ConnectorResult<Vec<LogEntry>>>;

    /// Line-by-line blame of `url`.
    fn annotate<'a>(
        &'a self,
        url: &'a str,
        options: CommandOptions,
    ) -> BoxFuture<'a, ConnectorResult<Vec<AnnotationLine>>>;

    /// Reads a versioned property.
    fn get_property<'a>(
        &'a self,
        url: &'a str,
        name: &'a str,
    ) -> BoxFuture<'a, ConnectorResult<Option<String>>>;

    /// Sets a versioned property; creates a revision.
    fn set_property<'a>(
        &'a self,
        url: &'a str,
        name: &'a str,
        value: &'a str,
        message: &'a str,
        options: CommandOptions,
        notify: &'a NotificationHub,
    ) -> BoxFuture<'a, ConnectorResult<()>>;

    /// Sets an unversioned property on `revision`.
    fn set_revision_property<'a>(
        &'a self,
        location: &'a str,
        revision: i64,
        name: &'a str,
        value: &'a str,
    ) -> BoxFuture<'a, ConnectorResult<()>>;
}

#[cfg(test)]
mod tests;
