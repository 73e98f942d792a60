// svnop-rs: Subversion operation engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Operation outcomes.
//!
//! ```text
//!   Status (tree)
//!     severity = max(children)       Ok < Warning < Cancelled < Error
//!     message, cause
//!     children ----> Status ...
//! ```
//!
//! A leaf [`Status`] describes one step; an aggregate built with
//! [`StatusAggregate`] keeps one entry per contribution and reports the
//! worst child severity. Errors rank above cancellation so that a real
//! failure is never hidden behind a cancelled sibling.

use std::fmt;
use std::sync::Arc;

/// Severity of an operation outcome, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Severity {
    /// Completed successfully.
    #[default]
    Ok,
    /// Completed with a non-blocking problem.
    Warning,
    /// Stopped because cancellation was requested. Not a failure.
    Cancelled,
    /// Failed.
    Error,
}

impl Severity {
    /// Returns the upper-case label used in reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Warning => "WARNING",
            Self::Cancelled => "CANCELLED",
            Self::Error => "ERROR",
        }
    }

    /// Returns whether dependents of an operation with this severity may run.
    #[must_use]
    pub const fn allows_dependents(self) -> bool {
        matches!(self, Self::Ok | Self::Warning)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of an operation or of one of its steps.
#[derive(Debug, Clone, Default)]
pub struct Status {
    severity: Severity,
    message: String,
    cause: Option<Arc<anyhow::Error>>,
    children: Vec<Self>,
}

impl Status {
    /// Successful outcome.
    pub fn ok(message: impl Into<String>) -> Self {
        Self::leaf(Severity::Ok, message, None)
    }

    /// Non-blocking problem.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::leaf(Severity::Warning, message, None)
    }

    /// Failure, optionally carrying the underlying error.
    pub fn error(message: impl Into<String>, cause: Option<anyhow::Error>) -> Self {
        Self::leaf(Severity::Error, message, cause.map(Arc::new))
    }

    /// Cancellation.
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::leaf(Severity::Cancelled, message, None)
    }

    fn leaf(severity: Severity, message: impl Into<String>, cause: Option<Arc<anyhow::Error>>) -> Self {
        Self {
            severity,
            message: message.into(),
            cause,
            children: Vec::new(),
        }
    }

    /// Returns the severity.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.severity
    }

    /// Returns the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the underlying error, if any.
    #[must_use]
    pub fn cause(&self) -> Option<&anyhow::Error> {
        self.cause.as_deref()
    }

    /// Returns the child statuses of an aggregate.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        &self.children
    }

    /// Returns `true` for [`Severity::Ok`].
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.severity == Severity::Ok
    }

    /// Returns `true` for [`Severity::Cancelled`].
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.severity == Severity::Cancelled
    }

    /// Returns `true` if this status or any descendant is a cancellation.
    #[must_use]
    pub fn contains_cancellation(&self) -> bool {
        self.is_cancelled() || self.children.iter().any(Self::contains_cancellation)
    }

    /// Collects every non-OK leaf, depth first.
    ///
    /// This is the multi-entry report shown to the user instead of one
    /// message per failing child.
    #[must_use]
    pub fn problems(&self) -> Vec<&Self> {
        let mut out = Vec::new();
        self.collect_problems(&mut out);
        out
    }

    fn collect_problems<'a>(&'a self, out: &mut Vec<&'a Self>) {
        if self.children.is_empty() {
            if !self.is_ok() {
                out.push(self);
            }
            return;
        }
        for child in &self.children {
            child.collect_problems(out);
        }
    }

    /// Renders the status tree as indented `SEVERITY: message` lines.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out, 0);
        out
    }

    fn render_into(&self, out: &mut String, depth: usize) {
        use std::fmt::Write;
        let _ = writeln!(out, "{:indent$}{self}", "", indent = depth * 2);
        for child in &self.children {
            child.render_into(out, depth + 1);
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)?;
        if let Some(cause) = &self.cause {
            write!(f, " ({cause:#})")?;
        }
        Ok(())
    }
}

/// Append-only builder for an aggregate [`Status`].
#[derive(Debug, Default)]
pub struct StatusAggregate {
    message: String,
    children: Vec<Status>,
}

impl StatusAggregate {
    /// Creates an empty aggregate.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            children: Vec::new(),
        }
    }

    /// Appends a contribution.
    pub fn push(&mut self, status: Status) {
        self.children.push(status);
    }

    /// Returns the worst severity contributed so far.
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.children
            .iter()
            .map(Status::severity)
            .max()
            .unwrap_or_default()
    }

    /// Returns `true` if any contribution is (or contains) a cancellation.
    #[must_use]
    pub fn has_cancellation(&self) -> bool {
        self.children.iter().any(Status::contains_cancellation)
    }

    /// Returns the number of contributions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Returns `true` if nothing was contributed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Freezes the aggregate.
    #[must_use]
    pub fn finish(self) -> Status {
        Status {
            severity: self.severity(),
            message: self.message,
            cause: None,
            children: self.children,
        }
    }
}
