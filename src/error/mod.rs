// svnop-rs: Subversion operation engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Error handling module.
//!
//! ```text
//!   anyhow::Error (operations, plans, config loading)
//!        |  chain walked by is_cancellation / is_fatal
//!        v
//!   ConnectorError   code: ErrorCode (stable, drives retries)
//!   OperationError   Cancelled, LockedExternally, MissingInput
//!   GraphError       Cycle, UnknownOperation, SelfDependency
//!   ConfigError      ReadError, ParseError, InvalidValue
//!   PlanError        UnknownKind, UnknownReference, MissingField,
//!                    DuplicateId, InvalidWeight
//! ```
//!
//! Operations return `anyhow::Result` and attach context freely; the
//! classification helpers [`is_cancellation`] and [`is_fatal`] walk the
//! `anyhow` chain to find the typed error underneath.

use std::fmt;

use thiserror::Error;

/// Convenience alias for `anyhow::Result`.
pub type Result<T> = anyhow::Result<T>;

/// Result type returned by [`crate::connector::Connector`] verbs.
pub type ConnectorResult<T> = std::result::Result<T, ConnectorError>;

// --- Connector Errors ---

/// Stable error codes raised by the protocol client.
///
/// Retry decisions are made on the code alone, never on the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Server or client does not support a requested capability.
    UnsupportedFeature,
    /// Request was aborted by the caller.
    Cancelled,
    /// Conflicting change on the server file system.
    FsConflict,
    /// Path does not exist in the repository.
    PathNotFound,
    /// Path already exists in the repository.
    AlreadyExists,
    /// Path is locked by another owner.
    Locked,
    /// Path holds no lock.
    NotLocked,
    /// Local I/O failed.
    Io,
    /// Anything not covered above.
    Other,
}

impl ErrorCode {
    /// Returns the wire-style identifier of this code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UnsupportedFeature => "unsupported-feature",
            Self::Cancelled => "cancelled",
            Self::FsConflict => "fs-conflict",
            Self::PathNotFound => "path-not-found",
            Self::AlreadyExists => "already-exists",
            Self::Locked => "locked",
            Self::NotLocked => "not-locked",
            Self::Io => "io",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed failure raised by a protocol client verb.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{verb} failed [{code}]: {message}")]
pub struct ConnectorError {
    verb: &'static str,
    code: ErrorCode,
    message: String,
}

impl ConnectorError {
    /// Creates a new error for `verb` carrying `code`.
    pub fn new(verb: &'static str, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            verb,
            code,
            message: message.into(),
        }
    }

    /// Creates a cancellation error for `verb`.
    #[must_use]
    pub fn cancelled(verb: &'static str) -> Self {
        Self::new(verb, ErrorCode::Cancelled, "operation cancelled")
    }

    /// Returns the verb that failed.
    #[must_use]
    pub const fn verb(&self) -> &'static str {
        self.verb
    }

    /// Returns the stable error code.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    /// Returns the server message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

// --- Operation Errors ---

/// Operation-level errors.
#[derive(Debug, Error)]
pub enum OperationError {
    /// Operation observed cancellation.
    #[error("operation '{0}' was cancelled")]
    Cancelled(String),

    /// Local content could not be removed because something else holds it.
    #[error("'{path}' is locked externally and cannot be cleared")]
    LockedExternally { path: String },

    /// A required input (revision provider, resource list) was empty.
    #[error("operation '{operation}' has no {what} to work on")]
    MissingInput { operation: String, what: String },
}

// --- Graph Errors ---

/// Composite dependency graph errors.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Adding the dependency would close a cycle.
    #[error("dependency '{dependent}' -> '{prerequisite}' would create a cycle")]
    Cycle {
        dependent: String,
        prerequisite: String,
    },

    /// An operation id does not belong to this composite.
    #[error("unknown operation id {0}")]
    UnknownOperation(usize),

    /// An operation was declared as its own prerequisite.
    #[error("operation '{0}' cannot depend on itself")]
    SelfDependency(String),
}

// --- Config Errors ---

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration file.
    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },

    /// Invalid configuration value.
    #[error("invalid value for '{key}' in section '[{section}]': {message}")]
    InvalidValue {
        section: String,
        key: String,
        message: String,
    },
}

// --- Plan Errors ---

/// Workflow plan errors.
#[derive(Debug, Error)]
pub enum PlanError {
    /// Operation kind is not recognised.
    #[error("operation '{id}' has unknown kind '{kind}'")]
    UnknownKind { id: String, kind: String },

    /// Operation refers to an id that is not defined before it.
    #[error("operation '{id}' refers to unknown operation '{reference}'")]
    UnknownReference { id: String, reference: String },

    /// Operation is missing a field its kind requires.
    #[error("operation '{id}' ({kind}) requires field '{field}'")]
    MissingField {
        id: String,
        kind: String,
        field: &'static str,
    },

    /// Two operations share the same id.
    #[error("operation id '{0}' is defined more than once")]
    DuplicateId(String),

    /// An explicit weight of zero.
    #[error("operation '{id}' must have a positive weight")]
    InvalidWeight { id: String },
}

/// Returns `true` if `err` (or anything in its chain) represents cancellation.
#[must_use]
pub fn is_cancellation(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<ConnectorError>()
            .is_some_and(|e| e.code() == ErrorCode::Cancelled)
            || matches!(
                cause.downcast_ref::<OperationError>(),
                Some(OperationError::Cancelled(_))
            )
    })
}

/// Returns `true` if `err` must abort the remaining steps of its operation.
#[must_use]
pub fn is_fatal(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<OperationError>(),
            Some(OperationError::LockedExternally { .. })
        )
    })
}
