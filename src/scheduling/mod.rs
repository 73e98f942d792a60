// svnop-rs: Subversion operation engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Locking domains and background scheduling.
//!
//! Every operation declares a [`LockingDomain`]: the repository paths or
//! workspace projects it must own exclusively while it runs. The
//! [`OperationScheduler`] runs submitted operations on tokio tasks and
//! holds back any operation whose domain overlaps one already running.
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`LockingDomain`] | Set of claimed paths, or the whole workspace |
//! | [`Workspace`] | Projects checked out locally |
//! | [`OperationScheduler`] | Domain-aware background runner |
//! | [`SubmittedOperation`] | Join/cancel handle for one submission |

mod domain;
mod scheduler;
mod workspace;

pub use domain::LockingDomain;
pub use scheduler::{OperationScheduler, SubmittedOperation, default_max_workers};
pub use workspace::{MemoryWorkspace, Workspace, WorkspaceProject};
