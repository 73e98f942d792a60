// svnop-rs: Subversion operation engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Local workspace model.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// A checked-out project known to the workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceProject {
    pub name: String,
    pub location: PathBuf,
}

impl WorkspaceProject {
    /// Creates a project entry.
    pub fn new(name: impl Into<String>, location: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
        }
    }
}

/// Registry of projects on the local machine.
pub trait Workspace: Send + Sync {
    /// Workspace root directory.
    fn root(&self) -> &Path;

    /// Known projects.
    fn projects(&self) -> Vec<WorkspaceProject>;

    /// Adds or replaces a project with the same name.
    fn register(&self, project: WorkspaceProject);

    /// Removes a project by name.
    fn unregister(&self, name: &str) -> Option<WorkspaceProject>;
}

/// Workspace kept in memory.
#[derive(Debug)]
pub struct MemoryWorkspace {
    root: PathBuf,
    projects: Mutex<Vec<WorkspaceProject>>,
}

impl MemoryWorkspace {
    /// Creates an empty workspace rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            projects: Mutex::new(Vec::new()),
        }
    }

    /// Adds a project at `root/name`.
    #[must_use]
    pub fn with_project(self, name: &str) -> Self {
        let location = self.root.join(name);
        self.register(WorkspaceProject::new(name, location));
        self
    }
}

impl Workspace for MemoryWorkspace {
    fn root(&self) -> &Path {
        &self.root
    }

    fn projects(&self) -> Vec<WorkspaceProject> {
        self.projects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn register(&self, project: WorkspaceProject) {
        let mut projects = self.projects.lock().unwrap_or_else(PoisonError::into_inner);
        projects.retain(|p| p.name != project.name);
        projects.push(project);
    }

    fn unregister(&self, name: &str) -> Option<WorkspaceProject> {
        let mut projects = self.projects.lock().unwrap_or_else(PoisonError::into_inner);
        let index = projects.iter().position(|p| p.name == name)?;
        Some(projects.remove(index))
    }
}
