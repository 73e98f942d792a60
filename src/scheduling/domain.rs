// svnop-rs: Subversion operation engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Locking domains.

use std::collections::BTreeSet;
use std::fmt;

use super::Workspace;

/// Normalises a resource path: `\` becomes `/`, trailing `/` is dropped.
fn normalize(path: &str) -> String {
    let path = path.replace('\\', "/");
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() && path.starts_with('/') {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Whether `a` equals `b` or one is an ancestor of the other.
fn nested(a: &str, b: &str) -> bool {
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    short == "/"
        || long == short
        || long
            .strip_prefix(short)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Resources an operation claims exclusive access to while running.
///
/// Two domains overlap when any path of one equals, contains or is
/// contained by a path of the other. The workspace domain overlaps every
/// non-empty domain; the empty domain overlaps nothing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LockingDomain {
    workspace: bool,
    paths: BTreeSet<String>,
}

impl LockingDomain {
    /// Domain that claims nothing.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            workspace: false,
            paths: BTreeSet::new(),
        }
    }

    /// Domain that claims the whole workspace.
    #[must_use]
    pub const fn workspace() -> Self {
        Self {
            workspace: true,
            paths: BTreeSet::new(),
        }
    }

    /// Domain over `paths`.
    pub fn paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            workspace: false,
            paths: paths.into_iter().map(|p| normalize(p.as_ref())).collect(),
        }
    }

    /// Domain over `targets` plus every workspace project nested with one
    /// of them.
    pub fn for_targets<S: AsRef<str>>(targets: &[S], workspace: &dyn Workspace) -> Self {
        let mut domain = Self::paths(targets);
        let nested_projects: Vec<String> = workspace
            .projects()
            .into_iter()
            .map(|project| normalize(&project.location.to_string_lossy()))
            .filter(|location| domain.paths.iter().any(|p| nested(p, location)))
            .collect();
        domain.paths.extend(nested_projects);
        domain
    }

    /// Whether this domain claims nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.workspace && self.paths.is_empty()
    }

    /// Whether this is the workspace domain.
    #[must_use]
    pub const fn is_workspace(&self) -> bool {
        self.workspace
    }

    /// Claimed paths.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    /// Whether the two domains must not run at the same time.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        if self.workspace || other.workspace {
            return true;
        }
        self.paths
            .iter()
            .any(|a| other.paths.iter().any(|b| nested(a, b)))
    }

    /// Union of two domains.
    #[must_use]
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            workspace: self.workspace || other.workspace,
            paths: self.paths.union(&other.paths).cloned().collect(),
        }
    }

    /// Union of many domains.
    pub fn merge_all<'a, I>(domains: I) -> Self
    where
        I: IntoIterator<Item = &'a Self>,
    {
        domains
            .into_iter()
            .fold(Self::none(), |acc, domain| acc.merge(domain))
    }
}

impl fmt::Display for LockingDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.workspace {
            return f.write_str("<workspace>");
        }
        if self.paths.is_empty() {
            return f.write_str("<none>");
        }
        let joined: Vec<&str> = self.iter().collect();
        f.write_str(&joined.join(", "))
    }
}
