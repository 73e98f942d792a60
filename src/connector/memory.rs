// svnop-rs: Subversion operation engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! In-memory repository implementing [`Connector`].
//!
//! Keeps a single HEAD tree (no per-revision snapshots), a log, locks and
//! properties. Fault injection hooks let tests script unsupported
//! capabilities, failing paths and the revision numbers the server hands
//! out.

use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use futures_util::future::BoxFuture;

use super::{
    AnnotationLine, CommandOptions, Connector, INVALID_REVISION, LogEntry, Notification,
    NotificationHub,
};
use crate::error::{ConnectorError, ConnectorResult, ErrorCode};

#[derive(Debug, Clone)]
enum Node {
    Dir,
    File {
        content: String,
        revision: i64,
        author: String,
    },
}

/// A verb invocation as seen by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRecord {
    pub verb: &'static str,
    pub options: CommandOptions,
    pub targets: Vec<String>,
}

#[derive(Debug, Default)]
struct RepoState {
    head: i64,
    nodes: BTreeMap<String, Node>,
    locks: BTreeMap<String, String>,
    properties: BTreeMap<(String, String), String>,
    revision_properties: BTreeMap<(i64, String), String>,
    merges: BTreeMap<i64, Vec<i64>>,
    log: Vec<LogEntry>,
    staged: BTreeMap<String, String>,
    rejected: CommandOptions,
    rejected_once: CommandOptions,
    failing: BTreeMap<String, ErrorCode>,
    scripted: VecDeque<i64>,
    calls: Vec<CallRecord>,
}

impl RepoState {
    /// Records the call and applies injected faults.
    fn begin(
        &mut self,
        verb: &'static str,
        options: CommandOptions,
        targets: &[String],
    ) -> ConnectorResult<()> {
        self.calls.push(CallRecord {
            verb,
            options,
            targets: targets.to_vec(),
        });

        let unsupported = options & (self.rejected | self.rejected_once);
        if !unsupported.is_empty() {
            self.rejected_once.remove(unsupported);
            return Err(ConnectorError::new(
                verb,
                ErrorCode::UnsupportedFeature,
                format!("server does not support{}", unsupported.as_command_line()),
            ));
        }

        for target in targets {
            if let Some((path, code)) = self
                .failing
                .iter()
                .find(|(path, _)| is_under(target, path))
            {
                return Err(ConnectorError::new(
                    verb,
                    *code,
                    format!("injected failure on '{path}'"),
                ));
            }
        }
        Ok(())
    }

    fn next_revision(&mut self, author: &str, message: &str, changed: Vec<String>) -> i64 {
        let revision = match self.scripted.pop_front() {
            Some(revision) => {
                self.head = self.head.max(revision);
                revision
            }
            None => {
                self.head += 1;
                self.head
            }
        };
        self.log.push(LogEntry {
            revision,
            author: author.to_string(),
            message: message.to_string(),
            changed_paths: changed,
            merged_revisions: Vec::new(),
        });
        revision
    }
}

fn parent_of(path: &str) -> Option<&str> {
    if path == "/" {
        return None;
    }
    match path.rsplit_once('/') {
        Some(("", _)) => Some("/"),
        Some((parent, _)) => Some(parent),
        None => None,
    }
}

fn basename(path: &str) -> &str {
    path.rsplit_once('/').map_or(path, |(_, name)| name)
}

fn join(dir: &str, name: &str) -> String {
    if dir == "/" {
        format!("/{name}")
    } else {
        format!("{dir}/{name}")
    }
}

fn is_under(path: &str, ancestor: &str) -> bool {
    ancestor == "/"
        || path == ancestor
        || path
            .strip_prefix(ancestor)
            .is_some_and(|rest| rest.starts_with('/'))
}

fn subtree(nodes: &BTreeMap<String, Node>, root: &str) -> Vec<(String, Node)> {
    nodes
        .iter()
        .filter(|(path, _)| is_under(path, root))
        .map(|(path, node)| (path.clone(), node.clone()))
        .collect()
}

fn ensure_parent(
    nodes: &mut BTreeMap<String, Node>,
    verb: &'static str,
    path: &str,
    make_parents: bool,
) -> ConnectorResult<()> {
    let Some(parent) = parent_of(path) else {
        return Ok(());
    };
    match nodes.get(parent) {
        Some(Node::Dir) => Ok(()),
        Some(Node::File { .. }) => Err(ConnectorError::new(
            verb,
            ErrorCode::FsConflict,
            format!("'{parent}' is not a directory"),
        )),
        None if make_parents => {
            ensure_parent(nodes, verb, parent, true)?;
            nodes.insert(parent.to_string(), Node::Dir);
            Ok(())
        }
        None => Err(ConnectorError::new(
            verb,
            ErrorCode::PathNotFound,
            format!("'{parent}' does not exist"),
        )),
    }
}

fn not_found(verb: &'static str, path: &str) -> ConnectorError {
    ConnectorError::new(verb, ErrorCode::PathNotFound, format!("'{path}' does not exist"))
}

fn io_error(verb: &'static str, path: &Path, err: &std::io::Error) -> ConnectorError {
    ConnectorError::new(verb, ErrorCode::Io, format!("{}: {err}", path.display()))
}

/// Simulated Subversion server.
#[derive(Debug)]
pub struct MemoryRepository {
    root_url: String,
    author: String,
    hub: NotificationHub,
    state: Mutex<RepoState>,
}

impl MemoryRepository {
    /// Creates an empty repository reachable at `root_url`.
    pub fn new(root_url: impl Into<String>) -> Self {
        let mut state = RepoState::default();
        state.nodes.insert("/".to_string(), Node::Dir);
        Self {
            root_url: root_url.into().trim_end_matches('/').to_string(),
            author: "svnop".to_string(),
            hub: NotificationHub::new(),
            state: Mutex::new(state),
        }
    }

    /// Seeds paths at revision 0. A trailing `/` marks a directory.
    #[must_use]
    pub fn with_paths<I, S>(self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        {
            let mut state = self.guard();
            for raw in paths {
                let raw = raw.as_ref();
                let path = self.repo_path(raw);
                let node = if raw.ends_with('/') {
                    Node::Dir
                } else {
                    Node::File {
                        content: String::new(),
                        revision: 0,
                        author: self.author.clone(),
                    }
                };
                if ensure_parent(&mut state.nodes, "seed", &path, true).is_ok() {
                    state.nodes.insert(path, node);
                }
            }
        }
        self
    }

    /// Sets the author recorded on new revisions.
    #[must_use]
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    /// Root URL of the repository.
    #[must_use]
    pub fn root_url(&self) -> &str {
        &self.root_url
    }

    fn guard(&self) -> MutexGuard<'_, RepoState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Maps a URL or repository path to a normalised absolute path.
    fn repo_path(&self, url: &str) -> String {
        let path = url.strip_prefix(self.root_url.as_str()).unwrap_or(url);
        let path = path.trim_end_matches('/');
        if path.is_empty() {
            "/".to_string()
        } else if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        }
    }

    fn repo_paths(&self, urls: &[String]) -> Vec<String> {
        urls.iter().map(|u| self.repo_path(u)).collect()
    }

    /// Notifies the issuing call first, then repository-wide observers.
    fn publish(&self, notify: &NotificationHub, revision: i64, path: Option<&str>) {
        let notification = Notification {
            revision,
            path: path.map(str::to_string),
        };
        notify.notify(&notification);
        self.hub.notify(&notification);
    }

    // --- fault injection and inspection ---

    /// Stages a local modification picked up by the next matching commit.
    pub fn stage(&self, path: &str, content: impl Into<String>) {
        let path = self.repo_path(path);
        self.guard().staged.insert(path, content.into());
    }

    /// Server permanently rejects commands carrying any of `flags`.
    pub fn reject_feature(&self, flags: CommandOptions) {
        self.guard().rejected.insert(flags);
    }

    /// Server rejects the next command carrying any of `flags`, once.
    pub fn reject_feature_once(&self, flags: CommandOptions) {
        self.guard().rejected_once.insert(flags);
    }

    /// Commands touching `path` (or anything below it) fail with `code`.
    pub fn fail_path(&self, path: &str, code: ErrorCode) {
        let path = self.repo_path(path);
        self.guard().failing.insert(path, code);
    }

    /// Next committing commands report these revision numbers, in order.
    pub fn script_revisions<I: IntoIterator<Item = i64>>(&self, revisions: I) {
        self.guard().scripted.extend(revisions);
    }

    /// Records that `revision` merged `merged`.
    pub fn record_merge(&self, revision: i64, merged: Vec<i64>) {
        self.guard().merges.insert(revision, merged);
    }

    /// Every call received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<CallRecord> {
        self.guard().calls.clone()
    }

    /// Youngest revision.
    #[must_use]
    pub fn head(&self) -> i64 {
        self.guard().head
    }

    /// Whether `path` exists at HEAD.
    #[must_use]
    pub fn exists(&self, path: &str) -> bool {
        let path = self.repo_path(path);
        self.guard().nodes.contains_key(&path)
    }

    /// Whether `path` holds a lock.
    #[must_use]
    pub fn is_locked(&self, path: &str) -> bool {
        let path = self.repo_path(path);
        self.guard().locks.contains_key(&path)
    }

    /// Content of the file at `path`.
    #[must_use]
    pub fn file_content(&self, path: &str) -> Option<String> {
        let path = self.repo_path(path);
        match self.guard().nodes.get(&path) {
            Some(Node::File { content, .. }) => Some(content.clone()),
            _ => None,
        }
    }

    /// Unversioned property of `revision`.
    #[must_use]
    pub fn revision_property(&self, revision: i64, name: &str) -> Option<String> {
        self.guard()
            .revision_properties
            .get(&(revision, name.to_string()))
            .cloned()
    }

    /// All paths at HEAD, sorted.
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        self.guard().nodes.keys().cloned().collect()
    }

    // --- verb implementations ---

    fn apply_transfer(
        &self,
        verb: &'static str,
        sources: &[String],
        destination: &str,
        message: &str,
        options: CommandOptions,
        remove_sources: bool,
    ) -> ConnectorResult<(i64, String)> {
        let sources = self.repo_paths(sources);
        let destination = self.repo_path(destination);
        let mut state = self.guard();
        let mut targets = sources.clone();
        targets.push(destination.clone());
        state.begin(verb, options, &targets)?;

        let mut nodes = state.nodes.clone();
        let as_child = options.contains(CommandOptions::INTERPRET_AS_CHILD)
            || sources.len() > 1
            || matches!(nodes.get(&destination), Some(Node::Dir));
        let mut changed = Vec::with_capacity(sources.len());

        for source in &sources {
            if !nodes.contains_key(source) {
                return Err(not_found(verb, source));
            }
            let target = if as_child {
                join(&destination, basename(source))
            } else {
                destination.clone()
            };
            if nodes.contains_key(&target) {
                return Err(ConnectorError::new(
                    verb,
                    ErrorCode::AlreadyExists,
                    format!("'{target}' already exists"),
                ));
            }
            if is_under(&target, source) {
                return Err(ConnectorError::new(
                    verb,
                    ErrorCode::FsConflict,
                    format!("cannot {verb} '{source}' into itself"),
                ));
            }
            ensure_parent(
                &mut nodes,
                verb,
                &target,
                options.contains(CommandOptions::MAKE_PARENTS),
            )?;

            for (path, node) in subtree(&nodes, source) {
                let rebased = format!("{target}{}", &path[source.len()..]);
                nodes.insert(rebased, node);
            }
            if remove_sources {
                nodes.retain(|path, _| !is_under(path, source));
                changed.push(source.clone());
            }
            changed.push(target);
        }

        if remove_sources {
            state
                .locks
                .retain(|path, _| !sources.iter().any(|source| is_under(path, source)));
        }
        state.nodes = nodes;
        let revision = state.next_revision(&self.author, message, changed);
        Ok((revision, destination))
    }

    fn apply_remove(
        &self,
        paths: &[String],
        message: &str,
        options: CommandOptions,
    ) -> ConnectorResult<i64> {
        let paths = self.repo_paths(paths);
        let mut state = self.guard();
        state.begin("delete", options, &paths)?;
        for path in &paths {
            if path == "/" {
                return Err(ConnectorError::new(
                    "delete",
                    ErrorCode::FsConflict,
                    "cannot delete the repository root",
                ));
            }
            if !state.nodes.contains_key(path) {
                return Err(not_found("delete", path));
            }
            if !options.contains(CommandOptions::FORCE)
                && let Some(locked) = state.locks.keys().find(|l| is_under(l, path))
            {
                return Err(ConnectorError::new(
                    "delete",
                    ErrorCode::Locked,
                    format!("'{locked}' is locked"),
                ));
            }
        }
        for path in &paths {
            state.nodes.retain(|p, _| !is_under(p, path));
            state.locks.retain(|p, _| !is_under(p, path));
        }
        Ok(state.next_revision(&self.author, message, paths))
    }

    fn apply_mkdir(
        &self,
        paths: &[String],
        message: &str,
        options: CommandOptions,
    ) -> ConnectorResult<i64> {
        let paths = self.repo_paths(paths);
        let mut state = self.guard();
        state.begin("mkdir", options, &paths)?;
        let mut nodes = state.nodes.clone();
        for path in &paths {
            if nodes.contains_key(path) {
                return Err(ConnectorError::new(
                    "mkdir",
                    ErrorCode::AlreadyExists,
                    format!("'{path}' already exists"),
                ));
            }
            ensure_parent(
                &mut nodes,
                "mkdir",
                path,
                options.contains(CommandOptions::MAKE_PARENTS),
            )?;
            nodes.insert(path.clone(), Node::Dir);
        }
        state.nodes = nodes;
        Ok(state.next_revision(&self.author, message, paths))
    }

    fn apply_commit(
        &self,
        paths: &[String],
        message: &str,
        options: CommandOptions,
    ) -> ConnectorResult<i64> {
        let paths = self.repo_paths(paths);
        let mut state = self.guard();
        state.begin("commit", options, &paths)?;

        let staged: Vec<(String, String)> = state
            .staged
            .iter()
            .filter(|(path, _)| paths.iter().any(|root| is_under(path, root)))
            .map(|(path, content)| (path.clone(), content.clone()))
            .collect();
        if staged.is_empty() {
            return Ok(INVALID_REVISION);
        }

        let mut nodes = state.nodes.clone();
        for (path, _) in &staged {
            if matches!(nodes.get(path), Some(Node::Dir)) {
                return Err(ConnectorError::new(
                    "commit",
                    ErrorCode::FsConflict,
                    format!("'{path}' is a directory"),
                ));
            }
            ensure_parent(&mut nodes, "commit", path, false)?;
        }

        let changed: Vec<String> = staged.iter().map(|(path, _)| path.clone()).collect();
        state.nodes = nodes;
        let revision = state.next_revision(&self.author, message, changed);
        for (path, content) in staged {
            state.staged.remove(&path);
            if !options.contains(CommandOptions::KEEP_LOCKS) {
                state.locks.remove(&path);
            }
            state.nodes.insert(
                path,
                Node::File {
                    content,
                    revision,
                    author: self.author.clone(),
                },
            );
        }
        Ok(revision)
    }

    fn apply_lock(
        &self,
        paths: &[String],
        comment: &str,
        options: CommandOptions,
    ) -> ConnectorResult<()> {
        let paths = self.repo_paths(paths);
        let mut state = self.guard();
        state.begin("lock", options, &paths)?;
        for path in &paths {
            match state.nodes.get(path) {
                Some(Node::File { .. }) => {}
                Some(Node::Dir) => {
                    return Err(ConnectorError::new(
                        "lock",
                        ErrorCode::FsConflict,
                        format!("'{path}' is a directory"),
                    ));
                }
                None => return Err(not_found("lock", path)),
            }
            if state.locks.contains_key(path) && !options.contains(CommandOptions::FORCE) {
                return Err(ConnectorError::new(
                    "lock",
                    ErrorCode::Locked,
                    format!("'{path}' is already locked"),
                ));
            }
        }
        for path in paths {
            state.locks.insert(path, comment.to_string());
        }
        Ok(())
    }

    fn apply_unlock(&self, paths: &[String], options: CommandOptions) -> ConnectorResult<()> {
        let paths = self.repo_paths(paths);
        let mut state = self.guard();
        state.begin("unlock", options, &paths)?;
        if let Some(path) = paths.iter().find(|p| !state.locks.contains_key(*p)) {
            return Err(ConnectorError::new(
                "unlock",
                ErrorCode::NotLocked,
                format!("'{path}' is not locked"),
            ));
        }
        for path in &paths {
            state.locks.remove(path);
        }
        Ok(())
    }

    fn apply_log(
        &self,
        url: &str,
        limit: usize,
        options: CommandOptions,
    ) -> ConnectorResult<Vec<LogEntry>> {
        let path = self.repo_path(url);
        let mut state = self.guard();
        state.begin("log", options, std::slice::from_ref(&path))?;
        if !state.nodes.contains_key(&path) {
            return Err(not_found("log", &path));
        }
        let include_merged = options.contains(CommandOptions::INCLUDE_MERGED_REVISIONS);
        let limit = if limit == 0 { usize::MAX } else { limit };
        Ok(state
            .log
            .iter()
            .rev()
            .filter(|entry| entry.changed_paths.iter().any(|p| is_under(p, &path)))
            .take(limit)
            .map(|entry| {
                let mut entry = entry.clone();
                if include_merged {
                    entry.merged_revisions = state
                        .merges
                        .get(&entry.revision)
                        .cloned()
                        .unwrap_or_default();
                }
                entry
            })
            .collect())
    }

    fn apply_annotate(
        &self,
        url: &str,
        options: CommandOptions,
    ) -> ConnectorResult<Vec<AnnotationLine>> {
        let path = self.repo_path(url);
        let mut state = self.guard();
        state.begin("annotate", options, std::slice::from_ref(&path))?;
        let Some(Node::File {
            content,
            revision,
            author,
        }) = state.nodes.get(&path)
        else {
            return Err(not_found("annotate", &path));
        };
        let binary = state
            .properties
            .get(&(path.clone(), "svn:mime-type".to_string()))
            .is_some_and(|mime| !mime.starts_with("text/"));
        if binary && !options.contains(CommandOptions::IGNORE_MIME_TYPE) {
            return Err(ConnectorError::new(
                "annotate",
                ErrorCode::Other,
                format!("cannot annotate binary file '{path}'"),
            ));
        }
        Ok(content
            .lines()
            .map(|text| AnnotationLine {
                revision: *revision,
                author: author.clone(),
                text: text.to_string(),
            })
            .collect())
    }

    fn apply_set_property(
        &self,
        url: &str,
        name: &str,
        value: &str,
        message: &str,
        options: CommandOptions,
    ) -> ConnectorResult<i64> {
        let path = self.repo_path(url);
        let mut state = self.guard();
        state.begin("propset", options, std::slice::from_ref(&path))?;
        if !state.nodes.contains_key(&path) {
            return Err(not_found("propset", &path));
        }
        state
            .properties
            .insert((path.clone(), name.to_string()), value.to_string());
        Ok(state.next_revision(&self.author, message, vec![path]))
    }

    fn apply_set_revision_property(
        &self,
        location: &str,
        revision: i64,
        name: &str,
        value: &str,
    ) -> ConnectorResult<()> {
        let path = self.repo_path(location);
        let mut state = self.guard();
        state.begin("propset", CommandOptions::empty(), std::slice::from_ref(&path))?;
        if !(0..=state.head).contains(&revision) {
            return Err(ConnectorError::new(
                "propset",
                ErrorCode::PathNotFound,
                format!("no such revision {revision}"),
            ));
        }
        if name == "svn:author"
            && let Some(entry) = state.log.iter_mut().find(|e| e.revision == revision)
        {
            entry.author = value.to_string();
        }
        state
            .revision_properties
            .insert((revision, name.to_string()), value.to_string());
        Ok(())
    }
}

/// Reads a local tree as `(relative path, file content or None for dirs)`.
async fn read_local_tree(root: &Path) -> ConnectorResult<Vec<(String, Option<String>)>> {
    let mut out = Vec::new();
    let metadata = tokio::fs::metadata(root)
        .await
        .map_err(|e| io_error("import", root, &e))?;
    if metadata.is_file() {
        let content = tokio::fs::read_to_string(root)
            .await
            .map_err(|e| io_error("import", root, &e))?;
        out.push((String::new(), Some(content)));
        return Ok(out);
    }

    let mut stack: Vec<(PathBuf, String)> = vec![(root.to_path_buf(), String::new())];
    while let Some((dir, relative)) = stack.pop() {
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| io_error("import", &dir, &e))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| io_error("import", &dir, &e))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            let child = format!("{relative}/{name}");
            let path = entry.path();
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| io_error("import", &path, &e))?;
            if file_type.is_dir() {
                out.push((child.clone(), None));
                stack.push((path, child));
            } else {
                let content = tokio::fs::read_to_string(&path)
                    .await
                    .map_err(|e| io_error("import", &path, &e))?;
                out.push((child, Some(content)));
            }
        }
    }
    out.sort();
    Ok(out)
}

impl Connector for MemoryRepository {
    fn location(&self) -> &str {
        &self.root_url
    }

    fn notifications(&self) -> &NotificationHub {
        &self.hub
    }

    fn checkout<'a>(
        &'a self,
        url: &'a str,
        revision: Option<i64>,
        destination: &'a Path,
        options: CommandOptions,
    ) -> BoxFuture<'a, ConnectorResult<i64>> {
        Box::pin(async move {
            let root = self.repo_path(url);
            let (entries, checked_out) = {
                let mut state = self.guard();
                state.begin("checkout", options, std::slice::from_ref(&root))?;
                if let Some(revision) = revision
                    && !(0..=state.head).contains(&revision)
                {
                    return Err(ConnectorError::new(
                        "checkout",
                        ErrorCode::PathNotFound,
                        format!("no such revision {revision}"),
                    ));
                }
                if !matches!(state.nodes.get(&root), Some(Node::Dir)) {
                    return Err(not_found("checkout", &root));
                }
                (subtree(&state.nodes, &root), revision.unwrap_or(state.head))
            };

            tokio::fs::create_dir_all(destination)
                .await
                .map_err(|e| io_error("checkout", destination, &e))?;
            for (path, node) in entries {
                let relative = path[root.len()..].trim_start_matches('/');
                if relative.is_empty() {
                    continue;
                }
                let local = destination.join(relative);
                match node {
                    Node::Dir => tokio::fs::create_dir_all(&local).await,
                    Node::File { content, .. } => tokio::fs::write(&local, content).await,
                }
                .map_err(|e| io_error("checkout", &local, &e))?;
            }
            Ok(checked_out)
        })
    }

    fn copy<'a>(
        &'a self,
        sources: &'a [String],
        destination: &'a str,
        message: &'a str,
        options: CommandOptions,
        notify: &'a NotificationHub,
    ) -> BoxFuture<'a, ConnectorResult<()>> {
        Box::pin(async move {
            let (revision, destination) =
                self.apply_transfer("copy", sources, destination, message, options, false)?;
            self.publish(notify, revision, Some(&destination));
            Ok(())
        })
    }

    fn move_to<'a>(
        &'a self,
        sources: &'a [String],
        destination: &'a str,
        message: &'a str,
        options: CommandOptions,
        notify: &'a NotificationHub,
    ) -> BoxFuture<'a, ConnectorResult<()>> {
        Box::pin(async move {
            let (revision, destination) =
                self.apply_transfer("move", sources, destination, message, options, true)?;
            self.publish(notify, revision, Some(&destination));
            Ok(())
        })
    }

    fn remove<'a>(
        &'a self,
        paths: &'a [String],
        message: &'a str,
        options: CommandOptions,
        notify: &'a NotificationHub,
    ) -> BoxFuture<'a, ConnectorResult<()>> {
        Box::pin(async move {
            let revision = self.apply_remove(paths, message, options)?;
            self.publish(notify, revision, None);
            Ok(())
        })
    }

    fn mkdir<'a>(
        &'a self,
        paths: &'a [String],
        message: &'a str,
        options: CommandOptions,
        notify: &'a NotificationHub,
    ) -> BoxFuture<'a, ConnectorResult<()>> {
        Box::pin(async move {
            let revision = self.apply_mkdir(paths, message, options)?;
            self.publish(notify, revision, None);
            Ok(())
        })
    }

    fn import<'a>(
        &'a self,
        source: &'a Path,
        url: &'a str,
        message: &'a str,
        options: CommandOptions,
        notify: &'a NotificationHub,
    ) -> BoxFuture<'a, ConnectorResult<()>> {
        Box::pin(async move {
            let target = self.repo_path(url);
            let local = read_local_tree(source).await?;
            let revision = {
                let mut state = self.guard();
                state.begin("import", options, std::slice::from_ref(&target))?;
                let mut nodes = state.nodes.clone();
                let head = state.head + 1;
                for (relative, content) in &local {
                    let path = format!("{target}{relative}");
                    if path == "/" {
                        continue;
                    }
                    if matches!(nodes.get(&path), Some(Node::File { .. })) {
                        return Err(ConnectorError::new(
                            "import",
                            ErrorCode::AlreadyExists,
                            format!("'{path}' already exists"),
                        ));
                    }
                    ensure_parent(&mut nodes, "import", &path, true)?;
                    let node = match content {
                        None => Node::Dir,
                        Some(content) => Node::File {
                            content: content.clone(),
                            revision: head,
                            author: self.author.clone(),
                        },
                    };
                    nodes.insert(path, node);
                }
                state.nodes = nodes;
                state.next_revision(&self.author, message, vec![target.clone()])
            };
            self.publish(notify, revision, Some(&target));
            Ok(())
        })
    }

    fn commit<'a>(
        &'a self,
        paths: &'a [String],
        message: &'a str,
        options: CommandOptions,
        notify: &'a NotificationHub,
    ) -> BoxFuture<'a, ConnectorResult<()>> {
        Box::pin(async move {
            let revision = self.apply_commit(paths, message, options)?;
            self.publish(notify, revision, None);
            Ok(())
        })
    }

    fn lock<'a>(
        &'a self,
        paths: &'a [String],
        comment: &'a str,
        options: CommandOptions,
    ) -> BoxFuture<'a, ConnectorResult<()>> {
        Box::pin(async move { self.apply_lock(paths, comment, options) })
    }

    fn unlock<'a>(
        &'a self,
        paths: &'a [String],
        options: CommandOptions,
    ) -> BoxFuture<'a, ConnectorResult<()>> {
        Box::pin(async move { self.apply_unlock(paths, options) })
    }

    fn log<'a>(
        &'a self,
        url: &'a str,
        limit: usize,
        options: CommandOptions,
    ) -> BoxFuture<'a, ConnectorResult<Vec<LogEntry>>> {
        Box::pin(async move { self.apply_log(url, limit, options) })
    }

    fn annotate<'a>(
        &'a self,
        url: &'a str,
        options: CommandOptions,
    ) -> BoxFuture<'a, ConnectorResult<Vec<AnnotationLine>>> {
        Box::pin(async move { self.apply_annotate(url, options) })
    }

    fn get_property<'a>(
        &'a self,
        url: &'a str,
        name: &'a str,
    ) -> BoxFuture<'a, ConnectorResult<Option<String>>> {
        Box::pin(async move {
            let path = self.repo_path(url);
            let mut state = self.guard();
            state.begin("propget", CommandOptions::empty(), std::slice::from_ref(&path))?;
            if !state.nodes.contains_key(&path) {
                return Err(not_found("propget", &path));
            }
            Ok(state.properties.get(&(path, name.to_string())).cloned())
        })
    }

    fn set_property<'a>(
        &'a self,
        url: &'a str,
        name: &'a str,
        value: &'a str,
        message: &'a str,
        options: CommandOptions,
        notify: &'a NotificationHub,
    ) -> BoxFuture<'a, ConnectorResult<()>> {
        Box::pin(async move {
            let revision = self.apply_set_property(url, name, value, message, options)?;
            self.publish(notify, revision, Some(url));
            Ok(())
        })
    }

    fn set_revision_property<'a>(
        &'a self,
        location: &'a str,
        revision: i64,
        name: &'a str,
        value: &'a str,
    ) -> BoxFuture<'a, ConnectorResult<()>> {
        Box::pin(async move { self.apply_set_revision_property(location, revision, name, value) })
    }
}
