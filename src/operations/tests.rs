// svnop-rs: Subversion operation engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use std::sync::Arc;

use super::*;
use crate::composite::CompositeOperation;
use crate::connector::{CommandOptions, Connector, MemoryRepository, NotificationHub};
use crate::console::{ChannelConsole, ConsoleLine};
use crate::error::ErrorCode;
use crate::ledger::{ResourceProvider, RevisionLedger, RevisionPair, RevisionProvider};
use crate::operation::{ActionOperation, OperationContext};
use crate::progress::ProgressMonitor;
use crate::scheduling::{LockingDomain, MemoryWorkspace, Workspace, WorkspaceProject};
use crate::status::Severity;

const ROOT: &str = "https://svn.example.com/repo";

fn set(paths: &[&str]) -> ResourceSet {
    paths.iter().copied().collect()
}

fn repository() -> Arc<MemoryRepository> {
    Arc::new(MemoryRepository::new(ROOT).with_paths([
        "/trunk/a.txt",
        "/trunk/b.txt",
        "/trunk/c.txt",
        "/branches/",
    ]))
}

fn console_context() -> (OperationContext, flume::Receiver<ConsoleLine>) {
    let (console, rx) = ChannelConsole::new();
    (
        OperationContext::new(ProgressMonitor::detached(), Arc::new(console)),
        rx,
    )
}

fn lines(rx: &flume::Receiver<ConsoleLine>) -> Vec<String> {
    rx.drain().map(|line| line.to_string()).collect()
}

// --- Transfers ---

#[tokio::test]
async fn test_branch_records_revision_and_echoes_command() {
    let repo = repository();
    let (ctx, rx) = console_context();
    let op = RepositoryTransferOperation::new(
        TransferKind::Branch,
        repo.clone(),
        set(&["/trunk"]),
        "/branches/b1",
        "create branch",
    );

    let status = op.run(&ctx).await;

    assert!(status.is_ok(), "{}", status.render());
    assert!(repo.exists("/branches/b1/a.txt"));
    assert_eq!(
        op.ledger().revisions(),
        vec![RevisionPair::new(1, vec!["/branches/b1".to_string()], ROOT)]
    );
    let output = lines(&rx);
    assert!(output.contains(
        &"[cmd] svn copy \"/trunk\" \"/branches/b1\" -m \"create branch\" --parents".to_string()
    ));
    assert!(output.contains(&"[ok] Committed revision 1.".to_string()));
}

#[test]
fn test_move_claims_sources_but_copy_does_not() {
    let repo = repository();
    let moved = RepositoryTransferOperation::new(
        TransferKind::Move,
        repo.clone(),
        set(&["/trunk/a.txt"]),
        "/trunk/z.txt",
        "rename",
    );
    let copied = RepositoryTransferOperation::new(
        TransferKind::Copy,
        repo,
        set(&["/trunk/a.txt"]),
        "/trunk/z.txt",
        "copy",
    );

    assert_eq!(
        moved.locking_domain().to_string(),
        "/trunk/a.txt, /trunk/z.txt"
    );
    assert_eq!(copied.locking_domain().to_string(), "/trunk/z.txt");
}

#[tokio::test]
async fn test_failed_transfer_leaves_ledger_empty() {
    let repo = repository();
    let op = RepositoryTransferOperation::new(
        TransferKind::Copy,
        repo,
        set(&["/missing"]),
        "/branches/b1",
        "copy",
    );

    let status = op.run(&OperationContext::detached()).await;

    assert_eq!(status.severity(), Severity::Error);
    assert!(op.ledger().is_empty());
}

// --- Mutations ---

#[tokio::test]
async fn test_commit_without_changes_records_nothing() {
    let repo = repository();
    let op = CommitOperation::new(repo.clone(), set(&["/trunk"]), "nothing");

    let status = op.run(&OperationContext::detached()).await;
    assert!(status.is_ok());
    assert!(op.ledger().is_empty());

    repo.stage("/trunk/a.txt", "hello");
    let status = op.run(&OperationContext::detached()).await;
    assert!(status.is_ok());
    assert_eq!(op.ledger().len(), 1);
    assert_eq!(repo.file_content("/trunk/a.txt").as_deref(), Some("hello"));
}

#[tokio::test]
async fn test_scripted_revision_reaches_author_stamp() {
    let repo = repository();
    repo.script_revisions([42]);
    let mkdir = Arc::new(CreateFolderOperation::new(
        repo.clone(),
        set(&["/tags/v1/docs"]),
        "layout",
    ));
    let stamp = SetRevisionAuthorOperation::new(repo.clone(), mkdir.ledger(), "alice");

    let mut plan = CompositeOperation::new("stamp");
    let first = plan.add_shared(mkdir.clone());
    plan.add_after(Arc::new(stamp), &[first])
        .expect("first is known");
    let status = plan.run(&OperationContext::detached()).await;

    assert!(status.is_ok(), "{}", status.render());
    assert!(repo.exists("/tags/v1/docs"));
    assert_eq!(mkdir.ledger().revisions()[0].revision, 42);
    assert_eq!(
        repo.revision_property(42, "svn:author").as_deref(),
        Some("alice")
    );
}

#[tokio::test]
async fn test_author_stamp_with_no_revisions_is_ok() {
    let repo = repository();
    let empty = Arc::new(RevisionLedger::new());
    let op = SetRevisionAuthorOperation::new(repo.clone(), empty, "alice");

    let status = op.run(&OperationContext::detached()).await;

    assert!(status.is_ok());
    assert!(repo.calls().is_empty());
}

#[tokio::test]
async fn test_empty_provider_is_missing_input() {
    let repo = repository();
    let ledger: Arc<dyn ResourceProvider> = Arc::new(RevisionLedger::new());
    let op = DeleteRemoteOperation::new(repo.clone(), ledger, "cleanup");

    let status = op.run(&OperationContext::detached()).await;

    assert_eq!(status.severity(), Severity::Error);
    assert!(status.render().contains("has no paths to work on"));
    assert!(repo.calls().is_empty());
}

#[tokio::test]
async fn test_delete_consumes_paths_of_prerequisite() {
    let repo = repository();
    let branch = Arc::new(RepositoryTransferOperation::new(
        TransferKind::Branch,
        repo.clone(),
        set(&["/trunk"]),
        "/branches/tmp",
        "branch",
    ));
    let provider: Arc<dyn ResourceProvider> = branch.ledger();
    let delete = DeleteRemoteOperation::new(repo.clone(), provider, "drop branch");

    let mut plan = CompositeOperation::new("roundtrip");
    let first = plan.add_shared(branch);
    plan.add_after(Arc::new(delete), &[first])
        .expect("first is known");
    let status = plan.run(&OperationContext::detached()).await;

    assert!(status.is_ok(), "{}", status.render());
    assert!(!repo.exists("/branches/tmp"));
    assert_eq!(repo.head(), 2);
}

// --- Locks ---

#[tokio::test]
async fn test_lock_failure_on_one_path_does_not_stop_others() {
    let repo = repository();
    repo.fail_path("/trunk/b.txt", ErrorCode::Locked);
    let op = LockOperation::new(
        repo.clone(),
        set(&["/trunk/a.txt", "/trunk/b.txt", "/trunk/c.txt"]),
        "editing",
    );

    let status = op.run(&OperationContext::detached()).await;

    assert_eq!(status.severity(), Severity::Error);
    assert_eq!(status.problems().len(), 1);
    assert!(repo.is_locked("/trunk/a.txt"));
    assert!(!repo.is_locked("/trunk/b.txt"));
    assert!(repo.is_locked("/trunk/c.txt"));
}

#[tokio::test]
async fn test_unlock_reports_paths_that_were_not_locked() {
    let repo = repository();
    let lock = LockOperation::new(repo.clone(), set(&["/trunk/a.txt"]), "mine");
    assert!(lock.run(&OperationContext::detached()).await.is_ok());

    let unlock = UnlockOperation::new(repo.clone(), set(&["/trunk/a.txt", "/trunk/b.txt"]));
    let status = unlock.run(&OperationContext::detached()).await;

    assert_eq!(status.severity(), Severity::Error);
    assert!(!repo.is_locked("/trunk/a.txt"));
}

// --- Retry ---

#[tokio::test]
async fn test_log_downgrade_sticks_for_later_urls() {
    let repo = repository();
    repo.reject_feature(CommandOptions::INCLUDE_MERGED_REVISIONS);
    let op = GetLogMessagesOperation::new(
        repo.clone(),
        [format!("{ROOT}/trunk"), format!("{ROOT}/branches")],
        true,
    );

    let status = op.run(&OperationContext::detached()).await;

    assert!(status.is_ok(), "{}", status.render());
    assert!(op.is_downgraded());
    let options: Vec<CommandOptions> = repo.calls().iter().map(|c| c.options).collect();
    assert_eq!(
        options,
        vec![
            CommandOptions::INCLUDE_MERGED_REVISIONS,
            CommandOptions::empty(),
            CommandOptions::empty(),
        ]
    );
    assert!(op.entries(&format!("{ROOT}/branches")).is_some());
}

#[tokio::test]
async fn test_log_without_retry_fails_every_url() {
    let repo = repository();
    repo.reject_feature(CommandOptions::INCLUDE_MERGED_REVISIONS);
    let op = GetLogMessagesOperation::new(repo.clone(), ["/trunk", "/branches"], false);

    let status = op.run(&OperationContext::detached()).await;

    assert_eq!(status.severity(), Severity::Error);
    assert_eq!(status.problems().len(), 2);
    assert!(!op.is_downgraded());
    assert_eq!(repo.calls().len(), 2);
}

#[tokio::test]
async fn test_log_cache_is_shared_within_a_run() {
    let repo = repository();
    let first = Arc::new(GetLogMessagesOperation::new(repo.clone(), ["/trunk"], true));
    let second = Arc::new(GetLogMessagesOperation::new(repo.clone(), ["/trunk"], true));

    let mut plan = CompositeOperation::new("history");
    plan.add_shared(first.clone());
    plan.add_shared(second.clone());
    let ctx = OperationContext::detached();
    let status = plan.run(&ctx).await;

    assert!(status.is_ok());
    assert_eq!(repo.calls().len(), 1);
    assert_eq!(second.entries("/trunk"), first.entries("/trunk"));
    let cache = ctx.scope().get::<LogCache>().expect("cache created");
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn test_annotate_drops_refused_flag() {
    let repo = repository();
    repo.stage("/trunk/a.txt", "one\ntwo");
    let paths = ["/trunk".to_string()];
    repo.commit(&paths, "content", CommandOptions::empty(), &NotificationHub::new())
        .await
        .expect("commit succeeds");
    repo.reject_feature_once(CommandOptions::IGNORE_MIME_TYPE);
    let op = AnnotateOperation::new(repo.clone(), "/trunk/a.txt", true);

    let status = op.run(&OperationContext::detached()).await;

    assert!(status.is_ok(), "{}", status.render());
    assert!(op.is_downgraded());
    let texts: Vec<String> = op.lines().into_iter().map(|l| l.text).collect();
    assert_eq!(texts, vec!["one", "two"]);
    let annotate_calls: Vec<CommandOptions> = repo
        .calls()
        .iter()
        .filter(|c| c.verb == "annotate")
        .map(|c| c.options)
        .collect();
    assert_eq!(
        annotate_calls,
        vec![CommandOptions::IGNORE_MIME_TYPE, CommandOptions::empty()]
    );
}

#[test]
fn test_provided_resources_claim_the_workspace() {
    let repo = repository();
    let ledger: Arc<dyn ResourceProvider> = Arc::new(RevisionLedger::new());
    let cleanup = DeleteRemoteOperation::new(repo.clone(), ledger, "cleanup");
    let fixed = DeleteRemoteOperation::new(repo, set(&["/trunk/a.txt"]), "rm");

    assert!(cleanup.locking_domain().is_workspace());
    assert!(cleanup.locking_domain().overlaps(&LockingDomain::paths(["/anywhere"])));
    assert_eq!(fixed.locking_domain().to_string(), "/trunk/a.txt");
}

// --- Checkout ---

#[tokio::test]
async fn test_checkout_replaces_overlapping_projects() {
    let dir = tempfile::tempdir().expect("tempdir");
    let nested = dir.path().join("proj").join("nested");
    std::fs::create_dir_all(&nested).expect("create nested project");
    std::fs::write(nested.join("stale.txt"), "old").expect("write stale file");

    let workspace = Arc::new(MemoryWorkspace::new(dir.path()).with_project("other"));
    workspace.register(WorkspaceProject::new("nested", nested.clone()));
    let repo = Arc::new(MemoryRepository::new(ROOT).with_paths(["/trunk/src/main.c"]));
    let op = CheckoutAsOperation::new(
        repo,
        workspace.clone(),
        "proj",
        format!("{ROOT}/trunk"),
        dir.path(),
    );
    assert_eq!(op.overlapping().len(), 1);

    let status = op.run(&OperationContext::detached()).await;

    assert!(status.is_ok(), "{}", status.render());
    assert!(!nested.join("stale.txt").exists());
    assert!(dir.path().join("proj/src/main.c").exists());
    let names: Vec<String> = workspace.projects().into_iter().map(|p| p.name).collect();
    assert_eq!(names, vec!["other", "proj"]);
}

#[tokio::test]
async fn test_checkout_of_missing_url_registers_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let workspace = Arc::new(MemoryWorkspace::new(dir.path()));
    let repo = Arc::new(MemoryRepository::new(ROOT));
    let op = CheckoutAsOperation::new(
        repo,
        workspace.clone(),
        "proj",
        format!("{ROOT}/missing"),
        dir.path(),
    );

    let status = op.run(&OperationContext::detached()).await;

    assert_eq!(status.severity(), Severity::Error);
    assert!(workspace.projects().is_empty());
}

/// Puts `path` back to `0o755` so the temp dir can be cleaned up.
#[cfg(unix)]
struct RestorePermissions(std::path::PathBuf);

#[cfg(unix)]
impl RestorePermissions {
    fn set(path: &std::path::Path, mode: u32) -> Self {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
            .expect("change permissions");
        Self(path.to_path_buf())
    }
}

#[cfg(unix)]
impl Drop for RestorePermissions {
    fn drop(&mut self) {
        use std::os::unix::fs::PermissionsExt;
        let _ = std::fs::set_permissions(&self.0, std::fs::Permissions::from_mode(0o755));
    }
}

#[cfg(unix)]
#[tokio::test]
async fn test_checkout_stops_when_content_is_locked_externally() {
    let dir = tempfile::tempdir().expect("tempdir");
    let nested = dir.path().join("proj").join("nested");
    std::fs::create_dir_all(&nested).expect("create nested project");
    std::fs::write(nested.join("held.txt"), "busy").expect("write held file");
    let _restore = RestorePermissions::set(&nested, 0o555);
    if std::fs::write(nested.join("write-check"), "").is_ok() {
        // Permission bits are not enforced for this user.
        return;
    }

    let workspace = Arc::new(MemoryWorkspace::new(dir.path()));
    workspace.register(WorkspaceProject::new("nested", nested.clone()));
    let repo = Arc::new(MemoryRepository::new(ROOT).with_paths(["/trunk/src/main.c"]));
    let op = CheckoutAsOperation::new(
        repo.clone(),
        workspace.clone(),
        "proj",
        format!("{ROOT}/trunk"),
        dir.path(),
    );

    let status = op.run(&OperationContext::detached()).await;

    assert_eq!(status.severity(), Severity::Error);
    assert!(status.render().contains("locked externally"), "{}", status.render());
    assert!(repo.calls().iter().all(|call| call.verb != "checkout"));
    assert!(nested.join("held.txt").exists());
    let names: Vec<String> = workspace.projects().into_iter().map(|p| p.name).collect();
    assert_eq!(names, vec!["nested"], "uncleared project stays registered");
}

#[cfg(unix)]
#[tokio::test]
async fn test_checkout_reports_unreadable_destination() {
    let dir = tempfile::tempdir().expect("tempdir");
    let destination = dir.path().join("proj");
    std::fs::create_dir_all(destination.join("sub")).expect("create destination");
    let _restore = RestorePermissions::set(&destination, 0o000);
    if std::fs::read_dir(&destination).is_ok() {
        // Permission bits are not enforced for this user.
        return;
    }

    let workspace = Arc::new(MemoryWorkspace::new(dir.path()));
    let repo = Arc::new(MemoryRepository::new(ROOT).with_paths(["/trunk/src/main.c"]));
    let op = CheckoutAsOperation::new(
        repo.clone(),
        workspace.clone(),
        "proj",
        format!("{ROOT}/trunk"),
        dir.path(),
    );

    let status = op.run(&OperationContext::detached()).await;

    assert_eq!(status.severity(), Severity::Error);
    assert!(status.render().contains("failed to remove"), "{}", status.render());
    assert!(repo.calls().iter().all(|call| call.verb != "checkout"));
    assert!(workspace.projects().is_empty());
}

#[test]
fn test_checkout_domain_covers_nested_projects() {
    let workspace = MemoryWorkspace::new("/ws");
    workspace.register(WorkspaceProject::new("inner", "/ws/proj/inner"));
    let workspace: Arc<dyn Workspace> = Arc::new(workspace);
    let repo = Arc::new(MemoryRepository::new(ROOT));
    let op = CheckoutAsOperation::new(repo, workspace, "proj", ROOT, "/ws");

    assert_eq!(op.weight(), CHECKOUT_WEIGHT);
    assert_eq!(op.locking_domain().to_string(), "/ws/proj, /ws/proj/inner");
}
