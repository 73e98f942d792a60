// svnop-rs: Subversion operation engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use std::sync::{Arc, Mutex};

use super::{
    CommandOptions, Connector, INVALID_REVISION, MemoryRepository, Notification, NotificationHub,
};
use crate::error::ErrorCode;

fn repo() -> MemoryRepository {
    MemoryRepository::new("svn://memory/repo").with_paths([
        "/trunk/",
        "/trunk/src/",
        "/trunk/src/main.c",
        "/trunk/README",
        "/branches/",
        "/tags/",
    ])
}

/// Per-call hub nobody listens on.
fn hub() -> NotificationHub {
    NotificationHub::new()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}

fn record_revisions(hub: &NotificationHub) -> (Arc<Mutex<Vec<i64>>>, super::Subscription) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let subscription = hub.subscribe(move |n: &Notification| sink.lock().unwrap().push(n.revision));
    (seen, subscription)
}

#[test]
fn test_command_line_flags() {
    let flags =
        CommandOptions::FORCE | CommandOptions::MAKE_PARENTS | CommandOptions::INTERPRET_AS_CHILD;
    assert_eq!(flags.as_command_line(), " --force --parents");
    assert_eq!(CommandOptions::empty().as_command_line(), "");
}

#[test]
fn test_subscription_deregisters_on_drop() {
    let hub = NotificationHub::new();
    let (seen, subscription) = record_revisions(&hub);
    assert_eq!(hub.listener_count(), 1);

    hub.notify(&Notification::committed(3));
    drop(subscription);
    hub.notify(&Notification::committed(4));

    assert_eq!(hub.listener_count(), 0);
    assert_eq!(*seen.lock().unwrap(), vec![3]);
}

#[test]
fn test_subscription_outliving_hub_is_harmless() {
    let hub = NotificationHub::new();
    let (_seen, subscription) = record_revisions(&hub);
    drop(hub);
    drop(subscription);
}

#[tokio::test]
async fn test_mkdir_assigns_increasing_revisions() {
    let repo = repo();
    let (seen, _sub) = record_revisions(repo.notifications());

    repo.mkdir(&strings(&["/trunk/docs"]), "docs", CommandOptions::empty(), &hub())
        .await
        .unwrap();
    repo.mkdir(
        &strings(&["svn://memory/repo/deep/er/dir"]),
        "deep",
        CommandOptions::MAKE_PARENTS,
        &hub(),
    )
    .await
    .unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    assert!(repo.exists("/deep/er"));
    assert!(repo.exists("/trunk/docs"));
}

#[tokio::test]
async fn test_mkdir_without_parents_fails() {
    let repo = repo();
    let err = repo
        .mkdir(&strings(&["/nope/child"]), "x", CommandOptions::empty(), &hub())
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::PathNotFound);
    assert_eq!(repo.head(), 0);
}

#[tokio::test]
async fn test_copy_into_existing_directory_as_child() {
    let repo = repo();
    repo.copy(&strings(&["/trunk"]), "/branches", "branch", CommandOptions::empty(), &hub())
        .await
        .unwrap();
    assert!(repo.exists("/branches/trunk/src/main.c"));
    assert!(repo.exists("/trunk/src/main.c"));
}

#[tokio::test]
async fn test_move_removes_source() {
    let repo = repo();
    repo.move_to(
        &strings(&["/trunk/README"]),
        "/trunk/README.md",
        "rename",
        CommandOptions::empty(),
        &hub(),
    )
    .await
    .unwrap();
    assert!(!repo.exists("/trunk/README"));
    assert!(repo.exists("/trunk/README.md"));
}

#[tokio::test]
async fn test_copy_into_itself_is_rejected() {
    let repo = repo();
    let err = repo
        .copy(&strings(&["/trunk"]), "/trunk/src/again", "loop", CommandOptions::empty(), &hub())
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::FsConflict);
}

#[tokio::test]
async fn test_commit_without_changes_notifies_invalid_revision() {
    let repo = repo();
    let (seen, _sub) = record_revisions(repo.notifications());
    repo.commit(&strings(&["/trunk"]), "nothing", CommandOptions::empty(), &hub())
        .await
        .unwrap();
    assert_eq!(*seen.lock().unwrap(), vec![INVALID_REVISION]);
}

#[tokio::test]
async fn test_call_hub_hears_only_its_own_command() {
    let repo = repo();
    let (everything, _all) = record_revisions(repo.notifications());
    let first = hub();
    let second = hub();
    let (first_seen, _first) = record_revisions(&first);
    let (second_seen, _second) = record_revisions(&second);

    repo.mkdir(&strings(&["/a"]), "a", CommandOptions::empty(), &first)
        .await
        .unwrap();
    repo.mkdir(&strings(&["/b"]), "b", CommandOptions::empty(), &second)
        .await
        .unwrap();
    repo.copy(&strings(&["/a"]), "/c", "c", CommandOptions::empty(), &first)
        .await
        .unwrap();

    assert_eq!(*first_seen.lock().unwrap(), vec![1, 3]);
    assert_eq!(*second_seen.lock().unwrap(), vec![2]);
    assert_eq!(*everything.lock().unwrap(), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_commit_releases_locks_unless_kept() {
    let repo = repo();
    let paths = strings(&["/trunk/README"]);
    repo.lock(&paths, "editing", CommandOptions::empty()).await.unwrap();

    repo.stage("/trunk/README", "hello\n");
    repo.commit(&paths, "keep", CommandOptions::KEEP_LOCKS, &hub()).await.unwrap();
    assert!(repo.is_locked("/trunk/README"));

    repo.stage("/trunk/README", "hello again\n");
    repo.commit(&paths, "release", CommandOptions::empty(), &hub()).await.unwrap();
    assert!(!repo.is_locked("/trunk/README"));
    assert_eq!(repo.file_content("/trunk/README").as_deref(), Some("hello again\n"));
}

#[tokio::test]
async fn test_scripted_revisions_arrive_in_script_order() {
    let repo = repo();
    repo.script_revisions([5, 7, 6]);
    let (seen, _sub) = record_revisions(repo.notifications());
    for dir in ["/a", "/b", "/c"] {
        repo.mkdir(&strings(&[dir]), "m", CommandOptions::empty(), &hub()).await.unwrap();
    }
    assert_eq!(*seen.lock().unwrap(), vec![5, 7, 6]);
    assert_eq!(repo.head(), 7);
}

#[tokio::test]
async fn test_reject_feature_once() {
    let repo = repo();
    repo.reject_feature_once(CommandOptions::INCLUDE_MERGED_REVISIONS);

    let err = repo
        .log("/trunk", 0, CommandOptions::INCLUDE_MERGED_REVISIONS)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::UnsupportedFeature);

    repo.log("/trunk", 0, CommandOptions::INCLUDE_MERGED_REVISIONS)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_failing_path_applies_to_descendants() {
    let repo = repo();
    repo.fail_path("/trunk/src", ErrorCode::Locked);
    let err = repo
        .remove(&strings(&["/trunk/src/main.c"]), "rm", CommandOptions::empty(), &hub())
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::Locked);
    assert!(repo.exists("/trunk/src/main.c"));
}

#[tokio::test]
async fn test_unlock_requires_lock() {
    let repo = repo();
    let err = repo
        .unlock(&strings(&["/trunk/README"]), CommandOptions::empty())
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotLocked);
}

#[tokio::test]
async fn test_log_newest_first_with_limit() {
    let repo = repo();
    for dir in ["/trunk/a", "/trunk/b", "/other"] {
        repo.mkdir(&strings(&[dir]), &format!("add {dir}"), CommandOptions::empty(), &hub())
            .await
            .unwrap();
    }
    repo.record_merge(2, vec![1]);

    let entries = repo.log("/trunk", 0, CommandOptions::empty()).await.unwrap();
    let revisions: Vec<i64> = entries.iter().map(|e| e.revision).collect();
    assert_eq!(revisions, vec![2, 1]);
    assert!(entries[0].merged_revisions.is_empty());

    let entries = repo
        .log("/trunk", 1, CommandOptions::INCLUDE_MERGED_REVISIONS)
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].merged_revisions, vec![1]);
}

#[tokio::test]
async fn test_annotate_binary_requires_ignore_mime_type() {
    let repo = repo();
    repo.stage("/trunk/logo.png", "line one\nline two\n");
    repo.commit(&strings(&["/trunk"]), "logo", CommandOptions::empty(), &hub())
        .await
        .unwrap();
    repo.set_property(
        "/trunk/logo.png",
        "svn:mime-type",
        "image/png",
        "mime",
        CommandOptions::empty(),
        &hub(),
    )
    .await
    .unwrap();

    let err = repo
        .annotate("/trunk/logo.png", CommandOptions::empty())
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::Other);

    let lines = repo
        .annotate("/trunk/logo.png", CommandOptions::IGNORE_MIME_TYPE)
        .await
        .unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].revision, 1);
}

#[tokio::test]
async fn test_revision_property_rewrites_log_author() {
    let repo = repo();
    repo.mkdir(&strings(&["/x"]), "x", CommandOptions::empty(), &hub()).await.unwrap();
    repo.set_revision_property("/", 1, "svn:author", "alice").await.unwrap();

    assert_eq!(repo.revision_property(1, "svn:author").as_deref(), Some("alice"));
    let entries = repo.log("/x", 0, CommandOptions::empty()).await.unwrap();
    assert_eq!(entries[0].author, "alice");

    let err = repo
        .set_revision_property("/", 9, "svn:author", "bob")
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::PathNotFound);
}

#[tokio::test]
async fn test_checkout_and_import_through_file_system() {
    let repo = repo();
    repo.stage("/trunk/src/main.c", "int main() {}\n");
    repo.commit(&strings(&["/trunk"]), "code", CommandOptions::empty(), &hub())
        .await
        .unwrap();

    let temp = tempfile::tempdir().unwrap();
    let wc = temp.path().join("wc");
    let revision = repo
        .checkout("svn://memory/repo/trunk", None, &wc, CommandOptions::empty())
        .await
        .unwrap();
    assert_eq!(revision, 1);
    assert_eq!(
        std::fs::read_to_string(wc.join("src/main.c")).unwrap(),
        "int main() {}\n"
    );

    std::fs::create_dir_all(wc.join("extra")).unwrap();
    std::fs::write(wc.join("extra/notes.txt"), "note").unwrap();
    repo.import(&wc.join("extra"), "/imported", "import", CommandOptions::empty(), &hub())
        .await
        .unwrap();
    assert_eq!(repo.file_content("/imported/notes.txt").as_deref(), Some("note"));
}
