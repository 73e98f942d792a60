// svnop-rs: Subversion operation engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Integration tests for operation workflows.
//!
//! Runs real operations against the in-memory repository through
//! composites and the scheduler. Unit tests for the individual pieces live
//! next to each module.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::future::BoxFuture;
use svnop_rs::composite::{CompositeOperation, ExecutionState};
use svnop_rs::connector::{CommandOptions, Connector, MemoryRepository};
use svnop_rs::console::{ChannelConsole, NullConsole};
use svnop_rs::error::Result;
use svnop_rs::ledger::{RevisionLedger, RevisionProvider};
use svnop_rs::operation::{ActionOperation, OperationContext, StepReporter};
use svnop_rs::operations::{
    CreateFolderOperation, GetLogMessagesOperation, ImportOperation, RepositoryTransferOperation,
    SetRevisionAuthorOperation, TransferKind,
};
use svnop_rs::progress::{CountingSink, ProgressMonitor};
use svnop_rs::scheduling::{LockingDomain, OperationScheduler};
use svnop_rs::status::Severity;
use tokio::sync::Barrier;
use tokio_util::sync::CancellationToken;

const ROOT: &str = "https://svn.example.com/repo";

fn repository() -> Arc<MemoryRepository> {
    Arc::new(MemoryRepository::new(ROOT).with_paths(["/trunk/a.txt", "/branches/"]))
}

fn counting_context() -> (Arc<CountingSink>, OperationContext) {
    let sink = Arc::new(CountingSink::new());
    let progress = ProgressMonitor::new(sink.clone(), CancellationToken::new());
    (sink, OperationContext::new(progress, Arc::new(NullConsole)))
}

fn mkdir(repo: &Arc<MemoryRepository>, path: &str) -> CreateFolderOperation {
    CreateFolderOperation::new(repo.clone(), vec![path.to_string()], "mkdir")
}

// =============================================================================
// Composite execution
// =============================================================================

#[tokio::test]
async fn failed_branch_skips_stamp_but_not_siblings() {
    let repo = repository();
    let branch = RepositoryTransferOperation::new(
        TransferKind::Branch,
        repo.clone(),
        vec!["/missing".to_string()],
        "/branches/b1",
        "branch",
    );
    let ledger: Arc<dyn RevisionProvider> = branch.ledger();
    let stamp = SetRevisionAuthorOperation::new(repo.clone(), ledger, "bot");
    let folder = mkdir(&repo, "/tags");

    let mut plan = CompositeOperation::new("release");
    let branch_id = plan.add(branch);
    let stamp_id = plan.add_after(Arc::new(stamp), &[branch_id]).unwrap();
    let folder_id = plan.add(folder);

    let (sink, ctx) = counting_context();
    let status = plan.run(&ctx).await;
    ctx.progress().done();

    assert_eq!(status.severity(), Severity::Error);
    assert_eq!(plan.state_of(stamp_id), Some(ExecutionState::Cancelled));
    assert_eq!(plan.state_of(folder_id), Some(ExecutionState::Done));
    assert!(repo.exists("/tags"));
    assert_eq!(sink.total_worked(), plan.weight());
}

#[tokio::test]
async fn aggregate_reflects_worst_child() {
    let repo = repository();
    repo.reject_feature(CommandOptions::INCLUDE_MERGED_REVISIONS);

    let mut clean = CompositeOperation::new("clean");
    clean.add(mkdir(&repo, "/one"));
    clean.add(mkdir(&repo, "/two"));
    let status = clean.run(&OperationContext::detached()).await;
    assert_eq!(status.severity(), Severity::Ok);

    let mut mixed = CompositeOperation::new("mixed");
    mixed.add(mkdir(&repo, "/three"));
    mixed.add(GetLogMessagesOperation::new(repo.clone(), ["/trunk"], false));
    mixed.add(mkdir(&repo, "/four"));
    let status = mixed.run(&OperationContext::detached()).await;

    assert_eq!(status.severity(), Severity::Error);
    assert_eq!(status.problems().len(), 1);
    assert!(repo.exists("/four"), "independent children still run");
}

// =============================================================================
// Revision ledger
// =============================================================================

#[tokio::test]
async fn ledger_keeps_arrival_order() {
    let repo = repository();
    repo.script_revisions([5, 7, 6]);

    let watched = Arc::new(RevisionLedger::new());
    let _subscription = watched.watch(
        repo.notifications(),
        vec!["/".to_string()],
        ROOT,
        Arc::new(NullConsole),
    );

    let a = mkdir(&repo, "/a");
    let b = mkdir(&repo, "/b");
    let c = mkdir(&repo, "/c");
    let ledgers = [a.ledger(), b.ledger(), c.ledger()];

    let mut plan = CompositeOperation::new("folders");
    let first = plan.add(a);
    let second = plan.add_after(Arc::new(b), &[first]).unwrap();
    plan.add_after(Arc::new(c), &[second]).unwrap();
    assert!(plan.run(&OperationContext::detached()).await.is_ok());

    let arrival: Vec<i64> = watched.revisions().iter().map(|p| p.revision).collect();
    assert_eq!(arrival, vec![5, 7, 6]);

    let per_operation: Vec<(i64, Vec<String>)> = ledgers
        .iter()
        .flat_map(|ledger| ledger.revisions())
        .map(|pair| (pair.revision, pair.paths))
        .collect();
    assert_eq!(
        per_operation,
        vec![
            (5, vec!["/a".to_string()]),
            (7, vec!["/b".to_string()]),
            (6, vec!["/c".to_string()]),
        ]
    );
}

#[tokio::test]
async fn ledger_feeds_dependent_author_stamp() {
    let repo = repository();
    let (console, rx) = ChannelConsole::new();
    let ctx = OperationContext::new(ProgressMonitor::detached(), Arc::new(console));

    let branch = RepositoryTransferOperation::new(
        TransferKind::Branch,
        repo.clone(),
        vec!["/trunk".to_string()],
        "/branches/b1",
        "branch",
    );
    let ledger = branch.ledger();
    let stamp = SetRevisionAuthorOperation::new(repo.clone(), ledger.clone(), "release-bot");

    let mut plan = CompositeOperation::new("branch and stamp");
    let id = plan.add(branch);
    plan.add_after(Arc::new(stamp), &[id]).unwrap();
    let status = plan.run(&ctx).await;

    assert!(status.is_ok(), "{}", status.render());
    assert_eq!(ledger.len(), 1);
    assert_eq!(
        repo.revision_property(1, "svn:author").as_deref(),
        Some("release-bot")
    );
    assert!(rx.drain().any(|line| line.text == "Committed revision 1."));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_operations_keep_their_own_revisions() {
    let repo = repository();
    let source = tempfile::tempdir().unwrap();
    std::fs::write(source.path().join("notes.txt"), "note").unwrap();

    let import = ImportOperation::new(repo.clone(), source.path(), "/import", "import");
    let folder = mkdir(&repo, "/other");
    let imported = import.ledger();
    let created = folder.ledger();

    let scheduler = OperationScheduler::with_concurrency(4);
    let first = scheduler.submit(Arc::new(import));
    let second = scheduler.submit(Arc::new(folder));
    assert!(first.wait().await.is_ok());
    assert!(second.wait().await.is_ok());

    let imported = imported.revisions();
    let created = created.revisions();
    assert_eq!(imported.len(), 1);
    assert_eq!(created.len(), 1);
    assert_eq!(imported[0].paths, vec!["/import".to_string()]);
    assert_eq!(created[0].paths, vec!["/other".to_string()]);

    let mut revisions = vec![imported[0].revision, created[0].revision];
    revisions.sort_unstable();
    assert_eq!(revisions, vec![1, 2]);
}

// =============================================================================
// Unsupported-feature retry
// =============================================================================

#[tokio::test]
async fn refused_flag_is_dropped_once_for_the_operation() {
    let repo = repository();
    repo.reject_feature_once(CommandOptions::INCLUDE_MERGED_REVISIONS);
    let op = GetLogMessagesOperation::new(repo.clone(), ["/trunk", "/branches"], true);

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
}

// =============================================================================
// Scheduler
// =============================================================================

struct Gauge {
    name: String,
    domain: LockingDomain,
    running: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    barrier: Option<Arc<Barrier>>,
}

impl Gauge {
    fn new(name: &str, path: &str, running: &Arc<AtomicUsize>, peak: &Arc<AtomicUsize>) -> Self {
        Self {
            name: name.to_string(),
            domain: LockingDomain::paths([path]),
            running: Arc::clone(running),
            peak: Arc::clone(peak),
            barrier: None,
        }
    }

    fn meeting(mut self, barrier: &Arc<Barrier>) -> Self {
        self.barrier = Some(Arc::clone(barrier));
        self
    }
}

impl ActionOperation for Gauge {
    fn name(&self) -> &str {
        &self.name
    }

    fn locking_domain(&self) -> LockingDomain {
        self.domain.clone()
    }

    fn run_impl<'a>(
        &'a self,
        ctx: &'a OperationContext,
        steps: &'a mut StepReporter,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            steps
                .protect(ctx.progress(), 1, |_| async {
                    match &self.barrier {
                        Some(barrier) => {
                            barrier.wait().await;
                        }
                        None => tokio::time::sleep(Duration::from_millis(20)).await,
                    }
                    Ok(())
                })
                .await;
            self.running.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        })
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn nested_domains_serialize() {
    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let scheduler = OperationScheduler::with_concurrency(4);

    let outer = scheduler.submit(Arc::new(Gauge::new("outer", "/a/b", &running, &peak)));
    let inner = scheduler.submit(Arc::new(Gauge::new("inner", "/a/b/c", &running, &peak)));

    assert!(outer.wait().await.is_ok());
    assert!(inner.wait().await.is_ok());
    assert_eq!(peak.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn disjoint_domains_run_together() {
    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(2));
    let scheduler = OperationScheduler::with_concurrency(4);

    let left = scheduler.submit(Arc::new(
        Gauge::new("left", "/a/b", &running, &peak).meeting(&barrier),
    ));
    let right = scheduler.submit(Arc::new(
        Gauge::new("right", "/x/y", &running, &peak).meeting(&barrier),
    ));

    let both = async { (left.wait().await, right.wait().await) };
    let (left, right) = tokio::time::timeout(Duration::from_secs(5), both)
        .await
        .expect("disjoint operations must not wait for each other");

    assert!(left.is_ok());
    assert!(right.is_ok());
    assert_eq!(peak.load(Ordering::SeqCst), 2);
}
