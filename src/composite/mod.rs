// svnop-rs: Subversion operation engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Dependency-ordered composition of operations.
//!
//! # Execution
//!
//! ```text
//!   add(a)  add(b)  add_after(c, [a, b])  add(d)
//!
//!        a ----.
//!               >--> c          d
//!        b ----'
//!
//!   ready queue (FIFO): [a, b, d] -> run a, run b, c becomes ready,
//!                        run d, run c
//!
//!   a fails  => c (and everything after c) is skipped and CANCELLED,
//!               b and d still run
//! ```
//!
//! Children run one at a time. Each child gets a progress sub-range
//! sized by its weight, so the composite's total equals the sum of child
//! weights and nested composites forward their range unchanged.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::future::BoxFuture;
use petgraph::Direction;
use petgraph::algo::has_path_connecting;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::error::{GraphError, Result};
use crate::operation::{ActionOperation, OperationContext, StepReporter};
use crate::scheduling::LockingDomain;
use crate::status::Status;

/// Handle to a child of a [`CompositeOperation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationId(NodeIndex);

impl OperationId {
    /// Position of the child in insertion order.
    #[must_use]
    pub fn index(self) -> usize {
        self.0.index()
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0.index())
    }
}

/// Lifecycle of a child within one composite run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionState {
    #[default]
    NotStarted,
    Running,
    Done,
    Cancelled,
}

/// An ordered set of operations plus dependency edges, run as one.
///
/// Edges point from prerequisite to dependent. The graph is kept acyclic:
/// [`depend`](Self::depend) refuses any edge that would close a cycle.
pub struct CompositeOperation {
    name: String,
    graph: DiGraph<Arc<dyn ActionOperation>, ()>,
    states: Mutex<Vec<ExecutionState>>,
}

impl CompositeOperation {
    /// Creates an empty composite.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            graph: DiGraph::new(),
            states: Mutex::new(Vec::new()),
        }
    }

    /// Adds a child with no prerequisites.
    pub fn add(&mut self, operation: impl ActionOperation + 'static) -> OperationId {
        self.add_shared(Arc::new(operation))
    }

    /// Adds a child that is also referenced elsewhere.
    pub fn add_shared(&mut self, operation: Arc<dyn ActionOperation>) -> OperationId {
        let id = OperationId(self.graph.add_node(operation));
        self.lock_states().push(ExecutionState::NotStarted);
        id
    }

    /// Adds a child that runs only after every id in `prerequisites`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownOperation`] if a prerequisite does not
    /// belong to this composite. The child is not added in that case.
    pub fn add_after(
        &mut self,
        operation: Arc<dyn ActionOperation>,
        prerequisites: &[OperationId],
    ) -> std::result::Result<OperationId, GraphError> {
        if let Some(unknown) = prerequisites.iter().find(|id| !self.contains(**id)) {
            return Err(GraphError::UnknownOperation(unknown.index()));
        }
        let id = self.add_shared(operation);
        for prerequisite in prerequisites {
            self.depend(id, *prerequisite)?;
        }
        Ok(id)
    }

    /// Declares that `dependent` runs only after `prerequisite`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] for unknown ids, self dependencies, and
    /// edges that would create a cycle.
    pub fn depend(
        &mut self,
        dependent: OperationId,
        prerequisite: OperationId,
    ) -> std::result::Result<(), GraphError> {
        for id in [dependent, prerequisite] {
            if !self.contains(id) {
                return Err(GraphError::UnknownOperation(id.index()));
            }
        }
        if dependent == prerequisite {
            return Err(GraphError::SelfDependency(
                self.graph[dependent.0].name().to_string(),
            ));
        }
        if has_path_connecting(&self.graph, dependent.0, prerequisite.0, None) {
            return Err(GraphError::Cycle {
                dependent: self.graph[dependent.0].name().to_string(),
                prerequisite: self.graph[prerequisite.0].name().to_string(),
            });
        }
        self.graph.update_edge(prerequisite.0, dependent.0, ());
        Ok(())
    }

    fn contains(&self, id: OperationId) -> bool {
        id.index() < self.graph.node_count()
    }

    /// Number of children.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Whether the composite has no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Ids of every child in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = OperationId> + '_ {
        self.graph.node_indices().map(OperationId)
    }

    /// Returns a child by id.
    #[must_use]
    pub fn operation(&self, id: OperationId) -> Option<&Arc<dyn ActionOperation>> {
        self.graph.node_weight(id.0)
    }

    /// Direct prerequisites of a child, in insertion order.
    #[must_use]
    pub fn prerequisites(&self, id: OperationId) -> Vec<OperationId> {
        let mut ids: Vec<OperationId> = self
            .graph
            .neighbors_directed(id.0, Direction::Incoming)
            .map(OperationId)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// State of one child in the current or last run.
    #[must_use]
    pub fn state_of(&self, id: OperationId) -> Option<ExecutionState> {
        self.lock_states().get(id.index()).copied()
    }

    /// States of every child in insertion order.
    #[must_use]
    pub fn states(&self) -> Vec<ExecutionState> {
        self.lock_states().clone()
    }

    fn lock_states(&self) -> std::sync::MutexGuard<'_, Vec<ExecutionState>> {
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, node: NodeIndex, state: ExecutionState) {
        if let Some(slot) = self.lock_states().get_mut(node.index()) {
            *slot = state;
        }
    }

    /// Dependents of `node`, in insertion order.
    fn dependents(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut nodes: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(node, Direction::Outgoing)
            .collect();
        nodes.sort_unstable();
        nodes
    }

    /// Marks every not-yet-started transitive dependent of `failed` as
    /// skipped, recording a CANCELLED status and flushing its progress.
    fn skip_dependents(
        &self,
        failed: NodeIndex,
        skipped: &mut [bool],
        ctx: &OperationContext,
        steps: &mut StepReporter,
    ) {
        let cause = self.graph[failed].name().to_string();
        let mut stack = self.dependents(failed);
        stack.reverse();
        while let Some(node) = stack.pop() {
            if skipped[node.index()] {
                continue;
            }
            skipped[node.index()] = true;
            let child = &self.graph[node];
            tracing::info!(
                composite = %self.name,
                operation = %child.name(),
                prerequisite = %cause,
                "skipping dependent of unsuccessful prerequisite"
            );
            self.set_state(node, ExecutionState::Cancelled);
            ctx.progress().subrange(child.weight()).done();
            steps.record(Status::cancelled(format!(
                "{} skipped: prerequisite {cause} did not complete",
                child.name()
            )));
            let mut next = self.dependents(node);
            next.reverse();
            stack.extend(next);
        }
    }
}

impl ActionOperation for CompositeOperation {
    fn name(&self) -> &str {
        &self.name
    }

    /// Sum of child weights.
    fn weight(&self) -> u64 {
        self.graph
            .node_weights()
            .map(|op| op.weight())
            .fold(0, u64::saturating_add)
    }

    /// Union of child domains, so the whole composite takes one lock.
    fn locking_domain(&self) -> LockingDomain {
        let domains: Vec<LockingDomain> = self
            .graph
            .node_weights()
            .map(|op| op.locking_domain())
            .collect();
        LockingDomain::merge_all(&domains)
    }

    fn run_impl<'a>(
        &'a self,
        ctx: &'a OperationContext,
        steps: &'a mut StepReporter,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let count = self.graph.node_count();
            *self.lock_states() = vec![ExecutionState::NotStarted; count];

            let progress = ctx.progress();
            progress.begin_task(&self.name, self.weight());

            let mut pending: Vec<usize> = self
                .graph
                .node_indices()
                .map(|node| {
                    self.graph
                        .neighbors_directed(node, Direction::Incoming)
                        .count()
                })
                .collect();
            let mut skipped = vec![false; count];
            let mut ready: VecDeque<NodeIndex> = self
                .graph
                .node_indices()
                .filter(|node| pending[node.index()] == 0)
                .collect();

            while let Some(node) = ready.pop_front() {
                let child = &self.graph[node];
                let sub = progress.subrange(child.weight());

                let status = if ctx.is_cancelled() {
                    sub.done();
                    Status::cancelled(format!("{} cancelled", child.name()))
                } else {
                    tracing::debug!(composite = %self.name, operation = %child.name(), "running child");
                    self.set_state(node, ExecutionState::Running);
                    let status = child.run(&ctx.with_progress(sub.clone())).await;
                    sub.done();
                    status
                };

                let passed = status.severity().allows_dependents();
                self.set_state(
                    node,
                    if status.is_cancelled() {
                        ExecutionState::Cancelled
                    } else {
                        ExecutionState::Done
                    },
                );
                steps.record(status);

                if passed {
                    for dependent in self.dependents(node) {
                        let slot = &mut pending[dependent.index()];
                        *slot = slot.saturating_sub(1);
                        if *slot == 0 && !skipped[dependent.index()] {
                            ready.push_back(dependent);
                        }
                    }
                } else {
                    self.skip_dependents(node, &mut skipped, ctx, steps);
                }
            }
            Ok(())
        })
    }
}

impl fmt::Debug for CompositeOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let children: Vec<&str> = self.graph.node_weights().map(|op| op.name()).collect();
        f.debug_struct("CompositeOperation")
            .field("name", &self.name)
            .field("children", &children)
            .field("edges", &self.graph.edge_count())
            .finish()
    }
}
