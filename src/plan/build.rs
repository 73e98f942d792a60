// svnop-rs: Subversion operation engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Turning a [`Plan`] into a runnable composite.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use super::{OperationKind, OperationSpec, Plan};
use crate::composite::{CompositeOperation, OperationId};
use crate::connector::{CommandOptions, Connector, MemoryRepository};
use crate::error::{PlanError, Result};
use crate::ledger::{ResourceProvider, RevisionLedger, RevisionPair, RevisionProvider};
use crate::operation::{ActionOperation, OperationContext, StepReporter};
use crate::operations::{
    AnnotateOperation, CommitOperation, CreateFolderOperation, DeleteRemoteOperation,
    GetLogMessagesOperation, ImportOperation, LockOperation, RepositoryTransferOperation,
    ResourceSet, SetRevisionAuthorOperation, TransferKind, UnlockOperation,
};
use crate::scheduling::LockingDomain;

/// A plan entry: the concrete operation under the entry's id.
pub struct PlannedOperation {
    id: String,
    weight: Option<u64>,
    inner: Arc<dyn ActionOperation>,
}

impl PlannedOperation {
    pub fn new(id: impl Into<String>, inner: Arc<dyn ActionOperation>) -> Self {
        Self {
            id: id.into(),
            weight: None,
            inner,
        }
    }

    /// Overrides the inner operation's weight.
    #[must_use]
    pub const fn with_weight(mut self, weight: u64) -> Self {
        self.weight = Some(weight);
        self
    }
}

impl ActionOperation for PlannedOperation {
    fn name(&self) -> &str {
        &self.id
    }

    fn weight(&self) -> u64 {
        self.weight.unwrap_or_else(|| self.inner.weight())
    }

    fn locking_domain(&self) -> LockingDomain {
        self.inner.locking_domain()
    }

    fn run_impl<'a>(
        &'a self,
        ctx: &'a OperationContext,
        steps: &'a mut StepReporter,
    ) -> BoxFuture<'a, Result<()>> {
        self.inner.run_impl(ctx, steps)
    }
}

/// A plan ready to run, with the repository it runs against.
pub struct BuiltPlan {
    operation: Arc<CompositeOperation>,
    repository: Arc<MemoryRepository>,
    ledgers: Vec<(String, Arc<RevisionLedger>)>,
}

impl BuiltPlan {
    /// The composite holding every plan entry.
    #[must_use]
    pub fn operation(&self) -> Arc<CompositeOperation> {
        Arc::clone(&self.operation)
    }

    /// Repository the plan operates on.
    #[must_use]
    pub const fn repository(&self) -> &Arc<MemoryRepository> {
        &self.repository
    }

    /// Ledger of the entry `id`, if its kind records revisions.
    #[must_use]
    pub fn ledger(&self, id: &str) -> Option<Arc<RevisionLedger>> {
        self.ledgers
            .iter()
            .find(|(entry, _)| entry == id)
            .map(|(_, ledger)| Arc::clone(ledger))
    }

    /// Every recorded revision, by entry in plan order.
    #[must_use]
    pub fn revisions(&self) -> Vec<(String, RevisionPair)> {
        self.ledgers
            .iter()
            .flat_map(|(id, ledger)| {
                ledger
                    .revisions()
                    .into_iter()
                    .map(move |pair| (id.clone(), pair))
            })
            .collect()
    }
}

impl Plan {
    /// Builds the composite and a repository seeded from the plan.
    ///
    /// `retry` is the default opt-in for the unsupported-feature retry;
    /// entries may override it.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError`] for unknown kinds, duplicate ids, references
    /// to ids not defined earlier, and missing fields.
    pub fn build(&self, retry: bool) -> Result<BuiltPlan> {
        let mut repository =
            MemoryRepository::new(&self.repository.url).with_paths(&self.repository.seed);
        if let Some(author) = &self.repository.author {
            repository = repository.with_author(author);
        }
        let repository = Arc::new(repository);

        let mut builder = Builder {
            composite: CompositeOperation::new(&self.name),
            ids: HashMap::new(),
            ledgers: Vec::new(),
            connector: repository.clone(),
            repository: Arc::clone(&repository),
            retry,
        };
        for spec in &self.operations {
            builder.add(spec)?;
        }
        tracing::info!(
            plan = %self.name,
            operations = builder.composite.len(),
            "plan built"
        );

        Ok(BuiltPlan {
            operation: Arc::new(builder.composite),
            repository,
            ledgers: builder.ledgers,
        })
    }
}

type Instantiated = (Arc<dyn ActionOperation>, Option<Arc<RevisionLedger>>);

struct Builder {
    composite: CompositeOperation,
    ids: HashMap<String, OperationId>,
    ledgers: Vec<(String, Arc<RevisionLedger>)>,
    connector: Arc<dyn Connector>,
    repository: Arc<MemoryRepository>,
    retry: bool,
}

fn missing(spec: &OperationSpec, kind: OperationKind, field: &'static str) -> PlanError {
    PlanError::MissingField {
        id: spec.id.clone(),
        kind: kind.to_string(),
        field,
    }
}

/// Fixed `paths` only; used by kinds that read rather than create.
fn fixed_paths(spec: &OperationSpec, kind: OperationKind) -> Result<&[String]> {
    if spec.paths.is_empty() {
        return Err(missing(spec, kind, "paths").into());
    }
    Ok(&spec.paths)
}

impl Builder {
    fn add(&mut self, spec: &OperationSpec) -> Result<()> {
        if self.ids.contains_key(&spec.id) {
            return Err(PlanError::DuplicateId(spec.id.clone()).into());
        }
        let kind = spec.kind()?;
        if spec.weight == Some(0) {
            return Err(PlanError::InvalidWeight {
                id: spec.id.clone(),
            }
            .into());
        }
        let prerequisites = spec
            .references()
            .into_iter()
            .map(|reference| {
                self.ids
                    .get(reference)
                    .copied()
                    .ok_or_else(|| PlanError::UnknownReference {
                        id: spec.id.clone(),
                        reference: reference.to_string(),
                    })
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let (operation, ledger) = self.instantiate(spec, kind)?;
        let mut planned = PlannedOperation::new(&spec.id, operation);
        if let Some(weight) = spec.weight {
            planned = planned.with_weight(weight);
        }
        let id = self.composite.add_after(Arc::new(planned), &prerequisites)?;
        tracing::debug!(
            id = %spec.id,
            kind = %kind,
            prerequisites = prerequisites.len(),
            "operation planned"
        );

        self.ids.insert(spec.id.clone(), id);
        if let Some(ledger) = ledger {
            self.ledgers.push((spec.id.clone(), ledger));
        }
        Ok(())
    }

    fn ledger_of(&self, spec: &OperationSpec, reference: &str) -> Result<Arc<RevisionLedger>> {
        self.ledgers
            .iter()
            .find(|(id, _)| id == reference)
            .map(|(_, ledger)| Arc::clone(ledger))
            .ok_or_else(|| {
                PlanError::UnknownReference {
                    id: spec.id.clone(),
                    reference: reference.to_string(),
                }
                .into()
            })
    }

    /// Fixed `paths`, or the paths created by `paths_from`.
    fn resources(&self, spec: &OperationSpec, kind: OperationKind) -> Result<ResourceSet> {
        if let Some(reference) = &spec.paths_from {
            let provider: Arc<dyn ResourceProvider> = self.ledger_of(spec, reference)?;
            return Ok(ResourceSet::from(provider));
        }
        if spec.paths.is_empty() {
            return Err(missing(spec, kind, "paths").into());
        }
        Ok(ResourceSet::from(spec.paths.clone()))
    }

    fn instantiate(&self, spec: &OperationSpec, kind: OperationKind) -> Result<Instantiated> {
        let connector = Arc::clone(&self.connector);
        let message = spec.message.clone().unwrap_or_default();
        let force = if spec.force {
            CommandOptions::FORCE
        } else {
            CommandOptions::empty()
        };
        let retry = spec.retry.unwrap_or(self.retry);

        let instantiated: Instantiated = match kind {
            OperationKind::Mkdir => {
                let op = CreateFolderOperation::new(connector, self.resources(spec, kind)?, message);
                let ledger = op.ledger();
                (Arc::new(op), Some(ledger))
            }
            OperationKind::Copy | OperationKind::Move | OperationKind::Branch | OperationKind::Tag => {
                let transfer = match kind {
                    OperationKind::Move => TransferKind::Move,
                    OperationKind::Branch => TransferKind::Branch,
                    OperationKind::Tag => TransferKind::Tag,
                    _ => TransferKind::Copy,
                };
                let destination = spec
                    .destination
                    .clone()
                    .ok_or_else(|| missing(spec, kind, "destination"))?;
                let op = RepositoryTransferOperation::new(
                    transfer,
                    connector,
                    self.resources(spec, kind)?,
                    destination,
                    message,
                )
                .with_options(force);
                let ledger = op.ledger();
                (Arc::new(op), Some(ledger))
            }
            OperationKind::Delete => {
                let op = DeleteRemoteOperation::new(connector, self.resources(spec, kind)?, message)
                    .with_options(force);
                let ledger = op.ledger();
                (Arc::new(op), Some(ledger))
            }
            OperationKind::Commit => {
                let paths = self.resources(spec, kind)?;
                if let Some(content) = &spec.content {
                    for path in &spec.paths {
                        self.repository.stage(path, content.clone());
                    }
                }
                let op = CommitOperation::new(connector, paths, message);
                let ledger = op.ledger();
                (Arc::new(op), Some(ledger))
            }
            OperationKind::Import => {
                let source = spec
                    .source
                    .clone()
                    .ok_or_else(|| missing(spec, kind, "source"))?;
                let destination = spec
                    .destination
                    .clone()
                    .ok_or_else(|| missing(spec, kind, "destination"))?;
                let op = ImportOperation::new(connector, source, destination, message);
                let ledger = op.ledger();
                (Arc::new(op), Some(ledger))
            }
            OperationKind::Lock => {
                let op = LockOperation::new(connector, self.resources(spec, kind)?, message)
                    .with_options(force);
                (Arc::new(op), None)
            }
            OperationKind::Unlock => {
                let op =
                    UnlockOperation::new(connector, self.resources(spec, kind)?).with_options(force);
                (Arc::new(op), None)
            }
            OperationKind::Log => {
                let urls = fixed_paths(spec, kind)?;
                let op = GetLogMessagesOperation::new(connector, urls, retry)
                    .with_limit(spec.limit.unwrap_or(0));
                (Arc::new(op), None)
            }
            OperationKind::Annotate => {
                let urls = fixed_paths(spec, kind)?;
                if let [url] = urls {
                    (Arc::new(AnnotateOperation::new(connector, url, retry)), None)
                } else {
                    let mut each = CompositeOperation::new(&spec.id);
                    for url in urls {
                        each.add(AnnotateOperation::new(Arc::clone(&connector), url, retry));
                    }
                    (Arc::new(each), None)
                }
            }
            OperationKind::SetAuthor => {
                let reference = spec
                    .revisions_from
                    .as_deref()
                    .ok_or_else(|| missing(spec, kind, "revisions_from"))?;
                let author = spec
                    .author
                    .clone()
                    .ok_or_else(|| missing(spec, kind, "author"))?;
                let provider: Arc<dyn RevisionProvider> = self.ledger_of(spec, reference)?;
                let op = SetRevisionAuthorOperation::new(connector, provider, author);
                (Arc::new(op), None)
            }
        };
        Ok(instantiated)
    }
}
