// svnop-rs: Subversion operation engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! History retrieval.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::future::BoxFuture;

use crate::connector::{CommandOptions, Connector, LogEntry};
use crate::console::CommandLine;
use crate::error::Result;
use crate::operation::{ActionOperation, FeatureRetry, OperationContext, StepReporter};

/// Log entries fetched during one run, shared by every log operation in it.
///
/// Lives in the run's [`RunScope`](crate::operation::RunScope) and is
/// dropped with it.
#[derive(Debug, Default)]
pub struct LogCache {
    entries: Mutex<HashMap<(String, usize), Vec<LogEntry>>>,
}

impl LogCache {
    fn get(&self, url: &str, limit: usize) -> Option<Vec<LogEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(url.to_string(), limit))
            .cloned()
    }

    fn insert(&self, url: &str, limit: usize, entries: Vec<LogEntry>) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((url.to_string(), limit), entries);
    }

    /// Number of cached histories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Fetches the history of one or more URLs.
///
/// Merged revisions are requested by default; a server that does not
/// support them is asked again without, once, and never again for the
/// lifetime of the operation.
pub struct GetLogMessagesOperation {
    urls: Vec<String>,
    limit: usize,
    options: CommandOptions,
    retry: FeatureRetry,
    connector: Arc<dyn Connector>,
    results: Mutex<Vec<(String, Vec<LogEntry>)>>,
}

impl GetLogMessagesOperation {
    /// `retry` opts into the unsupported-feature downgrade.
    pub fn new<I, S>(connector: Arc<dyn Connector>, urls: I, retry: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            urls: urls.into_iter().map(Into::into).collect(),
            limit: 0,
            options: CommandOptions::INCLUDE_MERGED_REVISIONS,
            retry: FeatureRetry::new(CommandOptions::INCLUDE_MERGED_REVISIONS, retry),
            connector,
            results: Mutex::new(Vec::new()),
        }
    }

    /// At most `limit` entries per URL (0 = all).
    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    #[must_use]
    pub const fn with_options(mut self, options: CommandOptions) -> Self {
        self.options = options;
        self
    }

    /// Whether merged revisions were dropped after a server refusal.
    #[must_use]
    pub fn is_downgraded(&self) -> bool {
        self.retry.is_downgraded()
    }

    /// Entries fetched for `url` by the last run.
    #[must_use]
    pub fn entries(&self, url: &str) -> Option<Vec<LogEntry>> {
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|(u, _)| u == url)
            .map(|(_, entries)| entries.clone())
    }

    fn store(&self, url: &str, entries: Vec<LogEntry>) {
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((url.to_string(), entries));
    }
}

impl ActionOperation for GetLogMessagesOperation {
    fn name(&self) -> &str {
        "Get Log Messages"
    }

    fn run_impl<'a>(
        &'a self,
        ctx: &'a OperationContext,
        steps: &'a mut StepReporter,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.results
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clear();
            let cache = ctx.scope().get_or_insert_with(LogCache::default);
            let progress = ctx.progress();
            progress.begin_task(self.name(), self.urls.len() as u64);

            for url in &self.urls {
                if let Some(entries) = cache.get(url, self.limit) {
                    tracing::debug!(url = %url, "log served from run cache");
                    self.store(url, entries);
                    progress.worked(1);
                    continue;
                }

                let mut line = CommandLine::new("log").path(url);
                if self.limit > 0 {
                    line = line.arg(&format!("--limit {}", self.limit));
                }
                line.flags(self.retry.effective(self.options))
                    .emit(ctx.console());

                let shared = &cache;
                let outcome = steps
                    .protect(progress, 1, |_| async move {
                        let entries = self
                            .retry
                            .call(self.options, |options| {
                                self.connector.log(url, self.limit, options)
                            })
                            .await?;
                        shared.insert(url, self.limit, entries.clone());
                        self.store(url, entries);
                        Ok(())
                    })
                    .await;
                if outcome.should_stop() {
                    break;
                }
            }
            Ok(())
        })
    }
}
